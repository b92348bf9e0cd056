use crate::error::{DomainError, Result};
use serde::{Deserialize, Serialize};

/// Device connection status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceStatus {
    /// Registered but never provisioned with network credentials
    NotConfigured,
    /// Network credentials delivered
    Configured,
    Online,
    Offline,
}

impl DeviceStatus {
    pub const ALL: [DeviceStatus; 4] = [
        Self::NotConfigured,
        Self::Configured,
        Self::Online,
        Self::Offline,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotConfigured => "not_configured",
            Self::Configured => "configured",
            Self::Online => "online",
            Self::Offline => "offline",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|s| s.as_str() == value)
            .ok_or_else(|| {
                DomainError::InvalidInput(format!(
                    "Invalid device status '{value}'. Must be one of: not_configured, configured, online, offline"
                ))
            })
    }
}

impl Default for DeviceStatus {
    fn default() -> Self {
        Self::NotConfigured
    }
}

impl std::fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_status_as_str() {
        assert_eq!(DeviceStatus::NotConfigured.as_str(), "not_configured");
        assert_eq!(DeviceStatus::Configured.as_str(), "configured");
        assert_eq!(DeviceStatus::Online.as_str(), "online");
        assert_eq!(DeviceStatus::Offline.as_str(), "offline");
    }

    #[test]
    fn test_parse_matches_serde_names() {
        for status in DeviceStatus::ALL {
            let json = serde_json::to_value(status).unwrap();
            assert_eq!(json, serde_json::json!(status.as_str()));
            assert_eq!(DeviceStatus::parse(status.as_str()).unwrap(), status);
        }
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert!(matches!(
            DeviceStatus::parse("rebooting"),
            Err(DomainError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_default() {
        assert_eq!(DeviceStatus::default(), DeviceStatus::NotConfigured);
    }
}
