use crate::error::{DomainError, Result};
use serde::{Deserialize, Serialize};

/// Value object representing a hardware MAC address
///
/// Rules:
/// - Six hex octets separated by `:` or `-`
/// - Stored upper-case with `:` separators so uniqueness is checked on one spelling
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MacAddress(String);

impl MacAddress {
    pub fn new(mac: impl Into<String>) -> Result<Self> {
        let mac = mac.into();
        let trimmed = mac.trim();

        if trimmed.is_empty() {
            return Err(DomainError::InvalidInput(
                "MAC address cannot be empty".to_string(),
            ));
        }

        let octets: Vec<&str> = trimmed.split([':', '-']).collect();
        let well_formed = octets.len() == 6
            && octets
                .iter()
                .all(|o| o.len() == 2 && o.chars().all(|c| c.is_ascii_hexdigit()));

        if !well_formed {
            return Err(DomainError::InvalidInput(format!(
                "Invalid MAC address '{trimmed}': expected six hex octets like AA:BB:CC:DD:EE:FF"
            )));
        }

        Ok(Self(octets.join(":").to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for MacAddress {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<MacAddress> for String {
    fn from(value: MacAddress) -> Self {
        value.0
    }
}

impl std::fmt::Display for MacAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
