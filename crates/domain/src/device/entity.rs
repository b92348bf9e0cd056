use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{DeviceStatus, MacAddress};
use crate::context::UserId;
use crate::error::{DomainError, Result};
use crate::validation::ensure_max_chars;

pub const DEFAULT_DEVICE_TYPE: &str = "ESP32";
pub const DEFAULT_SERVICE_UUID: &str = "12345678-1234-1234-1234-1234567890ab";

// Column widths of the `devices` table
const MAX_NAME_LEN: usize = 100;
const MAX_HARDWARE_ID_LEN: usize = 100;
const MAX_DEVICE_TYPE_LEN: usize = 50;
const MAX_SERVICE_UUID_LEN: usize = 36;
const MAX_SSID_LEN: usize = 100;
const MAX_LOCATION_LEN: usize = 200;

/// Checks an SSID before it is recorded as the device's last network.
pub fn validate_ssid(ssid: &str) -> Result<()> {
    if ssid.trim().is_empty() {
        return Err(DomainError::InvalidInput("ssid is required".to_string()));
    }
    ensure_max_chars("ssid", ssid, MAX_SSID_LEN)
}

/// A registered IoT device.
///
/// `id` is the store row id. `hardware_id` is the identifier the device
/// reports about itself and is exposed as `device_id` on the wire.
/// Ownership (`user_id`) never changes after registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: i64,
    pub user_id: UserId,
    pub name: String,
    #[serde(rename = "device_id")]
    pub hardware_id: String,
    pub mac_address: MacAddress,
    pub device_type: String,
    pub service_uuid: String,
    pub status: DeviceStatus,
    pub last_ssid: Option<String>,
    pub last_configured: Option<DateTime<Utc>>,
    pub rssi: Option<i32>,
    pub is_connected: bool,
    pub location: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Device {
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }

    /// Applies only the fields present in `changes`.
    pub fn apply(&mut self, changes: &DeviceUpdate, now: DateTime<Utc>) {
        if let Some(name) = &changes.name {
            self.name = name.clone();
        }
        if let Some(device_type) = &changes.device_type {
            self.device_type = device_type.clone();
        }
        if let Some(status) = changes.status {
            self.status = status;
        }
        if let Some(ssid) = &changes.last_ssid {
            self.last_ssid = Some(ssid.clone());
        }
        if let Some(rssi) = changes.rssi {
            self.rssi = Some(rssi);
        }
        if let Some(connected) = changes.is_connected {
            self.is_connected = connected;
        }
        if let Some(location) = &changes.location {
            self.location = Some(location.clone());
        }
        if let Some(description) = &changes.description {
            self.description = Some(description.clone());
        }
        self.updated_at = now;
    }

    /// Records a delivered Wi-Fi configuration.
    pub fn configure_wifi(&mut self, ssid: &str, now: DateTime<Utc>) {
        self.last_ssid = Some(ssid.to_string());
        self.status = DeviceStatus::Configured;
        self.last_configured = Some(now);
        self.updated_at = now;
    }
}

/// Registration request for a new device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDevice {
    pub name: String,
    #[serde(rename = "device_id")]
    pub hardware_id: String,
    pub mac_address: MacAddress,
    #[serde(default)]
    pub device_type: Option<String>,
    #[serde(default)]
    pub service_uuid: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl NewDevice {
    pub fn new(
        name: impl Into<String>,
        hardware_id: impl Into<String>,
        mac_address: MacAddress,
    ) -> Self {
        Self {
            name: name.into(),
            hardware_id: hardware_id.into(),
            mac_address,
            device_type: None,
            service_uuid: None,
            location: None,
            description: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::InvalidInput(
                "Device name cannot be empty".to_string(),
            ));
        }
        if self.hardware_id.trim().is_empty() {
            return Err(DomainError::InvalidInput(
                "device_id cannot be empty".to_string(),
            ));
        }
        ensure_max_chars("name", &self.name, MAX_NAME_LEN)?;
        ensure_max_chars("device_id", &self.hardware_id, MAX_HARDWARE_ID_LEN)?;
        if let Some(device_type) = &self.device_type {
            ensure_max_chars("device_type", device_type, MAX_DEVICE_TYPE_LEN)?;
        }
        if let Some(service_uuid) = &self.service_uuid {
            ensure_max_chars("service_uuid", service_uuid, MAX_SERVICE_UUID_LEN)?;
        }
        if let Some(location) = &self.location {
            ensure_max_chars("location", location, MAX_LOCATION_LEN)?;
        }
        Ok(())
    }

    pub fn device_type_or_default(&self) -> &str {
        self.device_type
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(DEFAULT_DEVICE_TYPE)
    }

    pub fn service_uuid_or_default(&self) -> &str {
        self.service_uuid
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or(DEFAULT_SERVICE_UUID)
    }

    /// Materializes the device as the store would persist it.
    pub fn into_device(self, id: i64, user_id: UserId, now: DateTime<Utc>) -> Device {
        let device_type = self.device_type_or_default().to_string();
        let service_uuid = self.service_uuid_or_default().to_string();
        Device {
            id,
            user_id,
            name: self.name,
            hardware_id: self.hardware_id,
            mac_address: self.mac_address,
            device_type,
            service_uuid,
            status: DeviceStatus::NotConfigured,
            last_ssid: None,
            last_configured: None,
            rssi: None,
            is_connected: false,
            location: self.location,
            description: self.description,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update of the mutable device fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub device_type: Option<String>,
    #[serde(default)]
    pub status: Option<DeviceStatus>,
    #[serde(default)]
    pub last_ssid: Option<String>,
    #[serde(default)]
    pub rssi: Option<i32>,
    #[serde(default)]
    pub is_connected: Option<bool>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl DeviceUpdate {
    pub fn validate(&self) -> Result<()> {
        if matches!(&self.name, Some(name) if name.trim().is_empty()) {
            return Err(DomainError::InvalidInput(
                "Device name cannot be empty".to_string(),
            ));
        }
        let bounded = [
            ("name", &self.name, MAX_NAME_LEN),
            ("device_type", &self.device_type, MAX_DEVICE_TYPE_LEN),
            ("last_ssid", &self.last_ssid, MAX_SSID_LEN),
            ("location", &self.location, MAX_LOCATION_LEN),
        ];
        for (field, value, max) in bounded {
            if let Some(value) = value {
                ensure_max_chars(field, value, max)?;
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Per-user device counts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceStatistics {
    pub total: i64,
    pub configured: i64,
    pub not_configured: i64,
    pub online: i64,
    pub offline: i64,
    pub connected: i64,
}

impl DeviceStatistics {
    pub fn tally<'a>(devices: impl IntoIterator<Item = &'a Device>) -> Self {
        let mut stats = Self::default();
        for device in devices {
            stats.total += 1;
            match device.status {
                DeviceStatus::Configured => stats.configured += 1,
                DeviceStatus::NotConfigured => stats.not_configured += 1,
                DeviceStatus::Online => stats.online += 1,
                DeviceStatus::Offline => stats.offline += 1,
            }
            if device.is_connected {
                stats.connected += 1;
            }
        }
        stats
    }
}
