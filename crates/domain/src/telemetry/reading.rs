use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DomainError, Result};
use crate::validation::ensure_max_chars;

// Column widths of the `sensor_data` table
const MAX_SENSOR_TYPE_LEN: usize = 50;
const MAX_UNIT_LEN: usize = 20;

/// One immutable sensor observation; `timestamp` is assigned by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub id: i64,
    pub device_id: i64,
    pub sensor_type: String,
    pub sensor_value: f64,
    pub unit: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub metadata: Option<Value>,
}

/// A validated reading ready to be stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewReading {
    pub device_id: i64,
    pub sensor_type: String,
    pub sensor_value: f64,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub metadata: Option<Value>,
}

impl NewReading {
    pub fn new(device_id: i64, sensor_type: impl Into<String>, sensor_value: f64) -> Self {
        Self {
            device_id,
            sensor_type: sensor_type.into(),
            sensor_value,
            unit: None,
            metadata: None,
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.sensor_type.trim().is_empty() {
            return Err(DomainError::InvalidInput(
                "sensor_type is required".to_string(),
            ));
        }
        ensure_max_chars("sensor_type", &self.sensor_type, MAX_SENSOR_TYPE_LEN)?;
        if let Some(unit) = &self.unit {
            ensure_max_chars("unit", unit, MAX_UNIT_LEN)?;
        }
        if !self.sensor_value.is_finite() {
            return Err(DomainError::InvalidInput(
                "sensor_value must be a finite number".to_string(),
            ));
        }
        Ok(())
    }

    /// Trims the sensor type, then validates; the result is what gets stored.
    pub fn validated(mut self) -> Result<Self> {
        self.sensor_type = self.sensor_type.trim().to_string();
        self.validate()?;
        Ok(self)
    }

    pub fn into_reading(self, id: i64, timestamp: DateTime<Utc>) -> SensorReading {
        SensorReading {
            id,
            device_id: self.device_id,
            sensor_type: self.sensor_type,
            sensor_value: self.sensor_value,
            unit: self.unit,
            timestamp,
            metadata: self.metadata,
        }
    }
}

/// Loosely typed reading as submitted by a client; every field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReadingInput {
    #[serde(default)]
    pub device_id: Option<i64>,
    #[serde(default)]
    pub sensor_type: Option<String>,
    #[serde(default)]
    pub sensor_value: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub metadata: Option<Value>,
}

impl ReadingInput {
    /// Checks required fields and field rules, producing a storable reading.
    pub fn into_reading(self) -> Result<NewReading> {
        let (Some(device_id), Some(sensor_type), Some(sensor_value)) =
            (self.device_id, self.sensor_type, self.sensor_value)
        else {
            return Err(DomainError::InvalidInput(
                "device_id, sensor_type and sensor_value are required".to_string(),
            ));
        };

        NewReading {
            device_id,
            sensor_type,
            sensor_value,
            unit: self.unit,
            metadata: self.metadata,
        }
        .validated()
    }
}

impl From<NewReading> for ReadingInput {
    fn from(reading: NewReading) -> Self {
        Self {
            device_id: Some(reading.device_id),
            sensor_type: Some(reading.sensor_type),
            sensor_value: Some(reading.sensor_value),
            unit: reading.unit,
            metadata: reading.metadata,
        }
    }
}

/// Inclusive time window; either end may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl TimeRange {
    pub fn new(from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        Self { from, to }
    }

    pub fn since(from: DateTime<Utc>) -> Self {
        Self {
            from: Some(from),
            to: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let (Some(from), Some(to)) = (self.from, self.to) {
            if from > to {
                return Err(DomainError::InvalidInput(format!(
                    "from_date ({from}) is after to_date ({to})"
                )));
            }
        }
        Ok(())
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.from.is_none_or(|from| ts >= from) && self.to.is_none_or(|to| ts <= to)
    }
}

/// Filters for a raw reading lookup on one device
#[derive(Debug, Clone, PartialEq)]
pub struct ReadingQuery {
    pub device_id: i64,
    pub sensor_type: Option<String>,
    pub limit: i64,
    pub range: TimeRange,
}

impl ReadingQuery {
    pub fn new(device_id: i64, limit: i64) -> Self {
        Self {
            device_id,
            sensor_type: None,
            limit,
            range: TimeRange::default(),
        }
    }

    pub fn with_sensor_type(mut self, sensor_type: Option<String>) -> Self {
        self.sensor_type = sensor_type.filter(|t| !t.is_empty());
        self
    }

    pub fn with_range(mut self, range: TimeRange) -> Self {
        self.range = range;
        self
    }

    pub fn matches(&self, reading: &SensorReading) -> bool {
        reading.device_id == self.device_id
            && self
                .sensor_type
                .as_deref()
                .is_none_or(|t| t == reading.sensor_type)
            && self.range.contains(reading.timestamp)
    }
}

/// A distinct sensor type seen on a device with the unit it reported
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SensorType {
    pub sensor_type: String,
    pub unit: Option<String>,
}
