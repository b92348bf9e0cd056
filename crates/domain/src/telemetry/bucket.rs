use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::{Deserialize, Serialize};

use super::SensorReading;
use crate::error::{DomainError, Result};

/// Calendar-aligned aggregation window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeBucket {
    Minute,
    Hour,
    Day,
    Month,
}

impl TimeBucket {
    pub const ALL: [TimeBucket; 4] = [Self::Minute, Self::Hour, Self::Day, Self::Month];

    /// Also the unit name understood by Postgres `date_trunc`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Minute => "minute",
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Month => "month",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|b| b.as_str() == value)
            .ok_or_else(|| {
                DomainError::InvalidInput(format!(
                    "Invalid interval '{value}'. Must be one of: minute, hour, day, month"
                ))
            })
    }

    /// Start of the bucket containing `ts`.
    pub fn truncate(&self, ts: DateTime<Utc>) -> DateTime<Utc> {
        let date = ts.date_naive();
        let start = match self {
            Self::Minute => date.and_hms_opt(ts.hour(), ts.minute(), 0),
            Self::Hour => date.and_hms_opt(ts.hour(), 0, 0),
            Self::Day => date.and_hms_opt(0, 0, 0),
            Self::Month => date.with_day(1).and_then(|d| d.and_hms_opt(0, 0, 0)),
        };
        start.map(|naive| naive.and_utc()).unwrap_or(ts)
    }
}

impl std::fmt::Display for TimeBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summary of the readings that fell into one bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketAggregate {
    pub period: DateTime<Utc>,
    pub avg_value: f64,
    pub min_value: f64,
    pub max_value: f64,
    pub count: i64,
}

/// Per sensor type summary over a window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorStatistics {
    pub sensor_type: String,
    pub total_readings: i64,
    pub avg_value: f64,
    pub min_value: f64,
    pub max_value: f64,
    pub first_reading: DateTime<Utc>,
    pub last_reading: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy)]
struct Accumulator {
    sum: f64,
    min: f64,
    max: f64,
    count: i64,
    first: DateTime<Utc>,
    last: DateTime<Utc>,
}

impl Accumulator {
    fn new(reading: &SensorReading) -> Self {
        Self {
            sum: reading.sensor_value,
            min: reading.sensor_value,
            max: reading.sensor_value,
            count: 1,
            first: reading.timestamp,
            last: reading.timestamp,
        }
    }

    fn push(&mut self, reading: &SensorReading) {
        self.sum += reading.sensor_value;
        self.min = self.min.min(reading.sensor_value);
        self.max = self.max.max(reading.sensor_value);
        self.count += 1;
        self.first = self.first.min(reading.timestamp);
        self.last = self.last.max(reading.timestamp);
    }

    fn avg(&self) -> f64 {
        self.sum / self.count as f64
    }
}

/// Groups readings into buckets, ascending by bucket start.
///
/// Only buckets that received at least one reading are returned.
pub fn aggregate_readings<'a>(
    readings: impl IntoIterator<Item = &'a SensorReading>,
    bucket: TimeBucket,
) -> Vec<BucketAggregate> {
    let mut groups: BTreeMap<DateTime<Utc>, Accumulator> = BTreeMap::new();
    for reading in readings {
        groups
            .entry(bucket.truncate(reading.timestamp))
            .and_modify(|acc| acc.push(reading))
            .or_insert_with(|| Accumulator::new(reading));
    }

    groups
        .into_iter()
        .map(|(period, acc)| BucketAggregate {
            period,
            avg_value: acc.avg(),
            min_value: acc.min,
            max_value: acc.max,
            count: acc.count,
        })
        .collect()
}

/// One row per distinct sensor type, ordered by type name.
pub fn summarize_by_sensor<'a>(
    readings: impl IntoIterator<Item = &'a SensorReading>,
) -> Vec<SensorStatistics> {
    let mut groups: BTreeMap<&'a str, Accumulator> = BTreeMap::new();
    for reading in readings {
        groups
            .entry(reading.sensor_type.as_str())
            .and_modify(|acc| acc.push(reading))
            .or_insert_with(|| Accumulator::new(reading));
    }

    groups
        .into_iter()
        .map(|(sensor_type, acc)| SensorStatistics {
            sensor_type: sensor_type.to_string(),
            total_readings: acc.count,
            avg_value: acc.avg(),
            min_value: acc.min,
            max_value: acc.max,
            first_reading: acc.first,
            last_reading: acc.last,
        })
        .collect()
}
