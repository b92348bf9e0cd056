use super::{
    BucketAggregate, NewReading, ReadingQuery, SensorReading, SensorStatistics, SensorType,
    TimeBucket, TimeRange,
};
use crate::DomainError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Repository interface for sensor telemetry
///
/// Readings are append-only: there is no update, only inserts and
/// retention deletes.
#[async_trait]
pub trait TelemetryRepository: Send + Sync {
    async fn insert(
        &self,
        reading: &NewReading,
        timestamp: DateTime<Utc>,
    ) -> Result<SensorReading, DomainError>;

    /// Store all readings with one multi-row write; returns rows written
    async fn insert_batch(
        &self,
        readings: &[NewReading],
        timestamp: DateTime<Utc>,
    ) -> Result<u64, DomainError>;

    /// Matching readings, newest first, capped at `query.limit`
    async fn query(&self, query: &ReadingQuery) -> Result<Vec<SensorReading>, DomainError>;

    /// Newest readings across several devices
    async fn find_by_devices(
        &self,
        device_ids: &[i64],
        sensor_type: Option<&str>,
        limit: i64,
    ) -> Result<Vec<SensorReading>, DomainError>;

    async fn latest(
        &self,
        device_id: i64,
        sensor_type: &str,
    ) -> Result<Option<SensorReading>, DomainError>;

    /// Non-empty buckets only, ascending by period
    async fn aggregate(
        &self,
        device_id: i64,
        sensor_type: &str,
        bucket: TimeBucket,
        range: TimeRange,
    ) -> Result<Vec<BucketAggregate>, DomainError>;

    async fn statistics(
        &self,
        device_id: i64,
        since: DateTime<Utc>,
    ) -> Result<Vec<SensorStatistics>, DomainError>;

    async fn sensor_types(&self, device_id: i64) -> Result<Vec<SensorType>, DomainError>;

    /// Delete readings older than `cutoff`; returns rows removed
    async fn purge_before(&self, cutoff: DateTime<Utc>) -> Result<u64, DomainError>;
}
