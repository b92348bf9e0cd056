use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use domain::telemetry::{
    BucketAggregate, NewReading, ReadingInput, ReadingQuery, SensorReading, SensorStatistics,
    SensorType, TelemetryRepository, TimeBucket, TimeRange,
};
use domain::{AuditEvent, DomainError, RequestContext, UserId};

use crate::action::window_start;
use crate::audit::AuditRecorder;
use crate::device::DeviceRegistry;

/// Append-only sensor readings, scoped by device ownership.
pub struct TelemetryService {
    readings: Arc<dyn TelemetryRepository>,
    registry: Arc<DeviceRegistry>,
    audit: AuditRecorder,
}

/// Outcome of an accepted batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReceipt {
    pub saved: u64,
    pub device_ids: Vec<i64>,
}

impl TelemetryService {
    pub fn new(
        readings: Arc<dyn TelemetryRepository>,
        registry: Arc<DeviceRegistry>,
        audit: AuditRecorder,
    ) -> Self {
        Self {
            readings,
            registry,
            audit,
        }
    }

    pub async fn record(
        &self,
        ctx: &RequestContext,
        reading: NewReading,
    ) -> Result<SensorReading, DomainError> {
        let reading = reading.validated()?;
        self.registry.authorize(reading.device_id, ctx.user_id).await?;

        let stored = self.readings.insert(&reading, ctx.now).await?;
        debug!(
            device_id = stored.device_id,
            sensor_type = %stored.sensor_type,
            value = stored.sensor_value,
            "Sensor reading recorded"
        );

        self.audit
            .record(AuditEvent::sensor_recorded(
                ctx,
                stored.device_id,
                &stored.sensor_type,
            ))
            .await;
        Ok(stored)
    }

    /// Stores a batch only if every item is valid and targets an owned device.
    ///
    /// Items are checked in order; the first failure rejects the whole batch
    /// with that item's index and nothing is written. Accepted batches go
    /// to the store as one multi-row insert.
    pub async fn record_batch(
        &self,
        ctx: &RequestContext,
        items: Vec<ReadingInput>,
    ) -> Result<BatchReceipt, DomainError> {
        if items.is_empty() {
            return Err(DomainError::InvalidInput("batch is empty".to_string()));
        }

        let mut owned = BTreeSet::new();
        let mut accepted = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            let reading = item
                .into_reading()
                .map_err(|e| DomainError::batch_item(index, e))?;
            self.check_batch_owner(&mut owned, reading.device_id, ctx.user_id)
                .await
                .map_err(|e| match e {
                    DomainError::Unauthorized(_) => DomainError::batch_item(index, e),
                    other => other,
                })?;
            accepted.push(reading);
        }

        let saved = self.readings.insert_batch(&accepted, ctx.now).await?;
        let device_ids: Vec<i64> = owned.into_iter().collect();
        info!(saved, devices = ?device_ids, "Sensor batch recorded");

        self.audit
            .record(AuditEvent::sensor_batch_recorded(ctx, saved, &device_ids))
            .await;
        Ok(BatchReceipt { saved, device_ids })
    }

    async fn check_batch_owner(
        &self,
        owned: &mut BTreeSet<i64>,
        device_id: i64,
        user_id: UserId,
    ) -> Result<(), DomainError> {
        if !owned.contains(&device_id) {
            self.registry.authorize(device_id, user_id).await?;
            owned.insert(device_id);
        }
        Ok(())
    }

    /// Raw readings of one owned device, newest first.
    pub async fn query(
        &self,
        ctx: &RequestContext,
        query: ReadingQuery,
    ) -> Result<Vec<SensorReading>, DomainError> {
        check_limit(query.limit)?;
        query.range.validate()?;
        self.registry.authorize(query.device_id, ctx.user_id).await?;
        self.readings.query(&query).await
    }

    pub async fn latest(
        &self,
        ctx: &RequestContext,
        device_id: i64,
        sensor_type: &str,
    ) -> Result<SensorReading, DomainError> {
        self.registry.authorize(device_id, ctx.user_id).await?;
        self.readings
            .latest(device_id, sensor_type)
            .await?
            .ok_or_else(|| {
                DomainError::NotFound(format!(
                    "No {sensor_type} reading for device {device_id}"
                ))
            })
    }

    /// Calendar-aligned buckets, ascending, empty buckets omitted.
    pub async fn aggregate(
        &self,
        ctx: &RequestContext,
        device_id: i64,
        sensor_type: &str,
        bucket: TimeBucket,
        range: TimeRange,
    ) -> Result<Vec<BucketAggregate>, DomainError> {
        if sensor_type.trim().is_empty() {
            return Err(DomainError::InvalidInput(
                "sensor_type is required for aggregation".to_string(),
            ));
        }
        range.validate()?;
        self.registry.authorize(device_id, ctx.user_id).await?;
        self.readings
            .aggregate(device_id, sensor_type, bucket, range)
            .await
    }

    /// Per sensor type summary over the last `window_days`.
    pub async fn statistics(
        &self,
        ctx: &RequestContext,
        device_id: i64,
        window_days: i64,
    ) -> Result<Vec<SensorStatistics>, DomainError> {
        let since = window_start(ctx.now, window_days)?;
        self.registry.authorize(device_id, ctx.user_id).await?;
        self.readings.statistics(device_id, since).await
    }

    pub async fn sensor_types(
        &self,
        ctx: &RequestContext,
        device_id: i64,
    ) -> Result<Vec<SensorType>, DomainError> {
        self.registry.authorize(device_id, ctx.user_id).await?;
        self.readings.sensor_types(device_id).await
    }

    /// Newest readings across every device the caller owns.
    pub async fn list_for_user(
        &self,
        ctx: &RequestContext,
        sensor_type: Option<&str>,
        limit: i64,
    ) -> Result<Vec<SensorReading>, DomainError> {
        check_limit(limit)?;
        let device_ids = self.registry.owned_device_ids(ctx.user_id).await?;
        if device_ids.is_empty() {
            return Ok(Vec::new());
        }
        let sensor_type = sensor_type.filter(|t| !t.is_empty());
        self.readings
            .find_by_devices(&device_ids, sensor_type, limit)
            .await
    }

    pub async fn purge_older_than(
        &self,
        retention_days: i64,
        now: DateTime<Utc>,
    ) -> Result<u64, DomainError> {
        let cutoff = window_start(now, retention_days)?;
        let removed = self.readings.purge_before(cutoff).await?;
        debug!(removed, %cutoff, "Purged sensor readings");
        Ok(removed)
    }
}

fn check_limit(limit: i64) -> Result<(), DomainError> {
    if limit < 1 {
        return Err(DomainError::InvalidInput(format!(
            "limit must be at least 1, got {limit}"
        )));
    }
    Ok(())
}
