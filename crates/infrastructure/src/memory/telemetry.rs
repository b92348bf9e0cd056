use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::DomainError;
use domain::telemetry::{
    BucketAggregate, NewReading, ReadingQuery, SensorReading, SensorStatistics, SensorType,
    TelemetryRepository, TimeBucket, TimeRange, aggregate_readings, summarize_by_sensor,
};
use tokio::sync::RwLock;

#[derive(Default)]
struct Table {
    next_id: i64,
    rows: Vec<SensorReading>,
}

#[derive(Default)]
pub struct InMemoryTelemetryRepository {
    table: RwLock<Table>,
}

impl InMemoryTelemetryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.table.read().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drops every reading of a deleted device.
    pub(crate) async fn remove_device(&self, device_id: i64) {
        self.table.write().await.rows.retain(|r| r.device_id != device_id);
    }
}

fn newest_first(readings: &mut [SensorReading], limit: i64) -> usize {
    readings.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
    usize::try_from(limit).unwrap_or(0)
}

#[async_trait]
impl TelemetryRepository for InMemoryTelemetryRepository {
    async fn insert(
        &self,
        reading: &NewReading,
        timestamp: DateTime<Utc>,
    ) -> Result<SensorReading, DomainError> {
        let mut table = self.table.write().await;
        table.next_id += 1;
        let stored = reading.clone().into_reading(table.next_id, timestamp);
        table.rows.push(stored.clone());
        Ok(stored)
    }

    async fn insert_batch(
        &self,
        readings: &[NewReading],
        timestamp: DateTime<Utc>,
    ) -> Result<u64, DomainError> {
        let mut table = self.table.write().await;
        for reading in readings {
            table.next_id += 1;
            let id = table.next_id;
            table.rows.push(reading.clone().into_reading(id, timestamp));
        }
        Ok(readings.len() as u64)
    }

    async fn query(&self, query: &ReadingQuery) -> Result<Vec<SensorReading>, DomainError> {
        let table = self.table.read().await;
        let mut found: Vec<SensorReading> = table
            .rows
            .iter()
            .filter(|r| query.matches(r))
            .cloned()
            .collect();
        let keep = newest_first(&mut found, query.limit);
        found.truncate(keep);
        Ok(found)
    }

    async fn find_by_devices(
        &self,
        device_ids: &[i64],
        sensor_type: Option<&str>,
        limit: i64,
    ) -> Result<Vec<SensorReading>, DomainError> {
        let table = self.table.read().await;
        let mut found: Vec<SensorReading> = table
            .rows
            .iter()
            .filter(|r| {
                device_ids.contains(&r.device_id)
                    && sensor_type.is_none_or(|t| t == r.sensor_type)
            })
            .cloned()
            .collect();
        let keep = newest_first(&mut found, limit);
        found.truncate(keep);
        Ok(found)
    }

    async fn latest(
        &self,
        device_id: i64,
        sensor_type: &str,
    ) -> Result<Option<SensorReading>, DomainError> {
        let table = self.table.read().await;
        Ok(table
            .rows
            .iter()
            .filter(|r| r.device_id == device_id && r.sensor_type == sensor_type)
            .max_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)))
            .cloned())
    }

    async fn aggregate(
        &self,
        device_id: i64,
        sensor_type: &str,
        bucket: TimeBucket,
        range: TimeRange,
    ) -> Result<Vec<BucketAggregate>, DomainError> {
        let table = self.table.read().await;
        Ok(aggregate_readings(
            table.rows.iter().filter(|r| {
                r.device_id == device_id && r.sensor_type == sensor_type && range.contains(r.timestamp)
            }),
            bucket,
        ))
    }

    async fn statistics(
        &self,
        device_id: i64,
        since: DateTime<Utc>,
    ) -> Result<Vec<SensorStatistics>, DomainError> {
        let table = self.table.read().await;
        Ok(summarize_by_sensor(
            table
                .rows
                .iter()
                .filter(|r| r.device_id == device_id && r.timestamp >= since),
        ))
    }

    async fn sensor_types(&self, device_id: i64) -> Result<Vec<SensorType>, DomainError> {
        let table = self.table.read().await;
        let mut types: Vec<SensorType> = table
            .rows
            .iter()
            .filter(|r| r.device_id == device_id)
            .map(|r| SensorType {
                sensor_type: r.sensor_type.clone(),
                unit: r.unit.clone(),
            })
            .collect();
        // Postgres orders NULL after any value
        types.sort_by(|a, b| {
            a.sensor_type
                .cmp(&b.sensor_type)
                .then_with(|| match (&a.unit, &b.unit) {
                    (Some(x), Some(y)) => x.cmp(y),
                    (left, right) => right.is_some().cmp(&left.is_some()),
                })
        });
        types.dedup();
        Ok(types)
    }

    async fn purge_before(&self, cutoff: DateTime<Utc>) -> Result<u64, DomainError> {
        let mut table = self.table.write().await;
        let before = table.rows.len();
        table.rows.retain(|r| r.timestamp >= cutoff);
        Ok((before - table.rows.len()) as u64)
    }
}
