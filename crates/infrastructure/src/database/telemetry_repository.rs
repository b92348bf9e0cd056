use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use domain::DomainError;
use domain::telemetry::{
    BucketAggregate, NewReading, ReadingQuery, SensorReading, SensorStatistics, SensorType,
    TelemetryRepository, TimeBucket, TimeRange,
};
use serde_json::Value as JsonValue;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use super::store_error;

const READING_COLUMNS: &str = "id, device_id, sensor_type, sensor_value, unit, timestamp, metadata";

#[derive(FromRow)]
struct ReadingRow {
    id: i64,
    device_id: i64,
    sensor_type: String,
    sensor_value: f64,
    unit: Option<String>,
    timestamp: DateTime<Utc>,
    metadata: Option<JsonValue>,
}

impl From<ReadingRow> for SensorReading {
    fn from(row: ReadingRow) -> Self {
        SensorReading {
            id: row.id,
            device_id: row.device_id,
            sensor_type: row.sensor_type,
            sensor_value: row.sensor_value,
            unit: row.unit,
            timestamp: row.timestamp,
            metadata: row.metadata,
        }
    }
}

#[derive(FromRow)]
struct BucketRow {
    // date_trunc on a UTC-shifted timestamp yields a naive value
    period: NaiveDateTime,
    avg_value: f64,
    min_value: f64,
    max_value: f64,
    count: i64,
}

#[derive(FromRow)]
struct StatisticsRow {
    sensor_type: String,
    total_readings: i64,
    avg_value: f64,
    min_value: f64,
    max_value: f64,
    first_reading: DateTime<Utc>,
    last_reading: DateTime<Utc>,
}

/// PostgreSQL implementation of TelemetryRepository (`sensor_data` table)
pub struct PostgresTelemetryRepository {
    pool: PgPool,
}

impl PostgresTelemetryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn push_range(qb: &mut QueryBuilder<'_, Postgres>, range: TimeRange) {
        if let Some(from) = range.from {
            qb.push(" AND timestamp >= ");
            qb.push_bind(from);
        }
        if let Some(to) = range.to {
            qb.push(" AND timestamp <= ");
            qb.push_bind(to);
        }
    }
}

#[async_trait]
impl TelemetryRepository for PostgresTelemetryRepository {
    async fn insert(
        &self,
        reading: &NewReading,
        timestamp: DateTime<Utc>,
    ) -> Result<SensorReading, DomainError> {
        let sql = format!(
            "INSERT INTO sensor_data (device_id, sensor_type, sensor_value, unit, timestamp, metadata) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {READING_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ReadingRow>(&sql)
            .bind(reading.device_id)
            .bind(&reading.sensor_type)
            .bind(reading.sensor_value)
            .bind(&reading.unit)
            .bind(timestamp)
            .bind(&reading.metadata)
            .fetch_one(&self.pool)
            .await
            .map_err(store_error)?;

        Ok(row.into())
    }

    async fn insert_batch(
        &self,
        readings: &[NewReading],
        timestamp: DateTime<Utc>,
    ) -> Result<u64, DomainError> {
        if readings.is_empty() {
            return Ok(0);
        }

        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO sensor_data (device_id, sensor_type, sensor_value, unit, timestamp, metadata) ",
        );
        qb.push_values(readings, |mut row, reading| {
            row.push_bind(reading.device_id)
                .push_bind(&reading.sensor_type)
                .push_bind(reading.sensor_value)
                .push_bind(&reading.unit)
                .push_bind(timestamp)
                .push_bind(&reading.metadata);
        });

        let result = qb
            .build()
            .execute(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(result.rows_affected())
    }

    async fn query(&self, query: &ReadingQuery) -> Result<Vec<SensorReading>, DomainError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT ");
        qb.push(READING_COLUMNS);
        qb.push(" FROM sensor_data WHERE device_id = ");
        qb.push_bind(query.device_id);
        if let Some(sensor_type) = &query.sensor_type {
            qb.push(" AND sensor_type = ");
            qb.push_bind(sensor_type.clone());
        }
        Self::push_range(&mut qb, query.range);
        qb.push(" ORDER BY timestamp DESC, id DESC LIMIT ");
        qb.push_bind(query.limit);

        let rows = qb
            .build_query_as::<ReadingRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(rows.into_iter().map(SensorReading::from).collect())
    }

    async fn find_by_devices(
        &self,
        device_ids: &[i64],
        sensor_type: Option<&str>,
        limit: i64,
    ) -> Result<Vec<SensorReading>, DomainError> {
        let sql = format!(
            "SELECT {READING_COLUMNS} FROM sensor_data \
             WHERE device_id = ANY($1) AND ($2::text IS NULL OR sensor_type = $2) \
             ORDER BY timestamp DESC, id DESC LIMIT $3"
        );
        let rows = sqlx::query_as::<_, ReadingRow>(&sql)
            .bind(device_ids)
            .bind(sensor_type)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(store_error)?;

        Ok(rows.into_iter().map(SensorReading::from).collect())
    }

    async fn latest(
        &self,
        device_id: i64,
        sensor_type: &str,
    ) -> Result<Option<SensorReading>, DomainError> {
        let sql = format!(
            "SELECT {READING_COLUMNS} FROM sensor_data \
             WHERE device_id = $1 AND sensor_type = $2 \
             ORDER BY timestamp DESC, id DESC LIMIT 1"
        );
        let row = sqlx::query_as::<_, ReadingRow>(&sql)
            .bind(device_id)
            .bind(sensor_type)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;

        Ok(row.map(SensorReading::from))
    }

    async fn aggregate(
        &self,
        device_id: i64,
        sensor_type: &str,
        bucket: TimeBucket,
        range: TimeRange,
    ) -> Result<Vec<BucketAggregate>, DomainError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT date_trunc(");
        qb.push_bind(bucket.as_str());
        qb.push(
            ", timestamp AT TIME ZONE 'UTC') AS period, \
             AVG(sensor_value) AS avg_value, MIN(sensor_value) AS min_value, \
             MAX(sensor_value) AS max_value, COUNT(*) AS count \
             FROM sensor_data WHERE device_id = ",
        );
        qb.push_bind(device_id);
        qb.push(" AND sensor_type = ");
        qb.push_bind(sensor_type.to_string());
        Self::push_range(&mut qb, range);
        qb.push(" GROUP BY period ORDER BY period ASC");

        let rows = qb
            .build_query_as::<BucketRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(store_error)?;

        Ok(rows
            .into_iter()
            .map(|row| BucketAggregate {
                period: row.period.and_utc(),
                avg_value: row.avg_value,
                min_value: row.min_value,
                max_value: row.max_value,
                count: row.count,
            })
            .collect())
    }

    async fn statistics(
        &self,
        device_id: i64,
        since: DateTime<Utc>,
    ) -> Result<Vec<SensorStatistics>, DomainError> {
        let rows = sqlx::query_as::<_, StatisticsRow>(
            "SELECT sensor_type, COUNT(*) AS total_readings, AVG(sensor_value) AS avg_value, \
                    MIN(sensor_value) AS min_value, MAX(sensor_value) AS max_value, \
                    MIN(timestamp) AS first_reading, MAX(timestamp) AS last_reading \
             FROM sensor_data WHERE device_id = $1 AND timestamp >= $2 \
             GROUP BY sensor_type ORDER BY sensor_type",
        )
        .bind(device_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(rows
            .into_iter()
            .map(|row| SensorStatistics {
                sensor_type: row.sensor_type,
                total_readings: row.total_readings,
                avg_value: row.avg_value,
                min_value: row.min_value,
                max_value: row.max_value,
                first_reading: row.first_reading,
                last_reading: row.last_reading,
            })
            .collect())
    }

    async fn sensor_types(&self, device_id: i64) -> Result<Vec<SensorType>, DomainError> {
        let rows: Vec<(String, Option<String>)> = sqlx::query_as(
            "SELECT DISTINCT sensor_type, unit FROM sensor_data \
             WHERE device_id = $1 ORDER BY sensor_type, unit",
        )
        .bind(device_id)
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(rows
            .into_iter()
            .map(|(sensor_type, unit)| SensorType { sensor_type, unit })
            .collect())
    }

    async fn purge_before(&self, cutoff: DateTime<Utc>) -> Result<u64, DomainError> {
        let result = sqlx::query("DELETE FROM sensor_data WHERE timestamp < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(store_error)?;

        Ok(result.rows_affected())
    }
}
