use std::sync::Arc;

use axum::extract::{Path, State};
use chrono::{DateTime, Utc};
use domain::{DomainError, SensorReading};
use domain::telemetry::{ReadingInput, ReadingQuery, TimeBucket, TimeRange};
use serde::Deserialize;
use serde_json::{Value, json};

use super::extract::{ApiJson, ApiQuery, page_limit};
use crate::auth::Caller;
use crate::error::ApiResult;
use crate::response::ApiResponse;
use crate::state::AppState;

const DEFAULT_LIMIT: i64 = 100;
const DEFAULT_STATS_DAYS: i64 = 7;

/// Body of `POST /api/sensors`: one reading, or `{ "batch": [...] }`.
#[derive(Debug)]
pub enum RecordRequest {
    Batch(Vec<ReadingInput>),
    Single(ReadingInput),
}

impl RecordRequest {
    /// Batch items are decoded one at a time so a malformed item is
    /// reported with its position.
    pub fn from_body(body: Value) -> Result<Self, DomainError> {
        let Value::Object(mut fields) = body else {
            return Err(DomainError::InvalidInput(
                "request body must be a JSON object".to_string(),
            ));
        };

        match fields.remove("batch") {
            Some(Value::Array(items)) => items
                .into_iter()
                .enumerate()
                .map(|(index, item)| {
                    serde_json::from_value::<ReadingInput>(item).map_err(|e| {
                        DomainError::batch_item(index, DomainError::InvalidInput(e.to_string()))
                    })
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Self::Batch),
            Some(_) => Err(DomainError::InvalidInput(
                "batch must be an array".to_string(),
            )),
            None => serde_json::from_value(Value::Object(fields))
                .map(Self::Single)
                .map_err(|e| DomainError::InvalidInput(e.to_string())),
        }
    }
}

pub async fn record(
    Caller(ctx): Caller,
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<Value>,
) -> ApiResult<ApiResponse<Value>> {
    match RecordRequest::from_body(body)? {
        RecordRequest::Batch(batch) => {
            let receipt = state.telemetry.record_batch(&ctx, batch).await?;
            Ok(ApiResponse::created(
                "Sensor batch saved",
                json!({ "saved": receipt.saved, "device_ids": receipt.device_ids }),
            ))
        }
        RecordRequest::Single(input) => {
            let reading = state.telemetry.record(&ctx, input.into_reading()?).await?;
            Ok(ApiResponse::created(
                "Sensor reading saved",
                json!({ "sensor_data": reading }),
            ))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UserReadingsParams {
    pub sensor_type: Option<String>,
    pub limit: Option<i64>,
}

pub async fn list_for_user(
    Caller(ctx): Caller,
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<UserReadingsParams>,
) -> ApiResult<ApiResponse<Value>> {
    let limit = page_limit(params.limit, DEFAULT_LIMIT);
    let readings = state
        .telemetry
        .list_for_user(&ctx, params.sensor_type.as_deref(), limit)
        .await?;
    Ok(ApiResponse::ok(
        "Sensor readings retrieved",
        json!({ "total": readings.len(), "sensor_data": readings }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct DeviceReadingsParams {
    pub sensor_type: Option<String>,
    pub limit: Option<i64>,
    pub from_date: Option<DateTime<Utc>>,
    pub to_date: Option<DateTime<Utc>>,
    /// Bucket name; switches the reply to aggregates
    pub interval: Option<String>,
}

pub async fn for_device(
    Caller(ctx): Caller,
    State(state): State<Arc<AppState>>,
    Path(device_id): Path<i64>,
    ApiQuery(params): ApiQuery<DeviceReadingsParams>,
) -> ApiResult<ApiResponse<Value>> {
    let range = TimeRange::new(params.from_date, params.to_date);

    if let Some(interval) = params.interval.as_deref() {
        let bucket = TimeBucket::parse(interval)?;
        let sensor_type = params.sensor_type.unwrap_or_default();
        let buckets = state
            .telemetry
            .aggregate(&ctx, device_id, &sensor_type, bucket, range)
            .await?;
        return Ok(ApiResponse::ok(
            "Aggregated sensor data retrieved",
            json!({
                "device_id": device_id,
                "sensor_type": sensor_type,
                "interval": bucket,
                "total": buckets.len(),
                "sensor_data": buckets,
            }),
        ));
    }

    let query = ReadingQuery::new(device_id, page_limit(params.limit, DEFAULT_LIMIT))
        .with_sensor_type(params.sensor_type.clone())
        .with_range(range);
    let readings = state.telemetry.query(&ctx, query).await?;
    Ok(ApiResponse::ok(
        "Sensor data retrieved",
        json!({
            "device_id": device_id,
            "sensor_type": params.sensor_type,
            "total": readings.len(),
            "sensor_data": readings,
        }),
    ))
}

pub async fn latest(
    Caller(ctx): Caller,
    State(state): State<Arc<AppState>>,
    Path((device_id, sensor_type)): Path<(i64, String)>,
) -> ApiResult<ApiResponse<SensorReading>> {
    let reading = state
        .telemetry
        .latest(&ctx, device_id, &sensor_type)
        .await?;
    Ok(ApiResponse::ok("Latest sensor value retrieved", reading))
}

#[derive(Debug, Deserialize)]
pub struct WindowParams {
    pub days: Option<i64>,
}

pub async fn statistics(
    Caller(ctx): Caller,
    State(state): State<Arc<AppState>>,
    Path(device_id): Path<i64>,
    ApiQuery(params): ApiQuery<WindowParams>,
) -> ApiResult<ApiResponse<Value>> {
    let days = params.days.unwrap_or(DEFAULT_STATS_DAYS);
    let stats = state.telemetry.statistics(&ctx, device_id, days).await?;
    Ok(ApiResponse::ok(
        "Device statistics retrieved",
        json!({ "device_id": device_id, "period_days": days, "statistics": stats }),
    ))
}

pub async fn sensor_types(
    Caller(ctx): Caller,
    State(state): State<Arc<AppState>>,
    Path(device_id): Path<i64>,
) -> ApiResult<ApiResponse<Value>> {
    let types = state.telemetry.sensor_types(&ctx, device_id).await?;
    Ok(ApiResponse::ok(
        "Sensor types retrieved",
        json!({ "device_id": device_id, "sensor_types": types }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_item_type_error_keeps_its_index() {
        let body = json!({
            "batch": [
                { "device_id": 1, "sensor_type": "temperature", "sensor_value": 21.0 },
                { "device_id": 1, "sensor_type": "humidity", "sensor_value": "40.0" },
            ]
        });
        let err = RecordRequest::from_body(body).unwrap_err();
        assert!(matches!(err, DomainError::BatchItemRejected { index: 1, .. }));
        assert!(matches!(err.root(), DomainError::InvalidInput(_)));
    }

    #[test]
    fn test_single_and_non_array_batch() {
        let single = json!({ "device_id": 1, "sensor_type": "temperature", "sensor_value": 1.5 });
        assert!(matches!(
            RecordRequest::from_body(single),
            Ok(RecordRequest::Single(ReadingInput { device_id: Some(1), .. }))
        ));
        assert!(matches!(
            RecordRequest::from_body(json!({ "batch": {} })),
            Err(DomainError::InvalidInput(_))
        ));
        assert!(matches!(
            RecordRequest::from_body(json!([1, 2])),
            Err(DomainError::InvalidInput(_))
        ));
    }
}
