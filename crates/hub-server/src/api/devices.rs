use std::sync::Arc;

use axum::extract::{Path, State};
use domain::Device;
use domain::device::{DeviceStatistics, DeviceUpdate, NewDevice};
use serde::Deserialize;
use serde_json::{Value, json};

use super::extract::ApiJson;
use crate::auth::Caller;
use crate::error::ApiResult;
use crate::response::ApiResponse;
use crate::state::AppState;

pub async fn list(
    Caller(ctx): Caller,
    State(state): State<Arc<AppState>>,
) -> ApiResult<ApiResponse<Value>> {
    let devices = state.registry.list(&ctx).await?;
    Ok(ApiResponse::ok(
        "Devices retrieved",
        json!({ "total": devices.len(), "devices": devices }),
    ))
}

pub async fn register(
    Caller(ctx): Caller,
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<NewDevice>,
) -> ApiResult<ApiResponse<Device>> {
    let device = state.registry.register(&ctx, request).await?;
    Ok(ApiResponse::created("Device registered", device))
}

pub async fn statistics(
    Caller(ctx): Caller,
    State(state): State<Arc<AppState>>,
) -> ApiResult<ApiResponse<DeviceStatistics>> {
    let stats = state.registry.statistics(&ctx).await?;
    Ok(ApiResponse::ok("Device statistics retrieved", stats))
}

pub async fn get_one(
    Caller(ctx): Caller,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<ApiResponse<Device>> {
    let device = state.registry.get(&ctx, id).await?;
    Ok(ApiResponse::ok("Device retrieved", device))
}

pub async fn update(
    Caller(ctx): Caller,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    ApiJson(changes): ApiJson<DeviceUpdate>,
) -> ApiResult<ApiResponse<Device>> {
    let device = state.registry.update(&ctx, id, changes).await?;
    Ok(ApiResponse::ok("Device updated", device))
}

#[derive(Debug, Deserialize)]
pub struct WifiRequest {
    pub ssid: String,
}

pub async fn configure_wifi(
    Caller(ctx): Caller,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    ApiJson(request): ApiJson<WifiRequest>,
) -> ApiResult<ApiResponse<Device>> {
    let device = state
        .registry
        .configure_wifi(&ctx, id, &request.ssid)
        .await?;
    Ok(ApiResponse::ok("Wi-Fi configuration recorded", device))
}

pub async fn delete(
    Caller(ctx): Caller,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<ApiResponse<Value>> {
    state.registry.delete(&ctx, id).await?;
    Ok(ApiResponse::ok("Device deleted", json!({ "id": id })))
}
