use std::sync::Arc;

use axum::extract::{Path, State};
use domain::Action;
use domain::action::{ActionStatistics, NewAction};
use serde::Deserialize;
use serde_json::{Value, json};

use super::extract::{ApiJson, ApiQuery, page_limit};
use crate::auth::Caller;
use crate::error::ApiResult;
use crate::response::ApiResponse;
use crate::state::AppState;

const DEFAULT_LIMIT: i64 = 50;
const DEFAULT_STATS_DAYS: i64 = 30;

pub async fn list_pending(
    Caller(ctx): Caller,
    State(state): State<Arc<AppState>>,
) -> ApiResult<ApiResponse<Value>> {
    let actions = state.actions.list_pending_for_user(&ctx).await?;
    Ok(ApiResponse::ok(
        "Pending actions retrieved",
        json!({ "total": actions.len(), "actions": actions }),
    ))
}

pub async fn enqueue(
    Caller(ctx): Caller,
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<NewAction>,
) -> ApiResult<ApiResponse<Action>> {
    let action = state.actions.enqueue(&ctx, request).await?;
    Ok(ApiResponse::created("Action created", action))
}

pub async fn get_one(
    Caller(ctx): Caller,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<ApiResponse<Action>> {
    let action = state.actions.get_by_id(&ctx, id).await?;
    Ok(ApiResponse::ok("Action retrieved", action))
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
    #[serde(default)]
    pub response_data: Option<Value>,
    #[serde(default)]
    pub error_message: Option<String>,
}

pub async fn update_status(
    Caller(ctx): Caller,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    ApiJson(request): ApiJson<StatusRequest>,
) -> ApiResult<ApiResponse<Action>> {
    let action = state
        .actions
        .update_status(
            &ctx,
            id,
            &request.status,
            request.response_data,
            request.error_message,
        )
        .await?;
    Ok(ApiResponse::ok("Action status updated", action))
}

#[derive(Debug, Deserialize)]
pub struct LimitParams {
    pub limit: Option<i64>,
}

/// The device-facing listing; ownership is checked here, not in the queue.
pub async fn list_for_device(
    Caller(ctx): Caller,
    State(state): State<Arc<AppState>>,
    Path(device_id): Path<i64>,
    ApiQuery(params): ApiQuery<LimitParams>,
) -> ApiResult<ApiResponse<Value>> {
    state.registry.get(&ctx, device_id).await?;
    let limit = page_limit(params.limit, DEFAULT_LIMIT);
    let actions = state.actions.list_for_device(device_id, limit).await?;
    Ok(ApiResponse::ok(
        "Device actions retrieved",
        json!({ "device_id": device_id, "total": actions.len(), "actions": actions }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct WindowParams {
    pub days: Option<i64>,
}

pub async fn statistics(
    Caller(ctx): Caller,
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<WindowParams>,
) -> ApiResult<ApiResponse<ActionStatistics>> {
    let days = params.days.unwrap_or(DEFAULT_STATS_DAYS);
    let stats = state.actions.statistics(&ctx, days).await?;
    Ok(ApiResponse::ok("Action statistics retrieved", stats))
}
