use std::sync::Arc;

use axum::extract::State;
use serde::Deserialize;
use serde_json::{Value, json};

use super::extract::{ApiQuery, page_limit};
use crate::auth::Caller;
use crate::error::ApiResult;
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// The caller's own audit trail, newest first.
pub async fn list(
    Caller(ctx): Caller,
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<PageParams>,
) -> ApiResult<ApiResponse<Value>> {
    let limit = page_limit(params.limit, 50);
    let offset = params.offset.unwrap_or(0);
    let entries = state.audit.list_for_user(&ctx, limit, offset).await?;
    Ok(ApiResponse::ok(
        "Logs retrieved",
        json!({ "limit": limit, "offset": offset, "logs": entries }),
    ))
}
