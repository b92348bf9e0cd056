//! Bearer authentication extractor.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::header::{AUTHORIZATION, USER_AGENT};
use axum::http::request::Parts;
use chrono::Utc;
use domain::RequestContext;
use domain::auth::AuthError;

use crate::error::ApiError;
use crate::state::AppState;

/// The authenticated caller of a request, as the context every use case takes.
///
/// ```ignore
/// async fn handler(Caller(ctx): Caller, State(state): State<Arc<AppState>>) -> ApiResult<...> {
///     state.registry.list(&ctx).await?;
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Caller(pub RequestContext);

impl FromRequestParts<Arc<AppState>> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(AuthError::MissingCredential)?;
        let token = header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::InvalidCredential)?;

        let user_id = state.authenticator.authenticate(token.trim())?;

        let ctx = RequestContext::new(user_id, Utc::now())
            .with_client(client_ip(parts), user_agent(parts));
        Ok(Caller(ctx))
    }
}

fn client_ip(parts: &Parts) -> Option<String> {
    let forwarded = parts
        .headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string);

    forwarded.or_else(|| {
        parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
    })
}

fn user_agent(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}
