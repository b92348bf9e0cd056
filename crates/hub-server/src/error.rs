use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use domain::DomainError;
use domain::auth::AuthError;
use serde_json::json;

/// Error type for HTTP handlers.
///
/// Wraps [`DomainError`] and [`AuthError`] and adds the request-shape
/// failures axum reports while extracting. Renders the failure envelope.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Malformed body: {0}")]
    Body(#[from] JsonRejection),

    #[error("Malformed query: {0}")]
    Query(#[from] QueryRejection),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Domain(e) => domain_status(e.root()),
            ApiError::Auth(_) => StatusCode::UNAUTHORIZED,
            ApiError::Body(_) | ApiError::Query(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::Domain(e) => match e.root() {
                DomainError::InvalidInput(_) => "INVALID_INPUT",
                DomainError::Unauthorized(_) => "FORBIDDEN",
                DomainError::NotFound(_) => "NOT_FOUND",
                DomainError::Conflict(_) => "CONFLICT",
                DomainError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
                DomainError::BatchItemRejected { .. } => "INVALID_INPUT",
            },
            ApiError::Auth(_) => "UNAUTHORIZED",
            ApiError::Body(_) | ApiError::Query(_) => "BAD_REQUEST",
        }
    }
}

fn domain_status(err: &DomainError) -> StatusCode {
    match err {
        DomainError::InvalidInput(_) | DomainError::BatchItemRejected { .. } => {
            StatusCode::BAD_REQUEST
        }
        DomainError::Unauthorized(_) => StatusCode::FORBIDDEN,
        DomainError::NotFound(_) => StatusCode::NOT_FOUND,
        DomainError::Conflict(_) => StatusCode::CONFLICT,
        DomainError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Domain(e) if e.is_store_failure() => {
                tracing::error!(error = %e, "Store failure");
                "Storage is temporarily unavailable".to_string()
            }
            other => other.to_string(),
        };

        let mut body = json!({
            "success": false,
            "message": message,
            "error": self.code(),
            "timestamp": Utc::now(),
        });
        if let ApiError::Domain(DomainError::BatchItemRejected { index, .. }) = &self {
            body["index"] = json!(index);
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_kinds_map_to_statuses() {
        let cases = [
            (DomainError::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
            (DomainError::Unauthorized("x".into()), StatusCode::FORBIDDEN),
            (DomainError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (DomainError::Conflict("x".into()), StatusCode::CONFLICT),
            (
                DomainError::StoreUnavailable("x".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn test_batch_rejection_uses_reason_status() {
        let err = DomainError::batch_item(1, DomainError::Unauthorized("device 9".into()));
        assert_eq!(ApiError::from(err).status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_auth_failures_are_401() {
        assert_eq!(
            ApiError::from(AuthError::Expired).status(),
            StatusCode::UNAUTHORIZED
        );
    }
}
