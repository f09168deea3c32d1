use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// ApiError
///
/// The error taxonomy shared by every handler and core component. Each
/// variant except `Database` and `Internal` is an expected, caller-recoverable
/// outcome that maps to a 4xx response. Persistence failures are propagated
/// here unchanged and surface as 500s; they are never swallowed into empty
/// result sets.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No credential, or a credential that failed verification.
    #[error("invalid or missing credentials")]
    Unauthenticated,

    /// Authenticated, but the action is not permitted for this actor.
    #[error("access denied")]
    Forbidden,

    /// The referenced entity does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The request collides with existing state (e.g. a duplicate report).
    #[error("{0}")]
    Conflict(&'static str),

    /// The payload failed a validation rule.
    #[error("{0}")]
    Validation(String),

    /// Persistence-layer failure. Propagated, not recovered.
    #[error("database error")]
    Database(#[from] sqlx::Error),

    /// Unexpected internal failure (e.g. token signing).
    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Database(e) => {
                tracing::error!("database error: {:?}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Internal(msg) => {
                tracing::error!("internal error: {}", msg);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        // Internal detail stays in the logs; clients get a generic message.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            "internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}
