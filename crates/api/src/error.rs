use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tickwatch_engine::{DispatchError, EngineError};

/// Errors returned by route handlers, mapped onto HTTP status codes.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Internal(msg) => {
                // Details stay in the log
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl From<DispatchError> for ApiError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::Engine(EngineError::InvalidAlert(msg)) => ApiError::BadRequest(msg),
            DispatchError::Engine(e @ EngineError::InvalidPoint { .. }) => {
                ApiError::BadRequest(e.to_string())
            }
            DispatchError::Store(e) => ApiError::Internal(e.to_string()),
        }
    }
}
