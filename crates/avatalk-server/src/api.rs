//! Shared API error type.

use avatalk_avatar::AvatarError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

/// API error type mapping to HTTP status codes.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    BadRequest(String),
    #[error("internal server error: {0}")]
    InternalServerError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

impl From<AvatarError> for ApiError {
    /// Upstream failures are reported as a 500 carrying the provider's own
    /// description, so the browser can show what the provider said.
    fn from(e: AvatarError) -> Self {
        match e {
            AvatarError::InvalidRequest(_) => ApiError::BadRequest(e.to_string()),
            _ => ApiError::InternalServerError(e.to_string()),
        }
    }
}
