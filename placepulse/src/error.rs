use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PulseError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Upstream API error: {0}")]
    Upstream(String),

    #[error("Upstream authentication error: {0}")]
    UpstreamAuth(String),

    #[error("Upstream rate limit exceeded, retry after {retry_after:?} seconds")]
    RateLimited { retry_after: Option<u64> },

    #[error("Geocoding error: {0}")]
    Geocoding(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for PulseError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            PulseError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            PulseError::Http(e) => (StatusCode::BAD_GATEWAY, e.to_string()),
            PulseError::Json(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            PulseError::Io(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            PulseError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            PulseError::UpstreamAuth(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            PulseError::RateLimited { .. } => (StatusCode::TOO_MANY_REQUESTS, self.to_string()),
            PulseError::Geocoding(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            PulseError::Cache(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            PulseError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = Json(json!({
            "error": message,
            "code": status.as_u16()
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, PulseError>;
