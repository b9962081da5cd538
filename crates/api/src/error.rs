//! API Error Types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use imu_sampler::SamplerError;
use read_session::SessionError;
use ring_buffer::RingError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Errors surfaced by the server and its startup
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Ring(#[from] RingError),

    #[error(transparent)]
    Sampler(#[from] SamplerError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Logging setup failed: {0}")]
    Logging(String),

    #[error("Metrics exporter error: {0}")]
    Metrics(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Session(SessionError::UnknownSession(_)) => StatusCode::NOT_FOUND,
            ApiError::Session(SessionError::BufferTooSmall { .. }) => StatusCode::BAD_REQUEST,
            ApiError::Ring(RingError::UnknownChannel(_)) => StatusCode::NOT_FOUND,
            ApiError::Metrics(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
