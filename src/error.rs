use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Main error type for the caption window server
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Caption(#[from] CaptionError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures while fetching a caption track from upstream
#[derive(Error, Debug)]
pub enum CaptionError {
    #[error("Captions are not available for video {video_id}: {reason}")]
    Unavailable { video_id: String, reason: String },

    #[error("Failed to retrieve captions: {0}")]
    Upstream(String),
}

impl CaptionError {
    pub fn unavailable(video_id: &str, reason: impl Into<String>) -> Self {
        CaptionError::Unavailable {
            video_id: video_id.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<reqwest::Error> for CaptionError {
    fn from(err: reqwest::Error) -> Self {
        CaptionError::Upstream(err.to_string())
    }
}

impl ServerError {
    /// HTTP status this error maps to
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Caption(CaptionError::Unavailable { .. }) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("request failed: {}", self);
        } else {
            tracing::warn!("request rejected: {}", self);
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, ServerError>;
