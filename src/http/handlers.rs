//! HTTP request handlers

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use std::sync::Arc;

use crate::error::ServerError;
use crate::state::AppState;
use crate::window::{extract, ExtractionResult, DEFAULT_WINDOW_SECS};

/// Query parameters of `GET /get_transcript`.
///
/// Numbers are taken as strings so that a malformed value produces the
/// service's own JSON error instead of the extractor rejection.
#[derive(Debug, Default, PartialEq)]
pub struct TranscriptParams {
    pub video_id: Option<String>,
    pub target_time: Option<String>,
    pub window: Option<String>,
}

impl TranscriptParams {
    /// Build from raw query pairs. A repeated key keeps its first value;
    /// unknown keys are ignored.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut params = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "video_id" => &mut params.video_id,
                "target_time" => &mut params.target_time,
                "window" => &mut params.window,
                _ => continue,
            };
            slot.get_or_insert(value);
        }
        params
    }
}

fn parse_number(name: &str, value: Option<&str>, default: f64) -> Result<f64, ServerError> {
    match value {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<f64>()
            .map_err(|_| ServerError::InvalidRequest(format!("{} must be a number", name))),
    }
}

/// Liveness check
pub async fn ping() -> &'static str {
    "Pong!"
}

/// Version endpoint
pub async fn version_check() -> &'static str {
    concat!("caption-window v", env!("CARGO_PKG_VERSION"))
}

/// Caption text around a playback position
/// GET /get_transcript?video_id=..&target_time=..&window=..
pub async fn get_transcript(
    State(state): State<Arc<AppState>>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<ExtractionResult>, ServerError> {
    let Query(pairs) = query.map_err(|e| ServerError::InvalidRequest(e.body_text()))?;
    let params = TranscriptParams::from_pairs(pairs);

    let target_time = parse_number("target_time", params.target_time.as_deref(), 0.0)?;
    let window = parse_number("window", params.window.as_deref(), DEFAULT_WINDOW_SECS)?;
    let video_id = params
        .video_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ServerError::InvalidRequest("video_id is required".to_string()))?;

    let entries = state.source.fetch(&video_id).await?;
    let result = extract(&entries, target_time, window);
    tracing::debug!(
        "video={} window={} entries={} captured_chars={}",
        video_id,
        result.time_segment,
        entries.len(),
        result.text.len()
    );

    Ok(Json(result))
}
