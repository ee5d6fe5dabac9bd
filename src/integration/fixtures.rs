//! Test fixtures for integration tests
//!
//! Provides an in-memory caption source so the HTTP surface can be exercised
//! without reaching the network.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::CaptionError;
use crate::source::CaptionSource;
use crate::window::CaptionEntry;

/// Video id whose captions are reported as disabled
pub const DISABLED_VIDEO: &str = "no-captions";

/// Video id whose fetch fails upstream
pub const BROKEN_VIDEO: &str = "upstream-down";

/// Caption source serving one fixed track for every other video id
pub struct StaticSource {
    entries: Vec<CaptionEntry>,
    calls: AtomicUsize,
}

impl StaticSource {
    pub fn new(entries: Vec<CaptionEntry>) -> Self {
        Self {
            entries,
            calls: AtomicUsize::new(0),
        }
    }

    /// The three-entry track used across the end-to-end tests
    pub fn hello_world() -> Self {
        Self::new(vec![
            CaptionEntry::new(0.0, 5.0, "Hello"),
            CaptionEntry::new(10.0, 5.0, "world"),
            CaptionEntry::new(30.0, 5.0, "ignored"),
        ])
    }

    /// Number of fetches served so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CaptionSource for StaticSource {
    async fn fetch(&self, video_id: &str) -> Result<Vec<CaptionEntry>, CaptionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match video_id {
            DISABLED_VIDEO => Err(CaptionError::unavailable(
                video_id,
                "Subtitles are disabled for this video",
            )),
            BROKEN_VIDEO => Err(CaptionError::Upstream(
                "watch page request returned HTTP 503 Service Unavailable".to_string(),
            )),
            _ => Ok(self.entries.clone()),
        }
    }

    fn name(&self) -> &'static str {
        "static"
    }
}
