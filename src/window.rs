//! Caption window extraction
//!
//! Selects the caption entries overlapping a time window centred on a
//! playback position and joins their text. The window width is the *total*
//! width: half of it is applied on each side of the target time.

use serde::{Deserialize, Serialize};

/// Default total window width in seconds
pub const DEFAULT_WINDOW_SECS: f64 = 40.0;

/// One timed unit of caption text as delivered by a caption source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionEntry {
    /// Onset time in seconds
    pub start: f64,
    /// Display duration in seconds
    pub duration: f64,
    /// Caption text, untrimmed
    pub text: String,
}

impl CaptionEntry {
    pub fn new(start: f64, duration: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            duration,
            text: text.into(),
        }
    }

    /// End time in seconds
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// Time interval of interest around a playback position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeWindow {
    pub start: f64,
    pub end: f64,
}

impl TimeWindow {
    /// Build a window of total width `width` centred on `center`.
    ///
    /// Neither argument is validated: a negative start is a valid window and
    /// a non-positive width yields a degenerate or inverted window.
    pub fn centered(center: f64, width: f64) -> Self {
        Self {
            start: center - width / 2.0,
            end: center + width / 2.0,
        }
    }

    /// Closed-interval overlap test: touching at a boundary counts.
    pub fn overlaps(&self, entry: &CaptionEntry) -> bool {
        entry.end() >= self.start && entry.start <= self.end
    }

    /// Human readable `"m:ss to m:ss"` label
    pub fn label(&self) -> String {
        format!("{} to {}", format_time(self.start), format_time(self.end))
    }
}

/// Text captured from a window, as returned to HTTP clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub time_segment: String,
    pub text: String,
}

/// Collect the caption text overlapping the window of total width `window`
/// centred on `target_time`.
///
/// Entries are scanned in input order without assuming they are sorted.
pub fn extract(entries: &[CaptionEntry], target_time: f64, window: f64) -> ExtractionResult {
    let window = TimeWindow::centered(target_time, window);

    let mut captured = String::new();
    for entry in entries.iter().filter(|e| window.overlaps(e)) {
        captured.push_str(&entry.text);
        captured.push(' ');
    }

    ExtractionResult {
        time_segment: window.label(),
        text: captured.trim().to_string(),
    }
}

/// Render seconds as `minutes:seconds`.
///
/// Both parts truncate toward zero, so negative inputs keep their sign in
/// the seconds field: `-10.0` renders as `"0:-10"`.
pub fn format_time(seconds: f64) -> String {
    let minutes = (seconds / 60.0) as i64;
    let secs = (seconds as i64) % 60;
    format!("{}:{:02}", minutes, secs)
}
