//! Caption sources
//!
//! A caption source turns a video id into the video's time-aligned caption
//! entries. Two backends exist:
//! - `timedtext`: scrapes the watch page for caption tracks and downloads one
//! - `ytdlp`: delegates to the external `yt-dlp` tool

pub mod cookies;
pub mod timedtext;
pub mod ytdlp;

use async_trait::async_trait;
use regex::Regex;
use std::sync::{Arc, OnceLock};

use crate::config::{CaptionBackend, CaptionConfig};
use crate::error::{CaptionError, ServerError};
use crate::window::CaptionEntry;

pub use cookies::CookieJar;
pub use timedtext::TimedTextSource;
pub use ytdlp::YtDlpSource;

/// Upstream provider of caption tracks
#[async_trait]
pub trait CaptionSource: Send + Sync {
    /// Fetch the caption entries for `video_id`
    async fn fetch(&self, video_id: &str) -> Result<Vec<CaptionEntry>, CaptionError>;

    /// Short name for logs
    fn name(&self) -> &'static str;
}

/// Build the caption source selected by the configuration
pub fn build_source(config: &CaptionConfig) -> Result<Arc<dyn CaptionSource>, ServerError> {
    let source: Arc<dyn CaptionSource> = match config.backend {
        CaptionBackend::Timedtext => {
            let cookies = match &config.cookies_file {
                Some(path) => CookieJar::from_file(path)?.for_site("youtube.com"),
                None => CookieJar::default(),
            };
            if config.cookies_file.is_some() && cookies.is_empty() {
                tracing::warn!("Cookies file contains no youtube.com cookies");
            }
            Arc::new(TimedTextSource::new(config, cookies)?)
        }
        CaptionBackend::Ytdlp => {
            if let Some(path) = &config.cookies_file {
                if !path.exists() {
                    return Err(ServerError::Config(format!(
                        "cookies file not found: {}",
                        path.display()
                    )));
                }
            }
            Arc::new(YtDlpSource::new(config))
        }
    };

    tracing::info!("Caption source: {}", source.name());
    Ok(source)
}

/// Strip inline markup tags such as `<font color="#fff">` from caption text.
/// A lone `<` without a closing `>` is kept as text.
pub(crate) fn strip_tags(text: &str) -> String {
    static TAG: OnceLock<Regex> = OnceLock::new();
    TAG.get_or_init(|| Regex::new(r"<[^>]*>").expect("valid regex"))
        .replace_all(text, "")
        .into_owned()
}
