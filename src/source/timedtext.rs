//! Timedtext caption source
//!
//! Fetches the watch page of a video, locates the caption track list embedded
//! in the player response and downloads the preferred track in the timedtext
//! XML format:
//!
//! ```text
//! <transcript>
//!   <text start="0.16" dur="2.4">hey there</text>
//!   ...
//! </transcript>
//! ```

use async_trait::async_trait;
use regex::Regex;
use reqwest::header::{ACCEPT_LANGUAGE, COOKIE};
use serde::Deserialize;
use serde_json::Value;
use std::sync::OnceLock;

use super::{strip_tags, CaptionSource, CookieJar};
use crate::config::CaptionConfig;
use crate::error::{CaptionError, ServerError};
use crate::window::CaptionEntry;

const USER_AGENT: &str = concat!("caption-window/", env!("CARGO_PKG_VERSION"));

/// One entry of the player response `captionTracks` list
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionTrack {
    pub base_url: String,
    pub language_code: String,
    #[serde(default)]
    pub kind: Option<String>,
}

impl CaptionTrack {
    /// Automatic speech recognition track
    pub fn is_generated(&self) -> bool {
        self.kind.as_deref() == Some("asr")
    }
}

/// Caption source backed by the video site's timedtext endpoint
pub struct TimedTextSource {
    client: reqwest::Client,
    base_url: String,
    languages: Vec<String>,
    cookie_header: Option<String>,
}

impl TimedTextSource {
    pub fn new(config: &CaptionConfig, cookies: CookieJar) -> Result<Self, ServerError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout())
            .build()
            .map_err(|e| ServerError::Config(format!("failed to build HTTP client: {}", e)))?;

        if !cookies.is_empty() {
            tracing::info!("Using {} upstream cookie(s)", cookies.len());
        }

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            languages: config.languages.clone(),
            cookie_header: cookies.header_value(),
        })
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        let request = self.client.get(url).header(ACCEPT_LANGUAGE, "en-US");
        match &self.cookie_header {
            Some(cookies) => request.header(COOKIE, cookies),
            None => request,
        }
    }

    async fn get_text(&self, url: &str, what: &str) -> Result<String, CaptionError> {
        let response = self.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CaptionError::Upstream(format!(
                "{} request returned HTTP {}",
                what, status
            )));
        }
        Ok(response.text().await?)
    }

    /// Resolve a track URL that may be relative to the site
    fn track_url(&self, track: &CaptionTrack) -> String {
        let url = track.base_url.replace("&fmt=srv3", "");
        if url.starts_with('/') {
            format!("{}{}", self.base_url, url)
        } else {
            url
        }
    }
}

#[async_trait]
impl CaptionSource for TimedTextSource {
    async fn fetch(&self, video_id: &str) -> Result<Vec<CaptionEntry>, CaptionError> {
        let watch_url = watch_url(&self.base_url, video_id)?;
        tracing::debug!("Fetching watch page {}", watch_url);
        let page = self.get_text(watch_url.as_str(), "watch page").await?;

        let tracks = caption_tracks(&page, video_id)?;
        let track = select_track(&tracks, &self.languages)
            .ok_or_else(|| CaptionError::unavailable(video_id, "No caption tracks found"))?;
        tracing::debug!(
            "Selected caption track language={} generated={}",
            track.language_code,
            track.is_generated()
        );

        let xml = self.get_text(&self.track_url(track), "caption track").await?;
        let entries = parse_transcript(&xml)?;
        tracing::debug!("Fetched {} caption entries for {}", entries.len(), video_id);
        Ok(entries)
    }

    fn name(&self) -> &'static str {
        "timedtext"
    }
}

/// Watch page URL for a video, with the id query-encoded
pub(crate) fn watch_url(base_url: &str, video_id: &str) -> Result<reqwest::Url, CaptionError> {
    reqwest::Url::parse_with_params(&format!("{}/watch", base_url), &[("v", video_id)])
        .map_err(|e| CaptionError::Upstream(format!("invalid watch URL: {}", e)))
}

/// Parse the JSON value that follows `"key":` in `page`.
fn json_value_after(page: &str, key: &str) -> Option<Value> {
    let marker = format!("\"{}\":", key);
    let start = page.find(&marker)? + marker.len();
    serde_json::Deserializer::from_str(&page[start..])
        .into_iter::<Value>()
        .next()?
        .ok()
}

/// Extract the caption track list from a watch page.
pub fn caption_tracks(page: &str, video_id: &str) -> Result<Vec<CaptionTrack>, CaptionError> {
    if let Some(value) = json_value_after(page, "captionTracks") {
        let tracks: Vec<CaptionTrack> = serde_json::from_value(value)
            .map_err(|e| CaptionError::Upstream(format!("malformed caption track list: {}", e)))?;
        if tracks.is_empty() {
            return Err(CaptionError::unavailable(video_id, "No caption tracks found"));
        }
        return Ok(tracks);
    }

    if page.contains("class=\"g-recaptcha\"") {
        return Err(CaptionError::Upstream(
            "too many requests, upstream is asking for a captcha".to_string(),
        ));
    }

    if let Some(status) = json_value_after(page, "playabilityStatus") {
        if status["status"].as_str().is_some_and(|s| s != "OK") {
            let reason = status["reason"]
                .as_str()
                .unwrap_or("Video is unavailable")
                .to_string();
            return Err(CaptionError::unavailable(video_id, reason));
        }
    }

    Err(CaptionError::unavailable(
        video_id,
        "Subtitles are disabled for this video",
    ))
}

/// Pick a track: manually created tracks in preferred language order, then
/// generated ones, then whatever comes first.
pub fn select_track<'a>(tracks: &'a [CaptionTrack], languages: &[String]) -> Option<&'a CaptionTrack> {
    let by_language = |generated: bool| {
        languages.iter().find_map(|lang| {
            tracks
                .iter()
                .find(|t| t.language_code == *lang && t.is_generated() == generated)
        })
    };

    by_language(false)
        .or_else(|| by_language(true))
        .or_else(|| tracks.first())
}

fn text_element_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // self-closing elements match the first branch and carry no text
    RE.get_or_init(|| {
        Regex::new(r"(?s)<text\b([^>]*?)(?:/>|>(.*?)</text>)").expect("valid regex")
    })
}

fn attribute_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(\w+)="([^"]*)""#).expect("valid regex"))
}

/// Parse a timedtext XML document into caption entries.
///
/// Elements without text are dropped. A missing `dur` attribute means zero
/// duration; a missing or malformed `start` is an upstream error.
pub fn parse_transcript(xml: &str) -> Result<Vec<CaptionEntry>, CaptionError> {
    let mut entries = Vec::new();

    for caps in text_element_regex().captures_iter(xml) {
        let raw_text = caps.get(2).map_or("", |m| m.as_str());
        if raw_text.is_empty() {
            continue;
        }

        let mut start = None;
        let mut duration = 0.0;
        for attr in attribute_regex().captures_iter(&caps[1]) {
            let value = &attr[2];
            let parse = |v: &str| {
                v.parse::<f64>().map_err(|_| {
                    CaptionError::Upstream(format!("malformed caption timing: {:?}", v))
                })
            };
            match &attr[1] {
                "start" => start = Some(parse(value)?),
                "dur" => duration = parse(value)?,
                _ => {}
            }
        }
        let start = start.ok_or_else(|| {
            CaptionError::Upstream("caption element without start time".to_string())
        })?;

        // entities are escaped once for XML and once more for HTML
        let text = strip_tags(&unescape_entities(&unescape_entities(raw_text)));
        entries.push(CaptionEntry::new(start, duration, text));
    }

    Ok(entries)
}

/// Decode the named and numeric character references used in captions
pub fn unescape_entities(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail
            .find(';')
            .filter(|&end| end <= 10)
            .and_then(|end| decode_entity(&tail[1..end]).map(|c| (c, end)));

        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let code = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                name.strip_prefix('#')?.parse::<u32>().ok()?
            };
            char::from_u32(code)
        }
    }
}
