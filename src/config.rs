//! Server configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which upstream mechanism supplies caption tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptionBackend {
    /// YouTube watch page + timedtext track download
    Timedtext,
    /// External `yt-dlp` process
    Ytdlp,
}

impl std::str::FromStr for CaptionBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "timedtext" => Ok(CaptionBackend::Timedtext),
            "ytdlp" | "yt-dlp" => Ok(CaptionBackend::Ytdlp),
            other => Err(format!("unknown caption backend: {}", other)),
        }
    }
}

/// Caption source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptionConfig {
    /// Caption retrieval backend
    pub backend: CaptionBackend,

    /// Preferred caption languages, most preferred first
    pub languages: Vec<String>,

    /// Netscape-format cookies file used to authenticate upstream
    pub cookies_file: Option<PathBuf>,

    /// Path or name of the yt-dlp executable
    pub ytdlp_path: String,

    /// Upper bound for a single caption fetch in seconds
    pub timeout_secs: u64,

    /// Base URL of the video site
    pub base_url: String,
}

/// Fetch timeout used when none (or zero) is configured
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

impl Default for CaptionConfig {
    fn default() -> Self {
        Self {
            backend: CaptionBackend::Timedtext,
            languages: vec!["en".to_string()],
            cookies_file: None,
            ytdlp_path: "yt-dlp".to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            base_url: "https://www.youtube.com".to_string(),
        }
    }
}

impl CaptionConfig {
    /// Fetch timeout; zero means the default
    pub fn timeout(&self) -> std::time::Duration {
        match self.timeout_secs {
            0 => std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            secs => std::time::Duration::from_secs(secs),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Enable CORS
    pub cors_enabled: bool,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Log output format
    pub log_format: LogFormat,

    /// Caption source configuration
    pub captions: CaptionConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            cors_enabled: true,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            captions: CaptionConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Get the socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Default `EnvFilter` directives when `RUST_LOG` is unset
    pub fn log_directives(&self) -> String {
        format!(
            "caption_window={level},tower_http={level}",
            level = self.log_level
        )
    }

    /// Apply `CAPTION_WINDOW_*` environment overrides.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), String>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("CAPTION_WINDOW_HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("CAPTION_WINDOW_PORT") {
            self.port = port
                .parse()
                .map_err(|_| format!("invalid CAPTION_WINDOW_PORT: {}", port))?;
        }
        if let Some(backend) = lookup("CAPTION_WINDOW_BACKEND") {
            self.captions.backend = backend.parse()?;
        }
        if let Some(cookies) = lookup("CAPTION_WINDOW_COOKIES") {
            if !cookies.is_empty() {
                self.captions.cookies_file = Some(PathBuf::from(cookies));
            }
        }
        Ok(())
    }
}
