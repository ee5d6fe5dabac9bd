//! Configuration file support
//!
//! Loads server configuration from TOML files.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::{CaptionBackend, CaptionConfig, LogFormat, ServerConfig};

/// Configuration file format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Server settings
    pub server: ServerSettings,
    /// Caption source settings
    pub captions: Option<CaptionSettings>,
    /// Logging settings
    pub logging: Option<LoggingSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Host address to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Enable CORS
    pub cors_enabled: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaptionSettings {
    /// timedtext or ytdlp
    pub backend: Option<CaptionBackend>,
    /// Preferred languages, most preferred first
    pub languages: Option<Vec<String>>,
    /// Netscape cookies file
    pub cookies_file: Option<PathBuf>,
    /// yt-dlp executable
    pub ytdlp_path: Option<String>,
    /// Fetch timeout in seconds
    pub timeout_secs: Option<u64>,
    /// Base URL of the video site
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Output format (json, pretty)
    pub format: Option<LogFormat>,
}

impl ConfigFile {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: ConfigFile = toml::from_str(&content)?;
        Ok(config)
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Generate default configuration file
    pub fn default_config() -> Self {
        let defaults = CaptionConfig::default();
        Self {
            server: ServerSettings {
                host: "0.0.0.0".to_string(),
                port: 5000,
                cors_enabled: Some(true),
            },
            captions: Some(CaptionSettings {
                backend: Some(defaults.backend),
                languages: Some(defaults.languages),
                cookies_file: None,
                ytdlp_path: Some(defaults.ytdlp_path),
                timeout_secs: Some(defaults.timeout_secs),
                base_url: Some(defaults.base_url),
            }),
            logging: Some(LoggingSettings {
                level: "info".to_string(),
                format: Some(LogFormat::Pretty),
            }),
        }
    }

    /// Convert to ServerConfig
    pub fn into_server_config(self) -> ServerConfig {
        let defaults = CaptionConfig::default();
        let captions = self.captions.unwrap_or_default();

        ServerConfig {
            host: self.server.host,
            port: self.server.port,
            cors_enabled: self.server.cors_enabled.unwrap_or(true),
            log_level: self
                .logging
                .as_ref()
                .map(|l| l.level.clone())
                .unwrap_or_else(|| "info".to_string()),
            log_format: self
                .logging
                .as_ref()
                .and_then(|l| l.format)
                .unwrap_or(LogFormat::Pretty),
            captions: CaptionConfig {
                backend: captions.backend.unwrap_or(defaults.backend),
                languages: captions
                    .languages
                    .filter(|l| !l.is_empty())
                    .unwrap_or(defaults.languages),
                cookies_file: captions.cookies_file,
                ytdlp_path: captions.ytdlp_path.unwrap_or(defaults.ytdlp_path),
                timeout_secs: captions
                    .timeout_secs
                    .filter(|t| *t > 0)
                    .unwrap_or(defaults.timeout_secs),
                base_url: captions.base_url.unwrap_or(defaults.base_url),
            },
        }
    }
}

/// Load the server configuration from `path` if it exists.
///
/// A missing file yields the defaults. Errors are returned together with
/// the defaults so the caller can report them once logging is up.
pub fn load_server_config(path: &str) -> (ServerConfig, Option<String>) {
    if !Path::new(path).exists() {
        return (ServerConfig::default(), None);
    }

    match ConfigFile::from_file(path) {
        Ok(cf) => (cf.into_server_config(), None),
        Err(e) => (
            ServerConfig::default(),
            Some(format!(
                "Failed to load config file {}: {}. Using defaults.",
                path, e
            )),
        ),
    }
}
