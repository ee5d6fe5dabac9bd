//! Application state
//!
//! Holds the server configuration and the caption source shared by all
//! handlers. Nothing here is mutated after startup.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::error::Result;
use crate::source::{build_source, CaptionSource};

/// Application state shared across all handlers
pub struct AppState {
    /// Server configuration
    pub config: ServerConfig,

    /// Upstream caption provider
    pub source: Arc<dyn CaptionSource>,
}

impl AppState {
    /// Create state with the caption source selected by `config`
    pub fn new(config: ServerConfig) -> Result<Self> {
        let source = build_source(&config.captions)?;
        Ok(Self::with_source(config, source))
    }

    /// Create state around an existing caption source
    pub fn with_source(config: ServerConfig, source: Arc<dyn CaptionSource>) -> Self {
        Self { config, source }
    }
}
