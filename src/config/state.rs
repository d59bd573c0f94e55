// Application state module
// Everything request handlers of both services read; nothing here changes per request

use std::sync::Arc;

use super::types::{ChunkSizes, Config};
use crate::error::SourceError;
use crate::source::{self, ContentSource};

/// Application state
pub struct AppState {
    pub config: Config,
    /// Where the proxy reads video bytes from
    pub source: Arc<dyn ContentSource>,
    pub chunk_sizes: ChunkSizes,
}

impl AppState {
    /// Create `AppState` with the source described by `config.proxy`
    pub fn new(config: Config) -> Result<Self, SourceError> {
        let source = source::from_config(&config.proxy)?;
        Ok(Self::with_source(config, source))
    }

    /// Create `AppState` around an already built source
    pub fn with_source(config: Config, source: Arc<dyn ContentSource>) -> Self {
        let chunk_sizes = config.proxy.chunk_sizes();

        Self {
            config,
            source,
            chunk_sizes,
        }
    }
}
