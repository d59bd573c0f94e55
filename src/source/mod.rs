//! Content sources
//!
//! The proxy never touches the video bytes directly. It asks a [`ContentSource`]
//! for a window and gets back the bytes in that window together with the size
//! of the whole resource.

mod local;
mod remote;
mod timeout;

use std::sync::Arc;

use async_trait::async_trait;
use hyper::body::Bytes;

use crate::config::ProxyConfig;
use crate::error::SourceError;

pub use local::FileOrigin;
pub use remote::HttpOrigin;
pub use timeout::TimeoutSource;

/// Bytes read from a source for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Bytes of the requested window, at most the requested length
    pub bytes: Bytes,
    /// Size of the whole resource
    pub total: u64,
}

impl Chunk {
    /// Cut the window `[start, start + len)` out of a fully buffered resource.
    ///
    /// A start at or past the end gives an empty chunk.
    pub fn from_full(full: Bytes, start: u64, len: u64) -> Self {
        let total = u64::try_from(full.len()).unwrap_or(u64::MAX);
        let end = start.saturating_add(len).min(total);
        let bytes = if start < end {
            full.slice(to_index(start)..to_index(end))
        } else {
            Bytes::new()
        };
        Self { bytes, total }
    }

    pub fn empty(total: u64) -> Self {
        Self {
            bytes: Bytes::new(),
            total,
        }
    }
}

/// Where the proxy reads video bytes from
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Read up to `len` bytes starting at `start`.
    async fn read_range(&self, start: u64, len: u64) -> Result<Chunk, SourceError>;

    /// Human-readable location, for logs
    fn location(&self) -> String;
}

/// Build the source described by the proxy configuration.
///
/// `http://` locations go through [`HttpOrigin`], anything else is read from
/// disk. Either way the fetch is bounded by `fetch_timeout_ms`.
pub fn from_config(config: &ProxyConfig) -> Result<Arc<dyn ContentSource>, SourceError> {
    let location = config.origin_url.trim();
    let timeout = config.fetch_timeout();

    if location.starts_with("http://") {
        let origin = HttpOrigin::new(location, config.fetch_mode)?;
        Ok(Arc::new(TimeoutSource::new(origin, timeout)))
    } else if location.contains("://") {
        Err(SourceError::InvalidLocation(location.to_string()))
    } else {
        Ok(Arc::new(TimeoutSource::new(FileOrigin::new(location), timeout)))
    }
}

fn to_index(offset: u64) -> usize {
    usize::try_from(offset).unwrap_or(usize::MAX)
}
