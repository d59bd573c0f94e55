//! Fetch deadline shared by every content source

use std::time::Duration;

use async_trait::async_trait;

use super::{Chunk, ContentSource};
use crate::error::SourceError;

/// Timeout decorator for content sources
///
/// The bound covers the whole read, body included.
pub struct TimeoutSource<S> {
    inner: S,
    timeout: Duration,
}

impl<S: ContentSource> TimeoutSource<S> {
    pub const fn new(inner: S, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

#[async_trait]
impl<S: ContentSource> ContentSource for TimeoutSource<S> {
    async fn read_range(&self, start: u64, len: u64) -> Result<Chunk, SourceError> {
        tokio::time::timeout(self.timeout, self.inner.read_range(start, len))
            .await
            .map_err(|_| SourceError::Timeout(self.timeout))?
    }

    fn location(&self) -> String {
        self.inner.location()
    }
}
