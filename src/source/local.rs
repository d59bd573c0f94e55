//! Content read straight from the local filesystem

use std::io::SeekFrom;
use std::path::PathBuf;

use async_trait::async_trait;
use hyper::body::Bytes;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use super::{Chunk, ContentSource};
use crate::error::SourceError;

/// Video file on disk; only the requested window is read
#[derive(Debug, Clone)]
pub struct FileOrigin {
    path: PathBuf,
}

impl FileOrigin {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ContentSource for FileOrigin {
    async fn read_range(&self, start: u64, len: u64) -> Result<Chunk, SourceError> {
        let mut file = File::open(&self.path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SourceError::NotFound(self.path.display().to_string())
            } else {
                SourceError::Io(e)
            }
        })?;
        let total = file.metadata().await?.len();

        if start >= total {
            return Ok(Chunk::empty(total));
        }

        let wanted = len.min(total - start);
        file.seek(SeekFrom::Start(start)).await?;

        let mut buf = Vec::with_capacity(usize::try_from(wanted).unwrap_or(0));
        file.take(wanted).read_to_end(&mut buf).await?;

        Ok(Chunk {
            bytes: Bytes::from(buf),
            total,
        })
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
