//! HTTP Range handling for chunked video delivery
//!
//! Only the open-ended `bytes=<start>-` form drives the window. The client
//! never chooses the window length: a request without `Range` gets a small
//! first chunk, every explicit offset gets a full chunk.

use crate::config::ChunkSizes;

/// Why a `Range` header could not be used
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RangeError {
    /// Header does not use the `bytes=` unit
    #[error("missing 'bytes=' unit")]
    MissingUnit,
    /// Start offset is not a non-negative integer
    #[error("invalid start offset '{0}'")]
    InvalidOffset(String),
    /// Comma-separated ranges are not served
    #[error("multiple ranges are not supported")]
    MultiRange,
    /// Header value carries bytes outside visible ASCII
    #[error("header is not visible ASCII")]
    NotAscii,
}

/// Parse the start offset out of a `Range` header
///
/// Takes the raw header bytes. Returns `Ok(None)` when there is no header.
/// The end position, if the client sent one, is ignored.
///
/// # Examples
/// ```ignore
/// assert_eq!(parse_range_header(Some(b"bytes=200000-")), Ok(Some(200_000)));
/// assert_eq!(parse_range_header(None), Ok(None));
/// ```
pub fn parse_range_header(range_header: Option<&[u8]>) -> Result<Option<u64>, RangeError> {
    let Some(raw) = range_header else {
        return Ok(None);
    };
    if !raw.iter().all(|b| b.is_ascii_graphic() || *b == b' ' || *b == b'\t') {
        return Err(RangeError::NotAscii);
    }
    let header = std::str::from_utf8(raw).map_err(|_| RangeError::NotAscii)?;

    let spec = header
        .trim()
        .strip_prefix("bytes=")
        .ok_or(RangeError::MissingUnit)?;

    if spec.contains(',') {
        return Err(RangeError::MultiRange);
    }

    let start = spec.split_once('-').map_or(spec, |(start, _)| start).trim();
    start
        .parse::<u64>()
        .map(Some)
        .map_err(|_| RangeError::InvalidOffset(start.to_string()))
}

/// Requested byte window, before the total size is known
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkWindow {
    pub start: u64,
    /// Maximum number of bytes to serve
    pub len: u64,
}

impl ChunkWindow {
    /// Turn a `Range` header into a window.
    ///
    /// Unusable headers restart playback from offset 0 with a full chunk,
    /// unless `strict` is set, in which case the parse error is returned.
    pub fn resolve(
        range_header: Option<&[u8]>,
        sizes: ChunkSizes,
        strict: bool,
    ) -> Result<Self, RangeError> {
        match parse_range_header(range_header) {
            Ok(None) => Ok(Self {
                start: 0,
                len: sizes.first,
            }),
            Ok(Some(start)) => Ok(Self {
                start,
                len: sizes.subsequent,
            }),
            Err(err) if strict => Err(err),
            Err(err) => {
                crate::logger::log_warning(&format!(
                    "Ignoring unusable Range header {:?}: {err}, starting at 0",
                    range_header.map(String::from_utf8_lossy)
                ));
                Ok(Self {
                    start: 0,
                    len: sizes.subsequent,
                })
            }
        }
    }

    /// Clamp the window to a resource of `total` bytes
    pub fn clamp(&self, total: u64) -> ChunkBounds {
        ChunkBounds {
            start: self.start,
            end: self.start.saturating_add(self.len).min(total),
            total,
        }
    }
}

/// Window clamped to the resource size
///
/// `end` is exclusive. A start past the end of the resource keeps its value,
/// so `end < start` and the chunk is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkBounds {
    pub start: u64,
    pub end: u64,
    pub total: u64,
}

impl ChunkBounds {
    /// Number of bytes in the chunk
    #[inline]
    pub const fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `Content-Range` value, `bytes {start}-{end}/{total}`
    pub fn content_range(&self) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, self.total)
    }
}

/// Extract the complete length from a `Content-Range` response header
///
/// Accepts `bytes 0-99/1000` and `bytes */1000`. An unknown length (`/*`)
/// yields `None`.
pub fn parse_content_range_total(header: &str) -> Option<u64> {
    let rest = header.trim().strip_prefix("bytes")?.trim_start();
    let (_, total) = rest.rsplit_once('/')?;
    total.trim().parse().ok()
}

/// Extract the first byte position from a `Content-Range` response header
///
/// `bytes 200-299/1000` yields `200`. The unsatisfied form `bytes */1000` has
/// no position and yields `None`.
pub fn parse_content_range_start(header: &str) -> Option<u64> {
    let rest = header.trim().strip_prefix("bytes")?.trim_start();
    let (range, _) = rest.split_once('/')?;
    let (start, _) = range.split_once('-')?;
    start.trim().parse().ok()
}
