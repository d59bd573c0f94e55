//! Video chunk endpoint
//!
//! Each request resolves its window, reads it from the configured source and
//! answers `206 Partial Content`. Nothing is kept between requests.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;

use super::RequestContext;
use crate::config::{AppState, ChunkSizes};
use crate::error::ProxyError;
use crate::http::response::build_partial_response;
use crate::http::{self, ChunkBounds, ChunkWindow};
use crate::logger;
use crate::source::ContentSource;

/// Chunk ready to be framed as a 206 reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkResponse {
    pub bounds: ChunkBounds,
    pub body: Bytes,
}

/// Compute the window for `range_header` and read it from `source`.
///
/// The returned bounds always describe the returned body: a source that hands
/// back more than the window is cut down, a short read shrinks `end`.
pub async fn handle_video_request(
    range_header: Option<&[u8]>,
    source: &dyn ContentSource,
    sizes: ChunkSizes,
    strict: bool,
) -> Result<ChunkResponse, ProxyError> {
    let window = ChunkWindow::resolve(range_header, sizes, strict)?;
    let chunk = source.read_range(window.start, window.len).await?;

    let mut bounds = window.clamp(chunk.total);
    let mut body = chunk.bytes;
    let body_len = u64::try_from(body.len()).unwrap_or(u64::MAX);

    if body_len > bounds.len() {
        body.truncate(usize::try_from(bounds.len()).unwrap_or(usize::MAX));
    } else if body_len < bounds.len() {
        bounds.end = bounds.start + body_len;
    }

    Ok(ChunkResponse { bounds, body })
}

/// Serve `GET /video`
pub async fn serve_video(ctx: &RequestContext<'_>, state: &AppState) -> Response<Full<Bytes>> {
    let result = handle_video_request(
        ctx.range_header,
        state.source.as_ref(),
        state.chunk_sizes,
        state.config.proxy.strict_range,
    )
    .await;

    match result {
        Ok(chunk) => {
            logger::log_chunk(ctx.range_header, &chunk.bounds);
            build_partial_response(chunk.body, &chunk.bounds, ctx.is_head)
        }
        Err(err) => {
            match &err {
                ProxyError::BadRange(e) => logger::log_warning(&format!(
                    "Rejected Range header {:?}: {e}",
                    ctx.range_header.map(String::from_utf8_lossy)
                )),
                ProxyError::Upstream(e) => {
                    logger::log_upstream_failure(&state.source.location(), e);
                }
            }
            http::build_status_response(err.http_status())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::source::testing::{MemorySource, UnreachableSource};
    use http_body_util::BodyExt;
    use hyper::header::HeaderValue;
    use hyper::Request;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    const SIZES: ChunkSizes = ChunkSizes {
        first: 100 * 1024,
        subsequent: 2 * 1024 * 1024,
    };

    fn state_with(source: Arc<dyn ContentSource>, strict: bool) -> AppState {
        let mut cfg = Config::load_from("/nonexistent/video-chunk-server").unwrap();
        cfg.proxy.strict_range = strict;
        AppState::with_source(cfg, source)
    }

    async fn get_video(state: &AppState, range: Option<&str>) -> Response<Full<Bytes>> {
        let mut builder = Request::get("/video");
        if let Some(range) = range {
            builder = builder.header("Range", range);
        }
        let req = builder.body(()).unwrap();
        serve_video(&RequestContext::from_request(&req), state).await
    }

    #[tokio::test]
    async fn test_no_range_serves_first_chunk() {
        let source = MemorySource::patterned(5_000_000);
        let chunk = handle_video_request(None, &source, SIZES, false).await.unwrap();
        assert_eq!(chunk.bounds.content_range(), "bytes 0-102400/5000000");
        assert_eq!(chunk.body.len(), 102_400);
    }

    #[tokio::test]
    async fn test_offset_serves_full_chunk() {
        let source = MemorySource::patterned(5_000_000);
        let chunk = handle_video_request(Some(&b"bytes=200000-"[..]), &source, SIZES, false)
            .await
            .unwrap();
        assert_eq!(chunk.bounds.content_range(), "bytes 200000-2297152/5000000");
        assert_eq!(chunk.body.len(), 2_097_152);
        assert_eq!(chunk.body[0], (200_000 % 251) as u8);
    }

    #[tokio::test]
    async fn test_short_video_clamped() {
        let source = MemorySource::patterned(1000);
        let chunk = handle_video_request(None, &source, SIZES, false).await.unwrap();
        assert_eq!(chunk.bounds.content_range(), "bytes 0-1000/1000");
        assert_eq!(chunk.body.len(), 1000);
    }

    #[tokio::test]
    async fn test_start_past_end_is_empty() {
        let source = MemorySource::patterned(1000);
        let chunk = handle_video_request(Some(&b"bytes=5000-"[..]), &source, SIZES, false)
            .await
            .unwrap();
        assert!(chunk.body.is_empty());
        assert_eq!(chunk.bounds.content_range(), "bytes 5000-1000/1000");
    }

    #[tokio::test]
    async fn test_malformed_range_starts_at_zero() {
        let source = MemorySource::patterned(5_000_000);
        let chunk = handle_video_request(Some(&b"bytes=abc-"[..]), &source, SIZES, false)
            .await
            .unwrap();
        assert_eq!(chunk.bounds.start, 0);
        assert_eq!(chunk.body[..16], source_prefix(16)[..]);
    }

    fn source_prefix(len: usize) -> Vec<u8> {
        #[allow(clippy::cast_possible_truncation)]
        let bytes = (0..len).map(|i| (i % 251) as u8).collect();
        bytes
    }

    #[tokio::test]
    async fn test_repeated_requests_identical() {
        let source = MemorySource::patterned(3_000_000);
        let first = handle_video_request(Some(&b"bytes=1000-"[..]), &source, SIZES, false)
            .await
            .unwrap();
        let second = handle_video_request(Some(&b"bytes=1000-"[..]), &source, SIZES, false)
            .await
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(source.reads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_response_framing() {
        let state = state_with(Arc::new(MemorySource::patterned(5_000_000)), false);
        let response = get_video(&state, Some("bytes=200000-")).await;

        assert_eq!(response.status(), 206);
        let headers = response.headers();
        assert_eq!(headers["content-type"], "video/mp4");
        assert_eq!(headers["content-length"], "2097152");
        assert_eq!(headers["content-range"], "bytes 200000-2297152/5000000");

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body.len(), 2_097_152);
    }

    #[tokio::test]
    async fn test_strict_mode_returns_400() {
        let state = state_with(Arc::new(MemorySource::patterned(1000)), true);
        let response = get_video(&state, Some("bytes=0-10,20-30")).await;
        assert_eq!(response.status(), 400);

        let response = get_video(&state, Some("bytes=abc-")).await;
        assert_eq!(response.status(), 400);
    }

    #[tokio::test]
    async fn test_undecodable_range_is_malformed() {
        let req = Request::get("/video")
            .header("Range", HeaderValue::from_bytes(b"bytes=\xe9-").unwrap())
            .body(())
            .unwrap();
        let ctx = RequestContext::from_request(&req);

        let strict = state_with(Arc::new(MemorySource::patterned(5_000_000)), true);
        let response = serve_video(&ctx, &strict).await;
        assert_eq!(response.status(), 400);
        assert!(response.headers().get("content-range").is_none());

        let lenient = state_with(Arc::new(MemorySource::patterned(5_000_000)), false);
        let response = serve_video(&ctx, &lenient).await;
        assert_eq!(response.status(), 206);
        assert_eq!(response.headers()["content-range"], "bytes 0-2097152/5000000");
    }

    #[tokio::test]
    async fn test_unreachable_origin_returns_502() {
        let state = state_with(Arc::new(UnreachableSource), false);
        let response = get_video(&state, Some("bytes=0-")).await;

        assert_eq!(response.status(), 502);
        assert!(response.headers().get("content-range").is_none());
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"502 Bad Gateway");
    }
}
