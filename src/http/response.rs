//! HTTP response building module
//!
//! Provides builders for the status codes both services emit, decoupled from
//! request handling.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};

use super::range::ChunkBounds;

/// Content type of every chunk served by the proxy
pub const VIDEO_CONTENT_TYPE: &str = "video/mp4";

/// Build a plain-text response carrying only the status line as body
pub fn build_status_response(status: u16) -> Response<Full<Bytes>> {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let text = format!(
        "{} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Error")
    );

    Response::builder()
        .status(status)
        .header("Content-Type", "text/plain")
        .header("Content-Length", text.len())
        .body(Full::new(Bytes::from(text)))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 404 Not Found response
pub fn build_404_response() -> Response<Full<Bytes>> {
    build_status_response(404)
}

/// Build 405 Method Not Allowed response
pub fn build_405_response(allow: &str) -> Response<Full<Bytes>> {
    let mut response = build_status_response(405);
    if let Ok(value) = allow.parse() {
        response.headers_mut().insert("Allow", value);
    }
    response
}

/// Build OPTIONS response
pub fn build_options_response(allow: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(204)
        .header("Allow", allow)
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error("OPTIONS", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build health check response
pub fn build_health_response(status: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(200)
        .header("Content-Type", "text/plain")
        .header("Cache-Control", "no-store")
        .body(Full::new(Bytes::from(status.to_owned())))
        .unwrap_or_else(|e| {
            log_build_error("health", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build generic HTML response
pub fn build_html_response(content: String, is_head: bool) -> Response<Full<Bytes>> {
    let content_length = content.len();
    let body = if is_head {
        Bytes::new()
    } else {
        Bytes::from(content)
    };

    Response::builder()
        .status(200)
        .header("Content-Type", "text/html; charset=utf-8")
        .header("Content-Length", content_length)
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error("HTML", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 200 response carrying a whole file
pub fn build_file_response(
    data: Bytes,
    content_type: &str,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let content_length = data.len();
    let body = if is_head { Bytes::new() } else { data };

    Response::builder()
        .status(200)
        .header("Content-Type", content_type)
        .header("Content-Length", content_length)
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error("200", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 206 Partial Content response for a video chunk
///
/// `Content-Length` is the length of `data`, not the size of the whole resource.
pub fn build_partial_response(
    data: Bytes,
    bounds: &ChunkBounds,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let content_length = data.len();
    let body = if is_head { Bytes::new() } else { data };

    Response::builder()
        .status(206)
        .header("Content-Type", VIDEO_CONTENT_TYPE)
        .header("Content-Length", content_length)
        .header("Content-Range", bounds.content_range())
        .header("Accept-Ranges", "bytes")
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error("206", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    fn header<'a>(response: &'a Response<Full<Bytes>>, name: &str) -> &'a str {
        response.headers()[name].to_str().unwrap()
    }

    #[tokio::test]
    async fn test_partial_response_headers() {
        let bounds = ChunkBounds {
            start: 10,
            end: 14,
            total: 100,
        };
        let response = build_partial_response(Bytes::from_static(b"abcd"), &bounds, false);
        assert_eq!(response.status(), 206);
        assert_eq!(header(&response, "Content-Type"), "video/mp4");
        assert_eq!(header(&response, "Content-Length"), "4");
        assert_eq!(header(&response, "Content-Range"), "bytes 10-14/100");

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"abcd");
    }

    #[tokio::test]
    async fn test_head_keeps_length() {
        let response = build_file_response(Bytes::from_static(b"12345"), "video/mp4", true);
        assert_eq!(header(&response, "Content-Length"), "5");
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert!(body.is_empty());
    }

    #[test]
    fn test_status_response() {
        let response = build_status_response(502);
        assert_eq!(response.status(), 502);
        assert_eq!(header(&response, "Content-Type"), "text/plain");

        let response = build_405_response("GET, HEAD, OPTIONS");
        assert_eq!(response.status(), 405);
        assert_eq!(header(&response, "Allow"), "GET, HEAD, OPTIONS");
    }
}
