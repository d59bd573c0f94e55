//! Content origin service
//!
//! Serves the configured file in full on every request. Range headers are
//! ignored here; windowing is the proxy's job.

use std::io;
use std::path::Path;
use std::sync::Arc;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Request, Response};
use tokio::fs;

use super::{check_http_method, RequestContext};
use crate::config::AppState;
use crate::http::response::build_file_response;
use crate::http::{self, mime};
use crate::logger;

/// Main entry point for origin requests
pub async fn handle_request<B>(req: Request<B>, state: Arc<AppState>) -> Response<Full<Bytes>> {
    if let Some(resp) = check_http_method(req.method()) {
        return resp;
    }

    let ctx = RequestContext::from_request(&req);
    if ctx.path != state.config.origin.route {
        return http::build_404_response();
    }

    serve_file(&ctx, &state.config.origin.file).await
}

/// Serve a single file with status 200
pub async fn serve_file(ctx: &RequestContext<'_>, file_path: &str) -> Response<Full<Bytes>> {
    match load_file(file_path).await {
        Ok((content, content_type)) => build_file_response(content, content_type, ctx.is_head),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            logger::log_warning(&format!("Origin file not found: {file_path}"));
            http::build_404_response()
        }
        Err(e) => {
            logger::log_error(&format!("Failed to read file '{file_path}': {e}"));
            http::build_status_response(500)
        }
    }
}

/// Load a file and infer its content type from the extension
async fn load_file(file_path: &str) -> io::Result<(Bytes, &'static str)> {
    let path = Path::new(file_path);
    let content = fs::read(path).await?;
    let content_type = mime::get_content_type(path.extension().and_then(|e| e.to_str()));
    Ok((Bytes::from(content), content_type))
}
