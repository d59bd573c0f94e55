//! Request routing for the proxy service

use std::sync::Arc;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Request, Response};

use super::{check_http_method, page, video, RequestContext};
use crate::config::AppState;
use crate::http;

const HEALTH_PATH: &str = "/healthz";

/// Main entry point for proxy requests
pub async fn handle_request<B>(req: Request<B>, state: Arc<AppState>) -> Response<Full<Bytes>> {
    if let Some(resp) = check_http_method(req.method()) {
        return resp;
    }

    let ctx = RequestContext::from_request(&req);
    let video_path = state.config.proxy.video_path.as_str();

    match ctx.path {
        path if path == video_path => video::serve_video(&ctx, &state).await,
        "/" | "" => page::serve_index_page(&ctx, &state.config.page, video_path),
        HEALTH_PATH => http::build_health_response("ok"),
        _ => http::build_404_response(),
    }
}
