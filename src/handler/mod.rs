//! Request handler module
//!
//! One router per service: the proxy (index page and video chunks) and the
//! content origin (whole file).

pub mod origin;
pub mod page;
pub mod proxy;
pub mod video;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::HeaderValue;
use hyper::{Method, Request, Response};

use crate::http;
use crate::logger;

/// Methods accepted by both services
pub const ALLOWED_METHODS: &str = "GET, HEAD, OPTIONS";

/// Request context encapsulating information needed for request processing
pub struct RequestContext<'a> {
    pub path: &'a str,
    pub is_head: bool,
    /// Raw `Range` value; decoding is left to the range parser
    pub range_header: Option<&'a [u8]>,
}

impl<'a> RequestContext<'a> {
    pub fn from_request<B>(req: &'a Request<B>) -> Self {
        Self {
            path: req.uri().path(),
            is_head: req.method() == Method::HEAD,
            range_header: req.headers().get("range").map(HeaderValue::as_bytes),
        }
    }
}

/// Check HTTP method and return appropriate response for non-GET/HEAD methods
fn check_http_method(method: &Method) -> Option<Response<Full<Bytes>>> {
    match *method {
        Method::GET | Method::HEAD => None,
        Method::OPTIONS => Some(http::build_options_response(ALLOWED_METHODS)),
        _ => {
            logger::log_warning(&format!("Method not allowed: {method}"));
            Some(http::build_405_response(ALLOWED_METHODS))
        }
    }
}
