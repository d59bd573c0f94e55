//! Content origin reached over HTTP

use async_trait::async_trait;
use http_body_util::{BodyExt, Empty};
use hyper::body::{Bytes, Incoming};
use hyper::{Request, Response, StatusCode, Uri};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;

use super::{Chunk, ContentSource};
use crate::config::FetchMode;
use crate::error::SourceError;
use crate::http::range::{parse_content_range_start, parse_content_range_total};

/// HTTP origin holding the full video
///
/// In [`FetchMode::Range`] only the requested window is asked for. An origin
/// that ignores `Range` and answers 200 still works: the full body is
/// buffered and sliced here.
#[derive(Clone)]
pub struct HttpOrigin {
    client: Client<HttpConnector, Empty<Bytes>>,
    uri: Uri,
    mode: FetchMode,
}

impl HttpOrigin {
    pub fn new(location: &str, mode: FetchMode) -> Result<Self, SourceError> {
        let uri = location
            .parse::<Uri>()
            .map_err(|_| SourceError::InvalidLocation(location.to_string()))?;
        if uri.host().is_none() {
            return Err(SourceError::InvalidLocation(location.to_string()));
        }

        let mut connector = HttpConnector::new();
        connector.set_nodelay(true);
        let client = Client::builder(TokioExecutor::new()).build(connector);

        Ok(Self { client, uri, mode })
    }

    fn build_request(&self, start: u64, len: u64) -> Result<Request<Empty<Bytes>>, SourceError> {
        let mut builder = Request::get(self.uri.clone());
        if self.mode == FetchMode::Range && len > 0 {
            let last = start.saturating_add(len - 1);
            builder = builder.header("Range", format!("bytes={start}-{last}"));
        }
        builder
            .body(Empty::new())
            .map_err(|e| SourceError::InvalidLocation(format!("{}: {e}", self.uri)))
    }

    async fn read_body(response: Response<Incoming>) -> Result<Bytes, SourceError> {
        response
            .into_body()
            .collect()
            .await
            .map(http_body_util::Collected::to_bytes)
            .map_err(|e| SourceError::Body(e.to_string()))
    }

    fn content_range_header(response: &Response<Incoming>) -> Option<&str> {
        response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
    }

    fn content_range_total(response: &Response<Incoming>) -> Option<u64> {
        Self::content_range_header(response).and_then(parse_content_range_total)
    }
}

#[async_trait]
impl ContentSource for HttpOrigin {
    async fn read_range(&self, start: u64, len: u64) -> Result<Chunk, SourceError> {
        let request = self.build_request(start, len)?;
        let response = self
            .client
            .request(request)
            .await
            .map_err(|e| SourceError::Connect(format!("{}: {e}", self.uri)))?;

        match response.status() {
            StatusCode::OK => {
                let full = Self::read_body(response).await?;
                Ok(Chunk::from_full(full, start, len))
            }
            StatusCode::PARTIAL_CONTENT => {
                let total = Self::content_range_total(&response).ok_or_else(|| {
                    SourceError::Body("206 reply without a usable Content-Range".to_string())
                })?;
                let reply_start = Self::content_range_header(&response)
                    .and_then(parse_content_range_start);
                if reply_start != Some(start) {
                    return Err(SourceError::Body(format!(
                        "asked for bytes from {start}, origin answered {reply_start:?}"
                    )));
                }
                let mut bytes = Self::read_body(response).await?;
                // Never hand out more than was asked for
                bytes.truncate(usize::try_from(len).unwrap_or(usize::MAX));
                Ok(Chunk { bytes, total })
            }
            StatusCode::RANGE_NOT_SATISFIABLE => Self::content_range_total(&response)
                .map(Chunk::empty)
                .ok_or_else(|| {
                    SourceError::Body("416 reply without a usable Content-Range".to_string())
                }),
            StatusCode::NOT_FOUND => Err(SourceError::NotFound(self.uri.to_string())),
            status => Err(SourceError::Status {
                status: status.as_u16(),
                location: self.uri.to_string(),
            }),
        }
    }

    fn location(&self) -> String {
        self.uri.to_string()
    }
}
