//! Error types shared by the proxy, the content sources and the service supervisor.

use std::time::Duration;

use crate::http::RangeError;

/// Failure while pulling bytes from the origin.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The origin location could not be turned into a request target.
    #[error("invalid origin location '{0}'")]
    InvalidLocation(String),

    /// The origin could not be reached.
    #[error("origin unreachable: {0}")]
    Connect(String),

    /// The origin has no such resource.
    #[error("origin resource not found: {0}")]
    NotFound(String),

    /// The origin answered with a status the proxy cannot use.
    #[error("origin answered HTTP {status} for {location}")]
    Status { status: u16, location: String },

    /// The origin reply could not be read or understood.
    #[error("malformed origin reply: {0}")]
    Body(String),

    /// The fetch did not complete within the configured bound.
    #[error("origin fetch timed out after {0:?}")]
    Timeout(Duration),

    #[error("origin read failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Request-level failure of the `/video` endpoint.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    /// Unusable `Range` header, only surfaced in strict mode.
    #[error("invalid Range header: {0}")]
    BadRange(#[from] RangeError),

    #[error("upstream fetch failed: {0}")]
    Upstream(#[from] SourceError),
}

impl ProxyError {
    /// Map this error to the status sent to the client.
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::BadRange(_) => 400,
            Self::Upstream(SourceError::Timeout(_)) => 504,
            Self::Upstream(_) => 502,
        }
    }
}

/// Reason the supervisor stopped the process.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{service} listener failed: {source}")]
    Listener {
        service: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{service} service exited unexpectedly")]
    Exited { service: &'static str },

    #[error("{service} service panicked")]
    Panicked { service: &'static str },
}
