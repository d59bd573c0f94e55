//! HTTP protocol layer module
//!
//! Range parsing, MIME lookup and response builders, shared by the proxy and
//! the content origin.

pub mod mime;
pub mod range;
pub mod response;

// Re-export commonly used types
pub use range::{ChunkBounds, ChunkWindow, RangeError};
pub use response::{
    build_404_response, build_405_response, build_health_response, build_options_response,
    build_status_response,
};
