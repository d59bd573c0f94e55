// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub proxy: ProxyConfig,
    pub origin: OriginConfig,
    pub page: PageConfig,
}

/// Listener configuration for both services
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub origin_host: String,
    pub origin_port: u16,
    pub workers: Option<usize>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    pub max_connections: Option<u64>,
}

/// How the proxy pulls bytes from the origin
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FetchMode {
    /// Ask the origin for the window only, slice locally if it ignores the request
    #[default]
    Range,
    /// Always download the whole resource, then slice
    Full,
}

/// Range proxy configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ProxyConfig {
    /// Origin location: an `http://` URL or a local file path
    pub origin_url: String,
    pub video_path: String,
    pub first_chunk_size: u64,
    pub chunk_size: u64,
    pub fetch_timeout_ms: u64,
    #[serde(default)]
    pub fetch_mode: FetchMode,
    /// Reject unparseable or multi-range headers with 400 instead of starting at 0
    #[serde(default)]
    pub strict_range: bool,
}

impl ProxyConfig {
    pub const fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn chunk_sizes(&self) -> ChunkSizes {
        ChunkSizes {
            first: self.first_chunk_size,
            subsequent: self.chunk_size,
        }
    }
}

/// Window sizes used when turning a `Range` header into a chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSizes {
    /// Window served when the client sent no `Range` header
    pub first: u64,
    /// Window served from an explicit start offset
    pub subsequent: u64,
}

/// Content origin configuration
#[derive(Debug, Deserialize, Clone)]
pub struct OriginConfig {
    /// File served on every request
    pub file: String,
    pub route: String,
}

/// Index page configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PageConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}
