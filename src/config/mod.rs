// Configuration module entry point
// Loads layered configuration and builds the runtime state shared by both services

mod state;
mod types;

use std::net::SocketAddr;

// Re-export public types
pub use state::AppState;
pub use types::{ChunkSizes, Config, FetchMode, LoggingConfig, PageConfig, ProxyConfig};

const KB: u64 = 1024;

/// Window served when the client sends no `Range` header (fast playback start)
pub const FIRST_CHUNK_SIZE: u64 = 100 * KB;

/// Window served for `bytes=<start>-` requests
pub const CHUNK_SIZE: u64 = 2 * KB * KB;

/// Config file used when no path is given on the command line
pub const DEFAULT_CONFIG_PATH: &str = "config";

impl Config {
    /// Load configuration from specified file path (without extension)
    ///
    /// Sources, lowest priority first: built-in defaults, the file (optional),
    /// then `VIDEO_*` environment variables (`VIDEO_PROXY__CHUNK_SIZE=...`).
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("VIDEO")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8000)?
            .set_default("server.origin_host", "127.0.0.1")?
            .set_default("server.origin_port", 8001)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("proxy.origin_url", "http://127.0.0.1:8001/video")?
            .set_default("proxy.video_path", "/video")?
            .set_default("proxy.first_chunk_size", FIRST_CHUNK_SIZE)?
            .set_default("proxy.chunk_size", CHUNK_SIZE)?
            .set_default("proxy.fetch_timeout_ms", 30_000)?
            .set_default("proxy.fetch_mode", "range")?
            .set_default("proxy.strict_range", false)?
            .set_default("origin.file", "video.mp4")?
            .set_default("origin.route", "/video")?
            .set_default("page.title", "Video")?
            .set_default("page.width", 640)?
            .set_default("page.height", 480)?
            .build()?;

        let cfg: Self = settings.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), config::ConfigError> {
        if self.proxy.first_chunk_size == 0 || self.proxy.chunk_size == 0 {
            return Err(config::ConfigError::Message(
                "proxy chunk sizes must be greater than zero".to_string(),
            ));
        }
        if self.proxy.fetch_timeout_ms == 0 {
            return Err(config::ConfigError::Message(
                "proxy.fetch_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }

    pub fn get_origin_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.origin_host, self.server.origin_port)
            .parse()
            .map_err(|e| format!("Invalid origin address: {e}"))
    }
}
