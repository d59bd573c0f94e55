//! Logger module
//!
//! Thin facade over `tracing`:
//! - Server lifecycle logging
//! - Access logging with multiple formats, on its own writer
//! - Error and warning logging
//! - File-based logging support

mod format;
pub mod writer;

pub use format::AccessLogEntry;

use std::net::SocketAddr;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use crate::config::{Config, LoggingConfig};
use crate::http::ChunkBounds;

/// Target carrying access log lines
pub const ACCESS_TARGET: &str = "access";

/// Install the global subscriber
///
/// Should be called once at application startup. `RUST_LOG` takes precedence
/// over `logging.level`.
pub fn init(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let diagnostics_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))?
        .add_directive(format!("{ACCESS_TARGET}=off").parse()?);

    let access_layer = fmt::layer()
        .with_writer(writer::access_writer(config.access_log_file.as_deref())?)
        .with_ansi(false)
        .without_time()
        .with_level(false)
        .with_target(false)
        .with_filter(tracing_subscriber::filter::filter_fn(|meta| {
            meta.target() == ACCESS_TARGET
        }));

    let diagnostics_layer = fmt::layer()
        .with_writer(writer::error_writer(config.error_log_file.as_deref())?)
        .with_ansi(config.error_log_file.is_none())
        .with_filter(diagnostics_filter);

    tracing_subscriber::registry()
        .with(access_layer)
        .with(diagnostics_layer)
        .try_init()?;
    Ok(())
}

pub fn log_server_start(proxy_addr: &SocketAddr, origin_addr: &SocketAddr, config: &Config) {
    tracing::info!("======================================");
    tracing::info!("Video chunk server started");
    tracing::info!("Proxy listening on: http://{proxy_addr}");
    tracing::info!("Origin listening on: http://{origin_addr}");
    tracing::info!(
        "Proxy reads from {} ({:?} mode, timeout {} ms)",
        config.proxy.origin_url,
        config.proxy.fetch_mode,
        config.proxy.fetch_timeout_ms
    );
    tracing::info!(
        "Chunk sizes: first {} bytes, then {} bytes",
        config.proxy.first_chunk_size,
        config.proxy.chunk_size
    );
    tracing::info!("Origin serves: {}", config.origin.file);
    if let Some(workers) = config.server.workers {
        tracing::info!("Worker threads: {workers}");
    }
    if let Some(ref path) = config.logging.access_log_file {
        tracing::info!("Access log: {path}");
    }
    tracing::info!("======================================");
}

pub fn log_connection_accepted(service: &str, peer_addr: &SocketAddr) {
    tracing::debug!("[{service}] Accepted connection from {peer_addr}");
}

pub fn log_connection_error(service: &str, err: &impl std::fmt::Debug) {
    tracing::warn!("[{service}] Failed to serve connection: {err:?}");
}

pub fn log_error(message: &str) {
    tracing::error!("{message}");
}

pub fn log_warning(message: &str) {
    tracing::warn!("{message}");
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    tracing::info!(target: ACCESS_TARGET, "{}", entry.format(format));
}

pub fn log_chunk(range_header: Option<&[u8]>, bounds: &ChunkBounds) {
    tracing::debug!(
        "Requested: {}, response: {}",
        range_header.map_or_else(|| "-".into(), String::from_utf8_lossy),
        bounds.content_range()
    );
}

pub fn log_upstream_failure(location: &str, err: &dyn std::error::Error) {
    tracing::error!("Fetch from {location} failed: {err}");
}

pub fn log_shutdown_requested(signal: &str) {
    tracing::info!("{signal} received, shutting down");
}

pub fn log_service_stopped(service: &str) {
    tracing::info!("[{service}] Listener closed");
}
