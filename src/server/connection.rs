// Connection handling module
// Accepts a single TCP connection and serves it with the router of its service

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use http_body_util::Full;
use hyper::body::{Body, Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::{TokioIo, TokioTimer};

use super::ServiceKind;
use crate::config::AppState;
use crate::handler;
use crate::logger::{self, AccessLogEntry};

/// Accept and process a connection, checking limits and logging.
///
/// # Arguments
///
/// * `stream` - The TCP stream to handle
/// * `peer_addr` - The peer's socket address
/// * `state` - Shared application state
/// * `conn_counter` - Active connection counter of this service
/// * `kind` - Which service accepted the connection
pub fn accept_connection(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    state: &Arc<AppState>,
    conn_counter: &Arc<AtomicUsize>,
    kind: ServiceKind,
) {
    // Increment counter first, then check limit (prevents race condition)
    let prev_count = conn_counter.fetch_add(1, Ordering::SeqCst);

    if kind.checks_connection_limit() {
        if let Some(max_conn) = state.config.performance.max_connections {
            if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
                // Exceeded limit: rollback counter and reject
                conn_counter.fetch_sub(1, Ordering::SeqCst);
                logger::log_warning(&format!(
                    "[{}] Max connections reached: {prev_count}/{max_conn}. Connection rejected.",
                    kind.label()
                ));
                drop(stream);
                return;
            }
        }
    }

    if let Err(e) = stream.set_nodelay(true) {
        logger::log_warning(&format!("[{}] Failed to set TCP_NODELAY: {e}", kind.label()));
    }
    logger::log_connection_accepted(kind.label(), &peer_addr);

    handle_connection(
        stream,
        peer_addr,
        Arc::clone(state),
        Arc::clone(conn_counter),
        kind,
    );
}

/// Serve one connection in a local task.
///
/// HTTP/1.1 keep-alive follows `performance.keep_alive_timeout`; a client that
/// does not finish sending headers within `performance.read_timeout` seconds
/// is dropped. The counter is decremented when the connection ends.
fn handle_connection(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
    conn_counter: Arc<AtomicUsize>,
    kind: ServiceKind,
) {
    tokio::task::spawn_local(async move {
        let io = TokioIo::new(stream);

        let performance = &state.config.performance;
        let mut builder = http1::Builder::new();
        builder
            .timer(TokioTimer::new())
            .keep_alive(performance.keep_alive_timeout > 0);
        if performance.read_timeout > 0 {
            builder.header_read_timeout(Duration::from_secs(performance.read_timeout));
        }

        let service_state = Arc::clone(&state);
        let conn = builder.serve_connection(
            io,
            service_fn(move |req| {
                let state = Arc::clone(&service_state);
                async move { Ok::<_, Infallible>(dispatch(req, state, kind, peer_addr).await) }
            }),
        );

        if let Err(err) = conn.await {
            logger::log_connection_error(kind.label(), &err);
        }

        conn_counter.fetch_sub(1, Ordering::SeqCst);
    });
}

/// Route a request to its service and write the access log line
async fn dispatch(
    req: Request<Incoming>,
    state: Arc<AppState>,
    kind: ServiceKind,
    peer_addr: SocketAddr,
) -> Response<Full<Bytes>> {
    let started = Instant::now();
    let entry = state
        .config
        .logging
        .access_log
        .then(|| access_entry(&req, kind, peer_addr));

    let response = match kind {
        ServiceKind::Proxy => handler::proxy::handle_request(req, Arc::clone(&state)).await,
        ServiceKind::Origin => handler::origin::handle_request(req, Arc::clone(&state)).await,
    };

    if let Some(mut entry) = entry {
        entry.status = response.status().as_u16();
        entry.body_bytes = response.body().size_hint().exact().unwrap_or(0);
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    response
}

fn access_entry(req: &Request<Incoming>, kind: ServiceKind, peer_addr: SocketAddr) -> AccessLogEntry {
    let header = |name: &str| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string)
    };

    let mut entry = AccessLogEntry::new(
        kind.label(),
        peer_addr.ip().to_string(),
        req.method().to_string(),
        req.uri().path().to_string(),
    );
    entry.query = req.uri().query().map(ToString::to_string);
    entry.http_version = format!("{:?}", req.version())
        .trim_start_matches("HTTP/")
        .to_string();
    entry.range = header("range");
    entry.referer = header("referer");
    entry.user_agent = header("user-agent");
    entry
}
