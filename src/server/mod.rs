// Server module entry
// Runs the proxy and origin listeners side by side under one supervisor

pub mod connection;
pub mod listener;
pub mod signal;

// Rust 不允许 loop 作为模块名（关键字），改用 server_loop
#[path = "loop.rs"]
pub mod server_loop;

use std::io;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::Notify;
use tokio::task::{JoinError, JoinHandle};

use crate::config::AppState;
use crate::error::ServiceError;
use crate::logger;

pub use listener::bind_listener;
pub use server_loop::run_accept_loop;

/// The two services sharing the process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceKind {
    /// Index page and video chunks
    Proxy,
    /// Whole-file content origin
    Origin,
}

impl ServiceKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Proxy => "proxy",
            Self::Origin => "origin",
        }
    }

    /// `performance.max_connections` applies to client-facing traffic only
    pub const fn checks_connection_limit(self) -> bool {
        matches!(self, Self::Proxy)
    }
}

/// Run both services until one of them stops or `shutdown` is notified.
///
/// A service that stops for any reason takes the other one down with it and
/// the error is returned. Must be called inside a `LocalSet`.
pub async fn run_services(
    proxy_listener: TcpListener,
    origin_listener: TcpListener,
    state: Arc<AppState>,
    shutdown: Arc<Notify>,
) -> Result<(), ServiceError> {
    let mut proxy = spawn_service(proxy_listener, &state, ServiceKind::Proxy);
    let mut origin = spawn_service(origin_listener, &state, ServiceKind::Origin);

    let result = tokio::select! {
        res = &mut proxy => service_outcome(ServiceKind::Proxy, res),
        res = &mut origin => service_outcome(ServiceKind::Origin, res),
        () = shutdown.notified() => Ok(()),
    };

    proxy.abort();
    origin.abort();
    logger::log_service_stopped(ServiceKind::Proxy.label());
    logger::log_service_stopped(ServiceKind::Origin.label());

    result
}

fn spawn_service(
    listener: TcpListener,
    state: &Arc<AppState>,
    kind: ServiceKind,
) -> JoinHandle<io::Result<()>> {
    tokio::task::spawn_local(run_accept_loop(
        listener,
        Arc::clone(state),
        Arc::new(AtomicUsize::new(0)),
        kind,
    ))
}

/// Every way an accept loop can end is fatal
fn service_outcome(
    kind: ServiceKind,
    res: Result<io::Result<()>, JoinError>,
) -> Result<(), ServiceError> {
    let service = kind.label();
    match res {
        Ok(Ok(())) => Err(ServiceError::Exited { service }),
        Ok(Err(source)) => Err(ServiceError::Listener { service, source }),
        Err(e) if e.is_panic() => Err(ServiceError::Panicked { service }),
        Err(_) => Err(ServiceError::Exited { service }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, FetchMode};
    use http_body_util::{BodyExt, Empty};
    use hyper::body::Bytes;
    use hyper::{Request, Response};
    use hyper_util::client::legacy::Client;
    use hyper_util::rt::TokioExecutor;
    use std::net::SocketAddr;
    use tokio::task::LocalSet;

    const VIDEO_LEN: usize = 300_000;

    fn video_bytes() -> Vec<u8> {
        #[allow(clippy::cast_possible_truncation)]
        let bytes = (0..VIDEO_LEN).map(|i| (i % 253) as u8).collect();
        bytes
    }

    struct Running {
        proxy_addr: SocketAddr,
        shutdown: Arc<Notify>,
        handle: JoinHandle<Result<(), ServiceError>>,
        _dir: tempfile::TempDir,
    }

    /// Start both services on ephemeral ports; `origin_url` defaults to the origin just bound
    fn start(fetch_mode: FetchMode, origin_url: Option<String>) -> Running {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("video.mp4");
        std::fs::write(&video, video_bytes()).unwrap();

        let proxy_listener = bind_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let origin_listener = bind_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let proxy_addr = proxy_listener.local_addr().unwrap();
        let origin_addr = origin_listener.local_addr().unwrap();

        let mut cfg = Config::load_from("/nonexistent/video-chunk-server").unwrap();
        cfg.origin.file = video.to_string_lossy().into_owned();
        cfg.proxy.fetch_mode = fetch_mode;
        cfg.proxy.origin_url =
            origin_url.unwrap_or_else(|| format!("http://{origin_addr}/video"));
        cfg.logging.access_log = false;

        let state = Arc::new(AppState::new(cfg).unwrap());
        let shutdown = Arc::new(Notify::new());
        let handle = tokio::task::spawn_local(run_services(
            proxy_listener,
            origin_listener,
            state,
            Arc::clone(&shutdown),
        ));

        Running {
            proxy_addr,
            shutdown,
            handle,
            _dir: dir,
        }
    }

    async fn get(addr: SocketAddr, path: &str, range: Option<&str>) -> (Response<()>, Bytes) {
        let client = Client::builder(TokioExecutor::new()).build_http::<Empty<Bytes>>();
        let mut builder = Request::get(format!("http://{addr}{path}"));
        if let Some(range) = range {
            builder = builder.header("Range", range);
        }
        let response = client.request(builder.body(Empty::new()).unwrap()).await.unwrap();
        let (parts, body) = response.into_parts();
        let body = body.collect().await.unwrap().to_bytes();
        (Response::from_parts(parts, ()), body)
    }

    #[tokio::test]
    async fn test_chunks_through_both_services() {
        LocalSet::new()
            .run_until(async {
                let running = start(FetchMode::Range, None);
                let video = video_bytes();

                let (response, body) = get(running.proxy_addr, "/video", None).await;
                assert_eq!(response.status(), 206);
                assert_eq!(response.headers()["content-range"], "bytes 0-102400/300000");
                assert_eq!(response.headers()["content-length"], "102400");
                assert_eq!(&body[..], &video[..102_400]);

                let (response, body) =
                    get(running.proxy_addr, "/video", Some("bytes=200000-")).await;
                assert_eq!(response.status(), 206);
                assert_eq!(response.headers()["content-range"], "bytes 200000-300000/300000");
                assert_eq!(&body[..], &video[200_000..]);

                let (response, body) =
                    get(running.proxy_addr, "/video", Some("bytes=400000-")).await;
                assert_eq!(response.status(), 206);
                assert_eq!(response.headers()["content-range"], "bytes 400000-300000/300000");
                assert!(body.is_empty());

                let (response, _) = get(running.proxy_addr, "/", None).await;
                assert_eq!(response.status(), 200);

                running.shutdown.notify_one();
                assert!(running.handle.await.unwrap().is_ok());
            })
            .await;
    }

    #[tokio::test]
    async fn test_full_fetch_mode_matches_range_mode() {
        LocalSet::new()
            .run_until(async {
                let running = start(FetchMode::Full, None);
                let video = video_bytes();

                let (response, body) =
                    get(running.proxy_addr, "/video", Some("bytes=1000-")).await;
                assert_eq!(response.status(), 206);
                assert_eq!(response.headers()["content-range"], "bytes 1000-300000/300000");
                assert_eq!(&body[..], &video[1000..]);

                let (_, again) = get(running.proxy_addr, "/video", Some("bytes=1000-")).await;
                assert_eq!(body, again);

                running.shutdown.notify_one();
                assert!(running.handle.await.unwrap().is_ok());
            })
            .await;
    }

    #[tokio::test]
    async fn test_unreachable_origin() {
        LocalSet::new()
            .run_until(async {
                let closed = bind_listener("127.0.0.1:0".parse().unwrap()).unwrap();
                let closed_addr = closed.local_addr().unwrap();
                drop(closed);

                let running = start(FetchMode::Range, Some(format!("http://{closed_addr}/video")));

                let (response, body) = get(running.proxy_addr, "/video", Some("bytes=0-")).await;
                assert_eq!(response.status(), 502);
                assert!(response.headers().get("content-range").is_none());
                assert_eq!(&body[..], b"502 Bad Gateway");

                running.shutdown.notify_one();
                assert!(running.handle.await.unwrap().is_ok());
            })
            .await;
    }

    #[test]
    fn test_any_service_exit_is_fatal() {
        assert!(matches!(
            service_outcome(ServiceKind::Origin, Ok(Ok(()))),
            Err(ServiceError::Exited { service: "origin" })
        ));
        assert!(matches!(
            service_outcome(
                ServiceKind::Proxy,
                Ok(Err(io::Error::from(io::ErrorKind::InvalidInput)))
            ),
            Err(ServiceError::Listener { service: "proxy", .. })
        ));
    }
}
