// Server loop module
// Accept loop shared by the proxy and the origin

use std::io;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use super::connection::accept_connection;
use super::ServiceKind;
use crate::config::AppState;
use crate::logger;

/// Pause after running out of file descriptors, so the loop does not spin
const FD_EXHAUSTED_BACKOFF: Duration = Duration::from_millis(50);

/// Accept connections until the listener fails.
///
/// Errors caused by a single client (reset, aborted handshake) or by a
/// temporary lack of file descriptors are logged and skipped. Any other accept
/// error means the listener itself is broken and is returned.
pub async fn run_accept_loop(
    listener: TcpListener,
    state: Arc<AppState>,
    active_connections: Arc<AtomicUsize>,
    kind: ServiceKind,
) -> io::Result<()> {
    loop {
        match listener.accept().await {
            Ok((stream, peer_addr)) => {
                accept_connection(stream, peer_addr, &state, &active_connections, kind);
            }
            Err(e) if is_fd_exhausted(&e) => {
                logger::log_warning(&format!(
                    "[{}] Failed to accept connection: {e}",
                    kind.label()
                ));
                tokio::time::sleep(FD_EXHAUSTED_BACKOFF).await;
            }
            Err(e) if is_per_connection(&e) => {
                logger::log_warning(&format!(
                    "[{}] Failed to accept connection: {e}",
                    kind.label()
                ));
            }
            Err(e) => {
                logger::log_error(&format!("[{}] Listener failed: {e}", kind.label()));
                return Err(e);
            }
        }
    }
}

fn is_per_connection(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionRefused
            | io::ErrorKind::Interrupted
            | io::ErrorKind::WouldBlock
            | io::ErrorKind::TimedOut
    )
}

/// EMFILE / ENFILE
fn is_fd_exhausted(e: &io::Error) -> bool {
    matches!(e.raw_os_error(), Some(23 | 24))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let reset = io::Error::from(io::ErrorKind::ConnectionReset);
        assert!(is_per_connection(&reset));
        assert!(!is_fd_exhausted(&reset));

        let emfile = io::Error::from_raw_os_error(24);
        assert!(is_fd_exhausted(&emfile));

        let broken = io::Error::from(io::ErrorKind::InvalidInput);
        assert!(!is_per_connection(&broken));
        assert!(!is_fd_exhausted(&broken));
    }
}
