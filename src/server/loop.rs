// Accept loop module
// Accepts connections until shutdown, then drains in-flight requests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::Notify;

use crate::config::AppState;
use crate::logger;
use crate::server::connection::accept_connection;

/// How long in-flight requests get to finish after shutdown is requested
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Run the accept loop until the shutdown signal fires.
///
/// Shutdown is cooperative: the listener stops accepting, the health
/// endpoint flips to unhealthy, and in-flight connections get a bounded
/// grace period to complete.
pub async fn run(listener: TcpListener, state: Arc<AppState>, shutdown: Arc<Notify>) {
    let active_connections = Arc::new(AtomicUsize::new(0));

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state, &active_connections);
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            () = shutdown.notified() => {
                break;
            }
        }
    }

    logger::log_shutdown_started();
    state.health.begin_shutdown();
    drop(listener);

    drain_connections(&active_connections, SHUTDOWN_GRACE).await;
}

/// Wait for the active connection count to reach zero, bounded by `grace`
async fn drain_connections(active: &AtomicUsize, grace: Duration) {
    let deadline = tokio::time::Instant::now() + grace;

    loop {
        let remaining = active.load(Ordering::SeqCst);
        if remaining == 0 {
            logger::log_shutdown_complete();
            return;
        }
        if tokio::time::Instant::now() >= deadline {
            logger::log_shutdown_timeout(remaining);
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn drain_returns_immediately_when_idle() {
        let active = AtomicUsize::new(0);
        drain_connections(&active, Duration::from_secs(5)).await;
    }

    #[tokio::test]
    async fn drain_gives_up_after_grace_period() {
        let active = AtomicUsize::new(3);
        // Zero grace: must return instead of waiting on the stuck counter
        drain_connections(&active, Duration::ZERO).await;
        assert_eq!(active.load(Ordering::SeqCst), 3);
    }
}
