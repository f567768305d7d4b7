// Signal handling module
//
// SIGTERM and SIGINT both trigger cooperative shutdown: stop accepting,
// let in-flight requests finish, then exit.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Signal handler state
pub struct SignalHandler {
    /// Shutdown signal (SIGTERM, SIGINT)
    pub shutdown: Arc<Notify>,
    /// Whether shutdown has been requested
    pub shutdown_requested: Arc<AtomicBool>,
}

impl SignalHandler {
    #[must_use]
    pub fn new() -> Self {
        Self {
            shutdown: Arc::new(Notify::new()),
            shutdown_requested: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl Default for SignalHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Start the shutdown signal listener (Unix)
#[cfg(unix)]
pub fn start_signal_handler(handler: Arc<SignalHandler>) {
    use tokio::signal::unix::{signal, SignalKind};

    tokio::spawn(async move {
        let mut sigterm =
            signal(SignalKind::terminate()).expect("Failed to register SIGTERM handler");
        let mut sigint =
            signal(SignalKind::interrupt()).expect("Failed to register SIGINT handler");

        loop {
            tokio::select! {
                _ = sigterm.recv() => {
                    println!("\n[Signal] SIGTERM received, initiating graceful shutdown");
                }
                _ = sigint.recv() => {
                    println!("\n[Signal] SIGINT received, initiating graceful shutdown");
                }
            }

            // A second signal during the drain aborts immediately
            if handler.shutdown_requested.swap(true, Ordering::SeqCst) {
                println!("[Signal] Repeated shutdown signal, exiting now");
                std::process::exit(1);
            }
            handler.shutdown.notify_waiters();
        }
    });
}

/// Windows fallback - only handles Ctrl+C
#[cfg(not(unix))]
pub fn start_signal_handler(handler: Arc<SignalHandler>) {
    tokio::spawn(async move {
        while let Ok(()) = tokio::signal::ctrl_c().await {
            println!("\n[Signal] Ctrl+C received, initiating graceful shutdown");
            if handler.shutdown_requested.swap(true, Ordering::SeqCst) {
                println!("[Signal] Repeated shutdown signal, exiting now");
                std::process::exit(1);
            }
            handler.shutdown.notify_waiters();
        }
    });
}
