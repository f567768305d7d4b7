//! Logger module
//!
//! Server lifecycle logging, access logging in several formats, and
//! error/warning logging with optional file targets.

mod format;
pub mod writer;

pub use format::AccessLogEntry;

use crate::config::Config;
use std::net::SocketAddr;

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    writer::init(
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )
}

/// Write to info/access log
fn write_info(message: &str) {
    match writer::get() {
        Some(w) => w.write_info(message),
        None => println!("{message}"),
    }
}

/// Write to error log
fn write_error(message: &str) {
    match writer::get() {
        Some(w) => w.write_error(message),
        None => eprintln!("{message}"),
    }
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    write_info("======================================");
    write_info("Page server started successfully");
    write_info(&format!("Listening on: http://{addr}"));
    write_info(&format!("Runtime mode: {:?}", config.runtime.mode));
    write_info(&format!("Log level: {}", config.logging.level));
    write_info(&format!("Static root: {}", config.static_files.root));
    write_info(&format!("Template dir: {}", config.pages.template_dir));
    if config.health.enabled {
        write_info(&format!("Health endpoint: {}", config.health.path));
    }
    if let Some(workers) = config.server.workers {
        write_info(&format!("Worker threads: {workers}"));
    }
    if let Some(ref path) = config.logging.access_log_file {
        write_info(&format!("Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        write_info(&format!("Error log: {path}"));
    }
    write_info("======================================\n");
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    write_info(&format!("[Connection] Accepted from: {peer_addr}"));
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    write_error(&format!("[ERROR] Failed to serve connection: {err:?}"));
}

pub fn log_error(message: &str) {
    write_error(&format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    write_error(&format!("[WARN] {message}"));
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    write_info(&entry.format(format));
}

pub fn log_shutdown_started() {
    write_info("\n[Shutdown] Stopping accept loop, draining in-flight requests");
}

pub fn log_shutdown_complete() {
    write_info("[Shutdown] All connections finished, exiting");
}

pub fn log_shutdown_timeout(remaining: usize) {
    write_error(&format!(
        "[WARN] Shutdown grace period elapsed with {remaining} connection(s) still active"
    ));
}
