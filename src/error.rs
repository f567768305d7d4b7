//! Crate-level error types.

use thiserror::Error;

/// Errors that can abort server startup or the accept loop.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("invalid listen address '{addr}': {reason}")]
    Addr { addr: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
