// Application state module
// Immutable configuration plus the shared runtime state handed to every task

use std::sync::atomic::AtomicBool;

use super::types::Config;
use crate::health::HealthState;

/// Application state shared across connections
pub struct AppState {
    pub config: Config,
    pub health: HealthState,

    // Cached so the hot path never re-reads config
    pub cached_access_log: AtomicBool,
}

impl AppState {
    #[must_use]
    pub fn new(config: Config) -> Self {
        let cached_access_log = AtomicBool::new(config.logging.access_log);
        Self {
            config,
            health: HealthState::new(),
            cached_access_log,
        }
    }
}
