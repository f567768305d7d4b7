//! Health check endpoint
//!
//! Liveness is process-level only: the endpoint reports healthy from the
//! moment the server starts serving until shutdown begins. No downstream
//! dependency checks are performed.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::http;

/// Liveness of the process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    Healthy,
    Unhealthy,
}

/// Shared health state, flipped exactly once when shutdown starts
pub struct HealthState {
    serving: AtomicBool,
}

impl HealthState {
    #[must_use]
    pub fn new() -> Self {
        Self {
            serving: AtomicBool::new(true),
        }
    }

    #[must_use]
    pub fn current(&self) -> Liveness {
        if self.serving.load(Ordering::Relaxed) {
            Liveness::Healthy
        } else {
            Liveness::Unhealthy
        }
    }

    /// Mark the process as draining; health reports unhealthy from here on
    pub fn begin_shutdown(&self) {
        self.serving.store(false, Ordering::Relaxed);
    }
}

impl Default for HealthState {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the liveness response for the current state
pub fn respond(state: &HealthState) -> Response<Full<Bytes>> {
    match state.current() {
        Liveness::Healthy => http::build_json_response(200, &json!({ "status": "ok" })),
        Liveness::Unhealthy => {
            http::build_json_response(503, &json!({ "status": "unavailable" }))
        }
    }
}
