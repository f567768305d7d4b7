//! HTTP protocol layer module
//!
//! Protocol-level building blocks shared by every pipeline step: MIME
//! detection, ETag handling, and response builders. Carries no routing or
//! page logic.

pub mod cache;
pub mod mime;
pub mod response;

// Re-export commonly used builders
pub use response::{
    build_304_response, build_403_response, build_404_response, build_405_response,
    build_413_response, build_diagnostic_response, build_json_response, build_options_response,
    build_redirect_response,
};
