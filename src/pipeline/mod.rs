//! Request pipeline module
//!
//! Runs every request through a fixed middleware order: fault wrapper
//! (production only), static file lookup, routing, authorization, then
//! endpoint dispatch.

pub mod auth;
pub mod router;
pub mod static_files;

pub use router::{handle_request, RequestContext};

use thiserror::Error;

/// A fault escaping endpoint dispatch. Outside development mode it is never
/// shown to the client; the fault wrapper answers with a redirect to the
/// error page instead.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Render(#[from] crate::pages::RenderError),
}
