//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → host.rs (Host pinning on loopback binds)
//!     → origin.rs (Origin/Referer whitelist)
//!     → csrf (token check on mutating methods)
//!     → Pass to handlers
//! Outgoing response:
//!     → headers.rs (CSP and friends)
//! ```
//!
//! # Design Decisions
//! - Defense in depth: each check wraps the next and short-circuits
//! - Fail closed: reject with 403 on any security check failure
//! - Every rejection is logged at error level under the `security` target

pub mod headers;
pub mod host;
pub mod origin;

use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::envelope::encode::forbidden;

pub use headers::{apply_security_headers, CONTENT_SECURITY_POLICY};
pub use host::{host_check_middleware, HostCheck};
pub use origin::{origin_check_middleware, OriginRefererCheck};

/// A request refused by a security check. Always answered with 403.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("Invalid Host")]
    InvalidHost,

    #[error("Invalid URL in Origin or Referer header")]
    InvalidOriginUrl,

    #[error("Invalid Origin or Referer")]
    InvalidOrigin,
}

impl Rejection {
    /// Metric label.
    pub fn kind(&self) -> &'static str {
        match self {
            Rejection::InvalidHost => "host",
            Rejection::InvalidOriginUrl => "origin_url",
            Rejection::InvalidOrigin => "origin",
        }
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        forbidden(&self.to_string())
    }
}

/// Misconfiguration detected while building the security layers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SecurityConfigError {
    #[error("loopback address {address} has no port; cannot build the Host whitelist")]
    LoopbackWithoutPort { address: String },

    #[error("invalid address {address}")]
    InvalidAddress { address: String },
}
