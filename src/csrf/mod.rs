//! Anti-forgery tokens.
//!
//! # Data Flow
//! ```text
//! GET /api/v1/csrf
//!     → store.rs issues a token (or 404 when disabled)
//! POST/PUT/PATCH/DELETE with X-CSRF-Token
//!     → middleware.rs asks store.rs to consume it
//!     → Accepted: pass to handler
//!     → Rejected: 403, logged under the `security` target
//! ```
//!
//! # Design Decisions
//! - Tokens are single-use; a consumed token is indistinguishable from a
//!   forged one
//! - No background sweeper; expiry is checked when a token is presented,
//!   and issuance sweeps expired tokens once the set has doubled
//! - Disabled mode accepts every request, header or not

pub mod middleware;
pub mod store;
pub mod token;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use middleware::{csrf_middleware, is_safe_method, issue_token};
pub use store::TokenStore;
pub use token::{CsrfToken, TokenIssue, MAX_TOKEN_TTL};

/// Header carrying the token on mutating requests.
pub const CSRF_HEADER: &str = "X-CSRF-Token";

/// Body of a successful `GET /api/v1/csrf`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CsrfTokenResponse {
    pub csrf_token: String,
}

/// Result of presenting a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsrfValidation {
    Accepted,
    Rejected(CsrfRejection),
}

impl CsrfValidation {
    /// Metric label.
    pub fn label(&self) -> &'static str {
        match self {
            CsrfValidation::Accepted => "accepted",
            CsrfValidation::Rejected(CsrfRejection::Invalid) => "invalid",
            CsrfValidation::Rejected(CsrfRejection::Expired) => "expired",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CsrfRejection {
    /// Unknown, already used, or missing.
    #[error("invalid CSRF token")]
    Invalid,

    #[error("expired CSRF token")]
    Expired,
}
