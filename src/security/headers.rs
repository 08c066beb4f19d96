//! Security response headers.
//!
//! # Responsibilities
//! - Pin `Content-Security-Policy` so scripts only load from our own origin
//! - Add `X-Content-Type-Options` and `X-Frame-Options` when enabled

use axum::{
    http::{header, HeaderValue},
    Router,
};
use tower_http::set_header::SetResponseHeaderLayer;

/// Fixed script policy for every response.
pub const CONTENT_SECURITY_POLICY: &str = "script-src 'self' 127.0.0.1";

/// Wrap a router with the security response headers.
pub fn apply_security_headers(router: Router, extra_headers: bool) -> Router {
    let router = router.layer(SetResponseHeaderLayer::overriding(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static(CONTENT_SECURITY_POLICY),
    ));

    if !extra_headers {
        return router;
    }

    router
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
}
