//! Host header pinning against DNS rebinding.
//!
//! # Responsibilities
//! - Decide once, at construction, whether the bound address is loopback
//! - Build the implicit `127.0.0.1:<port>` / `localhost:<port>` whitelist
//! - Reject requests whose `Host` is not whitelisted with 403
//!
//! # Design Decisions
//! - Public binds make the check a no-op
//! - An absent Host header is treated as a non-browser client
//! - Host comparison is case-insensitive

use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::HashSet;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use crate::observability::metrics;
use crate::security::{Rejection, SecurityConfigError};

/// Validates the `Host` header of incoming requests.
#[derive(Debug, Clone)]
pub struct HostCheck {
    configured_host: String,
    is_loopback: bool,
    whitelist: HashSet<String>,
}

impl HostCheck {
    /// Build the check for the server's bound address.
    ///
    /// Fails when the address is loopback but carries no usable port.
    pub fn new(bound: &str, whitelist: &[String]) -> Result<Self, SecurityConfigError> {
        let (host, port) = split_host_port(bound)?;
        let is_loopback = is_loopback_host(&host);

        let mut allowed = HashSet::with_capacity(whitelist.len() + 2);
        if is_loopback {
            let port = port.ok_or_else(|| SecurityConfigError::LoopbackWithoutPort {
                address: bound.to_string(),
            })?;
            allowed.insert(format!("127.0.0.1:{port}"));
            allowed.insert(format!("localhost:{port}"));
        }
        allowed.extend(whitelist.iter().map(|h| h.to_lowercase()));

        Ok(Self {
            configured_host: bound.to_string(),
            is_loopback,
            whitelist: allowed,
        })
    }

    /// Whether Host pinning is active.
    pub fn is_active(&self) -> bool {
        self.is_loopback
    }

    /// Check the textual Host value of a request.
    pub fn check(&self, host: Option<&str>) -> Result<(), Rejection> {
        if !self.is_loopback {
            return Ok(());
        }

        match host {
            None | Some("") => Ok(()),
            Some(h) if self.whitelist.contains(&h.to_lowercase()) => Ok(()),
            Some(h) => {
                tracing::error!(
                    target: "security",
                    configured_host = %self.configured_host,
                    header_host = %h,
                    "Detected DNS rebind attempt"
                );
                Err(Rejection::InvalidHost)
            }
        }
    }
}

/// Middleware enforcing [`HostCheck`].
pub async fn host_check_middleware(
    State(check): State<Arc<HostCheck>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    match check.check(request_host(&req).as_deref()) {
        Ok(()) => next.run(req).await,
        Err(rejection) => {
            metrics::record_security_rejection(rejection.kind());
            rejection.into_response()
        }
    }
}

/// The `Host` header, or the URI authority for HTTP/2 (`:authority`).
///
/// A header that is not visible ASCII is kept lossily so it still counts
/// as present; it can never equal a whitelist entry.
fn request_host<B>(req: &Request<B>) -> Option<String> {
    match req.headers().get(header::HOST) {
        Some(value) => Some(String::from_utf8_lossy(value.as_bytes()).into_owned()),
        None => req.uri().authority().map(|a| a.as_str().to_owned()),
    }
}

/// Split `host[:port]`, accepting bracketed IPv6.
///
/// A zero port counts as no port.
fn split_host_port(addr: &str) -> Result<(String, Option<u16>), SecurityConfigError> {
    if let Ok(sa) = addr.parse::<SocketAddr>() {
        let port = Some(sa.port()).filter(|p| *p != 0);
        return Ok((sa.ip().to_string(), port));
    }
    if let Ok(ip) = addr.parse::<IpAddr>() {
        return Ok((ip.to_string(), None));
    }

    match addr.rsplit_once(':') {
        Some((host, port)) => {
            let port: u16 = port.parse().map_err(|_| SecurityConfigError::InvalidAddress {
                address: addr.to_string(),
            })?;
            Ok((host.to_string(), Some(port).filter(|p| *p != 0)))
        }
        None if addr.is_empty() => Err(SecurityConfigError::InvalidAddress {
            address: addr.to_string(),
        }),
        None => Ok((addr.to_string(), None)),
    }
}

fn is_loopback_host(host: &str) -> bool {
    host.eq_ignore_ascii_case("localhost")
        || host
            .trim_start_matches('[')
            .trim_end_matches(']')
            .parse::<IpAddr>()
            .map(|ip| ip.is_loopback())
            .unwrap_or(false)
}
