//! Origin/Referer validation against cross-site requests.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::HashSet;
use std::sync::Arc;
use url::Url;

use crate::observability::metrics;
use crate::security::Rejection;

/// Validates `Origin` (falling back to `Referer`) against a host whitelist.
#[derive(Debug, Clone)]
pub struct OriginRefererCheck {
    whitelist: HashSet<String>,
}

impl OriginRefererCheck {
    /// `host` is the server's own `host:port`; `whitelist` adds extra entries.
    ///
    /// Entries compare against the URL's `host[:port]`, lowercased. A
    /// scheme's default port matches both with and without the port, so
    /// `wallet.local` and `wallet.local:80` both accept
    /// `Origin: http://wallet.local:80`.
    pub fn new(host: &str, whitelist: &[String]) -> Self {
        let mut allowed = HashSet::with_capacity(whitelist.len() + 1);
        allowed.insert(host.to_lowercase());
        allowed.extend(whitelist.iter().map(|h| h.to_lowercase()));
        Self { whitelist: allowed }
    }

    /// Check the request headers.
    ///
    /// Requests carrying neither header pass; curl-class clients never set
    /// them and browsers always do on cross-origin writes.
    pub fn check(&self, headers: &HeaderMap) -> Result<(), Rejection> {
        let origin = header_str(headers, header::ORIGIN)?;
        let to_check = if origin.is_empty() {
            header_str(headers, header::REFERER)?
        } else {
            origin
        };

        if to_check.is_empty() {
            return Ok(());
        }

        let url = Url::parse(to_check).map_err(|e| {
            tracing::error!(
                target: "security",
                value = %to_check,
                error = %e,
                "Unparsable Origin or Referer"
            );
            Rejection::InvalidOriginUrl
        })?;

        let host = url_host(&url);
        let with_default_port = url
            .port_or_known_default()
            .filter(|_| url.port().is_none())
            .map(|port| format!("{host}:{port}"));

        if self.whitelist.contains(&host)
            || with_default_port.is_some_and(|h| self.whitelist.contains(&h))
        {
            Ok(())
        } else {
            tracing::error!(
                target: "security",
                origin_host = %host,
                "Rejected cross-origin request"
            );
            Err(Rejection::InvalidOrigin)
        }
    }
}

/// Middleware enforcing [`OriginRefererCheck`].
pub async fn origin_check_middleware(
    State(check): State<Arc<OriginRefererCheck>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    match check.check(req.headers()) {
        Ok(()) => next.run(req).await,
        Err(rejection) => {
            metrics::record_security_rejection(rejection.kind());
            rejection.into_response()
        }
    }
}

/// Trimmed header text, empty when absent. A present value that is not
/// visible ASCII cannot be a URL and is rejected.
fn header_str(headers: &HeaderMap, name: header::HeaderName) -> Result<&str, Rejection> {
    match headers.get(&name) {
        None => Ok(""),
        Some(value) => value.to_str().map(str::trim).map_err(|_| {
            tracing::error!(
                target: "security",
                header = %name,
                value = ?value,
                "Unreadable Origin or Referer"
            );
            Rejection::InvalidOriginUrl
        }),
    }
}

/// `host[:port]` of a URL, lowercased.
fn url_host(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default().to_lowercase();
    match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(header::HeaderName, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(name.clone(), HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn test_same_origin_allowed() {
        let check = OriginRefererCheck::new("127.0.0.1:6420", &[]);
        let h = headers(&[(header::ORIGIN, "http://127.0.0.1:6420")]);
        assert!(check.check(&h).is_ok());
    }

    #[test]
    fn test_foreign_origin_rejected() {
        let check = OriginRefererCheck::new("127.0.0.1:6420", &[]);
        let h = headers(&[(header::ORIGIN, "http://attacker.example")]);
        assert_eq!(check.check(&h), Err(Rejection::InvalidOrigin));
    }

    #[test]
    fn test_no_headers_allowed() {
        let check = OriginRefererCheck::new("127.0.0.1:6420", &[]);
        assert!(check.check(&HeaderMap::new()).is_ok());
    }

    #[test]
    fn test_referer_fallback() {
        let check = OriginRefererCheck::new("127.0.0.1:6420", &[]);

        let h = headers(&[(header::REFERER, "http://127.0.0.1:6420/wallet/new")]);
        assert!(check.check(&h).is_ok());

        let h = headers(&[(header::REFERER, "https://attacker.example/page")]);
        assert_eq!(check.check(&h), Err(Rejection::InvalidOrigin));
    }

    #[test]
    fn test_origin_takes_precedence_over_referer() {
        let check = OriginRefererCheck::new("127.0.0.1:6420", &[]);
        let h = headers(&[
            (header::ORIGIN, "http://attacker.example"),
            (header::REFERER, "http://127.0.0.1:6420/"),
        ]);
        assert_eq!(check.check(&h), Err(Rejection::InvalidOrigin));
    }

    #[test]
    fn test_unparsable_origin() {
        let check = OriginRefererCheck::new("127.0.0.1:6420", &[]);
        let h = headers(&[(header::ORIGIN, "::not a url::")]);
        assert_eq!(check.check(&h), Err(Rejection::InvalidOriginUrl));
    }

    #[test]
    fn test_unreadable_origin_rejected() {
        let check = OriginRefererCheck::new("127.0.0.1:6420", &[]);

        let mut h = HeaderMap::new();
        h.insert(
            header::ORIGIN,
            HeaderValue::from_bytes(b"http://attacker\xff.example").unwrap(),
        );
        assert_eq!(check.check(&h), Err(Rejection::InvalidOriginUrl));

        let mut h = HeaderMap::new();
        h.insert(
            header::REFERER,
            HeaderValue::from_bytes(b"http://127.0.0.1:6420/\xfe").unwrap(),
        );
        assert_eq!(check.check(&h), Err(Rejection::InvalidOriginUrl));
    }

    #[test]
    fn test_default_port_matches_either_form() {
        let check = OriginRefererCheck::new(
            "127.0.0.1:6420",
            &["wallet.local:80".to_string(), "secure.local".to_string()],
        );

        let h = headers(&[(header::ORIGIN, "http://wallet.local:80")]);
        assert!(check.check(&h).is_ok());
        let h = headers(&[(header::ORIGIN, "http://wallet.local")]);
        assert!(check.check(&h).is_ok());
        let h = headers(&[(header::ORIGIN, "https://secure.local:443")]);
        assert!(check.check(&h).is_ok());

        // a default port for another scheme is still a different origin
        let h = headers(&[(header::ORIGIN, "https://wallet.local")]);
        assert_eq!(check.check(&h), Err(Rejection::InvalidOrigin));
    }

    #[test]
    fn test_whitelisted_origin() {
        let check = OriginRefererCheck::new("127.0.0.1:6420", &["wallet.local:8000".to_string()]);
        let h = headers(&[(header::ORIGIN, "http://wallet.local:8000")]);
        assert!(check.check(&h).is_ok());
    }
}
