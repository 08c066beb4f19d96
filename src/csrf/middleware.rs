//! CSRF enforcement and the token issuance endpoint.

use axum::{
    body::Body,
    extract::State,
    http::{Method, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::csrf::{CsrfTokenResponse, CsrfValidation, TokenIssue, TokenStore, CSRF_HEADER};
use crate::envelope::{forbidden, v1_error, v1_ok};
use crate::observability::metrics;

/// Methods that never change state and therefore skip the token check.
pub fn is_safe_method(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE
    )
}

/// Require a valid single-use token on every mutating request.
pub async fn csrf_middleware(
    State(store): State<Arc<TokenStore>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if is_safe_method(req.method()) {
        return next.run(req).await;
    }

    let presented = req
        .headers()
        .get(CSRF_HEADER)
        .and_then(|v| v.to_str().ok());

    match store.validate(presented) {
        CsrfValidation::Accepted => next.run(req).await,
        CsrfValidation::Rejected(reason) => {
            tracing::error!(
                target: "security",
                method = %req.method(),
                path = %req.uri().path(),
                reason = %reason,
                "CSRF check failed"
            );
            metrics::record_security_rejection("csrf");
            forbidden(&reason.to_string())
        }
    }
}

/// `GET /api/v1/csrf`
///
/// 404 tells clients the mechanism is off and the header can be omitted.
pub async fn issue_token(State(store): State<Arc<TokenStore>>) -> Response {
    match store.issue() {
        TokenIssue::Token(token) => v1_ok(CsrfTokenResponse {
            csrf_token: token.value,
        }),
        TokenIssue::Disabled => v1_error(StatusCode::NOT_FOUND, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        middleware,
        routing::{get, post},
        Router,
    };
    use std::time::Duration;
    use tower::ServiceExt;

    fn app(store: Arc<TokenStore>) -> Router {
        Router::new()
            .route("/api/v1/csrf", get(issue_token))
            .route("/api/v1/write", post(|| async { "written" }))
            .route("/api/v1/read", get(|| async { "read" }))
            .layer(middleware::from_fn_with_state(store.clone(), csrf_middleware))
            .with_state(store)
    }

    async fn fetch_token(app: &Router) -> String {
        let response = app
            .clone()
            .oneshot(Request::get("/api/v1/csrf").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: CsrfTokenResponse = serde_json::from_slice(&bytes).unwrap();
        body.csrf_token
    }

    fn write_request(token: Option<&str>) -> Request<Body> {
        let mut builder = Request::post("/api/v1/write");
        if let Some(token) = token {
            builder = builder.header(CSRF_HEADER, token);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_token_round_trip() {
        let app = app(Arc::new(TokenStore::new(true, Duration::from_secs(30))));
        let token = fetch_token(&app).await;

        let response = app.clone().oneshot(write_request(Some(&token))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // replay
        let response = app.clone().oneshot(write_request(Some(&token))).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_missing_token_forbidden() {
        let app = app(Arc::new(TokenStore::new(true, Duration::from_secs(30))));
        let response = app.oneshot(write_request(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"403 Forbidden - invalid CSRF token");
    }

    #[tokio::test]
    async fn test_safe_methods_skip_check() {
        let app = app(Arc::new(TokenStore::new(true, Duration::from_secs(30))));
        let response = app
            .oneshot(Request::get("/api/v1/read").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_disabled_store() {
        let app = app(Arc::new(TokenStore::disabled()));

        let response = app
            .clone()
            .oneshot(Request::get("/api/v1/csrf").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app.oneshot(write_request(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
