//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with every endpoint
//! - Wire up middleware (request ID, tracing, Host/Origin checks,
//!   security headers, timeout, body limit, CSRF)
//! - Bind the server to a listener and stop on the shutdown signal
//!
//! # Data Flow
//! ```text
//! request
//!     → request ID + trace span
//!     → security headers (applied to every response, rejections included)
//!     → Host check → Origin/Referer check
//!     → metrics → timeout → body limit
//!     → CSRF check (mutating methods only)
//!     → handler
//! ```

use axum::{
    body::Body,
    extract::FromRef,
    http::Request,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{ApiConfig, GatewayConfig};
use crate::csrf::{csrf_middleware, issue_token, TokenStore};
use crate::gateway::Backend;
use crate::http::handlers;
use crate::http::request::{request_id, UuidRequestId};
use crate::observability::metrics;
use crate::security::{
    apply_security_headers, host_check_middleware, origin_check_middleware, HostCheck,
    OriginRefererCheck, SecurityConfigError,
};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub backend: Backend,
    pub api: ApiConfig,
    pub csrf: Arc<TokenStore>,
}

impl FromRef<AppState> for Arc<TokenStore> {
    fn from_ref(state: &AppState) -> Self {
        state.csrf.clone()
    }
}

/// HTTP server for the gateway API.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
    tokens: Arc<TokenStore>,
}

impl HttpServer {
    /// Create a new HTTP server.
    ///
    /// `config.listener.bind_address` must be the address actually bound,
    /// since the Host whitelist is derived from it.
    pub fn new(config: GatewayConfig, backend: Backend) -> Result<Self, SecurityConfigError> {
        let tokens = Arc::new(TokenStore::new(config.csrf.enabled, config.csrf.token_ttl()));

        let host_check = Arc::new(HostCheck::new(
            &config.listener.bind_address,
            &config.security.host_whitelist,
        )?);
        let origin_check = Arc::new(OriginRefererCheck::new(
            &config.listener.bind_address,
            &config.security.host_whitelist,
        ));

        if !host_check.is_active() {
            tracing::warn!(
                address = %config.listener.bind_address,
                "Listening on a non-loopback address, Host header checks are off"
            );
        }
        if !tokens.is_enabled() {
            tracing::warn!("CSRF protection is disabled");
        }

        let state = AppState {
            backend,
            api: config.api.clone(),
            csrf: tokens.clone(),
        };

        let router = Self::build_router(&config, state, host_check, origin_check);
        Ok(Self {
            router,
            config,
            tokens,
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(
        config: &GatewayConfig,
        state: AppState,
        host_check: Arc<HostCheck>,
        origin_check: Arc<OriginRefererCheck>,
    ) -> Router {
        let tokens = state.csrf.clone();

        let router = Router::new()
            .route("/api/v1/csrf", get(issue_token))
            .route("/api/v1/version", get(handlers::version))
            .route("/api/v1/injectTransaction", post(handlers::inject_transaction))
            .route("/api/v2/address/verify", post(handlers::verify_address))
            .route("/api/v2/transaction/verify", post(handlers::verify_transaction))
            .fallback(handlers::not_found)
            .with_state(state)
            .layer(middleware::from_fn_with_state(tokens, csrf_middleware))
            .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(middleware::from_fn(track_metrics))
            .layer(middleware::from_fn_with_state(origin_check, origin_check_middleware))
            .layer(middleware::from_fn_with_state(host_check, host_check_middleware));

        apply_security_headers(router, config.security.enable_headers).layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
                .layer(
                    TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                        tracing::info_span!(
                            "request",
                            method = %req.method(),
                            path = %req.uri().path(),
                            request_id = %request_id(req),
                        )
                    }),
                )
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            csrf = self.tokens.is_enabled(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The router, for in-process tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// The token store backing `/api/v1/csrf`.
    pub fn token_store(&self) -> Arc<TokenStore> {
        self.tokens.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

async fn track_metrics(req: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let response = next.run(req).await;
    metrics::record_request(&method, response.status().as_u16(), start);
    response
}
