//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber for the binaries
//! - Configure log level from config, overridable by `RUST_LOG`
//!
//! # Design Decisions
//! - Library code only emits events; the subscriber is installed by the
//!   process entry point and nowhere else
//! - JSON format for production, human format for development
//! - Security rejections use the `security` target at error level

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Build the filter: `RUST_LOG` wins, otherwise the configured level for
/// this crate plus tower_http.
pub fn env_filter(config: &ObservabilityConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "node_gateway={level},tower_http={level},security=warn",
            level = config.log_level
        ))
    })
}

/// Install the global subscriber. Call once from `main`.
pub fn init_logging(config: &ObservabilityConfig) {
    let registry = tracing_subscriber::registry().with(env_filter(config));

    if config.json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
