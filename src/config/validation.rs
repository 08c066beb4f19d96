//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Reject a loopback bind without a port (the implicit Host whitelist
//!   cannot be built)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::csrf::MAX_TOKEN_TTL;
use crate::security::host::HostCheck;
use crate::security::SecurityConfigError;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("{field} is invalid: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Validate a parsed configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match HostCheck::new(
        &config.listener.bind_address,
        &config.security.host_whitelist,
    ) {
        Ok(_) => {}
        // Port 0 is resolved when the listener binds
        Err(SecurityConfigError::LoopbackWithoutPort { .. })
            if config.listener.bind_address.ends_with(":0") => {}
        Err(e) => errors.push(ValidationError::Invalid {
            field: "listener.bind_address",
            reason: e.to_string(),
        }),
    }

    if config.csrf.token_ttl_secs == 0 {
        errors.push(ValidationError::Zero {
            field: "csrf.token_ttl_secs",
        });
    } else if config.csrf.token_ttl_secs > MAX_TOKEN_TTL.as_secs() {
        errors.push(ValidationError::Invalid {
            field: "csrf.token_ttl_secs",
            reason: format!("must be at most {} seconds", MAX_TOKEN_TTL.as_secs()),
        });
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero {
            field: "timeouts.request_secs",
        });
    }

    if config.security.max_body_size == 0 {
        errors.push(ValidationError::Zero {
            field: "security.max_body_size",
        });
    }

    if config.client.request_timeout_ms == 0 {
        errors.push(ValidationError::Zero {
            field: "client.request_timeout_ms",
        });
    }

    if let Err(e) = url::Url::parse(&config.client.base_url) {
        errors.push(ValidationError::Invalid {
            field: "client.base_url",
            reason: e.to_string(),
        });
    }

    if config.observability.metrics_enabled {
        if let Err(e) = config.observability.metrics_address.parse::<SocketAddr>() {
            errors.push(ValidationError::Invalid {
                field: "observability.metrics_address",
                reason: e.to_string(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
