//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Anti-forgery token settings.
    pub csrf: CsrfConfig,

    /// Host/Origin hardening.
    pub security: SecurityConfig,

    /// Endpoint toggles.
    pub api: ApiConfig,

    /// Server-side timeouts.
    pub timeouts: TimeoutConfig,

    /// Outbound client timeouts (used by `gateway-cli`).
    pub client: ClientConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:6420").
    ///
    /// A loopback bind turns on Host header pinning.
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:6420".to_string(),
        }
    }
}

/// CSRF token configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CsrfConfig {
    /// Require a token on every mutating request.
    pub enabled: bool,

    /// Token lifetime in seconds.
    pub token_ttl_secs: u64,
}

impl Default for CsrfConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            token_ttl_secs: 30,
        }
    }
}

impl CsrfConfig {
    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Extra `host:port` values accepted in `Host`, `Origin` and `Referer`.
    pub host_whitelist: Vec<String>,
    /// Enable security response headers.
    pub enable_headers: bool,
    /// Maximum body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            host_whitelist: Vec::new(),
            enable_headers: true,
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Endpoint toggles.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Allow transaction injection. When false the endpoint answers 403.
    pub enable_transaction_inject: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enable_transaction_inject: true,
        }
    }
}

/// Server timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Outbound client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Gateway base URL.
    pub base_url: String,

    /// TCP connect timeout in milliseconds.
    pub dial_timeout_ms: u64,

    /// TLS handshake timeout in milliseconds.
    pub tls_handshake_timeout_ms: u64,

    /// Whole-exchange timeout in milliseconds.
    pub request_timeout_ms: u64,

    /// Optional basic-auth username.
    pub username: Option<String>,

    /// Optional basic-auth password.
    pub password: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:6420".to_string(),
            dial_timeout_ms: 60_000,
            tls_handshake_timeout_ms: 60_000,
            request_timeout_ms: 120_000,
            username: None,
            password: None,
        }
    }
}

impl ClientConfig {
    pub fn dial_timeout(&self) -> Duration {
        Duration::from_millis(self.dial_timeout_ms)
    }

    pub fn tls_handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.tls_handshake_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of the human format.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_toml_uses_defaults() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [csrf]
            enabled = false
            "#,
        )
        .unwrap();

        assert!(!config.csrf.enabled);
        assert_eq!(config.csrf.token_ttl_secs, 30);
        assert_eq!(config.listener.bind_address, "127.0.0.1:6420");
        assert!(config.security.host_whitelist.is_empty());
    }

    #[test]
    fn test_whitelist_parses() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [security]
            host_whitelist = ["wallet.local:6420", "10.0.0.2:6420"]
            "#,
        )
        .unwrap();

        assert_eq!(config.security.host_whitelist.len(), 2);
        assert!(config.security.enable_headers);
    }
}
