//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → whitelists and token store built once at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no hot reload because the
//!   security whitelists must not change under a running server
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::ApiConfig;
pub use schema::ClientConfig;
pub use schema::CsrfConfig;
pub use schema::GatewayConfig;
pub use schema::ListenerConfig;
pub use schema::ObservabilityConfig;
pub use schema::SecurityConfig;
pub use schema::TimeoutConfig;
