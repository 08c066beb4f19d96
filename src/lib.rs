//! Node gateway library.
//!
//! HTTP API layer for a blockchain node: single-use CSRF tokens, Host and
//! Origin checks against DNS rebinding and cross-site requests, and two
//! generations of response encoding with a matching client.

pub mod client;
pub mod config;
pub mod csrf;
pub mod envelope;
pub mod gateway;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use client::{ClientError, ProtocolClient};
pub use config::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
