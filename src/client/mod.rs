//! Client side of the gateway protocol.
//!
//! [`ProtocolClient`] handles CSRF token acquisition and both response
//! envelope generations. Errors are classified by [`ClientError`].

pub mod client;
pub mod error;

pub use client::ProtocolClient;
pub use error::{ApiError, ClientError, Result};
