//! Client error types.

use axum::http::StatusCode;
use std::fmt;
use thiserror::Error;

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

/// An application-level error reported inside a generation-2 envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// HTTP status of the response.
    pub status: StatusCode,
    /// `error.message` from the envelope.
    pub message: String,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ApiError {}

/// Everything a single exchange can fail with.
#[derive(Debug, Error)]
pub enum ClientError {
    /// No server reached, or the connection broke (DNS, connect, TLS, timeout).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx response whose body is not the expected shape.
    #[error("{status}: {message}")]
    NonEnvelope {
        /// HTTP status code.
        status: StatusCode,
        /// The entire raw body.
        message: String,
    },

    /// 2xx response whose body does not match the expected shape.
    #[error("malformed success response: {0}")]
    MalformedSuccess(#[source] serde_json::Error),

    /// Well-formed envelope carrying an error.
    #[error("{0}")]
    Application(ApiError),

    /// Envelope `data` did not match the target type.
    #[error("failed to decode response data: {0}")]
    Decode(#[source] serde_json::Error),

    /// Error envelope whose `data` did not match the target type.
    #[error("{error} (response data unreadable: {source})")]
    ApplicationWithBadData {
        /// The application error from the envelope.
        error: ApiError,
        /// Why `data` failed to decode.
        #[source]
        source: serde_json::Error,
    },

    /// Endpoint could not be joined onto the base URL.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl ClientError {
    /// True for failures where no response was received.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Check if this is a timeout error.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_timeout())
    }

    /// Get the HTTP status code if a response was received.
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            Self::NonEnvelope { status, .. } => Some(*status),
            Self::Application(e) | Self::ApplicationWithBadData { error: e, .. } => Some(e.status),
            Self::Transport(e) => e.status(),
            _ => None,
        }
    }
}
