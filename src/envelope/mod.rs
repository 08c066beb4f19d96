//! Response envelopes for both API generations.
//!
//! Generation 1 writes the payload as-is on success and a plain-text
//! status line on failure. Generation 2 wraps everything in
//! `{"error": {...}, "data": ...}` where both fields are optional and may
//! appear together: a validation failure can still carry diagnostic data.
//!
//! Both directions live here so the wire shape is defined exactly once:
//! [`encode`] is used by the server handlers, [`decode`] by the client.

pub mod decode;
pub mod encode;

use serde::{Deserialize, Serialize};

pub use decode::{decode_v1, decode_v2, Partial};
pub use encode::{forbidden, v1_error, v1_ok, v2_error, V2Response};

/// Generation-2 wire shape.
///
/// Unknown fields are rejected so protocol drift surfaces as a decode
/// failure instead of silently dropped data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Envelope<T> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<EnvelopeError>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    pub fn data(data: T) -> Self {
        Self {
            error: None,
            data: Some(data),
        }
    }

    pub fn error(code: u16, message: impl Into<String>) -> Self {
        Self {
            error: Some(EnvelopeError {
                message: message.into(),
                code,
            }),
            data: None,
        }
    }

    pub fn with_data(mut self, data: T) -> Self {
        self.data = Some(data);
        self
    }
}

/// The `error` member of a generation-2 envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnvelopeError {
    pub message: String,

    /// HTTP status the server answered with. Older servers omit it.
    #[serde(default)]
    pub code: u16,
}
