//! Client-side response decoding.
//!
//! Decoding is strict at the envelope level (`deny_unknown_fields`).
//! Strictness of the payload follows the target type: payload structs in
//! this crate all carry `#[serde(deny_unknown_fields)]`.

use axum::http::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::client::error::{ApiError, ClientError};
use crate::envelope::Envelope;

/// Result of a generation-2 exchange that produced an interpretable envelope.
///
/// `error` and `data` are independent: a 422 may carry both.
#[derive(Debug)]
pub struct Partial<T> {
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

impl<T> Partial<T> {
    /// Whether `data` was present and decoded.
    pub fn populated(&self) -> bool {
        self.data.is_some()
    }

    /// Collapse into a `Result`, discarding data that came with an error.
    pub fn into_result(self) -> Result<Option<T>, ClientError> {
        match self.error {
            Some(error) => Err(ClientError::Application(error)),
            None => Ok(self.data),
        }
    }
}

/// Decode a generation-1 response.
///
/// Any non-2xx status short-circuits: the whole body becomes the message,
/// whatever its content type.
pub fn decode_v1<T: DeserializeOwned>(status: StatusCode, body: &[u8]) -> Result<T, ClientError> {
    if !status.is_success() {
        return Err(ClientError::NonEnvelope {
            status,
            message: raw_message(body),
        });
    }

    serde_json::from_slice(body).map_err(ClientError::MalformedSuccess)
}

/// Decode a generation-2 response.
pub fn decode_v2<T: DeserializeOwned>(
    status: StatusCode,
    body: &[u8],
) -> Result<Partial<T>, ClientError> {
    let envelope: Envelope<Value> = match serde_json::from_slice(body) {
        Ok(envelope) => envelope,
        // e.g. a 404 page for an unregistered route, or a proxy error page
        Err(_) if !status.is_success() => {
            return Err(ClientError::NonEnvelope {
                status,
                message: raw_message(body),
            });
        }
        Err(e) => return Err(ClientError::MalformedSuccess(e)),
    };

    let error = if status.is_success() {
        None
    } else {
        let message = match envelope.error {
            Some(e) => e.message,
            None => status.canonical_reason().unwrap_or_default().to_string(),
        };
        Some(ApiError { status, message })
    };

    let data = match envelope.data.map(serde_json::from_value).transpose() {
        Ok(data) => data,
        Err(source) => {
            return Err(match error {
                Some(error) => ClientError::ApplicationWithBadData { error, source },
                None => ClientError::Decode(source),
            });
        }
    };

    Ok(Partial { data, error })
}

fn raw_message(body: &[u8]) -> String {
    String::from_utf8_lossy(body).into_owned()
}
