//! Endpoint handlers.
//!
//! Generation-1 handlers answer with the bare payload or a plain-text
//! error line. Generation-2 handlers always answer with an envelope.

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;

use crate::envelope::{v1_error, v1_ok, v2_error, V2Response};
use crate::gateway::{
    BackendError, InjectTransactionRequest, VerifyAddressRequest, VerifyTransactionRequest,
};
use crate::http::server::AppState;

/// `GET /api/v1/version`
pub async fn version(State(state): State<AppState>) -> Response {
    v1_ok(state.backend.node.build_info())
}

/// `POST /api/v1/injectTransaction`
pub async fn inject_transaction(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if !state.api.enable_transaction_inject {
        tracing::warn!("Rejected call to disabled endpoint injectTransaction");
        return v1_error(StatusCode::FORBIDDEN, "Endpoint is disabled");
    }
    if !is_json(&headers) {
        return v1_error(StatusCode::UNSUPPORTED_MEDIA_TYPE, "");
    }

    let request: InjectTransactionRequest = match parse_body(&body) {
        Ok(r) => r,
        Err(msg) => return v1_error(StatusCode::BAD_REQUEST, &msg),
    };
    if request.rawtx.is_empty() {
        return v1_error(StatusCode::BAD_REQUEST, "rawtx is required");
    }

    match state.backend.injector.inject_transaction(&request.rawtx).await {
        Ok(txid) => v1_ok(txid),
        Err(BackendError::Internal(msg)) => {
            tracing::error!(error = %msg, "Transaction injection failed");
            v1_error(StatusCode::INTERNAL_SERVER_ERROR, &msg)
        }
        Err(e) => {
            tracing::debug!(error = %e, "Rejected transaction");
            v1_error(StatusCode::BAD_REQUEST, &e.to_string())
        }
    }
}

/// `POST /api/v2/address/verify`
pub async fn verify_address(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if !is_json(&headers) {
        return v2_error(StatusCode::UNSUPPORTED_MEDIA_TYPE, "Invalid content type");
    }

    let request: VerifyAddressRequest = match parse_body(&body) {
        Ok(r) => r,
        Err(msg) => return v2_error(StatusCode::BAD_REQUEST, msg),
    };
    if request.address.is_empty() {
        return v2_error(StatusCode::BAD_REQUEST, "address is required");
    }

    match state.backend.addresses.verify_address(&request.address) {
        Ok(verification) => V2Response::ok(verification).into_response(),
        Err(BackendError::Internal(msg)) => {
            tracing::error!(error = %msg, "Address verification failed");
            v2_error(StatusCode::INTERNAL_SERVER_ERROR, msg)
        }
        Err(e) => v2_error(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
    }
}

/// `POST /api/v2/transaction/verify`
///
/// A transaction that decodes but fails validation is answered with 422
/// and the decoded transaction as `data`.
pub async fn verify_transaction(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if !is_json(&headers) {
        return v2_error(StatusCode::UNSUPPORTED_MEDIA_TYPE, "Invalid content type");
    }

    let request: VerifyTransactionRequest = match parse_body(&body) {
        Ok(r) => r,
        Err(msg) => return v2_error(StatusCode::BAD_REQUEST, msg),
    };
    if request.encoded_transaction.is_empty() {
        return v2_error(StatusCode::BAD_REQUEST, "encoded_transaction is required");
    }

    match state
        .backend
        .verifier
        .verify_transaction(&request.encoded_transaction)
        .await
    {
        Ok(tx) => V2Response::ok(tx).into_response(),
        Err(BackendError::InvalidInput(msg)) => v2_error(StatusCode::BAD_REQUEST, msg),
        Err(BackendError::Invalid {
            reason,
            detail: Some(detail),
        }) => V2Response::error_with_data(StatusCode::UNPROCESSABLE_ENTITY, reason, detail)
            .into_response(),
        Err(BackendError::Invalid { reason, detail: None }) => {
            v2_error(StatusCode::UNPROCESSABLE_ENTITY, reason)
        }
        Err(BackendError::Internal(msg)) => {
            tracing::error!(error = %msg, "Transaction verification failed");
            v2_error(StatusCode::INTERNAL_SERVER_ERROR, msg)
        }
    }
}

/// Unregistered routes get the generation-1 text 404.
pub async fn not_found() -> Response {
    v1_error(StatusCode::NOT_FOUND, "")
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|ct| ct.split(';').next())
        .map(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
        .unwrap_or(false)
}

/// Strict JSON body parse. Client input errors are logged at debug only.
fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, String> {
    serde_json::from_slice(body).map_err(|e| {
        tracing::debug!(error = %e, "Malformed request body");
        e.to_string()
    })
}
