//! Wire payloads shared by the server handlers and the client.
//!
//! Every type rejects unknown fields so the client notices protocol drift.

use serde::{Deserialize, Serialize};

/// `GET /api/v1/version`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildInfo {
    pub version: String,
    pub commit: String,
    pub branch: String,
}

/// `POST /api/v1/injectTransaction` request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InjectTransactionRequest {
    pub rawtx: String,
}

/// `POST /api/v2/address/verify` request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VerifyAddressRequest {
    pub address: String,
}

/// `POST /api/v2/address/verify` response data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddressVerification {
    pub version: u8,
}

/// `POST /api/v2/transaction/verify` request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VerifyTransactionRequest {
    pub encoded_transaction: String,
}

/// `POST /api/v2/transaction/verify` response data.
///
/// Also sent alongside a 422 so callers can inspect what failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VerifiedTransaction {
    pub txid: Option<String>,
    pub confirmed: bool,
    pub length: usize,
}
