//! In-process backend for local development and tests.
//!
//! It does no cryptography: addresses are checked for the base58 alphabet
//! and length only, transactions for hex encoding, and "injection" records
//! the raw transaction in memory.

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use crate::gateway::{
    AddressVerification, AddressVerifier, BackendError, BackendResult, BuildInfo, NodeInfo,
    TransactionInjector, TransactionVerifier, VerifiedTransaction,
};

const BASE58_ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

#[derive(Debug, Default)]
pub struct MemoryGateway {
    /// raw transaction -> txid
    injected: DashMap<String, String>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of transactions injected so far.
    pub fn injected_count(&self) -> usize {
        self.injected.len()
    }
}

impl NodeInfo for MemoryGateway {
    fn build_info(&self) -> BuildInfo {
        BuildInfo {
            version: env!("CARGO_PKG_VERSION").to_string(),
            commit: String::new(),
            branch: String::new(),
        }
    }
}

impl AddressVerifier for MemoryGateway {
    fn verify_address(&self, address: &str) -> BackendResult<AddressVerification> {
        if !(26..=35).contains(&address.len()) {
            return Err(BackendError::InvalidInput("Invalid address length".to_string()));
        }
        if !address.chars().all(|c| BASE58_ALPHABET.contains(c)) {
            return Err(BackendError::InvalidInput("Invalid base58 character".to_string()));
        }
        Ok(AddressVerification { version: 0 })
    }
}

#[async_trait]
impl TransactionVerifier for MemoryGateway {
    async fn verify_transaction(&self, encoded: &str) -> BackendResult<VerifiedTransaction> {
        let length = decoded_len(encoded)?;

        if let Some(txid) = self.injected.get(encoded) {
            return Err(BackendError::Invalid {
                reason: "Transaction has already been injected".to_string(),
                detail: Some(VerifiedTransaction {
                    txid: Some(txid.value().clone()),
                    confirmed: false,
                    length,
                }),
            });
        }

        Ok(VerifiedTransaction {
            txid: None,
            confirmed: false,
            length,
        })
    }
}

#[async_trait]
impl TransactionInjector for MemoryGateway {
    async fn inject_transaction(&self, raw: &str) -> BackendResult<String> {
        decoded_len(raw)?;

        let txid = self
            .injected
            .entry(raw.to_string())
            .or_insert_with(|| Uuid::new_v4().simple().to_string())
            .value()
            .clone();
        tracing::info!(txid = %txid, "Injected transaction");
        Ok(txid)
    }
}

fn decoded_len(encoded: &str) -> BackendResult<usize> {
    if encoded.is_empty() || encoded.len() % 2 != 0 || !encoded.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(BackendError::InvalidInput(
            "Invalid transaction encoding".to_string(),
        ));
    }
    Ok(encoded.len() / 2)
}
