//! Backend capabilities.
//!
//! The node behind the gateway is reached only through these traits. Each
//! handler depends on the one capability it needs, so a deployment can
//! back them with different implementations.
//!
//! # Security Constraints
//! - Implementations never see CSRF tokens or Host/Origin headers; those
//!   are settled before a handler runs

pub mod memory;
pub mod types;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

pub use memory::MemoryGateway;
pub use types::{
    AddressVerification, BuildInfo, InjectTransactionRequest, VerifiedTransaction,
    VerifyAddressRequest, VerifyTransactionRequest,
};

/// Failure reported by a backend capability.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// The caller's input could not be interpreted at all.
    #[error("{0}")]
    InvalidInput(String),

    /// The input parsed but failed validation. `detail` is still useful to
    /// the caller.
    #[error("{reason}")]
    Invalid {
        reason: String,
        detail: Option<VerifiedTransaction>,
    },

    /// The node itself failed.
    #[error("{0}")]
    Internal(String),
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Build information for `/api/v1/version`.
pub trait NodeInfo: Send + Sync {
    fn build_info(&self) -> BuildInfo;
}

/// Address checks for `/api/v2/address/verify`.
pub trait AddressVerifier: Send + Sync {
    fn verify_address(&self, address: &str) -> BackendResult<AddressVerification>;
}

/// Transaction checks for `/api/v2/transaction/verify`.
#[async_trait]
pub trait TransactionVerifier: Send + Sync {
    async fn verify_transaction(&self, encoded: &str) -> BackendResult<VerifiedTransaction>;
}

/// Broadcast for `/api/v1/injectTransaction`. Returns the txid.
#[async_trait]
pub trait TransactionInjector: Send + Sync {
    async fn inject_transaction(&self, raw: &str) -> BackendResult<String>;
}

/// The capability set handed to the HTTP server.
#[derive(Clone)]
pub struct Backend {
    pub node: Arc<dyn NodeInfo>,
    pub addresses: Arc<dyn AddressVerifier>,
    pub verifier: Arc<dyn TransactionVerifier>,
    pub injector: Arc<dyn TransactionInjector>,
}

impl Backend {
    /// Use one implementation for every capability.
    pub fn from_gateway<G>(gateway: Arc<G>) -> Self
    where
        G: NodeInfo + AddressVerifier + TransactionVerifier + TransactionInjector + 'static,
    {
        Self {
            node: gateway.clone(),
            addresses: gateway.clone(),
            verifier: gateway.clone(),
            injector: gateway,
        }
    }
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backend").finish_non_exhaustive()
    }
}
