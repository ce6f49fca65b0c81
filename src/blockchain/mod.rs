//! Ledger access: the contract that maps document fingerprints to identity
//! records, and the clients that reach it.

pub mod abi;
pub mod ethereum;
pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

use crate::core::identity::{Fingerprint, RecordFields};

pub use ethereum::EthereumLedgerClient;
pub use memory::MemoryLedger;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("No ledger provider is configured")]
    NoProvider,

    #[error("Wrong network: expected chain {expected}, provider is on {actual}")]
    WrongNetwork { expected: String, actual: String },

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Decode error: {0}")]
    Decode(String),
}

/// Read access to the document registry.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Whether the fingerprint is registered.
    async fn lookup(&self, fingerprint: &Fingerprint) -> Result<bool, LedgerError>;

    /// The record registered under the fingerprint.
    async fn fetch_record(&self, fingerprint: &Fingerprint) -> Result<RecordFields, LedgerError>;
}
