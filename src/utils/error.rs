// src/utils/error.rs
use thiserror::Error;

use crate::{
    blockchain::LedgerError,
    core::{analysis::AnalysisError, export::ExportError},
};

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Empty input: a document must contain at least one byte")]
    EmptyInput,

    #[error("A verification is already in progress")]
    Busy,

    #[error("Verification attempt {0} was superseded before it completed")]
    Superseded(u64),

    #[error("No verified record is held")]
    NotVerified,

    #[error("Invalid fingerprint: {0}")]
    InvalidFingerprint(String),

    #[error("Digest error: {0}")]
    Digest(String),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, VerifyError>;
