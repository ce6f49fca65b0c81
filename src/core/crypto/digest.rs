// src/core/crypto/digest.rs
use ring::digest::{self, SHA256};
use std::path::Path;
use tracing::debug;

use crate::{
    core::identity::fingerprint::{Fingerprint, DIGEST_LEN},
    utils::error::{Result, VerifyError},
};

/// Produces a deterministic fingerprint from document bytes.
#[cfg_attr(test, mockall::automock)]
pub trait DigestService: Send + Sync {
    fn digest(&self, bytes: &[u8]) -> Result<Fingerprint>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Sha256Digest;

impl Sha256Digest {
    pub fn new() -> Self {
        Self
    }
}

impl DigestService for Sha256Digest {
    fn digest(&self, bytes: &[u8]) -> Result<Fingerprint> {
        let hash = digest::digest(&SHA256, bytes);
        let raw: &[u8; DIGEST_LEN] = hash
            .as_ref()
            .try_into()
            .map_err(|_| VerifyError::Digest("unexpected SHA-256 output length".into()))?;
        Ok(Fingerprint::from_digest(raw))
    }
}

/// Reads a document from disk and fingerprints it. Unreadable or empty files
/// are errors, never an empty fingerprint.
pub async fn digest_file(service: &dyn DigestService, path: &Path) -> Result<Fingerprint> {
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        VerifyError::Digest(format!("failed to read {}: {}", path.display(), e))
    })?;
    if bytes.is_empty() {
        return Err(VerifyError::EmptyInput);
    }
    debug!(path = %path.display(), size = bytes.len(), "Read document for hashing");
    service.digest(&bytes)
}
