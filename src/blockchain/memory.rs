use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

use super::{LedgerClient, LedgerError};
use crate::{
    core::identity::{Fingerprint, RecordFields},
    utils::error::{Result, VerifyError},
};

/// An in-process registry, loaded from a JSON object mapping fingerprints to
/// records. Useful offline and in tests.
#[derive(Default)]
pub struct MemoryLedger {
    records: RwLock<HashMap<Fingerprint, RecordFields>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn from_json_file(path: &Path) -> Result<Self> {
        let contents = tokio::fs::read_to_string(path).await?;
        let records: HashMap<Fingerprint, RecordFields> = serde_json::from_str(&contents)
            .map_err(|e| {
                VerifyError::Config(format!("invalid ledger file {}: {}", path.display(), e))
            })?;
        info!("Loaded {} ledger records from {}", records.len(), path.display());
        Ok(Self {
            records: RwLock::new(records),
        })
    }

    pub fn register(&self, fingerprint: Fingerprint, fields: RecordFields) {
        self.records.write().insert(fingerprint, fields);
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[async_trait]
impl LedgerClient for MemoryLedger {
    async fn lookup(&self, fingerprint: &Fingerprint) -> std::result::Result<bool, LedgerError> {
        Ok(self.records.read().contains_key(fingerprint))
    }

    async fn fetch_record(
        &self,
        fingerprint: &Fingerprint,
    ) -> std::result::Result<RecordFields, LedgerError> {
        // Unregistered fingerprints read back as an all-empty tuple, as the
        // contract's default storage would.
        Ok(self
            .records
            .read()
            .get(fingerprint)
            .cloned()
            .unwrap_or_default())
    }
}
