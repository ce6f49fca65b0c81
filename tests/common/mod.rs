// tests/common/mod.rs
#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

use docverify::{
    blockchain::{LedgerClient, LedgerError},
    core::{
        crypto::Sha256Digest,
        export::{ExportArtifact, ExportError, ExportPayload, ExportService, JsonCardExporter},
        identity::{Fingerprint, RecordFields},
        services::{event_channel, EventReceiver, VerificationController},
    },
};

pub fn manual_fingerprint() -> String {
    format!("0x{}", "ab".repeat(32))
}

pub fn other_fingerprint() -> String {
    format!("0x{}", "cd".repeat(32))
}

pub fn jane_doe() -> RecordFields {
    RecordFields {
        full_name: "Jane Doe".into(),
        dob: "1990-01-01".into(),
        gender: "Female".into(),
        phone: "+1 555 0100".into(),
        email: "jane@example.com".into(),
        ..Default::default()
    }
}

/// Ledger fake with per-fingerprint gates that hold a lookup until released.
#[derive(Default)]
pub struct FakeLedger {
    records: Mutex<HashMap<String, RecordFields>>,
    failure: Mutex<Option<String>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    pub lookups: AtomicUsize,
    pub fetches: AtomicUsize,
}

impl FakeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(self, fingerprint: &str, fields: RecordFields) -> Self {
        self.records.lock().insert(fingerprint.to_string(), fields);
        self
    }

    /// Every call fails as if the provider were unreachable.
    pub fn unreachable(self, reason: &str) -> Self {
        *self.failure.lock() = Some(reason.to_string());
        self
    }

    /// Lookups of `fingerprint` block until the returned gate is notified.
    pub fn gate(&self, fingerprint: &str) -> Arc<Notify> {
        self.gates
            .lock()
            .entry(fingerprint.to_string())
            .or_insert_with(|| Arc::new(Notify::new()))
            .clone()
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn failure(&self) -> Option<LedgerError> {
        self.failure.lock().clone().map(LedgerError::Transport)
    }
}

#[async_trait]
impl LedgerClient for FakeLedger {
    async fn lookup(&self, fingerprint: &Fingerprint) -> Result<bool, LedgerError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let gate = self.gates.lock().get(fingerprint.as_str()).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if let Some(err) = self.failure() {
            return Err(err);
        }
        Ok(self.records.lock().contains_key(fingerprint.as_str()))
    }

    async fn fetch_record(&self, fingerprint: &Fingerprint) -> Result<RecordFields, LedgerError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.failure() {
            return Err(err);
        }
        self.records
            .lock()
            .get(fingerprint.as_str())
            .cloned()
            .ok_or_else(|| LedgerError::Decode("no record".into()))
    }
}

/// Exporter that remembers what it was asked to render.
#[derive(Default)]
pub struct RecordingExporter {
    pub rendered: Mutex<Vec<ExportPayload>>,
}

impl ExportService for RecordingExporter {
    fn render(&self, payload: &ExportPayload) -> Result<ExportArtifact, ExportError> {
        self.rendered.lock().push(payload.clone());
        Ok(ExportArtifact {
            path: format!("{}.json", payload.file_stem).into(),
            size: 0,
        })
    }
}

pub struct TestContext {
    pub ledger: Arc<FakeLedger>,
    pub exporter: Arc<RecordingExporter>,
    pub controller: Arc<VerificationController>,
    pub events: EventReceiver,
}

impl TestContext {
    pub fn new(ledger: FakeLedger) -> Self {
        Self::with_delay(ledger, std::time::Duration::ZERO)
    }

    pub fn with_delay(ledger: FakeLedger, delay: std::time::Duration) -> Self {
        let ledger = Arc::new(ledger);
        let exporter = Arc::new(RecordingExporter::default());
        let (tx, events) = event_channel();
        let controller = VerificationController::new(
            Arc::new(Sha256Digest::new()),
            ledger.clone(),
            exporter.clone(),
        )
        .with_scan_delay(delay)
        .with_events(tx);

        Self {
            ledger,
            exporter,
            controller: Arc::new(controller),
            events,
        }
    }

    /// A controller that writes real JSON cards into `dir`.
    pub fn with_card_exporter(ledger: FakeLedger, dir: &std::path::Path) -> Arc<VerificationController> {
        Arc::new(VerificationController::new(
            Arc::new(Sha256Digest::new()),
            Arc::new(ledger),
            Arc::new(JsonCardExporter::new(dir)),
        ))
    }
}
