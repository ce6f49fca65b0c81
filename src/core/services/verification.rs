// src/core/services/verification.rs
use chrono::Utc;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::{
    blockchain::LedgerClient,
    core::{
        crypto::DigestService,
        export::{ExportArtifact, ExportPayload, ExportService},
        identity::{Fingerprint, VerificationRecord, VerificationRequest},
    },
    utils::{
        error::{Result, VerifyError},
        metrics::WorkflowMetrics,
    },
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "detail", rename_all = "camelCase")]
pub enum WorkflowState {
    Idle,
    Scanning,
    Verified(VerificationRecord),
    NotFound,
    ConnectionError { reason: String },
}

impl WorkflowState {
    pub fn status_message(&self) -> &'static str {
        match self {
            WorkflowState::Idle => "Ready to scan",
            WorkflowState::Scanning => "Scanning ledger...",
            WorkflowState::Verified(_) => "Verified successfully",
            WorkflowState::NotFound => "Verification failed",
            WorkflowState::ConnectionError { .. } => "Error connecting",
        }
    }

    pub fn record(&self) -> Option<&VerificationRecord> {
        match self {
            WorkflowState::Verified(record) => Some(record),
            _ => None,
        }
    }

    pub fn is_scanning(&self) -> bool {
        matches!(self, WorkflowState::Scanning)
    }
}

/// User-facing messages that accompany a transition or an export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Notice {
    NotFound { fingerprint: String },
    ConnectionError { reason: String },
    Exported { path: String },
    ExportFailed { reason: String },
}

impl Notice {
    pub fn message(&self) -> String {
        match self {
            Notice::NotFound { .. } => "Identity not found on the ledger".to_string(),
            Notice::ConnectionError { reason } => format!("Could not reach the ledger: {}", reason),
            Notice::Exported { path } => format!("Identity card saved to {}", path),
            Notice::ExportFailed { reason } => format!("Error generating identity card: {}", reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum WorkflowEvent {
    StateChanged { attempt: u64, state: WorkflowState },
    Notice(Notice),
}

pub type EventSender = mpsc::UnboundedSender<WorkflowEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<WorkflowEvent>;

pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

struct Inner {
    state: WorkflowState,
    /// Token of the most recent submission. Bumped by every submission and
    /// every reset, so a completion carrying an older token is stale.
    attempt: u64,
}

/// Drives a document from raw input to a resolved [`WorkflowState`].
///
/// At most one lookup is in flight: submissions made while `Scanning` are
/// rejected with [`VerifyError::Busy`]. `reset` does not cancel a running
/// lookup; its result is discarded when it arrives.
pub struct VerificationController {
    digest: Arc<dyn DigestService>,
    ledger: Arc<dyn LedgerClient>,
    exporter: Arc<dyn ExportService>,
    scan_delay: Duration,
    inner: Mutex<Inner>,
    state_tx: watch::Sender<WorkflowState>,
    events: Option<EventSender>,
    metrics: Arc<WorkflowMetrics>,
}

impl VerificationController {
    pub fn new(
        digest: Arc<dyn DigestService>,
        ledger: Arc<dyn LedgerClient>,
        exporter: Arc<dyn ExportService>,
    ) -> Self {
        let (state_tx, _) = watch::channel(WorkflowState::Idle);
        Self {
            digest,
            ledger,
            exporter,
            scan_delay: Duration::ZERO,
            inner: Mutex::new(Inner {
                state: WorkflowState::Idle,
                attempt: 0,
            }),
            state_tx,
            events: None,
            metrics: Arc::new(WorkflowMetrics::new()),
        }
    }

    /// Minimum time spent in `Scanning` before the ledger is queried.
    pub fn with_scan_delay(mut self, delay: Duration) -> Self {
        self.scan_delay = delay;
        self
    }

    pub fn with_events(mut self, sender: EventSender) -> Self {
        self.events = Some(sender);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<WorkflowMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn state(&self) -> WorkflowState {
        self.inner.lock().state.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<WorkflowState> {
        self.state_tx.subscribe()
    }

    pub fn metrics(&self) -> Arc<WorkflowMetrics> {
        self.metrics.clone()
    }

    pub async fn submit(&self, request: VerificationRequest) -> Result<WorkflowState> {
        match request {
            VerificationRequest::File(bytes) => self.submit_file(&bytes).await,
            VerificationRequest::ManualHash(hash) => self.submit_fingerprint(hash.trim()).await,
        }
    }

    /// Fingerprints the document and looks it up.
    pub async fn submit_file(&self, bytes: &[u8]) -> Result<WorkflowState> {
        if bytes.is_empty() {
            return Err(VerifyError::EmptyInput);
        }
        if self.inner.lock().state.is_scanning() {
            return Err(VerifyError::Busy);
        }

        let fingerprint = self.digest.digest(bytes)?;
        debug!(%fingerprint, size = bytes.len(), "Computed document fingerprint");
        self.submit_fingerprint(fingerprint.as_str()).await
    }

    /// Looks up a fingerprint. The state moves to `Scanning` before the input
    /// is validated; a malformed fingerprint resolves to `ConnectionError`.
    ///
    /// Returns the resolved state, or [`VerifyError::Superseded`] if a reset
    /// or newer submission happened while this one was in flight.
    pub async fn submit_fingerprint(&self, fingerprint: &str) -> Result<WorkflowState> {
        let attempt = self.begin()?;
        self.metrics.record_submission();

        if !self.scan_delay.is_zero() {
            tokio::time::sleep(self.scan_delay).await;
        }

        let (resolved, lookup_time) = match Fingerprint::parse(fingerprint) {
            Ok(parsed) => {
                let started = Instant::now();
                let resolved = self.resolve(attempt, parsed).await;
                (resolved, Some(started.elapsed()))
            }
            Err(e) => {
                warn!(attempt, "Rejected fingerprint: {}", e);
                let resolved = WorkflowState::ConnectionError {
                    reason: e.to_string(),
                };
                (resolved, None)
            }
        };

        self.complete(attempt, fingerprint, resolved, lookup_time)
    }

    /// Back to `Idle`, dropping any record. Any lookup still in flight
    /// becomes stale.
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        inner.attempt += 1;
        self.publish(&mut inner, WorkflowState::Idle);
        info!(attempt = inner.attempt, "Workflow reset");
    }

    /// Renders the held record through the export service. Only valid in
    /// `Verified`; never changes state.
    pub fn export_current(&self) -> Result<ExportArtifact> {
        let record = match &self.inner.lock().state {
            WorkflowState::Verified(record) => record.clone(),
            other => {
                warn!(state = other.status_message(), "Export requested without a verified record");
                return Err(VerifyError::NotVerified);
            }
        };

        let payload = ExportPayload::from_record(&record);
        match self.exporter.render(&payload) {
            Ok(artifact) => {
                self.metrics.record_export(true);
                self.emit(WorkflowEvent::Notice(Notice::Exported {
                    path: artifact.path.display().to_string(),
                }));
                Ok(artifact)
            }
            Err(e) => {
                self.metrics.record_export(false);
                error!(fingerprint = %record.fingerprint, "Export failed: {}", e);
                self.emit(WorkflowEvent::Notice(Notice::ExportFailed {
                    reason: e.to_string(),
                }));
                Err(e.into())
            }
        }
    }

    fn begin(&self) -> Result<u64> {
        let mut inner = self.inner.lock();
        if inner.state.is_scanning() {
            debug!(attempt = inner.attempt, "Rejected submission while scanning");
            return Err(VerifyError::Busy);
        }
        inner.attempt += 1;
        let attempt = inner.attempt;
        self.publish(&mut inner, WorkflowState::Scanning);
        info!(attempt, "Scanning ledger");
        Ok(attempt)
    }

    async fn resolve(&self, attempt: u64, fingerprint: Fingerprint) -> WorkflowState {
        match self.ledger.lookup(&fingerprint).await {
            Ok(false) => WorkflowState::NotFound,
            Ok(true) => match self.ledger.fetch_record(&fingerprint).await {
                Ok(fields) => {
                    WorkflowState::Verified(VerificationRecord::new(fingerprint, fields, Utc::now()))
                }
                Err(e) => {
                    error!(attempt, %fingerprint, "Failed to fetch record: {}", e);
                    WorkflowState::ConnectionError {
                        reason: e.to_string(),
                    }
                }
            },
            Err(e) => {
                error!(attempt, %fingerprint, "Ledger lookup failed: {}", e);
                WorkflowState::ConnectionError {
                    reason: e.to_string(),
                }
            }
        }
    }

    fn complete(
        &self,
        attempt: u64,
        fingerprint: &str,
        resolved: WorkflowState,
        lookup_time: Option<Duration>,
    ) -> Result<WorkflowState> {
        let mut inner = self.inner.lock();
        if inner.attempt != attempt {
            self.metrics.record_superseded();
            debug!(
                attempt,
                current = inner.attempt,
                "Discarding stale completion"
            );
            return Err(VerifyError::Superseded(attempt));
        }

        if let Some(elapsed) = lookup_time {
            self.metrics.record_lookup(elapsed);
        }

        match &resolved {
            WorkflowState::Verified(record) => {
                self.metrics.record_verified();
                info!(attempt, fingerprint = %record.fingerprint, "Document verified");
            }
            WorkflowState::NotFound => {
                self.metrics.record_not_found();
                info!(attempt, "Document not found on ledger");
            }
            WorkflowState::ConnectionError { .. } => self.metrics.record_connection_error(),
            WorkflowState::Idle | WorkflowState::Scanning => {}
        }

        self.publish(&mut inner, resolved.clone());

        let notice = match &resolved {
            WorkflowState::NotFound => Some(Notice::NotFound {
                fingerprint: fingerprint.to_string(),
            }),
            WorkflowState::ConnectionError { reason } => Some(Notice::ConnectionError {
                reason: reason.clone(),
            }),
            _ => None,
        };
        if let Some(notice) = notice {
            self.emit(WorkflowEvent::Notice(notice));
        }

        Ok(resolved)
    }

    /// Must be called with the lock held so events leave in transition order.
    fn publish(&self, inner: &mut Inner, state: WorkflowState) {
        inner.state = state.clone();
        self.state_tx.send_replace(state.clone());
        self.emit(WorkflowEvent::StateChanged {
            attempt: inner.attempt,
            state,
        });
    }

    fn emit(&self, event: WorkflowEvent) {
        if let Some(sender) = &self.events {
            // A dropped receiver just means nobody is listening.
            let _ = sender.send(event);
        }
    }
}
