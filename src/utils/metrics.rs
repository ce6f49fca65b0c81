// src/utils/metrics.rs
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::time::{Duration, Instant};

/// Counters for the verification workflow. Shared between the controller and
/// whoever wants to report on it.
pub struct WorkflowMetrics {
    start_time: Instant,
    submissions: AtomicU64,
    verified: AtomicU64,
    not_found: AtomicU64,
    connection_errors: AtomicU64,
    superseded: AtomicU64,
    exports: AtomicU64,
    export_failures: AtomicU64,
    lookups: AtomicU64,
    lookup_time_micros: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub submissions: u64,
    pub verified: u64,
    pub not_found: u64,
    pub connection_errors: u64,
    pub superseded: u64,
    pub exports: u64,
    pub export_failures: u64,
    pub lookups: u64,
    pub lookup_time_micros: u64,
}

impl WorkflowMetrics {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            submissions: AtomicU64::new(0),
            verified: AtomicU64::new(0),
            not_found: AtomicU64::new(0),
            connection_errors: AtomicU64::new(0),
            superseded: AtomicU64::new(0),
            exports: AtomicU64::new(0),
            export_failures: AtomicU64::new(0),
            lookups: AtomicU64::new(0),
            lookup_time_micros: AtomicU64::new(0),
        }
    }

    pub fn record_submission(&self) {
        self.submissions.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_verified(&self) {
        self.verified.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_not_found(&self) {
        self.not_found.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_connection_error(&self) {
        self.connection_errors.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_superseded(&self) {
        self.superseded.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_export(&self, success: bool) {
        self.exports.fetch_add(1, Ordering::SeqCst);
        if !success {
            self.export_failures.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Time spent in ledger calls for one attempt that resolved the state.
    pub fn record_lookup(&self, duration: Duration) {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.lookup_time_micros
            .fetch_add(duration.as_micros() as u64, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            submissions: self.submissions.load(Ordering::SeqCst),
            verified: self.verified.load(Ordering::SeqCst),
            not_found: self.not_found.load(Ordering::SeqCst),
            connection_errors: self.connection_errors.load(Ordering::SeqCst),
            superseded: self.superseded.load(Ordering::SeqCst),
            exports: self.exports.load(Ordering::SeqCst),
            export_failures: self.export_failures.load(Ordering::SeqCst),
            lookups: self.lookups.load(Ordering::SeqCst),
            lookup_time_micros: self.lookup_time_micros.load(Ordering::SeqCst),
        }
    }

    pub fn log_summary(&self) {
        let snapshot = self.snapshot();
        tracing::info!(
            uptime_secs = self.start_time.elapsed().as_secs(),
            submissions = snapshot.submissions,
            verified = snapshot.verified,
            not_found = snapshot.not_found,
            connection_errors = snapshot.connection_errors,
            superseded = snapshot.superseded,
            exports = snapshot.exports,
            export_failures = snapshot.export_failures,
            lookups = snapshot.lookups,
            avg_lookup_micros = snapshot.average_lookup_micros(),
            "Workflow metrics"
        );
    }
}

impl Default for WorkflowMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsSnapshot {
    /// Average time spent in ledger calls per recorded lookup.
    pub fn average_lookup_micros(&self) -> u64 {
        if self.lookups == 0 {
            0
        } else {
            self.lookup_time_micros / self.lookups
        }
    }
}
