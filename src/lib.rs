pub mod blockchain;
pub mod core;
pub mod utils;

use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::{
    blockchain::{EthereumLedgerClient, LedgerClient, MemoryLedger},
    core::{
        analysis::{
            analyze_with_fallback, DocumentAnalyzer, DocumentImage, GeminiAnalyzer, KycExtraction,
        },
        crypto::{DigestService, Sha256Digest},
        export::{ExportService, JsonCardExporter},
        services::{EventSender, VerificationController},
    },
    utils::{config::Config, error::Result, metrics::WorkflowMetrics},
};

/// Wires the workflow controller and the document analyzer from configuration.
pub struct Application {
    config: Arc<Config>,
    digest: Arc<dyn DigestService>,
    controller: Arc<VerificationController>,
    analyzer: Arc<dyn DocumentAnalyzer>,
    metrics: Arc<WorkflowMetrics>,
}

impl Application {
    /// Uses the Ethereum JSON-RPC ledger named by `ledger.rpc_url`.
    pub async fn new(config: Config, events: Option<EventSender>) -> Result<Self> {
        info!("Initializing ledger client...");
        let ledger: Arc<dyn LedgerClient> = Arc::new(EthereumLedgerClient::new(&config.ledger)?);
        Self::with_ledger(config, ledger, events)
    }

    /// Uses an in-memory ledger loaded from a JSON file instead of a provider.
    pub async fn with_ledger_file(
        config: Config,
        path: &Path,
        events: Option<EventSender>,
    ) -> Result<Self> {
        info!("Loading offline ledger from {}...", path.display());
        let ledger: Arc<dyn LedgerClient> = Arc::new(MemoryLedger::from_json_file(path).await?);
        Self::with_ledger(config, ledger, events)
    }

    pub fn with_ledger(
        config: Config,
        ledger: Arc<dyn LedgerClient>,
        events: Option<EventSender>,
    ) -> Result<Self> {
        let config = Arc::new(config);
        let metrics = Arc::new(WorkflowMetrics::new());

        info!("Initializing services...");
        let digest: Arc<dyn DigestService> = Arc::new(Sha256Digest::new());
        let exporter: Arc<dyn ExportService> =
            Arc::new(JsonCardExporter::new(config.export.output_dir.clone()));

        let mut controller = VerificationController::new(digest.clone(), ledger, exporter)
            .with_scan_delay(config.get_scan_delay())
            .with_metrics(metrics.clone());
        if let Some(events) = events {
            controller = controller.with_events(events);
        }

        let analyzer: Arc<dyn DocumentAnalyzer> = Arc::new(GeminiAnalyzer::new(&config.analysis)?);

        Ok(Self {
            config,
            digest,
            controller: Arc::new(controller),
            analyzer,
            metrics,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn digest(&self) -> Arc<dyn DigestService> {
        self.digest.clone()
    }

    pub fn controller(&self) -> Arc<VerificationController> {
        self.controller.clone()
    }

    pub async fn analyze(
        &self,
        id_card: &DocumentImage,
        selfie: Option<&DocumentImage>,
    ) -> Result<KycExtraction> {
        let extraction = analyze_with_fallback(
            self.analyzer.as_ref(),
            id_card,
            selfie,
            self.config.analysis.fallback_to_demo,
        )
        .await?;
        Ok(extraction)
    }

    pub fn shutdown(&self) {
        info!("Shutting down application...");
        self.metrics.log_summary();
        info!("Application shutdown complete");
    }
}
