// tests/integration/ledger_tests.rs
use std::sync::Arc;

use crate::common::jane_doe;
use docverify::{
    blockchain::{
        abi::{self, GET_DETAILS, VERIFY_DOCUMENT},
        LedgerClient, MemoryLedger,
    },
    core::{
        crypto::{DigestService, Sha256Digest},
        identity::Fingerprint,
        services::WorkflowState,
    },
    utils::config::Config,
    Application,
};

#[test]
fn test_registry_calldata_uses_distinct_selectors() {
    let fp = Fingerprint::parse(&format!("0x{}", "ab".repeat(32))).unwrap();
    let verify = abi::encode_bytes32_call(VERIFY_DOCUMENT, &fp.to_bytes());
    let details = abi::encode_bytes32_call(GET_DETAILS, &fp.to_bytes());

    assert_ne!(verify[..4], details[..4]);
    assert_eq!(verify[4..], details[4..]);
}

#[test]
fn test_record_tuple_survives_abi_encoding() {
    let fields = [
        "Jane Doe", "1990-01-01", "Female", "", "+1 555 0100", "jane@example.com", "", "", "", "",
        "", "",
    ];
    let decoded = abi::decode_record(&abi::encode_strings(&fields)).unwrap();
    assert_eq!(decoded.full_name, "Jane Doe");
    assert_eq!(decoded.phone, "+1 555 0100");
    assert_eq!(decoded.photo_url, "");
}

#[tokio::test]
async fn test_application_with_offline_ledger() {
    let dir = tempfile::tempdir().unwrap();
    let document = b"diploma scan".to_vec();
    let fp = Sha256Digest::new().digest(&document).unwrap();

    let ledger_path = dir.path().join("ledger.json");
    let mut records = std::collections::HashMap::new();
    records.insert(fp.clone(), jane_doe());
    std::fs::write(&ledger_path, serde_json::to_string(&records).unwrap()).unwrap();

    let mut config = Config::defaults().unwrap();
    config.workflow.scan_delay_ms = 0;
    config.export.output_dir = dir.path().join("cards");

    let app = Application::with_ledger_file(config, &ledger_path, None).await.unwrap();
    let controller = app.controller();

    let state = controller.submit_file(&document).await.unwrap();
    assert!(matches!(state, WorkflowState::Verified(_)));

    let artifact = controller.export_current().unwrap();
    assert!(artifact.path.starts_with(dir.path().join("cards")));
    assert!(artifact.path.exists());

    controller.reset();
    let state = controller.submit_file(b"unregistered").await.unwrap();
    assert_eq!(state, WorkflowState::NotFound);
    app.shutdown();
}

#[tokio::test]
async fn test_application_without_provider_reports_connection_error() {
    let mut config = Config::defaults().unwrap();
    config.workflow.scan_delay_ms = 0;

    let app = Application::new(config, None).await.unwrap();
    let state = app
        .controller()
        .submit_fingerprint(&format!("0x{}", "ab".repeat(32)))
        .await
        .unwrap();

    match state {
        WorkflowState::ConnectionError { reason } => assert!(reason.contains("No ledger provider")),
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test]
async fn test_memory_ledger_through_trait_object() {
    let ledger: Arc<dyn LedgerClient> = Arc::new(MemoryLedger::new());
    let fp = Fingerprint::parse(&format!("0x{}", "00".repeat(32))).unwrap();
    assert!(!ledger.lookup(&fp).await.unwrap());
}
