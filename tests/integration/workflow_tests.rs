// tests/integration/workflow_tests.rs
use futures::future::join_all;
use std::time::Duration;

use crate::common::{jane_doe, manual_fingerprint, other_fingerprint, FakeLedger, TestContext};
use docverify::{
    core::{
        crypto::{DigestService, Sha256Digest},
        services::{Notice, WorkflowEvent, WorkflowState},
    },
    utils::error::VerifyError,
};

fn drain(ctx: &mut TestContext) -> Vec<WorkflowEvent> {
    let mut events = Vec::new();
    while let Ok(event) = ctx.events.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn test_unknown_ten_byte_file_is_not_found() {
    let mut ctx = TestContext::new(FakeLedger::new());

    let state = ctx
        .controller
        .submit_file(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10])
        .await
        .expect("submission resolves");

    assert_eq!(state, WorkflowState::NotFound);
    assert_eq!(state.status_message(), "Verification failed");
    assert!(ctx.controller.state().record().is_none());
    assert_eq!(ctx.ledger.fetches(), 0);

    let notices: Vec<_> = drain(&mut ctx)
        .into_iter()
        .filter_map(|e| match e {
            WorkflowEvent::Notice(n) => Some(n),
            _ => None,
        })
        .collect();
    assert_eq!(notices.len(), 1);
    assert!(notices[0].message().contains("not found"));
}

#[tokio::test]
async fn test_manual_fingerprint_verifies_jane_doe() {
    let fp = manual_fingerprint();
    let ctx = TestContext::new(FakeLedger::new().with_record(&fp, jane_doe()));

    let state = ctx.controller.submit_fingerprint(&fp).await.unwrap();

    let record = state.record().expect("verified");
    assert_eq!(record.fingerprint.as_str(), fp);
    assert_eq!(record.full_name, "Jane Doe");
    assert_eq!(record.dob, "1990-01-01");
    assert_eq!(record.gender, "Female");
    assert_eq!(record.email.as_deref(), Some("jane@example.com"));
    assert!(record.passport.is_none());
    assert!(!record.verified_at.to_rfc3339().is_empty());
    assert_eq!(ctx.ledger.lookups(), 1);
    assert_eq!(ctx.ledger.fetches(), 1);
}

#[tokio::test]
async fn test_registered_file_verifies_by_content() {
    let document = b"scanned passport page".to_vec();
    let fp = Sha256Digest::new().digest(&document).unwrap();
    let ctx = TestContext::new(FakeLedger::new().with_record(fp.as_str(), jane_doe()));

    let state = ctx.controller.submit_file(&document).await.unwrap();
    assert_eq!(state.record().unwrap().fingerprint, fp);
}

#[tokio::test]
async fn test_connectivity_error_blocks_export() {
    let ctx = TestContext::new(FakeLedger::new().unreachable("connection refused"));

    let state = ctx.controller.submit_fingerprint(&manual_fingerprint()).await.unwrap();

    match &state {
        WorkflowState::ConnectionError { reason } => assert!(reason.contains("connection refused")),
        other => panic!("expected ConnectionError, got {:?}", other),
    }
    assert!(state.record().is_none());
    assert!(matches!(ctx.controller.export_current(), Err(VerifyError::NotVerified)));
    assert!(ctx.exporter.rendered.lock().is_empty());
}

#[tokio::test]
async fn test_stale_completion_does_not_clobber_newer_attempt() {
    let slow = manual_fingerprint();
    let ledger = FakeLedger::new().with_record(&slow, jane_doe());
    let gate = ledger.gate(&slow);
    let ctx = TestContext::new(ledger);
    let mut state_rx = ctx.controller.subscribe();

    let first = tokio::spawn({
        let controller = ctx.controller.clone();
        let slow = slow.clone();
        async move { controller.submit_fingerprint(&slow).await }
    });
    state_rx.wait_for(|s| s.is_scanning()).await.unwrap();

    ctx.controller.reset();
    let second = ctx.controller.submit_fingerprint(&other_fingerprint()).await.unwrap();
    assert_eq!(second, WorkflowState::NotFound);

    gate.notify_one();
    let first = first.await.unwrap();

    assert!(matches!(first, Err(VerifyError::Superseded(_))));
    assert_eq!(ctx.controller.state(), WorkflowState::NotFound);
    assert_eq!(ctx.controller.metrics().snapshot().superseded, 1);
}

#[tokio::test]
async fn test_reset_while_scanning_stays_idle() {
    let fp = manual_fingerprint();
    let ledger = FakeLedger::new().with_record(&fp, jane_doe());
    let gate = ledger.gate(&fp);
    let ctx = TestContext::new(ledger);
    let mut state_rx = ctx.controller.subscribe();

    let pending = tokio::spawn({
        let controller = ctx.controller.clone();
        async move { controller.submit_fingerprint(&manual_fingerprint()).await }
    });
    state_rx.wait_for(|s| s.is_scanning()).await.unwrap();

    ctx.controller.reset();
    assert_eq!(ctx.controller.state(), WorkflowState::Idle);

    gate.notify_one();
    assert!(matches!(pending.await.unwrap(), Err(VerifyError::Superseded(_))));
    assert_eq!(ctx.controller.state(), WorkflowState::Idle);
    assert!(ctx.exporter.rendered.lock().is_empty());
}

#[tokio::test]
async fn test_only_one_submission_in_flight() {
    let ctx = TestContext::with_delay(FakeLedger::new(), Duration::from_millis(50));

    let results = join_all((0..5).map(|_| ctx.controller.submit_fingerprint("0x00"))).await;

    let resolved = results.iter().filter(|r| r.is_ok()).count();
    let busy = results
        .iter()
        .filter(|r| matches!(r, Err(VerifyError::Busy)))
        .count();
    assert_eq!(resolved, 1);
    assert_eq!(busy, 4);
    assert_eq!(ctx.controller.metrics().snapshot().submissions, 1);
}

#[tokio::test]
async fn test_scan_delay_is_observed() {
    let ctx = TestContext::with_delay(FakeLedger::new(), Duration::from_millis(40));

    let started = std::time::Instant::now();
    ctx.controller.submit_fingerprint(&manual_fingerprint()).await.unwrap();
    assert!(started.elapsed() >= Duration::from_millis(40));
}

#[tokio::test]
async fn test_events_follow_transitions() {
    let fp = manual_fingerprint();
    let mut ctx = TestContext::new(FakeLedger::new().with_record(&fp, jane_doe()));

    ctx.controller.submit_fingerprint(&fp).await.unwrap();
    ctx.controller.export_current().unwrap();
    ctx.controller.reset();

    let events = drain(&mut ctx);
    let states: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            WorkflowEvent::StateChanged { state, .. } => Some(state.status_message()),
            _ => None,
        })
        .collect();
    assert_eq!(
        states,
        vec!["Scanning ledger...", "Verified successfully", "Ready to scan"]
    );
    assert!(events
        .iter()
        .any(|e| matches!(e, WorkflowEvent::Notice(Notice::Exported { .. }))));

    let rendered = ctx.exporter.rendered.lock();
    assert_eq!(rendered.len(), 1);
    assert_eq!(rendered[0].full_name, "Jane Doe");
    assert_eq!(rendered[0].phone.as_deref(), Some("+1 555 0100"));
}

#[tokio::test]
async fn test_export_writes_card_file() {
    let dir = tempfile::tempdir().unwrap();
    let fp = manual_fingerprint();
    let controller =
        TestContext::with_card_exporter(FakeLedger::new().with_record(&fp, jane_doe()), dir.path());

    controller.submit_fingerprint(&fp).await.unwrap();
    let artifact = controller.export_current().unwrap();

    assert_eq!(artifact.path, dir.path().join("SmartID-Jane Doe.json"));
    let card: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&artifact.path).unwrap()).unwrap();
    assert_eq!(card["fingerprint"], fp.as_str());
    assert_eq!(card["title"], "KYC VERIFIED STATUS");
}
