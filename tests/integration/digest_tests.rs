// tests/integration/digest_tests.rs
use docverify::core::{
    crypto::{digest_file, DigestService, Sha256Digest},
    identity::fingerprint::FINGERPRINT_LEN,
};

#[test]
fn test_digest_is_deterministic_and_well_formed() {
    let service = Sha256Digest::new();
    let inputs: [&[u8]; 4] = [b"", b"a", b"identity card", &[0u8; 4096]];

    for input in inputs {
        let first = service.digest(input).expect("digest");
        let second = service.digest(input).expect("digest");
        assert_eq!(first, second);
        assert_eq!(first.as_str().len(), FINGERPRINT_LEN);
        assert!(first.as_str().starts_with("0x"));
        assert!(first.as_str()[2..]
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }
}

#[tokio::test]
async fn test_file_and_memory_digests_agree() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("certificate.pdf");
    let content: Vec<u8> = (0..=255u8).cycle().take(10_000).collect();
    std::fs::write(&path, &content).unwrap();

    let service = Sha256Digest::new();
    assert_eq!(
        digest_file(&service, &path).await.unwrap(),
        service.digest(&content).unwrap()
    );
}
