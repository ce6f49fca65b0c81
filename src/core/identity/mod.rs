pub mod fingerprint;
pub mod types;

pub use fingerprint::Fingerprint;
pub use types::{RecordFields, VerificationRecord, VerificationRequest};
