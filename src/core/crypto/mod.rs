pub mod digest;

pub use digest::{digest_file, DigestService, Sha256Digest};
