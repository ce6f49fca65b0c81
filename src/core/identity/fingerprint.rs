// src/core/identity/fingerprint.rs
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::utils::error::{Result, VerifyError};

/// Size of the underlying digest in bytes (SHA-256).
pub const DIGEST_LEN: usize = 32;
/// Length of the rendered fingerprint: `0x` plus two hex digits per byte.
pub const FINGERPRINT_LEN: usize = 2 + DIGEST_LEN * 2;

/// A document fingerprint, rendered as `0x` followed by 64 lowercase hex digits.
///
/// Parsing is strict: the prefix must be `0x` and the digits lowercase. Input
/// is not trimmed or case-normalised; that is the caller's job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn parse(value: &str) -> Result<Self> {
        if value.len() != FINGERPRINT_LEN {
            return Err(VerifyError::InvalidFingerprint(format!(
                "expected {} characters, got {}",
                FINGERPRINT_LEN,
                value.len()
            )));
        }

        let digits = value.strip_prefix("0x").ok_or_else(|| {
            VerifyError::InvalidFingerprint("missing 0x prefix".into())
        })?;

        if let Some(bad) = digits
            .chars()
            .find(|c| !matches!(c, '0'..='9' | 'a'..='f'))
        {
            return Err(VerifyError::InvalidFingerprint(format!(
                "unexpected character {:?}",
                bad
            )));
        }

        Ok(Self(value.to_owned()))
    }

    pub fn from_digest(digest: &[u8; DIGEST_LEN]) -> Self {
        Self(format!("0x{}", hex::encode(digest)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The raw 32 bytes, as passed to a `bytes32` contract argument.
    pub fn to_bytes(&self) -> [u8; DIGEST_LEN] {
        let mut out = [0u8; DIGEST_LEN];
        // Format is checked on construction.
        if let Ok(decoded) = hex::decode(&self.0[2..]) {
            out.copy_from_slice(&decoded);
        }
        out
    }

    /// First and last 16 characters joined by an ellipsis, for compact display.
    pub fn abbreviated(&self) -> String {
        format!("{}...{}", &self.0[..16], &self.0[self.0.len() - 16..])
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Fingerprint {
    type Err = VerifyError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Fingerprint {
    type Error = VerifyError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Fingerprint> for String {
    fn from(fingerprint: Fingerprint) -> Self {
        fingerprint.0
    }
}
