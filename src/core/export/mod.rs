//! Export of a verified record as a downloadable identity card.

pub mod json;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

use crate::core::identity::VerificationRecord;

pub use json::JsonCardExporter;

pub const CARD_TITLE: &str = "KYC VERIFIED STATUS";
pub const CARD_BADGE: &str = "KYC CONFIRMED";
pub const CARD_FOOTER: &str = "BLOCKCHAIN SECURED • IMMUTABLE • DECENTRALIZED";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to render card: {0}")]
    Render(String),

    #[error("Failed to write card: {0}")]
    Write(#[from] std::io::Error),
}

/// What the card shows when the record has no photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum CardImage {
    Photo(String),
    /// QR code encoding the fingerprint.
    QrCode(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportPayload {
    pub title: &'static str,
    pub badge: &'static str,
    pub full_name: String,
    pub dob: String,
    pub gender: String,
    pub phone: Option<String>,
    pub image: CardImage,
    pub fingerprint: String,
    pub fingerprint_short: String,
    pub footer: &'static str,
    pub verified_at: DateTime<Utc>,
    pub file_stem: String,
}

impl ExportPayload {
    pub fn from_record(record: &VerificationRecord) -> Self {
        let image = match &record.photo_url {
            Some(url) => CardImage::Photo(url.clone()),
            None => CardImage::QrCode(record.fingerprint.to_string()),
        };

        Self {
            title: CARD_TITLE,
            badge: CARD_BADGE,
            full_name: record.full_name.clone(),
            dob: record.dob.clone(),
            gender: record.gender.clone(),
            phone: record.phone.clone(),
            image,
            fingerprint: record.fingerprint.to_string(),
            fingerprint_short: record.fingerprint.abbreviated(),
            footer: CARD_FOOTER,
            verified_at: record.verified_at,
            file_stem: format!("SmartID-{}", sanitize_file_name(&record.full_name)),
        }
    }
}

/// Where a rendered card ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub path: PathBuf,
    pub size: usize,
}

/// Renders a card from a payload. Called synchronously by the workflow.
#[cfg_attr(test, mockall::automock)]
pub trait ExportService: Send + Sync {
    fn render(&self, payload: &ExportPayload) -> Result<ExportArtifact, ExportError>;
}

fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim().trim_start_matches('.');
    if cleaned.is_empty() {
        "unnamed".to_string()
    } else {
        cleaned.to_string()
    }
}
