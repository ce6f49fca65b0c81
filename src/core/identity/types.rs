// src/core/identity/types.rs
use serde::{Serialize, Deserialize};
use chrono::{DateTime, Utc};

use super::fingerprint::Fingerprint;

/// One user action against the workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationRequest {
    File(Vec<u8>),
    ManualHash(String),
}

/// The fixed, ordered tuple the ledger returns for a registered fingerprint.
/// Empty strings mean the field was not provided at registration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecordFields {
    pub full_name: String,
    pub dob: String,
    pub gender: String,
    pub physical_address: String,
    pub phone: String,
    pub email: String,
    pub national_id: String,
    pub tax_id: String,
    pub passport: String,
    pub driving_license: String,
    pub voter_id: String,
    pub photo_url: String,
}

pub const RECORD_FIELD_COUNT: usize = 12;

impl RecordFields {
    /// Builds the record from the ledger's positional tuple.
    pub fn from_tuple(values: [String; RECORD_FIELD_COUNT]) -> Self {
        let [full_name, dob, gender, physical_address, phone, email, national_id, tax_id, passport, driving_license, voter_id, photo_url] =
            values;
        Self {
            full_name,
            dob,
            gender,
            physical_address,
            phone,
            email,
            national_id,
            tax_id,
            passport,
            driving_license,
            voter_id,
            photo_url,
        }
    }
}

/// A verified identity record. Only built after a successful ledger lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRecord {
    pub fingerprint: Fingerprint,
    pub full_name: String,
    pub dob: String,
    pub gender: String,
    pub physical_address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub national_id: Option<String>,
    pub tax_id: Option<String>,
    pub passport: Option<String>,
    pub driving_license: Option<String>,
    pub voter_id: Option<String>,
    pub photo_url: Option<String>,
    pub verified_at: DateTime<Utc>,
}

fn optional(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

impl VerificationRecord {
    pub fn new(fingerprint: Fingerprint, fields: RecordFields, verified_at: DateTime<Utc>) -> Self {
        Self {
            fingerprint,
            full_name: fields.full_name,
            dob: fields.dob,
            gender: fields.gender,
            physical_address: optional(fields.physical_address),
            phone: optional(fields.phone),
            email: optional(fields.email),
            national_id: optional(fields.national_id),
            tax_id: optional(fields.tax_id),
            passport: optional(fields.passport),
            driving_license: optional(fields.driving_license),
            voter_id: optional(fields.voter_id),
            photo_url: optional(fields.photo_url),
            verified_at,
        }
    }
}
