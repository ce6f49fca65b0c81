//! KYC document analysis: field extraction and tamper screening of an ID card
//! image (optionally matched against a selfie) by a generative model.

pub mod gemini;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

pub use gemini::GeminiAnalyzer;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("No API key configured for document analysis")]
    MissingApiKey,

    #[error("Analysis request failed: {0}")]
    Request(String),

    #[error("Model returned no text")]
    EmptyResponse,

    #[error("Model response is not valid extraction JSON: {0}")]
    InvalidResponse(String),

    #[error("Invalid image: {0}")]
    InvalidImage(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentImage {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl DocumentImage {
    pub fn new(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data,
        }
    }

    /// Accepts raw base64 or a `data:image/...;base64,` URL as produced by a
    /// webcam capture. Without a header the image is assumed to be JPEG.
    pub fn from_base64(value: &str) -> Result<Self, AnalysisError> {
        let (mime_type, payload) = match value.strip_prefix("data:") {
            Some(rest) => {
                let (header, payload) = rest
                    .split_once(',')
                    .ok_or_else(|| AnalysisError::InvalidImage("data URL has no payload".into()))?;
                let mime = header.strip_suffix(";base64").ok_or_else(|| {
                    AnalysisError::InvalidImage("data URL is not base64 encoded".into())
                })?;
                if !mime.starts_with("image/") {
                    return Err(AnalysisError::InvalidImage(format!("unsupported type {}", mime)));
                }
                (mime.to_string(), payload)
            }
            None => ("image/jpeg".to_string(), value),
        };

        let data = STANDARD
            .decode(payload.trim())
            .map_err(|e| AnalysisError::InvalidImage(e.to_string()))?;
        Ok(Self { mime_type, data })
    }

    /// Resolves a command line image argument: a `data:` URL is decoded in
    /// place, anything else is read as a file path.
    pub async fn from_source(value: &str) -> Result<Self, AnalysisError> {
        if value.starts_with("data:") {
            return Self::from_base64(value);
        }

        let path = std::path::Path::new(value);
        let data = tokio::fs::read(path)
            .await
            .map_err(|e| AnalysisError::InvalidImage(format!("failed to read {}: {}", value, e)))?;
        Ok(Self::new(Self::mime_for_path(path), data))
    }

    /// Guesses the MIME type from a file extension.
    pub fn mime_for_path(path: &std::path::Path) -> &'static str {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("png") => "image/png",
            Some("webp") => "image/webp",
            Some("gif") => "image/gif",
            Some("pdf") => "application/pdf",
            _ => "image/jpeg",
        }
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.data)
    }
}

/// Fields read off an ID card. Unreadable fields are `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KycExtraction {
    pub full_name: Option<String>,
    pub dob: Option<String>,
    pub gender: Option<String>,
    pub id_number: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub is_tampered: bool,
    /// Face match between ID photo and selfie, 0 to 100. Fractional and
    /// quoted scores are rounded and clamped; anything else reads as `None`.
    #[serde(deserialize_with = "lenient_score")]
    pub match_score: Option<u8>,
    /// Set when the values are placeholders rather than a real analysis.
    pub mock: bool,
}

impl KycExtraction {
    /// Placeholder values shown when analysis is unavailable and the demo
    /// fallback is enabled.
    pub fn demo() -> Self {
        Self {
            full_name: Some("John Doe (Demo)".into()),
            dob: Some("1995-08-15".into()),
            gender: Some("Male".into()),
            id_number: Some("ABCDE1234F".into()),
            address: Some("123 Blockchain Street, Crypto City, 560001".into()),
            phone: None,
            is_tampered: false,
            match_score: Some(92),
            mock: true,
        }
    }
}

fn lenient_score<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let score = match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().trim_end_matches('%').parse::<f64>().ok(),
        _ => None,
    };
    Ok(score
        .filter(|s| s.is_finite())
        .map(|s| s.round().clamp(0.0, 100.0) as u8))
}

#[async_trait]
pub trait DocumentAnalyzer: Send + Sync {
    async fn analyze(
        &self,
        id_card: &DocumentImage,
        selfie: Option<&DocumentImage>,
    ) -> Result<KycExtraction, AnalysisError>;
}

/// Parses model output, tolerating a surrounding markdown code fence.
pub fn parse_model_response(text: &str) -> Result<KycExtraction, AnalysisError> {
    let cleaned = text.replace("```json", "").replace("```", "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return Err(AnalysisError::EmptyResponse);
    }
    serde_json::from_str(cleaned).map_err(|e| AnalysisError::InvalidResponse(e.to_string()))
}

/// Runs the analyzer; on failure returns [`KycExtraction::demo`] when
/// `fallback_to_demo` is set, otherwise the error.
pub async fn analyze_with_fallback(
    analyzer: &dyn DocumentAnalyzer,
    id_card: &DocumentImage,
    selfie: Option<&DocumentImage>,
    fallback_to_demo: bool,
) -> Result<KycExtraction, AnalysisError> {
    match analyzer.analyze(id_card, selfie).await {
        Ok(extraction) => Ok(extraction),
        Err(e) if fallback_to_demo => {
            warn!("Document analysis failed, returning demo data: {}", e);
            Ok(KycExtraction::demo())
        }
        Err(e) => Err(e),
    }
}
