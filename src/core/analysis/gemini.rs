use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::{parse_model_response, AnalysisError, DocumentAnalyzer, DocumentImage, KycExtraction};
use crate::utils::config::AnalysisConfig;

const EXTRACTION_PROMPT: &str = r#"You verify identity documents for a KYC check.

From the ID card image, read:
- fullName
- dob, formatted YYYY-MM-DD
- gender
- idNumber (national ID, tax ID or passport number)
- address, shortened to city, state and postal code
- phone, if printed on the card

If a second image (a selfie) is attached, compare its face with the card photo
and report a matchScore from 0 to 100.

Use null for any field you cannot read clearly. Set isTampered to true if the
card shows signs of digital editing.

Reply with only this JSON object:
{"fullName": "...", "dob": "...", "gender": "...", "idNumber": "...", "address": "...", "phone": "...", "matchScore": 0, "isTampered": false}"#;

/// Calls the `generateContent` REST endpoint of a Gemini model.
pub struct GeminiAnalyzer {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GeminiAnalyzer {
    pub fn new(config: &AnalysisConfig) -> Result<Self, AnalysisError> {
        let http = reqwest::Client::builder()
            .timeout(config.get_request_timeout())
            .build()
            .map_err(|e| AnalysisError::Request(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
        })
    }

    fn request_body(id_card: &DocumentImage, selfie: Option<&DocumentImage>) -> Value {
        let mut parts = vec![json!({ "text": EXTRACTION_PROMPT })];
        for image in std::iter::once(id_card).chain(selfie) {
            parts.push(json!({
                "inline_data": {
                    "mime_type": image.mime_type,
                    "data": image.to_base64(),
                }
            }));
        }
        json!({ "contents": [{ "parts": parts }] })
    }
}

fn response_text(response: GenerateResponse) -> Result<String, AnalysisError> {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(AnalysisError::EmptyResponse);
    }
    Ok(text)
}

#[async_trait]
impl DocumentAnalyzer for GeminiAnalyzer {
    async fn analyze(
        &self,
        id_card: &DocumentImage,
        selfie: Option<&DocumentImage>,
    ) -> Result<KycExtraction, AnalysisError> {
        let api_key = self.api_key.as_deref().ok_or(AnalysisError::MissingApiKey)?;
        let url = format!("{}/models/{}:generateContent", self.endpoint, self.model);

        debug!(model = %self.model, with_selfie = selfie.is_some(), "Requesting document analysis");
        let response = self
            .http
            .post(&url)
            .query(&[("key", api_key)])
            .json(&Self::request_body(id_card, selfie))
            .send()
            .await
            .map_err(|e| AnalysisError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AnalysisError::Request(format!("model endpoint returned {}", status)));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::InvalidResponse(e.to_string()))?;
        let extraction = parse_model_response(&response_text(body)?)?;

        info!(tampered = extraction.is_tampered, "Document analysis complete");
        Ok(extraction)
    }
}
