//! Gemini Gateway Implementation
//!
//! Calls the Google Generative Language `generateContent` endpoint and asks
//! for a JSON reply (`responseMimeType: application/json`). The model name
//! and temperature come from the [`ModelParams`] of each call; the API key
//! travels as the `key` query parameter.
//!
//! # Examples
//!
//! ```no_run
//! use pcascan_domain::{ModelGateway, ModelParams};
//! use pcascan_llm::GeminiGateway;
//!
//! let gateway = GeminiGateway::new().unwrap();
//! let params = ModelParams::new("gemini-2.5-flash", 0.1).with_api_key("secret");
//! let reply = gateway.submit("Return {\"rows\": []}", &params).unwrap();
//! ```

use crate::LlmError;
use pcascan_domain::{ModelGateway, ModelParams};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default Generative Language API endpoint
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";

/// Default timeout for a single model call (extraction prompts are long)
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Gateway for Google's Gemini models
pub struct GeminiGateway {
    endpoint: String,
    client: reqwest::blocking::Client,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    response_mime_type: &'static str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

impl GeminiGateway {
    /// Create a gateway against the public endpoint
    pub fn new() -> Result<Self, LlmError> {
        Self::with_endpoint(DEFAULT_ENDPOINT)
    }

    /// Create a gateway against a custom endpoint
    pub fn with_endpoint(endpoint: impl Into<String>) -> Result<Self, LlmError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| LlmError::Communication(format!("Failed to build client: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.endpoint, model)
    }

    fn attempt(&self, prompt: &str, params: &ModelParams, api_key: &str) -> Result<String, LlmError> {
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: params.temperature,
                response_mime_type: "application/json",
            },
        };

        let response = self
            .client
            .post(self.url(&params.model))
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .map_err(|e| LlmError::Communication(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(match status {
                reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
                    LlmError::Authentication(format!("HTTP {}: {}", status, text))
                }
                reqwest::StatusCode::NOT_FOUND => LlmError::ModelNotAvailable(params.model.clone()),
                reqwest::StatusCode::TOO_MANY_REQUESTS => LlmError::RateLimitExceeded,
                _ => LlmError::Communication(format!("HTTP {}: {}", status, text)),
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        extract_text(parsed)
    }
}

fn extract_text(response: GenerateResponse) -> Result<String, LlmError> {
    let content = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .ok_or_else(|| LlmError::InvalidResponse("No candidates in response".to_string()))?;

    Ok(content
        .parts
        .into_iter()
        .map(|p| p.text)
        .collect::<Vec<_>>()
        .concat())
}

impl ModelGateway for GeminiGateway {
    type Error = LlmError;

    fn submit(&self, prompt: &str, params: &ModelParams) -> Result<String, Self::Error> {
        let api_key = params
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(LlmError::MissingApiKey)?;

        tracing::debug!(model = %params.model, prompt_chars = prompt.len(), "Submitting prompt");

        // Single attempt; failures are fatal to the job
        let text = self.attempt(prompt, params, api_key)?;
        tracing::debug!(reply_chars = text.len(), "Model replied");
        Ok(text)
    }
}
