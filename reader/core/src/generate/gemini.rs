//! Gemini Backend Implementation
//!
//! Text generation against the Gemini `generateContent` REST endpoint.
//!
//! The response body is deserialized into a strict schema; anything that does
//! not carry candidate text (missing fields, empty candidates, error bodies)
//! is reported as a [`GenerateError`] rather than indexed into blindly.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::traits::{GenerateError, GenerationOptions, TextGenerator};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Gemini REST client
#[derive(Clone)]
pub struct GeminiClient {
    api_key: String,
    model: String,
    base_url: String,
    http_client: reqwest::Client,
}

impl GeminiClient {
    /// Create a new client for the given API key and model
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            http_client: reqwest::Client::builder()
                .timeout(Duration::from_secs(60))
                .build()
                .expect("Failed to create HTTP client"),
        }
    }

    /// Create from environment variables (`GEMINI_API_KEY`, `ARCANA_MODEL`)
    #[must_use]
    pub fn from_env() -> Self {
        let api_key = std::env::var("GEMINI_API_KEY").unwrap_or_default();
        let model =
            std::env::var("ARCANA_MODEL").unwrap_or_else(|_| "gemini-2.0-flash".to_string());
        Self::new(api_key, model)
    }

    /// Override the endpoint base URL (local proxies, tests)
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        )
    }

    fn model_url(&self) -> String {
        format!("{}/{}?key={}", self.base_url, self.model, self.api_key)
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    fn name(&self) -> &'static str {
        "Gemini"
    }

    async fn health_check(&self) -> bool {
        self.http_client
            .get(self.model_url())
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, GenerateError> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: options.temperature,
                top_p: options.top_p,
                top_k: options.top_k,
                max_output_tokens: options.max_output_tokens,
            },
        };

        let response = self
            .http_client
            .post(self.generate_url())
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(GenerateError::BadStatus { status, message });
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| GenerateError::MalformedResponse(e.to_string()))?;

        extract_text(parsed)
    }
}

/// Pull the first candidate's text out of a response, or report why not
fn extract_text(response: GenerateContentResponse) -> Result<String, GenerateError> {
    let candidate = response
        .candidates
        .and_then(|mut c| if c.is_empty() { None } else { Some(c.remove(0)) })
        .ok_or(GenerateError::EmptyResponse)?;

    let text = candidate
        .content
        .and_then(|content| content.parts.into_iter().find_map(|p| p.text))
        .ok_or(GenerateError::EmptyResponse)?;

    if text.trim().is_empty() {
        return Err(GenerateError::EmptyResponse);
    }

    Ok(text)
}

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}
