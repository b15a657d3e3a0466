//! Google Gemini reply-generation adapter.
//!
//! # API Reference
//!
//! - Endpoint: `POST https://generativelanguage.googleapis.com/v1beta/models/{model}:generateContent`
//! - Models: gemini-2.5-flash, gemini-2.5-pro
//! - Auth: `x-goog-api-key` header

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::base::{LlmAdapter, LlmConfig, LlmError, LlmResult};
use super::chat_api::truncate_body;

/// Gemini API base URL
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default model when none is configured
pub const GEMINI_DEFAULT_MODEL: &str = "gemini-2.5-flash";

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateContentResponse {
    fn into_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .and_then(|content| content.parts.into_iter().next())
            .and_then(|part| part.text)
    }
}

/// Gemini adapter implementation using the `generateContent` API.
pub struct GeminiAdapter {
    api_key: String,
    model: String,
    endpoint: String,
    client: reqwest::Client,
}

impl GeminiAdapter {
    /// Create a new Gemini adapter.
    ///
    /// Fails with [`LlmError::ConfigurationError`] when the API key is empty.
    pub fn new(config: LlmConfig) -> LlmResult<Self> {
        if config.api_key.is_empty() {
            return Err(LlmError::ConfigurationError(
                "Gemini API key is required".to_string(),
            ));
        }

        let model = if config.model.is_empty() {
            GEMINI_DEFAULT_MODEL.to_string()
        } else {
            config.model.clone()
        };

        let base = config.base_url.as_deref().unwrap_or(GEMINI_BASE_URL);
        let endpoint = format!(
            "{}/models/{}:generateContent",
            base.trim_end_matches('/'),
            model
        );

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            api_key: config.api_key,
            model,
            endpoint,
            client,
        })
    }

    /// The configured model identifier.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// The resolved endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl LlmAdapter for GeminiAdapter {
    async fn generate(&self, prompt: &str) -> LlmResult<String> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiStatus {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| LlmError::MalformedResponse(e.to_string()))?;

        Ok(parsed
            .into_text()
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| "[gemini] empty response".to_string()))
    }

    fn provider_info(&self) -> &'static str {
        "Google Gemini"
    }
}
