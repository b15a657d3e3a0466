//! OpenAI reply-generation adapter.
//!
//! # API Reference
//!
//! - Endpoint: `POST https://api.openai.com/v1/chat/completions`
//! - Models: gpt-4o, gpt-4o-mini, gpt-4.1
//! - Auth: `Authorization: Bearer <api key>`

use std::time::Duration;

use async_trait::async_trait;

use super::base::{LlmAdapter, LlmConfig, LlmError, LlmResult};
use super::chat_api::{ChatCompletionsRequest, ChatCompletionsResponse, truncate_body};

/// OpenAI chat-completions endpoint
pub const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Default model when none is configured
pub const OPENAI_DEFAULT_MODEL: &str = "gpt-4o-mini";

/// OpenAI adapter implementation using the chat-completions API.
pub struct OpenAiAdapter {
    api_key: String,
    model: String,
    endpoint: String,
    client: reqwest::Client,
}

impl OpenAiAdapter {
    /// Create a new OpenAI adapter.
    ///
    /// Fails with [`LlmError::ConfigurationError`] when the API key is empty.
    pub fn new(config: LlmConfig) -> LlmResult<Self> {
        if config.api_key.is_empty() {
            return Err(LlmError::ConfigurationError(
                "OpenAI API key is required".to_string(),
            ));
        }

        let model = if config.model.is_empty() {
            OPENAI_DEFAULT_MODEL.to_string()
        } else {
            config.model.clone()
        };

        let endpoint = match &config.base_url {
            Some(base) => format!("{}/v1/chat/completions", base.trim_end_matches('/')),
            None => OPENAI_CHAT_URL.to_string(),
        };

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
}

#[async_trait]
impl LlmAdapter for OpenAiAdapter {
    async fn generate(&self, prompt: &str) -> LlmResult<String> {
        let body = ChatCompletionsRequest::from_prompt(&self.model, prompt);

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
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

        let parsed: ChatCompletionsResponse = response
            .json()
            .await
            .map_err(|e| LlmError::MalformedResponse(e.to_string()))?;

        Ok(parsed
            .into_content()
            .filter(|content| !content.is_empty())
            .unwrap_or_else(|| "[openai] empty response".to_string()))
    }

    fn provider_info(&self) -> &'static str {
        "OpenAI Chat Completions"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_api_key_rejected() {
        let result = OpenAiAdapter::new(LlmConfig::default());
        assert!(matches!(result, Err(LlmError::ConfigurationError(_))));
    }

    #[test]
    fn test_default_model() {
        let adapter = OpenAiAdapter::new(LlmConfig {
            api_key: "sk-test".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(adapter.model(), OPENAI_DEFAULT_MODEL);
        assert_eq!(adapter.provider_info(), "OpenAI Chat Completions");
    }
}
