//! DeepSeek reply-generation adapter.
//!
//! # API Reference
//!
//! - Endpoint: `POST https://api.deepseek.com/v1/chat/completions`
//! - Models: deepseek-chat, deepseek-reasoner
//! - Auth: `Authorization: Bearer <api key>`

use std::time::Duration;

use async_trait::async_trait;

use super::base::{LlmAdapter, LlmConfig, LlmError, LlmResult};
use super::chat_api::{ChatCompletionsRequest, ChatCompletionsResponse, truncate_body};

/// DeepSeek chat-completions endpoint
pub const DEEPSEEK_CHAT_URL: &str = "https://api.deepseek.com/v1/chat/completions";

/// Default model when none is configured
pub const DEEPSEEK_DEFAULT_MODEL: &str = "deepseek-chat";

/// DeepSeek adapter implementation using the chat-completions API.
pub struct DeepSeekAdapter {
    api_key: String,
    model: String,
    endpoint: String,
    client: reqwest::Client,
}

impl DeepSeekAdapter {
    /// Create a new DeepSeek adapter.
    ///
    /// Fails with [`LlmError::ConfigurationError`] when the API key is empty.
    pub fn new(config: LlmConfig) -> LlmResult<Self> {
        if config.api_key.is_empty() {
            return Err(LlmError::ConfigurationError(
                "DeepSeek API key is required".to_string(),
            ));
        }

        let model = if config.model.is_empty() {
            DEEPSEEK_DEFAULT_MODEL.to_string()
        } else {
            config.model.clone()
        };

        // base_url override is used by tests to point at a mock server
        let endpoint = match &config.base_url {
            Some(base) => format!("{}/v1/chat/completions", base.trim_end_matches('/')),
            None => DEEPSEEK_CHAT_URL.to_string(),
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

    /// The resolved endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl LlmAdapter for DeepSeekAdapter {
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
            .unwrap_or_else(|| "[deepseek] empty response".to_string()))
    }

    fn provider_info(&self) -> &'static str {
        "DeepSeek Chat Completions"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_api_key_rejected() {
        let result = DeepSeekAdapter::new(LlmConfig::default());
        assert!(matches!(result, Err(LlmError::ConfigurationError(_))));
    }

    #[test]
    fn test_default_model_and_endpoint() {
        let adapter = DeepSeekAdapter::new(LlmConfig {
            api_key: "sk-test".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(adapter.model(), DEEPSEEK_DEFAULT_MODEL);
        assert_eq!(adapter.endpoint(), DEEPSEEK_CHAT_URL);
        assert_eq!(adapter.provider_info(), "DeepSeek Chat Completions");
    }

    #[test]
    fn test_base_url_override() {
        let adapter = DeepSeekAdapter::new(LlmConfig {
            api_key: "sk-test".to_string(),
            base_url: Some("http://127.0.0.1:8081/".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(adapter.endpoint(), "http://127.0.0.1:8081/v1/chat/completions");
    }
}
