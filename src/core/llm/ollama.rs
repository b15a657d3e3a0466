//! Ollama local inference adapter.
//!
//! # API Reference
//!
//! - Endpoint: `POST {base_url}/api/generate` (default `http://localhost:11434`)
//! - Models: whatever the local daemon has pulled (default llama3)
//! - Streaming: newline-delimited JSON objects, last one carries `"done": true`

use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};

use super::base::{LlmAdapter, LlmConfig, LlmError, LlmResult};
use super::chat_api::truncate_body;
use super::stream::StreamSink;

/// Default base URL of a locally running Ollama daemon
pub const OLLAMA_DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Default model when none is configured
pub const OLLAMA_DEFAULT_MODEL: &str = "llama3";

#[derive(Debug, Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct OllamaGenerateResponse {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    done: bool,
}

/// Ollama adapter implementation.
///
/// The only HTTP adapter with true streaming support: `generate_stream`
/// forwards the daemon's incremental output chunk by chunk.
pub struct OllamaAdapter {
    model: String,
    endpoint: String,
    client: reqwest::Client,
}

impl OllamaAdapter {
    /// Create a new Ollama adapter. No API key involved; the base URL must
    /// have been validated by configuration loading.
    pub fn new(config: LlmConfig) -> LlmResult<Self> {
        let model = if config.model.is_empty() {
            OLLAMA_DEFAULT_MODEL.to_string()
        } else {
            config.model.clone()
        };

        let base = config
            .base_url
            .as_deref()
            .unwrap_or(OLLAMA_DEFAULT_BASE_URL);
        let endpoint = format!("{}/api/generate", base.trim_end_matches('/'));

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
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
impl LlmAdapter for OllamaAdapter {
    async fn generate(&self, prompt: &str) -> LlmResult<String> {
        let body = OllamaGenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        let response = self.client.post(&self.endpoint).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiStatus {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let parsed: OllamaGenerateResponse = response
            .json()
            .await
            .map_err(|e| LlmError::MalformedResponse(e.to_string()))?;

        Ok(parsed
            .response
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| "[ollama] empty response".to_string()))
    }

    async fn generate_stream(&self, prompt: &str, sink: StreamSink) -> LlmResult<()> {
        let body = OllamaGenerateRequest {
            model: &self.model,
            prompt,
            stream: true,
        };

        let response = self.client.post(&self.endpoint).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiStatus {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let mut bytes = response.bytes_stream();
        let mut buffer: Vec<u8> = Vec::new();

        while let Some(item) = bytes.next().await {
            let data = match item {
                Ok(data) => data,
                Err(e) => {
                    // Before the first chunk this is an initiation failure the
                    // orchestrator may retry; after it, the stream is terminal.
                    if sink.has_emitted() {
                        sink.fail(e.to_string()).await;
                        return Ok(());
                    }
                    return Err(e.into());
                }
            };

            buffer.extend_from_slice(&data);

            while let Some(pos) = buffer.iter().position(|&b| b == b'\n') {
                let line: Vec<u8> = buffer.drain(..=pos).collect();
                let line = &line[..line.len() - 1];
                if line.is_empty() {
                    continue;
                }

                let parsed: OllamaGenerateResponse = match serde_json::from_slice(line) {
                    Ok(parsed) => parsed,
                    Err(e) => {
                        if sink.has_emitted() {
                            sink.fail(format!("malformed stream line: {e}")).await;
                            return Ok(());
                        }
                        return Err(LlmError::MalformedResponse(e.to_string()));
                    }
                };

                if let Some(text) = parsed.response
                    && !text.is_empty()
                {
                    sink.chunk(text).await;
                }
                if parsed.done {
                    sink.complete().await;
                    return Ok(());
                }
            }
        }

        // Connection closed without a done marker
        if sink.has_emitted() {
            sink.fail("stream ended without completion").await;
            Ok(())
        } else {
            Err(LlmError::MalformedResponse(
                "stream ended before any output".to_string(),
            ))
        }
    }

    fn provider_info(&self) -> &'static str {
        "Ollama Local Inference"
    }
}
