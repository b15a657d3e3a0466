pub mod base;
pub mod chat_api;
pub mod deepseek;
pub mod gemini;
pub mod mock;
pub mod ollama;
pub mod openai;
pub mod stream;

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::ServerConfig;

// Re-export public types and traits
pub use base::{LlmAdapter, LlmConfig, LlmError, LlmResult};
pub use deepseek::DeepSeekAdapter;
pub use gemini::GeminiAdapter;
pub use mock::{MOCK_REPLY_PREFIX, MockAdapter};
pub use ollama::OllamaAdapter;
pub use openai::OpenAiAdapter;
pub use stream::{ReplyStream, StreamEvent, StreamSink, reply_channel};

/// Supported LLM providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// OpenAI Chat Completions API
    OpenAi,
    /// DeepSeek Chat Completions API
    DeepSeek,
    /// Ollama local inference server
    Ollama,
    /// Deterministic mock adapter
    Mock,
    /// Google Gemini generateContent API
    Gemini,
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmProvider::OpenAi => write!(f, "openai"),
            LlmProvider::DeepSeek => write!(f, "deepseek"),
            LlmProvider::Ollama => write!(f, "ollama"),
            LlmProvider::Mock => write!(f, "mock"),
            LlmProvider::Gemini => write!(f, "gemini"),
        }
    }
}

impl std::str::FromStr for LlmProvider {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" | "open-ai" | "open_ai" => Ok(LlmProvider::OpenAi),
            "deepseek" | "deep-seek" | "deep_seek" => Ok(LlmProvider::DeepSeek),
            "ollama" => Ok(LlmProvider::Ollama),
            "mock" => Ok(LlmProvider::Mock),
            "gemini" | "google-gemini" => Ok(LlmProvider::Gemini),
            _ => Err(LlmError::ConfigurationError(format!(
                "Unsupported LLM provider: {s}. Supported providers: openai, deepseek, ollama, mock, gemini"
            ))),
        }
    }
}

/// Get a list of all supported LLM provider names
pub fn get_supported_llm_providers() -> Vec<&'static str> {
    vec!["openai", "deepseek", "ollama", "mock", "gemini"]
}

/// Read-only table mapping a provider identity to its adapter.
///
/// Built once at process start from [`ServerConfig`]; an identity is
/// registered only when its backend is configured (Mock and Ollama need no
/// credentials and are always present). Resolution failure is a caller /
/// configuration error, never a retryable fault.
pub struct LlmRegistry {
    adapters: HashMap<LlmProvider, Arc<dyn LlmAdapter>>,
}

impl LlmRegistry {
    /// Create an empty registry. Mostly useful in tests; production code
    /// goes through [`LlmRegistry::from_config`].
    pub fn new() -> Self {
        Self {
            adapters: HashMap::new(),
        }
    }

    /// Register an adapter for an identity, replacing any previous one.
    pub fn register(&mut self, provider: LlmProvider, adapter: Arc<dyn LlmAdapter>) {
        self.adapters.insert(provider, adapter);
    }

    /// Build the registry from server configuration.
    pub fn from_config(config: &ServerConfig) -> LlmResult<Self> {
        let mut registry = Self::new();
        let timeout_seconds = config.request_timeout_seconds;

        registry.register(LlmProvider::Mock, Arc::new(MockAdapter::new()));

        registry.register(
            LlmProvider::Ollama,
            Arc::new(OllamaAdapter::new(LlmConfig {
                model: config.ollama_model.clone(),
                base_url: Some(config.ollama_base_url.clone()),
                timeout_seconds,
                ..Default::default()
            })?),
        );

        if let Some(ref api_key) = config.openai_api_key {
            registry.register(
                LlmProvider::OpenAi,
                Arc::new(OpenAiAdapter::new(LlmConfig {
                    api_key: api_key.as_str().to_owned(),
                    model: config.openai_model.clone(),
                    timeout_seconds,
                    ..Default::default()
                })?),
            );
        }

        if let Some(ref api_key) = config.deepseek_api_key {
            registry.register(
                LlmProvider::DeepSeek,
                Arc::new(DeepSeekAdapter::new(LlmConfig {
                    api_key: api_key.as_str().to_owned(),
                    model: config.deepseek_model.clone(),
                    timeout_seconds,
                    ..Default::default()
                })?),
            );
        }

        if let Some(ref api_key) = config.gemini_api_key {
            registry.register(
                LlmProvider::Gemini,
                Arc::new(GeminiAdapter::new(LlmConfig {
                    api_key: api_key.as_str().to_owned(),
                    model: config.gemini_model.clone(),
                    timeout_seconds,
                    ..Default::default()
                })?),
            );
        }

        info!(
            providers = ?registry.registered(),
            "LLM registry initialized"
        );

        Ok(registry)
    }

    /// Resolve an identity to its adapter.
    pub fn resolve(&self, provider: LlmProvider) -> LlmResult<Arc<dyn LlmAdapter>> {
        self.adapters
            .get(&provider)
            .cloned()
            .ok_or_else(|| LlmError::UnknownProvider(provider.to_string()))
    }

    /// Identities with a registered adapter, in no particular order.
    pub fn registered(&self) -> Vec<LlmProvider> {
        self.adapters.keys().copied().collect()
    }
}

impl Default for LlmRegistry {
    fn default() -> Self {
        Self::new()
    }
}
