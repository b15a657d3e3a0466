//! Base trait and types for LLM reply-generation providers.
//!
//! This module defines the foundational abstraction for backends that turn a
//! rendered prompt into character dialogue, either as a single completed
//! string or as an ordered stream of text chunks.
//!
//! # Supported Providers
//!
//! - OpenAI Chat Completions API
//! - DeepSeek Chat Completions API
//! - Ollama local inference server
//! - Google Gemini `generateContent` API
//! - Mock (deterministic stand-in for tests and offline development)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::stream::StreamSink;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during reply generation.
#[derive(Debug, Error)]
pub enum LlmError {
    /// The requested provider has no registered adapter.
    ///
    /// This is a caller/configuration error and is never retried.
    #[error("unknown LLM provider: {0}")]
    UnknownProvider(String),

    /// Invalid adapter configuration (missing API key, bad base URL)
    #[error("invalid configuration: {0}")]
    ConfigurationError(String),

    /// Transport-level HTTP failure (connect, TLS, body read)
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status
    #[error("provider returned status {status}: {body}")]
    ApiStatus {
        /// HTTP status code
        status: u16,
        /// Response body, truncated by the adapter
        body: String,
    },

    /// The backend answered 2xx but the payload did not match its contract
    #[error("malformed provider response: {0}")]
    MalformedResponse(String),

    /// Operation timed out
    #[error("operation timed out: {0}")]
    Timeout(String),
}

/// Result type for LLM operations.
pub type LlmResult<T> = Result<T, LlmError>;

// =============================================================================
// Configuration
// =============================================================================

/// Base configuration handed to an adapter at registration time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmConfig {
    /// API key for authentication (unused by local backends)
    #[serde(default)]
    pub api_key: String,

    /// Model identifier (provider-specific, e.g. "deepseek-chat")
    #[serde(default)]
    pub model: String,

    /// Base URL override (used by local backends such as Ollama)
    #[serde(default)]
    pub base_url: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_timeout_seconds() -> u64 {
    30
}

// =============================================================================
// Base Trait
// =============================================================================

/// Uniform capability interface over one reply-generation backend.
///
/// Adapters are registered once at process start and shared behind `Arc`,
/// so every method takes `&self` and must be safe under concurrent calls.
#[async_trait]
pub trait LlmAdapter: Send + Sync {
    /// Perform one synchronous generation call.
    ///
    /// Returns the generated text, or an [`LlmError`] on transport faults,
    /// non-success statuses, and contract violations. A 2xx response that
    /// carries no usable content yields a best-effort placeholder string
    /// rather than an empty string or an error, so callers can tell
    /// "backend had nothing to say" apart from "backend failed".
    async fn generate(&self, prompt: &str) -> LlmResult<String>;

    /// Stream a generation through `sink`.
    ///
    /// Emits zero or more chunks in generation order, then at most one
    /// terminal event. An error returned before the first chunk means the
    /// stream failed to initiate and may be retried by the caller; after
    /// chunks have flowed, the adapter reports failure through the sink
    /// instead and the stream is terminal.
    ///
    /// Backends without streaming support keep this default no-op: zero
    /// chunks, no terminal. Consumers apply their own idle timeout.
    async fn generate_stream(&self, prompt: &str, sink: StreamSink) -> LlmResult<()> {
        let _ = (prompt, sink);
        Ok(())
    }

    /// Human-readable provider label for logs and diagnostics.
    fn provider_info(&self) -> &'static str;
}
