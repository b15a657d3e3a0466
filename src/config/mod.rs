//! Configuration module for the Parley gateway.
//!
//! Configuration comes from environment variables (with `.env` support via
//! dotenvy) and an optional YAML file. Priority: YAML > ENV vars > defaults.
//!
//! # Example
//! ```rust,no_run
//! use parley_gateway::config::ServerConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ServerConfig::from_env()?;
//!
//! // Load from YAML file with environment variable fallback
//! let config = ServerConfig::from_file(&PathBuf::from("config.yaml"))?;
//!
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use url::Url;
use zeroize::Zeroizing;

use crate::core::llm::LlmProvider;
use crate::core::llm::ollama::{OLLAMA_DEFAULT_BASE_URL, OLLAMA_DEFAULT_MODEL};

/// Secret string zeroized on drop.
pub type Secret = Zeroizing<String>;

/// Configuration loading/validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse the configuration file
    #[error("failed to parse config file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A value failed validation
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// TLS configuration for HTTPS and WSS
#[derive(Debug, Clone)]
pub struct TlsConfig {
    /// Path to the TLS certificate file (PEM format)
    pub cert_path: PathBuf,
    /// Path to the TLS private key file (PEM format)
    pub key_path: PathBuf,
}

/// Server configuration
///
/// Contains everything needed to run the gateway:
/// - Server settings (host, port, TLS)
/// - LLM provider credentials and model selection
/// - Streaming behavior
/// - Security settings (CORS, rate limiting, connection limits)
#[derive(Debug, Clone)]
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,

    // TLS configuration (optional)
    pub tls: Option<TlsConfig>,

    // Provider credentials (zeroized on drop)
    pub openai_api_key: Option<Secret>,
    pub deepseek_api_key: Option<Secret>,
    pub gemini_api_key: Option<Secret>,

    // Provider model selection
    pub openai_model: String,
    pub deepseek_model: String,
    pub gemini_model: String,
    pub ollama_model: String,

    /// Base URL of the local Ollama daemon
    pub ollama_base_url: String,

    /// Provider used by the streaming endpoint when the request names none
    pub default_provider: LlmProvider,

    /// Per-request timeout for adapter HTTP calls, in seconds
    pub request_timeout_seconds: u64,

    /// Idle timeout the SSE consumer applies between stream events, in
    /// milliseconds. The backstop against adapters that never emit.
    pub sse_idle_timeout_ms: u64,

    // Security configuration
    /// CORS allowed origins (comma-separated list or "*" for all)
    /// Default: None (CORS disabled, same-origin only)
    pub cors_allowed_origins: Option<String>,

    /// Maximum requests per second per IP address
    pub rate_limit_requests_per_second: u32,
    /// Maximum burst size for rate limiting
    pub rate_limit_burst_size: u32,

    /// Maximum concurrent voice WebSocket connections (None = unlimited)
    pub max_websocket_connections: Option<usize>,
    /// Maximum connections per IP address
    pub max_connections_per_ip: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            tls: None,
            openai_api_key: None,
            deepseek_api_key: None,
            gemini_api_key: None,
            openai_model: String::new(),
            deepseek_model: String::new(),
            gemini_model: String::new(),
            ollama_model: OLLAMA_DEFAULT_MODEL.to_string(),
            ollama_base_url: OLLAMA_DEFAULT_BASE_URL.to_string(),
            default_provider: LlmProvider::Ollama,
            request_timeout_seconds: 30,
            sse_idle_timeout_ms: 1000,
            cors_allowed_origins: None,
            rate_limit_requests_per_second: 60,
            rate_limit_burst_size: 10,
            max_websocket_connections: None,
            max_connections_per_ip: 100,
        }
    }
}

// =============================================================================
// YAML file shape
// =============================================================================

#[derive(Debug, Default, Deserialize)]
struct YamlConfig {
    #[serde(default)]
    server: YamlServer,
    #[serde(default)]
    llm: YamlLlm,
    #[serde(default)]
    streaming: YamlStreaming,
    #[serde(default)]
    security: YamlSecurity,
}

#[derive(Debug, Default, Deserialize)]
struct YamlServer {
    host: Option<String>,
    port: Option<u16>,
    tls: Option<YamlTls>,
}

#[derive(Debug, Deserialize)]
struct YamlTls {
    cert_path: PathBuf,
    key_path: PathBuf,
}

#[derive(Debug, Default, Deserialize)]
struct YamlLlm {
    default_provider: Option<String>,
    request_timeout_seconds: Option<u64>,
    #[serde(default)]
    openai: YamlProvider,
    #[serde(default)]
    deepseek: YamlProvider,
    #[serde(default)]
    gemini: YamlProvider,
    #[serde(default)]
    ollama: YamlOllama,
}

#[derive(Debug, Default, Deserialize)]
struct YamlProvider {
    api_key: Option<String>,
    model: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct YamlOllama {
    base_url: Option<String>,
    model: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct YamlStreaming {
    sse_idle_timeout_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct YamlSecurity {
    cors_allowed_origins: Option<String>,
    rate_limit_requests_per_second: Option<u32>,
    rate_limit_burst_size: Option<u32>,
    max_websocket_connections: Option<usize>,
    max_connections_per_ip: Option<u32>,
}

// =============================================================================
// Loading
// =============================================================================

impl ServerConfig {
    /// Load configuration from environment variables only.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file, with environment variables as
    /// fallback for anything the file does not set.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env()?;
        let yaml: YamlConfig = serde_yaml::from_str(&std::fs::read_to_string(path)?)?;
        config.apply_yaml(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// The bind address as `host:port`.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Whether TLS is configured.
    pub fn is_tls_enabled(&self) -> bool {
        self.tls.is_some()
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(host) = std::env::var("HOST") {
            self.host = host;
        }
        if let Ok(port) = std::env::var("PORT") {
            self.port = port
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("invalid PORT: {port}")))?;
        }
        if let (Ok(cert), Ok(key)) = (std::env::var("TLS_CERT_PATH"), std::env::var("TLS_KEY_PATH"))
        {
            self.tls = Some(TlsConfig {
                cert_path: PathBuf::from(cert),
                key_path: PathBuf::from(key),
            });
        }

        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            self.openai_api_key = Some(Secret::new(key));
        }
        if let Ok(key) = std::env::var("DEEPSEEK_API_KEY") {
            self.deepseek_api_key = Some(Secret::new(key));
        }
        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            self.gemini_api_key = Some(Secret::new(key));
        }
        if let Ok(model) = std::env::var("OPENAI_MODEL") {
            self.openai_model = model;
        }
        if let Ok(model) = std::env::var("DEEPSEEK_MODEL") {
            self.deepseek_model = model;
        }
        if let Ok(model) = std::env::var("GEMINI_MODEL") {
            self.gemini_model = model;
        }
        if let Ok(model) = std::env::var("OLLAMA_MODEL") {
            self.ollama_model = model;
        }
        if let Ok(base_url) = std::env::var("OLLAMA_BASE_URL") {
            self.ollama_base_url = base_url;
        }
        if let Ok(provider) = std::env::var("DEFAULT_LLM_PROVIDER") {
            self.default_provider = provider
                .parse()
                .map_err(|e| ConfigError::Invalid(format!("DEFAULT_LLM_PROVIDER: {e}")))?;
        }
        if let Ok(timeout) = std::env::var("LLM_REQUEST_TIMEOUT_SECONDS") {
            self.request_timeout_seconds = timeout.parse().map_err(|_| {
                ConfigError::Invalid(format!("invalid LLM_REQUEST_TIMEOUT_SECONDS: {timeout}"))
            })?;
        }
        if let Ok(timeout) = std::env::var("SSE_IDLE_TIMEOUT_MS") {
            self.sse_idle_timeout_ms = timeout.parse().map_err(|_| {
                ConfigError::Invalid(format!("invalid SSE_IDLE_TIMEOUT_MS: {timeout}"))
            })?;
        }

        if let Ok(origins) = std::env::var("CORS_ALLOWED_ORIGINS") {
            self.cors_allowed_origins = Some(origins);
        }
        if let Ok(rps) = std::env::var("RATE_LIMIT_RPS") {
            self.rate_limit_requests_per_second = rps
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("invalid RATE_LIMIT_RPS: {rps}")))?;
        }
        if let Ok(burst) = std::env::var("RATE_LIMIT_BURST") {
            self.rate_limit_burst_size = burst
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("invalid RATE_LIMIT_BURST: {burst}")))?;
        }
        if let Ok(max) = std::env::var("MAX_WS_CONNECTIONS") {
            self.max_websocket_connections = Some(
                max.parse().map_err(|_| {
                    ConfigError::Invalid(format!("invalid MAX_WS_CONNECTIONS: {max}"))
                })?,
            );
        }
        if let Ok(max) = std::env::var("MAX_CONNECTIONS_PER_IP") {
            self.max_connections_per_ip = max.parse().map_err(|_| {
                ConfigError::Invalid(format!("invalid MAX_CONNECTIONS_PER_IP: {max}"))
            })?;
        }
        Ok(())
    }

    fn apply_yaml(&mut self, yaml: YamlConfig) -> Result<(), ConfigError> {
        if let Some(host) = yaml.server.host {
            self.host = host;
        }
        if let Some(port) = yaml.server.port {
            self.port = port;
        }
        if let Some(tls) = yaml.server.tls {
            self.tls = Some(TlsConfig {
                cert_path: tls.cert_path,
                key_path: tls.key_path,
            });
        }

        if let Some(provider) = yaml.llm.default_provider {
            self.default_provider = provider
                .parse()
                .map_err(|e| ConfigError::Invalid(format!("llm.default_provider: {e}")))?;
        }
        if let Some(timeout) = yaml.llm.request_timeout_seconds {
            self.request_timeout_seconds = timeout;
        }
        if let Some(key) = yaml.llm.openai.api_key {
            self.openai_api_key = Some(Secret::new(key));
        }
        if let Some(model) = yaml.llm.openai.model {
            self.openai_model = model;
        }
        if let Some(key) = yaml.llm.deepseek.api_key {
            self.deepseek_api_key = Some(Secret::new(key));
        }
        if let Some(model) = yaml.llm.deepseek.model {
            self.deepseek_model = model;
        }
        if let Some(key) = yaml.llm.gemini.api_key {
            self.gemini_api_key = Some(Secret::new(key));
        }
        if let Some(model) = yaml.llm.gemini.model {
            self.gemini_model = model;
        }
        if let Some(base_url) = yaml.llm.ollama.base_url {
            self.ollama_base_url = base_url;
        }
        if let Some(model) = yaml.llm.ollama.model {
            self.ollama_model = model;
        }

        if let Some(timeout) = yaml.streaming.sse_idle_timeout_ms {
            self.sse_idle_timeout_ms = timeout;
        }

        if let Some(origins) = yaml.security.cors_allowed_origins {
            self.cors_allowed_origins = Some(origins);
        }
        if let Some(rps) = yaml.security.rate_limit_requests_per_second {
            self.rate_limit_requests_per_second = rps;
        }
        if let Some(burst) = yaml.security.rate_limit_burst_size {
            self.rate_limit_burst_size = burst;
        }
        if let Some(max) = yaml.security.max_websocket_connections {
            self.max_websocket_connections = Some(max);
        }
        if let Some(max) = yaml.security.max_connections_per_ip {
            self.max_connections_per_ip = max;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let url = Url::parse(&self.ollama_base_url)
            .map_err(|e| ConfigError::Invalid(format!("ollama base URL: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid(format!(
                "ollama base URL must be http(s), got {}",
                url.scheme()
            )));
        }
        if self.sse_idle_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "sse_idle_timeout_ms must be positive".to_string(),
            ));
        }
        if self.request_timeout_seconds == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_seconds must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
