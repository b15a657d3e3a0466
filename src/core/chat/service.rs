//! Reply orchestration: prompt build, adapter dispatch, retry and fallback.

use std::sync::Arc;

use tracing::{error, warn};

use super::prompt::build_prompt;
use super::retry::RetryPolicy;
use crate::core::llm::{LlmProvider, LlmRegistry, LlmResult, ReplyStream, reply_channel};

/// Orchestrates reply generation over the provider registry.
///
/// Stateless per call; the only shared data is the read-only registry, so
/// one instance serves every request concurrently.
#[derive(Clone)]
pub struct ChatService {
    registry: Arc<LlmRegistry>,
    retry: RetryPolicy,
}

impl ChatService {
    /// Create a service with the default retry policy (3 attempts, 1s backoff).
    pub fn new(registry: Arc<LlmRegistry>) -> Self {
        Self::with_retry_policy(registry, RetryPolicy::default())
    }

    /// Create a service with an explicit retry policy.
    pub fn with_retry_policy(registry: Arc<LlmRegistry>, retry: RetryPolicy) -> Self {
        Self { registry, retry }
    }

    /// Generate a reply synchronously.
    ///
    /// Resolution failures propagate immediately — an unknown provider is a
    /// caller error, not a backend fault. Adapter faults are retried under
    /// the policy budget; when every attempt fails the deterministic offline
    /// fallback is returned, so this method never surfaces a generation
    /// error to its caller.
    pub async fn generate_reply(
        &self,
        persona: Option<&str>,
        history: Option<&str>,
        user_message: &str,
        provider: LlmProvider,
    ) -> LlmResult<String> {
        let adapter = self.registry.resolve(provider)?;
        let prompt = build_prompt(persona, history, user_message);

        let mut attempt = 0;
        loop {
            attempt += 1;
            match adapter.generate(&prompt).await {
                Ok(text) => return Ok(text),
                Err(e) => {
                    warn!(
                        provider = %provider,
                        attempt,
                        error = %e,
                        "reply generation attempt failed"
                    );
                    if !self.retry.is_retryable(&e) || !self.retry.should_retry(attempt) {
                        error!(
                            provider = %provider,
                            attempts = attempt,
                            "reply generation exhausted, falling back to offline simulation"
                        );
                        return Ok(fallback_reply(persona, user_message));
                    }
                    tokio::time::sleep(self.retry.backoff).await;
                }
            }
        }
    }

    /// Start a streamed reply and return its consumer half immediately.
    ///
    /// Resolution failures propagate as with [`Self::generate_reply`]. The
    /// retry budget covers stream *initiation* only: an adapter error before
    /// the first chunk is retried with backoff on a background task; once
    /// chunks have flowed, a failure is reported exactly once through the
    /// stream's terminal event and never replayed. There is no offline
    /// fallback on this path — the transport layer owns terminal handling.
    pub async fn generate_reply_stream(
        &self,
        persona: Option<&str>,
        history: Option<&str>,
        user_message: &str,
        provider: LlmProvider,
    ) -> LlmResult<ReplyStream> {
        let adapter = self.registry.resolve(provider)?;
        let prompt = build_prompt(persona, history, user_message);
        let retry = self.retry.clone();
        let (sink, stream) = reply_channel();

        tokio::spawn(async move {
            let mut attempt = 0;
            loop {
                attempt += 1;
                match adapter.generate_stream(&prompt, sink.clone()).await {
                    Ok(()) => return,
                    Err(e) => {
                        warn!(
                            provider = %provider,
                            attempt,
                            error = %e,
                            "stream initiation attempt failed"
                        );
                        // A fault after chunks have flowed is terminal.
                        if sink.has_emitted() || sink.is_terminal() {
                            sink.fail(e.to_string()).await;
                            return;
                        }
                        if !retry.is_retryable(&e) || !retry.should_retry(attempt) {
                            sink.fail(e.to_string()).await;
                            return;
                        }
                        tokio::time::sleep(retry.backoff).await;
                    }
                }
            }
        });

        Ok(stream)
    }
}

/// Deterministic offline reply used when every generation attempt failed.
pub fn fallback_reply(persona: Option<&str>, user_message: &str) -> String {
    format!(
        "[simulated reply] {}: I saw your message — \"{}\" (offline simulation)",
        persona.unwrap_or(""),
        user_message
    )
}
