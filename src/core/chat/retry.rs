//! Bounded retry policy for adapter calls.

use std::time::Duration;

use crate::core::llm::LlmError;

/// Retry policy for reply generation: a fixed attempt budget with a fixed
/// backoff delay between attempts.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first).
    /// Default: 3
    pub max_attempts: u32,

    /// Delay between attempts.
    /// Default: 1000ms
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    /// Check if another attempt is allowed after `attempt` completed ones.
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Classify an error as retryable.
    ///
    /// Current policy retries every adapter fault — transient or not — to
    /// maximize availability. Unknown-provider resolution failures never
    /// reach the retry loop, but are excluded here too so the classification
    /// stays truthful if call sites move. Tightening this predicate is the
    /// single place future policy changes land.
    pub fn is_retryable(&self, error: &LlmError) -> bool {
        !matches!(error, LlmError::UnknownProvider(_))
    }
}
