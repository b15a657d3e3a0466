//! Deterministic mock adapter for tests and offline development.

use async_trait::async_trait;

use super::base::{LlmAdapter, LlmResult};
use super::stream::StreamSink;

/// Prefix the mock puts in front of every echoed prompt
pub const MOCK_REPLY_PREFIX: &str = "[mock llm] received prompt: ";

/// Mock adapter: echoes the prompt behind a fixed prefix.
///
/// Unlike the HTTP adapters, its streaming path is fully implemented — the
/// reply is split on whitespace and delivered one word per chunk — so the
/// whole streaming pipeline can be exercised without a live backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct MockAdapter;

impl MockAdapter {
    /// Create a new mock adapter.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl LlmAdapter for MockAdapter {
    async fn generate(&self, prompt: &str) -> LlmResult<String> {
        Ok(format!("{MOCK_REPLY_PREFIX}{prompt}"))
    }

    async fn generate_stream(&self, prompt: &str, sink: StreamSink) -> LlmResult<()> {
        let reply = format!("{MOCK_REPLY_PREFIX}{prompt}");
        for word in reply.split_whitespace() {
            if !sink.chunk(format!("{word} ")).await {
                return Ok(());
            }
        }
        sink.complete().await;
        Ok(())
    }

    fn provider_info(&self) -> &'static str {
        "Mock (deterministic echo)"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::llm::stream::{StreamEvent, reply_channel};

    #[tokio::test]
    async fn test_generate_echoes_prompt() {
        let adapter = MockAdapter::new();
        let reply = adapter.generate("ahoy").await.unwrap();
        assert_eq!(reply, "[mock llm] received prompt: ahoy");
    }

    #[tokio::test]
    async fn test_generate_never_returns_empty() {
        let adapter = MockAdapter::new();
        let reply = adapter.generate("").await.unwrap();
        assert!(!reply.is_empty());
    }

    #[tokio::test]
    async fn test_stream_emits_words_then_completes() {
        let adapter = MockAdapter::new();
        let (sink, mut stream) = reply_channel();
        adapter.generate_stream("ahoy", sink).await.unwrap();

        let mut chunks = Vec::new();
        loop {
            match stream.recv().await {
                Some(StreamEvent::Chunk(text)) => chunks.push(text),
                Some(StreamEvent::Completed) => break,
                other => panic!("unexpected stream event: {other:?}"),
            }
        }
        assert_eq!(chunks.concat().trim_end(), "[mock llm] received prompt: ahoy");
    }
}
