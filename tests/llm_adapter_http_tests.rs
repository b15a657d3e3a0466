//! HTTP contract tests for the LLM adapters, run against a mock server.

use parley_gateway::core::llm::{
    DeepSeekAdapter, GeminiAdapter, LlmAdapter, LlmConfig, LlmError, OllamaAdapter, OpenAiAdapter,
    StreamEvent, reply_channel,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer, api_key: &str) -> LlmConfig {
    LlmConfig {
        api_key: api_key.to_string(),
        base_url: Some(server.uri()),
        timeout_seconds: 5,
        ..Default::default()
    }
}

#[tokio::test]
async fn deepseek_generate_returns_first_choice_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({"model": "deepseek-chat"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "chatcmpl-1",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "Arr, ahoy!"}}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = DeepSeekAdapter::new(config_for(&server, "sk-test")).unwrap();
    let reply = adapter.generate("ahoy").await.unwrap();
    assert_eq!(reply, "Arr, ahoy!");
}

#[tokio::test]
async fn deepseek_non_success_status_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let adapter = DeepSeekAdapter::new(config_for(&server, "sk-test")).unwrap();
    let err = adapter.generate("ahoy").await.unwrap_err();
    match err {
        LlmError::ApiStatus { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "overloaded");
        }
        other => panic!("expected ApiStatus, got {other:?}"),
    }
}

#[tokio::test]
async fn deepseek_empty_choices_yield_placeholder_not_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "x", "choices": []})))
        .mount(&server)
        .await;

    let adapter = DeepSeekAdapter::new(config_for(&server, "sk-test")).unwrap();
    let reply = adapter.generate("ahoy").await.unwrap();
    assert_eq!(reply, "[deepseek] empty response");
}

#[tokio::test]
async fn deepseek_malformed_body_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let adapter = DeepSeekAdapter::new(config_for(&server, "sk-test")).unwrap();
    let err = adapter.generate("ahoy").await.unwrap_err();
    assert!(matches!(err, LlmError::MalformedResponse(_)));
}

#[tokio::test]
async fn openai_generate_returns_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-oa"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "Hello!"}}]
        })))
        .mount(&server)
        .await;

    let adapter = OpenAiAdapter::new(config_for(&server, "sk-oa")).unwrap();
    assert_eq!(adapter.generate("hi").await.unwrap(), "Hello!");
}

#[tokio::test]
async fn ollama_generate_returns_response_field() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(json!({"stream": false})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "llama3",
            "response": "Shiver me timbers",
            "done": true
        })))
        .mount(&server)
        .await;

    let adapter = OllamaAdapter::new(config_for(&server, "")).unwrap();
    assert_eq!(adapter.generate("ahoy").await.unwrap(), "Shiver me timbers");
}

#[tokio::test]
async fn ollama_empty_response_yields_placeholder() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"model": "llama3", "response": "", "done": true})),
        )
        .mount(&server)
        .await;

    let adapter = OllamaAdapter::new(config_for(&server, "")).unwrap();
    assert_eq!(adapter.generate("ahoy").await.unwrap(), "[ollama] empty response");
}

#[tokio::test]
async fn ollama_stream_delivers_chunks_in_order_then_completes() {
    let server = MockServer::start().await;
    let ndjson = concat!(
        "{\"model\":\"llama3\",\"response\":\"A\",\"done\":false}\n",
        "{\"model\":\"llama3\",\"response\":\"B\",\"done\":false}\n",
        "{\"model\":\"llama3\",\"response\":\"C\",\"done\":false}\n",
        "{\"model\":\"llama3\",\"response\":\"\",\"done\":true}\n",
    );
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(json!({"stream": true})))
        .respond_with(ResponseTemplate::new(200).set_body_raw(ndjson, "application/x-ndjson"))
        .mount(&server)
        .await;

    let adapter = OllamaAdapter::new(config_for(&server, "")).unwrap();
    let (sink, mut stream) = reply_channel();
    adapter.generate_stream("ahoy", sink).await.unwrap();

    let mut events = Vec::new();
    while let Some(event) = stream.recv().await {
        events.push(event);
    }
    assert_eq!(
        events,
        vec![
            StreamEvent::Chunk("A".into()),
            StreamEvent::Chunk("B".into()),
            StreamEvent::Chunk("C".into()),
            StreamEvent::Completed,
        ]
    );
}

#[tokio::test]
async fn ollama_stream_initiation_failure_is_returned_not_sunk() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model not found"))
        .mount(&server)
        .await;

    let adapter = OllamaAdapter::new(config_for(&server, "")).unwrap();
    let (sink, mut stream) = reply_channel();
    let err = adapter.generate_stream("ahoy", sink).await.unwrap_err();
    assert!(matches!(err, LlmError::ApiStatus { status: 500, .. }));

    // Nothing reached the consumer: the caller owns initiation retries
    drop(adapter);
    assert_eq!(stream.recv().await, None);
}

#[tokio::test]
async fn gemini_generate_returns_candidate_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-2.5-flash:generateContent"))
        .and(header("x-goog-api-key", "g-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [
                {"content": {"role": "model", "parts": [{"text": "Avast!"}]}}
            ]
        })))
        .mount(&server)
        .await;

    let adapter = GeminiAdapter::new(config_for(&server, "g-test")).unwrap();
    assert_eq!(adapter.generate("ahoy").await.unwrap(), "Avast!");
}

#[tokio::test]
async fn gemini_empty_candidates_yield_placeholder() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-2.5-flash:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let adapter = GeminiAdapter::new(config_for(&server, "g-test")).unwrap();
    assert_eq!(adapter.generate("ahoy").await.unwrap(), "[gemini] empty response");
}
