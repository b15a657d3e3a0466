//! Wire types for OpenAI-compatible chat-completions APIs.
//!
//! OpenAI and DeepSeek speak the same request/response shape; both adapters
//! build on these types so the contract is parsed in exactly one place.

use serde::{Deserialize, Serialize};

/// Maximum response-body bytes echoed into an error message.
pub const ERROR_BODY_LIMIT: usize = 512;

/// Chat-completions request body.
#[derive(Debug, Serialize)]
pub struct ChatCompletionsRequest<'a> {
    /// Model identifier
    pub model: &'a str,
    /// Conversation turns; this gateway sends the rendered prompt as one
    /// user turn
    pub messages: Vec<ChatTurn<'a>>,
}

impl<'a> ChatCompletionsRequest<'a> {
    /// Build the single-user-turn request this gateway always sends.
    pub fn from_prompt(model: &'a str, prompt: &'a str) -> Self {
        Self {
            model,
            messages: vec![ChatTurn {
                role: "user",
                content: prompt,
            }],
        }
    }
}

/// One conversation turn.
#[derive(Debug, Serialize)]
pub struct ChatTurn<'a> {
    /// Turn role ("user", "assistant", "system")
    pub role: &'a str,
    /// Turn text
    pub content: &'a str,
}

/// Chat-completions response body. Fields the gateway does not consume
/// (usage, ids, fingerprints) are left to serde's unknown-field handling.
#[derive(Debug, Deserialize)]
pub struct ChatCompletionsResponse {
    /// Generated choices, first one wins
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

/// One generated choice.
#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    /// The assistant message
    pub message: ChatChoiceMessage,
}

/// The message inside a choice.
#[derive(Debug, Deserialize)]
pub struct ChatChoiceMessage {
    /// Generated text; some backends omit it on filtered output
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatCompletionsResponse {
    /// Extract the first choice's content, if the backend produced any.
    pub fn into_content(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
    }
}

/// Truncate a response body for inclusion in an error message.
pub fn truncate_body(body: &str) -> String {
    if body.len() <= ERROR_BODY_LIMIT {
        body.to_string()
    } else {
        let mut end = ERROR_BODY_LIMIT;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}…", &body[..end])
    }
}
