//! Conversation endpoints: character setup, synchronous replies, and the
//! SSE streaming path.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::sse::{Event, Sse};
use futures::Stream;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::llm::{LlmProvider, StreamEvent};
use crate::errors::{AppError, AppResult};
use crate::state::AppState;
use crate::store::{Character, MessageRecord};

/// Sender tag for client turns
const SENDER_USER: &str = "USER";

/// Sender tag for generated turns
const SENDER_CHARACTER: &str = "CHARACTER";

/// Identifiers travel as decimal strings of at most 19 digits.
pub fn parse_id(raw: &str) -> AppResult<u64> {
    if raw.is_empty() || raw.len() > 19 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AppError::BadRequest(format!("malformed identifier: {raw}")));
    }
    raw.parse()
        .map_err(|_| AppError::BadRequest(format!("malformed identifier: {raw}")))
}

/// Render a message history the way prompts expect it: one
/// `"{sender}: {content}\n"` line per turn, in order.
fn render_history(messages: &[MessageRecord]) -> String {
    let mut history = String::new();
    for message in messages {
        history.push_str(&message.sender);
        history.push_str(": ");
        history.push_str(&message.content);
        history.push('\n');
    }
    history
}

// =============================================================================
// Characters
// =============================================================================

/// Request body for character creation
#[derive(Debug, Deserialize)]
pub struct CreateCharacterRequest {
    /// Display name
    pub name: String,
    /// Persona text prepended to prompts (optional)
    #[serde(default)]
    pub persona: Option<String>,
}

/// Character representation with a string identifier
#[derive(Debug, Serialize)]
pub struct CharacterResponse {
    pub id: String,
    pub name: String,
    pub persona: String,
}

impl From<Character> for CharacterResponse {
    fn from(character: Character) -> Self {
        Self {
            id: character.id.to_string(),
            name: character.name,
            persona: character.persona,
        }
    }
}

/// `POST /api/chat/characters` - create a character
pub async fn create_character(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateCharacterRequest>,
) -> AppResult<Json<CharacterResponse>> {
    let character = state
        .store
        .create_character(&body.name, body.persona.as_deref().unwrap_or(""))
        .await;
    Ok(Json(character.into()))
}

// =============================================================================
// Conversations
// =============================================================================

/// Request body for conversation creation
#[derive(Debug, Deserialize)]
pub struct CreateConversationRequest {
    /// Identifier of the character to converse with, as a decimal string
    pub character_id: String,
}

/// Response for conversation creation
#[derive(Debug, Serialize)]
pub struct CreateConversationResponse {
    pub conversation_id: String,
}

/// `POST /api/chat/conversations` - create a conversation
pub async fn create_conversation(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateConversationRequest>,
) -> AppResult<Json<CreateConversationResponse>> {
    let character_id = parse_id(&body.character_id)?;
    let conversation = state.store.create_conversation(character_id).await?;
    Ok(Json(CreateConversationResponse {
        conversation_id: conversation.id.to_string(),
    }))
}

/// One message with string identifiers
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub id: String,
    pub sender: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,
}

impl From<MessageRecord> for MessageResponse {
    fn from(message: MessageRecord) -> Self {
        Self {
            id: message.id.to_string(),
            sender: message.sender,
            content: message.content,
            metadata: message.metadata,
        }
    }
}

/// Conversation with its message history
#[derive(Debug, Serialize)]
pub struct ConversationResponse {
    pub id: String,
    pub character_id: String,
    pub messages: Vec<MessageResponse>,
}

/// `GET /api/chat/conversations/{id}` - conversation detail
pub async fn get_conversation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<ConversationResponse>> {
    let id = parse_id(&id)?;
    let (conversation, messages) = state.store.get_conversation(id).await?;
    Ok(Json(ConversationResponse {
        id: conversation.id.to_string(),
        character_id: conversation.character_id.to_string(),
        messages: messages.into_iter().map(Into::into).collect(),
    }))
}

// =============================================================================
// Synchronous reply path
// =============================================================================

/// Request body for sending a message
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    /// User text (missing is normalized to empty)
    #[serde(default)]
    pub text: Option<String>,
    /// Provider override; the configured default applies when absent
    #[serde(default)]
    pub provider: Option<LlmProvider>,
}

/// Response for the synchronous reply path
#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    /// Generated (or simulated) character reply
    pub reply: String,
    /// Identifier of the stored reply message
    pub message_id: String,
}

/// `POST /api/chat/conversations/{id}/message` - send a message and get the
/// character's reply.
///
/// Always answers with text: generation faults are absorbed into the
/// offline fallback inside the orchestrator, so the only error statuses
/// here are for malformed identifiers, missing resources, and unknown
/// providers.
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<SendMessageRequest>,
) -> AppResult<Json<SendMessageResponse>> {
    let conversation_id = parse_id(&id)?;
    let text = body.text.unwrap_or_default();
    let provider = body.provider.unwrap_or(state.config.default_provider);

    state
        .store
        .append_message(conversation_id, SENDER_USER, &text, None)
        .await?;

    let (conversation, messages) = state.store.get_conversation(conversation_id).await?;
    let character = state.store.get_character(conversation.character_id).await?;
    let history = render_history(&messages);

    let reply = state
        .chat
        .generate_reply(Some(&character.persona), Some(&history), &text, provider)
        .await?;

    let assistant_message = state
        .store
        .append_message(conversation_id, SENDER_CHARACTER, &reply, None)
        .await?;

    Ok(Json(SendMessageResponse {
        reply,
        message_id: assistant_message.id.to_string(),
    }))
}

// =============================================================================
// Streaming reply path (SSE)
// =============================================================================

/// Query parameters for the streaming endpoint
#[derive(Debug, Deserialize)]
pub struct StreamMessageQuery {
    /// User text
    pub message: String,
    /// Persona override (optional)
    #[serde(default)]
    pub persona: Option<String>,
    /// Pre-rendered history (optional)
    #[serde(default)]
    pub history: Option<String>,
    /// Provider; the configured default applies when absent
    #[serde(default)]
    pub provider: Option<LlmProvider>,
}

/// `GET /api/chat/conversations/{id}/stream_message` - stream a reply as
/// server-sent events, one event per generated chunk, terminated by a
/// `done` or `error` event.
///
/// The idle timeout between events is the backstop against adapters whose
/// streaming support is a silent no-op.
pub async fn stream_message(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<StreamMessageQuery>,
) -> AppResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    parse_id(&id)?;
    let provider = query.provider.unwrap_or(state.config.default_provider);
    let idle_timeout = Duration::from_millis(state.config.sse_idle_timeout_ms);

    let mut stream = state
        .chat
        .generate_reply_stream(
            query.persona.as_deref(),
            query.history.as_deref(),
            &query.message,
            provider,
        )
        .await?;

    let events = async_stream::stream! {
        loop {
            match tokio::time::timeout(idle_timeout, stream.recv()).await {
                Ok(Some(StreamEvent::Chunk(text))) => {
                    yield Ok(Event::default().data(text));
                }
                Ok(Some(StreamEvent::Completed)) => {
                    yield Ok(Event::default().event("done").data(""));
                    break;
                }
                Ok(Some(StreamEvent::Failed(message))) => {
                    yield Ok(Event::default().event("error").data(message));
                    break;
                }
                Ok(None) => break,
                Err(_) => {
                    debug!(provider = %provider, "SSE consumer idle timeout");
                    yield Ok(Event::default().event("error").data("stream idle timeout"));
                    break;
                }
            }
        }
    };

    Ok(Sse::new(events))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MessageRecord;

    #[test]
    fn test_parse_id_accepts_decimal_strings() {
        assert_eq!(parse_id("1").unwrap(), 1);
        assert_eq!(parse_id("1234567890123456789").unwrap(), 1234567890123456789);
    }

    #[test]
    fn test_parse_id_rejects_garbage() {
        assert!(parse_id("").is_err());
        assert!(parse_id("-3").is_err());
        assert!(parse_id("12ab").is_err());
        assert!(parse_id("12345678901234567890").is_err()); // 20 digits
    }

    #[test]
    fn test_render_history_format() {
        let messages = vec![
            MessageRecord {
                id: 1,
                sender: "USER".into(),
                content: "hi".into(),
                metadata: None,
            },
            MessageRecord {
                id: 2,
                sender: "CHARACTER".into(),
                content: "ahoy".into(),
                metadata: None,
            },
        ];
        assert_eq!(render_history(&messages), "USER: hi\nCHARACTER: ahoy\n");
    }

    #[test]
    fn test_render_history_empty() {
        assert_eq!(render_history(&[]), "");
    }
}
