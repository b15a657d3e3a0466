//! Conversation persistence port.
//!
//! Durable storage is an external collaborator; this module defines only the
//! operations the gateway consumes — create/read/append keyed by opaque
//! numeric identifiers — plus an in-memory implementation used by tests and
//! single-node demo deployments.

pub mod memory;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

pub use memory::MemoryStore;

/// Errors from the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// No conversation with this identifier
    #[error("conversation not found: {0}")]
    ConversationNotFound(u64),

    /// No character with this identifier
    #[error("character not found: {0}")]
    CharacterNotFound(u64),
}

/// A character a client can converse with.
#[derive(Debug, Clone, Serialize)]
pub struct Character {
    /// Opaque numeric identifier
    pub id: u64,
    /// Display name
    pub name: String,
    /// Free-text persona prepended to every prompt (may be empty)
    pub persona: String,
}

/// One stored conversation turn.
#[derive(Debug, Clone, Serialize)]
pub struct MessageRecord {
    /// Opaque numeric identifier
    pub id: u64,
    /// Sender tag, e.g. "USER" or "CHARACTER"
    pub sender: String,
    /// Turn text
    pub content: String,
    /// Optional metadata blob
    pub metadata: Option<String>,
}

/// A conversation header.
#[derive(Debug, Clone, Serialize)]
pub struct Conversation {
    /// Opaque numeric identifier
    pub id: u64,
    /// The character this conversation belongs to
    pub character_id: u64,
}

/// The persistence operations this gateway consumes.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Create a character and return it.
    async fn create_character(&self, name: &str, persona: &str) -> Character;

    /// Look up a character.
    async fn get_character(&self, id: u64) -> Result<Character, StoreError>;

    /// Create a conversation bound to a character.
    async fn create_conversation(&self, character_id: u64) -> Result<Conversation, StoreError>;

    /// Fetch a conversation and its messages in append order.
    async fn get_conversation(
        &self,
        id: u64,
    ) -> Result<(Conversation, Vec<MessageRecord>), StoreError>;

    /// Append a message to a conversation.
    async fn append_message(
        &self,
        conversation_id: u64,
        sender: &str,
        content: &str,
        metadata: Option<String>,
    ) -> Result<MessageRecord, StoreError>;
}
