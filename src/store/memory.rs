//! In-memory conversation store.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;

use super::{Character, Conversation, ConversationStore, MessageRecord, StoreError};

struct ConversationEntry {
    character_id: u64,
    messages: Vec<MessageRecord>,
}

/// Concurrent in-memory implementation of [`ConversationStore`].
///
/// Identifiers are a plain monotonic counter; externally they travel as
/// decimal strings like every other store implementation's.
#[derive(Default)]
pub struct MemoryStore {
    characters: DashMap<u64, Character>,
    conversations: DashMap<u64, ConversationEntry>,
    next_id: AtomicU64,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            characters: DashMap::new(),
            conversations: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    fn allocate_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }
}

#[async_trait]
impl ConversationStore for MemoryStore {
    async fn create_character(&self, name: &str, persona: &str) -> Character {
        let character = Character {
            id: self.allocate_id(),
            name: name.to_string(),
            persona: persona.to_string(),
        };
        self.characters.insert(character.id, character.clone());
        character
    }

    async fn get_character(&self, id: u64) -> Result<Character, StoreError> {
        self.characters
            .get(&id)
            .map(|entry| entry.clone())
            .ok_or(StoreError::CharacterNotFound(id))
    }

    async fn create_conversation(&self, character_id: u64) -> Result<Conversation, StoreError> {
        if !self.characters.contains_key(&character_id) {
            return Err(StoreError::CharacterNotFound(character_id));
        }
        let id = self.allocate_id();
        self.conversations.insert(
            id,
            ConversationEntry {
                character_id,
                messages: Vec::new(),
            },
        );
        Ok(Conversation { id, character_id })
    }

    async fn get_conversation(
        &self,
        id: u64,
    ) -> Result<(Conversation, Vec<MessageRecord>), StoreError> {
        let entry = self
            .conversations
            .get(&id)
            .ok_or(StoreError::ConversationNotFound(id))?;
        Ok((
            Conversation {
                id,
                character_id: entry.character_id,
            },
            entry.messages.clone(),
        ))
    }

    async fn append_message(
        &self,
        conversation_id: u64,
        sender: &str,
        content: &str,
        metadata: Option<String>,
    ) -> Result<MessageRecord, StoreError> {
        let id = self.allocate_id();
        let mut entry = self
            .conversations
            .get_mut(&conversation_id)
            .ok_or(StoreError::ConversationNotFound(conversation_id))?;
        let message = MessageRecord {
            id,
            sender: sender.to_string(),
            content: content.to_string(),
            metadata,
        };
        entry.messages.push(message.clone());
        Ok(message)
    }
}
