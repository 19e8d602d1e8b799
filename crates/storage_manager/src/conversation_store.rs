//! Conversations persisted under `conversation_<millis>` keys.

use std::sync::Arc;

use chat_core::{Conversation, ConversationMessage, CONVERSATION_KEY_PREFIX};
use chrono::{DateTime, Duration, Utc};

use crate::error::{Result, StorageError};
use crate::storage::KeyValueStore;

#[derive(Clone)]
pub struct ConversationStore {
    store: Arc<dyn KeyValueStore>,
}

impl ConversationStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Persist a freshly extracted conversation. Saves within the same
    /// millisecond get the next free key so nothing is overwritten.
    pub async fn save(
        &self,
        messages: Vec<ConversationMessage>,
        saved_at: DateTime<Utc>,
    ) -> Result<Conversation> {
        let mut at = saved_at;
        let mut key = Conversation::key_for(at);
        while self.store.contains(&key).await? {
            at += Duration::milliseconds(1);
            key = Conversation::key_for(at);
        }

        let value = serde_json::to_value(&messages)?;
        self.store.set(&key, value).await?;
        log::info!("Saved conversation {} ({} messages)", key, messages.len());

        Ok(Conversation::new(key, messages))
    }

    pub async fn get(&self, id: &str) -> Result<Option<Conversation>> {
        if !id.starts_with(CONVERSATION_KEY_PREFIX) {
            return Ok(None);
        }
        match self.store.get(id).await? {
            Some(value) => {
                let messages = serde_json::from_value::<Vec<ConversationMessage>>(value)
                    .map_err(|e| StorageError::InvalidData {
                        key: id.to_string(),
                        reason: e.to_string(),
                    })?;
                Ok(Some(Conversation::new(id, messages)))
            }
            None => Ok(None),
        }
    }

    /// All saved conversations, oldest first. Entries that no longer parse
    /// are skipped with a warning.
    pub async fn list(&self) -> Result<Vec<Conversation>> {
        let mut conversations = Vec::new();
        for key in self.store.keys().await? {
            if !key.starts_with(CONVERSATION_KEY_PREFIX) {
                continue;
            }
            match self.get(&key).await {
                Ok(Some(conversation)) => conversations.push(conversation),
                Ok(None) => {}
                Err(StorageError::InvalidData { key, reason }) => {
                    log::warn!("Skipping unreadable conversation {}: {}", key, reason);
                }
                Err(e) => return Err(e),
            }
        }
        conversations.sort_by_key(|c| (c.saved_at(), c.id.clone()));
        Ok(conversations)
    }
}
