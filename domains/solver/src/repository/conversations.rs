//! In-memory conversation store
//!
//! Maps conversation ids to their aggregates for the lifetime of the store.
//! Each conversation sits behind its own async mutex so a caller can hold it
//! across an LLM round trip while other conversations stay available. The id
//! map lock is only ever held for map operations, never across an `.await`.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::entities::Conversation;
use kata_common::{Error, Result};

/// Shared, lockable reference to one stored conversation
pub type ConversationHandle = Arc<Mutex<Conversation>>;

#[derive(Clone, Default)]
pub struct ConversationStore {
    conversations: Arc<RwLock<HashMap<Uuid, ConversationHandle>>>,
}

impl std::fmt::Debug for ConversationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationStore")
            .field("len", &self.len())
            .finish()
    }
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a conversation under its own id
    ///
    /// Fails if the id is already registered; stored conversations are never
    /// silently replaced.
    pub fn insert(&self, conversation: Conversation) -> Result<Uuid> {
        let id = conversation.id();
        let mut map = self
            .conversations
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        if map.contains_key(&id) {
            return Err(Error::InvalidArgument(format!(
                "Conversation already registered: {}",
                id
            )));
        }

        map.insert(id, Arc::new(Mutex::new(conversation)));
        Ok(id)
    }

    /// Lockable handle to a stored conversation
    pub fn handle(&self, id: Uuid) -> Option<ConversationHandle> {
        self.conversations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    /// Snapshot of a stored conversation
    pub async fn find(&self, id: Uuid) -> Option<Conversation> {
        let handle = self.handle(id)?;
        let conversation = handle.lock().await;
        Some(conversation.clone())
    }

    /// Snapshot of every stored conversation, oldest first
    pub async fn list(&self) -> Vec<Conversation> {
        let handles: Vec<ConversationHandle> = self
            .conversations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();

        let mut conversations = Vec::with_capacity(handles.len());
        for handle in handles {
            conversations.push(handle.lock().await.clone());
        }
        conversations.sort_by_key(Conversation::created_at);
        conversations
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.conversations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.conversations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
