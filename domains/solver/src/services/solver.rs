//! Kata solver: conversation orchestration against the LLM boundary
//!
//! The solver owns a `ConversationStore` and is the only writer of the
//! conversations in it. Every operation reports failure through
//! `kata_common::Error`; a failed exchange never leaves messages or
//! registrations behind.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use kata_common::{Error, Result};

use crate::domain::entities::{Conversation, LlmResponse, Message, MessageRole};
use crate::domain::require_text;
use crate::repository::{ConversationHandle, ConversationStore};
use crate::services::boundary::LlmBoundary;

/// Token usage summary for a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBreakdown {
    pub total_tokens: i64,
    pub message_count: usize,
}

pub struct KataSolver {
    boundary: Arc<dyn LlmBoundary>,
    store: ConversationStore,
}

fn not_found(id: Uuid) -> Error {
    Error::NotFound(format!("Conversation not found: {}", id))
}

/// Tokens attributable to a new user turn
///
/// The reported prompt tokens cover the whole context; what was already
/// counted for earlier turns is subtracted. Providers that truncate or cache
/// context can report fewer prompt tokens than were counted so far, in which
/// case the turn is recorded as zero.
fn incremental_prompt_tokens(conversation_id: Uuid, prompt_tokens: i64, prior_tokens: i64) -> i64 {
    let incremental = prompt_tokens - prior_tokens;
    if incremental < 0 {
        tracing::warn!(
            conversation_id = %conversation_id,
            prompt_tokens,
            prior_tokens,
            "Reported prompt tokens fell below the conversation total; recording zero"
        );
        return 0;
    }
    incremental
}

impl KataSolver {
    /// Create a solver over an explicit store
    pub fn new(boundary: Arc<dyn LlmBoundary>, store: ConversationStore) -> Self {
        Self { boundary, store }
    }

    /// Create a solver with a fresh, empty store
    pub fn with_boundary(boundary: Arc<dyn LlmBoundary>) -> Self {
        Self::new(boundary, ConversationStore::new())
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    fn handle(&self, id: Uuid) -> Result<ConversationHandle> {
        self.store.handle(id).ok_or_else(|| not_found(id))
    }

    /// Start a new conversation with an initial prompt
    pub async fn start_conversation(&self, initial_prompt: &str) -> Result<Conversation> {
        require_text(initial_prompt, "Prompt")?;

        let mut conversation = Conversation::new();

        let response = self
            .boundary
            .send_message(initial_prompt, &[])
            .await
            .inspect_err(|e| {
                tracing::error!(
                    conversation_id = %conversation.id(),
                    error = %e,
                    "Failed to start conversation"
                );
            })?;

        let usage = response.usage();
        let user = Message::new(MessageRole::User, initial_prompt, usage.prompt_tokens)?;
        let assistant = Message::new(
            MessageRole::Assistant,
            response.content(),
            usage.completion_tokens,
        )?;
        conversation.add_message(user);
        conversation.add_message(assistant);

        self.store.insert(conversation.clone())?;

        tracing::info!(
            conversation_id = %conversation.id(),
            model = %response.model(),
            total_tokens = conversation.total_tokens(),
            "Conversation started"
        );

        Ok(conversation)
    }

    /// Continue an existing conversation with a new user message
    ///
    /// The conversation stays locked for the whole exchange, so concurrent
    /// continuations of the same id are applied one after the other.
    pub async fn continue_conversation(
        &self,
        conversation_id: Uuid,
        user_message: &str,
    ) -> Result<LlmResponse> {
        require_text(user_message, "User message")?;

        let handle = self.handle(conversation_id)?;
        let mut conversation = handle.lock().await;

        let response = self
            .boundary
            .send_message(user_message, conversation.messages())
            .await
            .inspect_err(|e| {
                tracing::error!(
                    conversation_id = %conversation_id,
                    error = %e,
                    "Failed to continue conversation"
                );
            })?;

        let usage = response.usage();
        let user_tokens = incremental_prompt_tokens(
            conversation_id,
            usage.prompt_tokens,
            conversation.total_tokens(),
        );

        // Both messages are built before either is appended
        let user = Message::new(MessageRole::User, user_message, user_tokens)?;
        let assistant = Message::new(
            MessageRole::Assistant,
            response.content(),
            usage.completion_tokens,
        )?;
        conversation.add_message(user);
        conversation.add_message(assistant);

        tracing::info!(
            conversation_id = %conversation_id,
            message_count = conversation.message_count(),
            total_tokens = conversation.total_tokens(),
            "Conversation continued"
        );

        Ok(response)
    }

    /// Snapshot of a conversation
    pub async fn get_conversation(&self, conversation_id: Uuid) -> Result<Conversation> {
        self.store
            .find(conversation_id)
            .await
            .ok_or_else(|| not_found(conversation_id))
    }

    /// Messages of a conversation, in conversation order
    pub async fn get_conversation_history(&self, conversation_id: Uuid) -> Result<Vec<Message>> {
        let handle = self.handle(conversation_id)?;
        let conversation = handle.lock().await;
        Ok(conversation.messages().to_vec())
    }

    /// Clear every message while keeping the conversation registered
    pub async fn reset_conversation(&self, conversation_id: Uuid) -> Result<()> {
        let handle = self.handle(conversation_id)?;
        handle.lock().await.clear();

        tracing::info!(conversation_id = %conversation_id, "Conversation reset");
        Ok(())
    }

    pub async fn get_conversation_token_count(&self, conversation_id: Uuid) -> Result<i64> {
        let handle = self.handle(conversation_id)?;
        let total = handle.lock().await.total_tokens();
        Ok(total)
    }

    pub async fn get_conversation_token_breakdown(
        &self,
        conversation_id: Uuid,
    ) -> Result<TokenBreakdown> {
        let handle = self.handle(conversation_id)?;
        let conversation = handle.lock().await;

        Ok(TokenBreakdown {
            total_tokens: conversation.total_tokens(),
            message_count: conversation.message_count(),
        })
    }

    /// Register a previously serialized conversation under its original id
    pub fn restore_conversation(&self, conversation: Conversation) -> Result<Uuid> {
        let id = self.store.insert(conversation)?;
        tracing::debug!(conversation_id = %id, "Conversation restored");
        Ok(id)
    }

    /// Snapshots of every registered conversation, for callers that persist them
    pub async fn export_conversations(&self) -> Vec<Conversation> {
        self.store.list().await
    }
}
