//! Domain entities for the kata solver
//!
//! Messages and LLM responses are immutable values validated at construction.
//! The `Conversation` aggregate owns the ordered message log and derives token
//! totals from it. Every entity rehydrates through the same validation as its
//! constructor, so a serialized record never bypasses the invariants.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use kata_common::{Error, Result};

use super::require_text;

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// Message entity: one turn of a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "MessageRecord")]
pub struct Message {
    role: MessageRole,
    content: String,
    token_count: i64,
    timestamp: DateTime<Utc>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageRecord {
    role: MessageRole,
    content: String,
    token_count: i64,
    timestamp: DateTime<Utc>,
}

impl TryFrom<MessageRecord> for Message {
    type Error = Error;

    fn try_from(record: MessageRecord) -> Result<Self> {
        Message::restore(
            record.role,
            record.content,
            record.token_count,
            record.timestamp,
        )
    }
}

impl Message {
    /// Create a new message stamped with the current time
    pub fn new(role: MessageRole, content: impl Into<String>, token_count: i64) -> Result<Self> {
        Self::restore(role, content, token_count, Utc::now())
    }

    /// Rebuild a message with every field supplied, including its original timestamp
    pub fn restore(
        role: MessageRole,
        content: impl Into<String>,
        token_count: i64,
        timestamp: DateTime<Utc>,
    ) -> Result<Self> {
        let content = content.into();
        require_text(&content, "Message content")?;
        if token_count < 0 {
            return Err(Error::InvalidArgument(
                "Token count must be non-negative".to_string(),
            ));
        }

        Ok(Message {
            role,
            content,
            token_count,
            timestamp,
        })
    }

    pub fn role(&self) -> MessageRole {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn token_count(&self) -> i64 {
        self.token_count
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Token usage reported by the LLM for one completion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    pub prompt_tokens: i64,
    pub completion_tokens: i64,
    pub total_tokens: i64,
}

impl TokenUsage {
    /// Usage whose total is derived from its parts
    ///
    /// A total that would overflow saturates, and the resulting usage fails
    /// validation wherever it is checked.
    pub fn new(prompt_tokens: i64, completion_tokens: i64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.prompt_tokens < 0 || self.completion_tokens < 0 || self.total_tokens < 0 {
            return Err(Error::InvalidArgument(
                "Token counts must be non-negative".to_string(),
            ));
        }
        let Some(sum) = self.prompt_tokens.checked_add(self.completion_tokens) else {
            return Err(Error::InvariantViolation(format!(
                "promptTokens + completionTokens overflows ({} + {})",
                self.prompt_tokens, self.completion_tokens
            )));
        };
        if self.total_tokens != sum {
            return Err(Error::InvariantViolation(format!(
                "Total tokens ({}) must equal promptTokens + completionTokens ({} + {})",
                self.total_tokens, self.prompt_tokens, self.completion_tokens
            )));
        }
        Ok(())
    }
}

/// One completion returned by the LLM boundary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "LlmResponseRecord")]
pub struct LlmResponse {
    content: String,
    usage: TokenUsage,
    model: String,
    finish_reason: String,
    timestamp: DateTime<Utc>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LlmResponseRecord {
    content: String,
    usage: TokenUsage,
    model: String,
    finish_reason: String,
    timestamp: DateTime<Utc>,
}

impl TryFrom<LlmResponseRecord> for LlmResponse {
    type Error = Error;

    fn try_from(record: LlmResponseRecord) -> Result<Self> {
        LlmResponse::restore(
            record.content,
            record.usage,
            record.model,
            record.finish_reason,
            record.timestamp,
        )
    }
}

impl LlmResponse {
    /// Create a new response stamped with the current time
    pub fn new(
        content: impl Into<String>,
        usage: TokenUsage,
        model: impl Into<String>,
        finish_reason: impl Into<String>,
    ) -> Result<Self> {
        Self::restore(content, usage, model, finish_reason, Utc::now())
    }

    /// Rebuild a response with every field supplied, including its original timestamp
    pub fn restore(
        content: impl Into<String>,
        usage: TokenUsage,
        model: impl Into<String>,
        finish_reason: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Result<Self> {
        let content = content.into();
        require_text(&content, "Response content")?;
        usage.validate()?;

        Ok(LlmResponse {
            content,
            usage,
            model: model.into(),
            finish_reason: finish_reason.into(),
            timestamp,
        })
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn usage(&self) -> TokenUsage {
        self.usage
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn finish_reason(&self) -> &str {
        &self.finish_reason
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Conversation aggregate
///
/// Messages are kept in conversation order and are only ever appended or
/// cleared as a whole. `updated_at` moves on every mutation and never falls
/// behind `created_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "ConversationRecord")]
pub struct Conversation {
    id: Uuid,
    messages: Vec<Message>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConversationRecord {
    id: Uuid,
    messages: Vec<Message>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ConversationRecord> for Conversation {
    type Error = Error;

    fn try_from(record: ConversationRecord) -> Result<Self> {
        Conversation::restore(
            record.id,
            record.messages,
            record.created_at,
            record.updated_at,
        )
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    /// Create a new, empty conversation with a fresh identifier
    pub fn new() -> Self {
        let now = Utc::now();
        Conversation {
            id: Uuid::new_v4(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuild a conversation with its original identifier and timestamps
    pub fn restore(
        id: Uuid,
        messages: Vec<Message>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<Self> {
        if updated_at < created_at {
            return Err(Error::InvalidArgument(format!(
                "Conversation {} updatedAt precedes createdAt",
                id
            )));
        }

        Ok(Conversation {
            id,
            messages,
            created_at,
            updated_at,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Append a message to the end of the log
    pub fn add_message(&mut self, message: Message) {
        self.messages.push(message);
        self.touch();
    }

    /// Sum of every message's token count, saturating at `i64::MAX`
    pub fn total_tokens(&self) -> i64 {
        self.messages
            .iter()
            .map(Message::token_count)
            .fold(0_i64, i64::saturating_add)
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Drop every message, keeping the identifier and creation time
    pub fn clear(&mut self) {
        self.messages.clear();
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now().max(self.created_at);
    }
}
