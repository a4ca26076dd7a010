//! Kata solver domain: conversations, token accounting, exchange history

pub mod domain;
pub mod repository;
pub mod services;

// Re-export domain types at the crate root for convenience
pub use domain::entities::{Conversation, LlmResponse, Message, MessageRole, TokenUsage};
pub use domain::history::{HistoryEntry, HistoryEvaluation, KataEvaluation, SessionHistory};

// Re-export repository types
pub use repository::ConversationStore;

// Re-export service types
pub use services::boundary::{LlmBoundary, LlmServiceBoundary};
pub use services::solver::{KataSolver, TokenBreakdown};
