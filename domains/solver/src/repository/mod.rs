//! Conversation storage for the solver domain

pub mod conversations;

pub use conversations::{ConversationHandle, ConversationStore};
