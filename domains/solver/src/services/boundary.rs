//! LLM boundary consumed by the solver
//!
//! `LlmBoundary` is the narrow contract the solver depends on: a prompt plus
//! the prior message log in, one validated `LlmResponse` out.
//! `LlmServiceBoundary` adapts any `kata_llm::LlmService` to it.

use std::sync::Arc;

use kata_common::{Error, Result};
use kata_llm::{CompletionRequest, LlmMessage, LlmRole, LlmService};

use crate::domain::entities::{LlmResponse, Message, MessageRole, TokenUsage};

#[async_trait::async_trait]
pub trait LlmBoundary: Send + Sync {
    /// Send `prompt` with `history` as prior context
    ///
    /// Every failure, including a response that does not satisfy the
    /// `LlmResponse` invariants, is reported as `Error::Upstream`.
    async fn send_message(&self, prompt: &str, history: &[Message]) -> Result<LlmResponse>;
}

/// Boundary backed by an `LlmService`
pub struct LlmServiceBoundary {
    service: Arc<dyn LlmService>,
}

impl LlmServiceBoundary {
    pub fn new(service: Arc<dyn LlmService>) -> Self {
        Self { service }
    }
}

impl From<Box<dyn LlmService>> for LlmServiceBoundary {
    fn from(service: Box<dyn LlmService>) -> Self {
        Self::new(Arc::from(service))
    }
}

fn llm_role(role: MessageRole) -> LlmRole {
    match role {
        MessageRole::System => LlmRole::System,
        MessageRole::User => LlmRole::User,
        MessageRole::Assistant => LlmRole::Assistant,
    }
}

#[async_trait::async_trait]
impl LlmBoundary for LlmServiceBoundary {
    async fn send_message(&self, prompt: &str, history: &[Message]) -> Result<LlmResponse> {
        let messages: Vec<LlmMessage> = history
            .iter()
            .map(|m| LlmMessage {
                role: llm_role(m.role()),
                content: m.content().to_string(),
            })
            .chain(std::iter::once(LlmMessage::user(prompt)))
            .collect();

        let request = CompletionRequest {
            messages,
            ..CompletionRequest::default()
        };

        let completion = self
            .service
            .complete(request)
            .await
            .map_err(|e| Error::Upstream(e.to_string()))?;

        let usage = TokenUsage {
            prompt_tokens: completion.prompt_tokens,
            completion_tokens: completion.completion_tokens,
            total_tokens: completion.total_tokens,
        };

        LlmResponse::new(
            completion.content,
            usage,
            completion.model,
            completion.finish_reason,
        )
        .map_err(|e| Error::Upstream(format!("Malformed LLM response: {}", e)))
    }
}
