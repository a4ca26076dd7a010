//! Offline provider selected with `LLM_PROVIDER=mock`
//!
//! Echoes the latest prompt back and reports a rough four-characters-per-token
//! usage, so token totals grow with the conversation the way a real provider's
//! prompt counts do.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::{CompletionRequest, CompletionResponse, LlmError, LlmService};

const MOCK_MODEL: &str = "mock-model";

/// Deterministic completion service that never leaves the process
#[derive(Debug, Clone, Default)]
pub struct MockLlmService {
    calls: Arc<AtomicUsize>,
    unavailable: bool,
}

impl MockLlmService {
    pub fn new() -> Self {
        Self::default()
    }

    /// A service whose every call fails as if the provider were down
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    /// Number of completions requested so far, failed ones included
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn estimate_tokens(text: &str) -> i64 {
    match text.len() {
        0 => 0,
        len => (len as i64 / 4).max(1),
    }
}

#[async_trait::async_trait]
impl LlmService for MockLlmService {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(call, messages = request.messages.len(), "Mock completion");

        if self.unavailable {
            return Err(LlmError::Request("mock provider unavailable".to_string()));
        }

        let prompt = request
            .messages
            .last()
            .map(|m| m.content.as_str())
            .unwrap_or("empty");
        let content = format!("Mock response to: {}", prompt);

        let prompt_tokens: i64 = request
            .messages
            .iter()
            .map(|m| estimate_tokens(&m.content))
            .sum();
        let completion_tokens = estimate_tokens(&content);

        Ok(CompletionResponse {
            model: match request.model.as_str() {
                "" => MOCK_MODEL.to_string(),
                _ => request.model,
            },
            content,
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
            finish_reason: "stop".to_string(),
        })
    }

    fn default_model(&self) -> &str {
        MOCK_MODEL
    }
}
