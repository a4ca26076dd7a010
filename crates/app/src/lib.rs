//! Kata solver application composition root
//!
//! Wires configuration, the LLM service and the solver together behind a
//! string-based facade.

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use kata_common::{Error, Result};
use kata_llm::{LlmConfig, LlmError, LlmServiceFactory};
use kata_solver::{KataSolver, LlmBoundary, LlmServiceBoundary};

/// Reply to the first prompt of a conversation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SolverReply {
    pub conversation_id: Uuid,
    pub response: String,
}

/// How much of the model context window a conversation occupies
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextUsage {
    pub used_tokens: i64,
    pub context_window: u32,
    pub ratio: f64,
    /// Whether `ratio` reached the configured warning threshold
    pub near_limit: bool,
}

fn configuration_error(err: LlmError) -> Error {
    Error::Configuration(err.to_string())
}

/// Facade over the kata solver
pub struct KataSolverFacade {
    config: LlmConfig,
    solver: KataSolver,
}

impl KataSolverFacade {
    /// Build the facade from environment configuration
    pub fn from_env() -> Result<Self> {
        let config = LlmConfig::from_env().map_err(configuration_error)?;
        Self::new(config)
    }

    /// Build the facade from explicit configuration
    pub fn new(config: LlmConfig) -> Result<Self> {
        config.validate().map_err(configuration_error)?;
        let service = LlmServiceFactory::create(config.clone()).map_err(configuration_error)?;
        let boundary = Arc::new(LlmServiceBoundary::from(service));

        tracing::info!(provider = %config.provider, "Kata solver initialized");

        Ok(Self::with_boundary(config, boundary))
    }

    /// Build the facade over an already constructed boundary
    pub fn with_boundary(config: LlmConfig, boundary: Arc<dyn LlmBoundary>) -> Self {
        Self {
            config,
            solver: KataSolver::with_boundary(boundary),
        }
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    pub fn solver(&self) -> &KataSolver {
        &self.solver
    }

    /// Start a conversation and return its id with the assistant's reply
    pub async fn start_conversation(&self, prompt: &str) -> Result<SolverReply> {
        let conversation = self.solver.start_conversation(prompt).await?;
        let response = conversation
            .messages()
            .last()
            .map(|m| m.content().to_string())
            .ok_or_else(|| {
                Error::InvariantViolation("Started conversation has no reply".to_string())
            })?;

        Ok(SolverReply {
            conversation_id: conversation.id(),
            response,
        })
    }

    /// Continue a conversation addressed by its textual id
    pub async fn continue_conversation(
        &self,
        conversation_id: &str,
        user_message: &str,
    ) -> Result<String> {
        let Ok(id) = Uuid::parse_str(conversation_id) else {
            if user_message.trim().is_empty() {
                return Err(Error::InvalidArgument(
                    "User message cannot be empty".to_string(),
                ));
            }
            return Err(Error::NotFound(format!(
                "Conversation not found: {}",
                conversation_id
            )));
        };

        let response = self.solver.continue_conversation(id, user_message).await?;
        self.context_usage(id).await?;

        Ok(response.content().to_string())
    }

    /// Context window occupancy of a conversation
    pub async fn context_usage(&self, conversation_id: Uuid) -> Result<ContextUsage> {
        let used_tokens = self
            .solver
            .get_conversation_token_count(conversation_id)
            .await?;
        let context_window = self.config.context_window;
        let ratio = used_tokens as f64 / f64::from(context_window.max(1));
        let near_limit = ratio >= f64::from(self.config.warning_threshold);

        if near_limit {
            tracing::warn!(
                conversation_id = %conversation_id,
                used_tokens,
                context_window,
                "Conversation is approaching the model context window"
            );
        }

        Ok(ContextUsage {
            used_tokens,
            context_window,
            ratio,
            near_limit,
        })
    }
}
