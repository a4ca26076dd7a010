//! Kata Solver LLM Service
//!
//! Provides chat completion access with support for:
//! - OpenAI chat completions API for production
//! - Mock LLM service for testing and development
//! - Environment-driven model, sampling and context window settings

pub mod mock;
pub mod openai;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_MODEL: &str = "gpt-4-turbo-preview";
const DEFAULT_MAX_TOKENS: u32 = 4096;
const DEFAULT_TEMPERATURE: f32 = 0.7;
const DEFAULT_CONTEXT_WINDOW: u32 = 128_000;
const DEFAULT_WARNING_THRESHOLD: f32 = 0.8;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("LLM configuration error: {0}")]
    Configuration(String),

    #[error("LLM request error: {0}")]
    Request(String),

    #[error("LLM response error: {0}")]
    Response(String),

    #[error("LLM rate limit exceeded")]
    RateLimit,
}

/// Role of a message sent to the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmRole {
    System,
    User,
    Assistant,
}

impl LlmRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            LlmRole::System => "system",
            LlmRole::User => "user",
            LlmRole::Assistant => "assistant",
        }
    }
}

/// A single message in a completion request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmMessage {
    pub role: LlmRole,
    pub content: String,
}

impl LlmMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: LlmRole::User,
            content: content.into(),
        }
    }
}

/// Completion request, provider independent
#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    /// Model override; empty means the service default
    pub model: String,
    pub messages: Vec<LlmMessage>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

/// Completion response, provider independent
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionResponse {
    pub content: String,
    pub model: String,
    pub prompt_tokens: i64,
    pub completion_tokens: i64,
    pub total_tokens: i64,
    pub finish_reason: String,
}

/// LLM service configuration
#[derive(Clone)]
pub struct LlmConfig {
    /// LLM provider (openai, mock)
    pub provider: String,
    pub api_key: String,
    pub default_model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Model context window in tokens
    pub context_window: u32,
    /// Fraction of the context window after which usage is reported as near the limit
    pub warning_threshold: f32,
    /// Base URL override (tests, proxies)
    pub base_url: Option<String>,
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("api_key", &"[REDACTED]")
            .field("default_model", &self.default_model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("context_window", &self.context_window)
            .field("warning_threshold", &self.warning_threshold)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "mock".to_string(),
            api_key: String::new(),
            default_model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            context_window: DEFAULT_CONTEXT_WINDOW,
            warning_threshold: DEFAULT_WARNING_THRESHOLD,
            base_url: None,
        }
    }
}

impl LlmConfig {
    /// Create LLM config from environment variables
    pub fn from_env() -> Result<Self, LlmError> {
        dotenvy::dotenv().ok();

        let provider = std::env::var("LLM_PROVIDER").unwrap_or_else(|_| "openai".to_string());

        let api_key = std::env::var("OPENAI_API_KEY").unwrap_or_default();
        if provider == "openai" && api_key.trim().is_empty() {
            return Err(LlmError::Configuration(
                "OPENAI_API_KEY is required".to_string(),
            ));
        }

        let config = Self {
            provider,
            api_key,
            default_model: std::env::var("OPENAI_MODEL")
                .unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            max_tokens: number_env("OPENAI_MAX_TOKENS", DEFAULT_MAX_TOKENS as f64) as u32,
            temperature: number_env("OPENAI_TEMPERATURE", DEFAULT_TEMPERATURE as f64) as f32,
            context_window: number_env("OPENAI_CONTEXT_WINDOW", DEFAULT_CONTEXT_WINDOW as f64)
                as u32,
            warning_threshold: number_env(
                "OPENAI_WARNING_THRESHOLD",
                DEFAULT_WARNING_THRESHOLD as f64,
            ) as f32,
            base_url: std::env::var("OPENAI_BASE_URL").ok(),
        };

        // Range checks run on the raw values so negatives are not lost in the casts
        validate_raw_number("OPENAI_MAX_TOKENS", |v| v > 0.0, "Max tokens must be positive")?;
        validate_raw_number(
            "OPENAI_TEMPERATURE",
            |v| (0.0..=2.0).contains(&v),
            "Temperature must be between 0 and 2",
        )?;
        validate_raw_number(
            "OPENAI_WARNING_THRESHOLD",
            |v| (0.0..=1.0).contains(&v),
            "Warning threshold must be between 0 and 1",
        )?;
        config.validate()?;

        Ok(config)
    }

    /// Check the numeric settings are within their accepted ranges
    pub fn validate(&self) -> Result<(), LlmError> {
        if self.max_tokens == 0 {
            return Err(LlmError::Configuration(
                "Max tokens must be positive".to_string(),
            ));
        }
        if self.context_window == 0 {
            return Err(LlmError::Configuration(
                "Context window must be positive".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(LlmError::Configuration(
                "Temperature must be between 0 and 2".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.warning_threshold) {
            return Err(LlmError::Configuration(
                "Warning threshold must be between 0 and 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Parse a numeric environment variable, falling back to the default when
/// unset or unparsable
fn number_env(key: &str, default: f64) -> f64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<f64>().ok())
        .unwrap_or(default)
}

fn validate_raw_number(
    key: &str,
    accept: impl Fn(f64) -> bool,
    message: &str,
) -> Result<(), LlmError> {
    match std::env::var(key).ok().and_then(|v| v.trim().parse::<f64>().ok()) {
        Some(value) if !accept(value) => Err(LlmError::Configuration(message.to_string())),
        _ => Ok(()),
    }
}

/// LLM service trait for different implementations
#[async_trait::async_trait]
pub trait LlmService: Send + Sync {
    /// Run a single chat completion
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;

    /// Model used when a request does not name one
    fn default_model(&self) -> &str;
}

/// Factory for creating LlmService implementations
pub struct LlmServiceFactory;

impl LlmServiceFactory {
    /// Create an LlmService based on configuration
    pub fn create(config: LlmConfig) -> Result<Box<dyn LlmService>, LlmError> {
        match config.provider.as_str() {
            "openai" => {
                tracing::info!(model = %config.default_model, "Creating OpenAI LLM service");
                if config.api_key.trim().is_empty() {
                    return Err(LlmError::Configuration(
                        "OPENAI_API_KEY is required".to_string(),
                    ));
                }
                Ok(Box::new(openai::OpenAiService::new(config)))
            }
            "mock" => {
                tracing::info!("Creating mock LLM service");
                Ok(Box::new(mock::MockLlmService::new()))
            }
            provider => Err(LlmError::Configuration(format!(
                "Unknown LLM provider: {}. Supported providers: openai, mock",
                provider
            ))),
        }
    }
}
