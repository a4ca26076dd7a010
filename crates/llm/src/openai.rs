//! OpenAI Chat Completions Implementation
//!
//! Calls the OpenAI Chat Completions API (https://api.openai.com/v1/chat/completions)
//! using reqwest HTTP client.

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{CompletionRequest, CompletionResponse, LlmConfig, LlmError, LlmService};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// Chat Completions API request body
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<MessageBody>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct MessageBody {
    role: &'static str,
    content: String,
}

/// Chat Completions API response body
#[derive(Debug, Deserialize)]
struct ChatResponse {
    model: String,
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: i64,
    completion_tokens: i64,
    total_tokens: i64,
}

/// OpenAI API error response
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(rename = "type")]
    error_type: Option<String>,
    message: String,
}

/// OpenAI LLM service implementation
pub struct OpenAiService {
    client: Client,
    config: LlmConfig,
    base_url: String,
}

impl OpenAiService {
    /// Create a new OpenAI service
    pub fn new(config: LlmConfig) -> Self {
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Self {
            client: Client::new(),
            config,
            base_url,
        }
    }
}

#[async_trait::async_trait]
impl LlmService for OpenAiService {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let model = if request.model.is_empty() {
            self.config.default_model.clone()
        } else {
            request.model
        };

        let max_tokens = request.max_tokens.unwrap_or(self.config.max_tokens);
        let temperature = request.temperature.unwrap_or(self.config.temperature);

        let messages: Vec<MessageBody> = request
            .messages
            .into_iter()
            .map(|m| MessageBody {
                role: m.role.as_str(),
                content: m.content,
            })
            .collect();

        let body = ChatRequest {
            model: model.clone(),
            messages,
            max_tokens,
            temperature,
        };

        let url = format!("{}/v1/chat/completions", self.base_url);

        tracing::debug!(
            model = %model,
            max_tokens = %max_tokens,
            message_count = body.messages.len(),
            "Sending OpenAI API request"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Request(format!("OpenAI API error: {}", e)))?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(LlmError::RateLimit);
        }

        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());

            if let Ok(error_response) = serde_json::from_str::<ErrorResponse>(&error_body) {
                return Err(LlmError::Response(format!(
                    "OpenAI API error ({}): {}",
                    error_response
                        .error
                        .error_type
                        .unwrap_or_else(|| status.to_string()),
                    error_response.error.message
                )));
            }

            return Err(LlmError::Response(format!(
                "OpenAI API returned {}: {}",
                status, error_body
            )));
        }

        let api_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Response(format!("Failed to parse response: {}", e)))?;

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .filter(|c| {
                c.message
                    .content
                    .as_deref()
                    .is_some_and(|text| !text.is_empty())
            })
            .ok_or_else(|| {
                LlmError::Response("No response content from OpenAI API".to_string())
            })?;

        let usage = api_response.usage.ok_or_else(|| {
            LlmError::Response("No usage information from OpenAI API".to_string())
        })?;

        Ok(CompletionResponse {
            content: choice.message.content.unwrap_or_default(),
            model: api_response.model,
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
            finish_reason: choice
                .finish_reason
                .unwrap_or_else(|| "unknown".to_string()),
        })
    }

    fn default_model(&self) -> &str {
        &self.config.default_model
    }
}
