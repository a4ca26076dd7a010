//! Common test utilities and fixtures for integration tests
//!
//! This module provides shared infrastructure for the integration tests:
//! - Facade construction over the mock provider
//! - A wiremock-backed OpenAI chat completions endpoint
//! - Canned completion bodies

#![allow(dead_code)]

use kata_app::KataSolverFacade;
use kata_llm::LlmConfig;
use serde_json::{json, Value};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const CHAT_PATH: &str = "/v1/chat/completions";

/// Facade wired to the deterministic mock provider
pub fn mock_facade() -> KataSolverFacade {
    KataSolverFacade::new(LlmConfig::default()).expect("mock facade should build")
}

/// Facade wired to an OpenAI-compatible server
pub fn openai_facade(server: &MockServer) -> KataSolverFacade {
    let config = LlmConfig {
        provider: "openai".to_string(),
        api_key: "test-api-key".to_string(),
        default_model: "gpt-4".to_string(),
        base_url: Some(server.uri()),
        ..LlmConfig::default()
    };
    KataSolverFacade::new(config).expect("openai facade should build")
}

/// Chat completions body with the given reply and usage
pub fn completion(content: &str, prompt_tokens: i64, completion_tokens: i64) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "model": "gpt-4-0613",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {
            "prompt_tokens": prompt_tokens,
            "completion_tokens": completion_tokens,
            "total_tokens": prompt_tokens + completion_tokens
        }
    })
}

/// Answer requests whose body mentions `needle` with a canned completion
pub async fn mount_reply(server: &MockServer, needle: &str, body: Value) {
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .and(body_string_contains(needle))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}
