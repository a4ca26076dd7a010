//! Conversation flow against an OpenAI-compatible endpoint
//!
//! The endpoint is served by wiremock so usage figures are fixed and the
//! incremental token accounting can be checked exactly.

use kata_common::Error;
use kata_solver::MessageRole;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;

#[test_log::test(tokio::test)]
async fn test_token_accounting_across_turns() {
    let server = MockServer::start().await;
    common::mount_reply(
        &server,
        "Now in Rust",
        common::completion("fn main() {}", 70, 40),
    )
    .await;
    Mock::given(method("POST"))
        .and(path(common::CHAT_PATH))
        .and(header("authorization", "Bearer test-api-key"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(common::completion("def fizzbuzz(): ...", 20, 30)),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;

    let facade = common::openai_facade(&server);

    let reply = facade.start_conversation("Solve fizzbuzz").await.unwrap();
    assert_eq!(reply.response, "def fizzbuzz(): ...");

    let solver = facade.solver();
    let id = reply.conversation_id;
    assert_eq!(solver.get_conversation_token_count(id).await.unwrap(), 50);

    let answer = facade
        .continue_conversation(&id.to_string(), "Now in Rust")
        .await
        .unwrap();
    assert_eq!(answer, "fn main() {}");

    let messages = solver.get_conversation_history(id).await.unwrap();
    let counts: Vec<i64> = messages.iter().map(|m| m.token_count()).collect();
    assert_eq!(counts, vec![20, 30, 20, 40]);
    assert_eq!(messages[2].role(), MessageRole::User);
    assert_eq!(solver.get_conversation_token_count(id).await.unwrap(), 110);

    let usage = facade.context_usage(id).await.unwrap();
    assert_eq!(usage.used_tokens, 110);
    assert!(!usage.near_limit);
}

#[test_log::test(tokio::test)]
async fn test_prompt_tokens_below_running_total_clamp_to_zero() {
    let server = MockServer::start().await;
    common::mount_reply(&server, "Shorter please", common::completion("ok", 10, 5)).await;
    Mock::given(method("POST"))
        .and(path(common::CHAT_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(common::completion("long answer", 20, 30)),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;

    let facade = common::openai_facade(&server);
    let reply = facade.start_conversation("Explain recursion").await.unwrap();
    let id = reply.conversation_id;

    facade
        .continue_conversation(&id.to_string(), "Shorter please")
        .await
        .unwrap();

    let messages = facade.solver().get_conversation_history(id).await.unwrap();
    assert_eq!(messages[2].token_count(), 0);
    assert_eq!(messages[3].token_count(), 5);
    assert_eq!(
        facade.solver().get_conversation_token_count(id).await.unwrap(),
        55
    );
}

#[test_log::test(tokio::test)]
async fn test_upstream_failure_on_start_registers_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(common::CHAT_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
            "error": {"message": "The server had an error", "type": "server_error"}
        })))
        .mount(&server)
        .await;

    let facade = common::openai_facade(&server);
    let result = facade.start_conversation("Solve fizzbuzz").await;

    assert!(matches!(result, Err(Error::Upstream(_))));
    assert!(facade.solver().store().is_empty());
}

#[test_log::test(tokio::test)]
async fn test_upstream_failure_on_continue_leaves_conversation_untouched() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(common::CHAT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::completion("answer", 12, 8)))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(common::CHAT_PATH))
        .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
            "error": {"message": "Rate limit reached", "type": "requests"}
        })))
        .mount(&server)
        .await;

    let facade = common::openai_facade(&server);
    let reply = facade.start_conversation("Solve it").await.unwrap();
    let id = reply.conversation_id;
    let before = facade.solver().get_conversation(id).await.unwrap();

    let result = facade
        .continue_conversation(&id.to_string(), "Again")
        .await;

    assert!(matches!(result, Err(Error::Upstream(_))));
    let after = facade.solver().get_conversation(id).await.unwrap();
    assert_eq!(after, before);
    assert_eq!(after.message_count(), 2);
    assert_eq!(after.total_tokens(), 20);
}
