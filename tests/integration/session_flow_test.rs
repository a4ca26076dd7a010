//! End-to-end solving session over the mock provider
//!
//! Drives a conversation through the facade while keeping the session's
//! exchange history the way a front end would: record each exchange, then
//! attach extracted code and an evaluation to the latest entry.

use kata_common::Error;
use kata_solver::{
    Conversation, HistoryEntry, HistoryEvaluation, KataEvaluation, MessageRole, SessionHistory,
};

mod common;

#[test_log::test(tokio::test)]
async fn test_full_session_with_history_enrichment() {
    let facade = common::mock_facade();
    let mut history = SessionHistory::new();

    // First exchange
    let prompt = "Solve fizzbuzz in Rust";
    let reply = facade.start_conversation(prompt).await.unwrap();
    history.record(HistoryEntry::new(prompt, &reply.response).unwrap());

    // Second exchange
    let follow_up = "Add unit tests";
    let id = reply.conversation_id.to_string();
    let answer = facade.continue_conversation(&id, follow_up).await.unwrap();
    history.record(HistoryEntry::new(follow_up, &answer).unwrap());

    // Enrich the latest entry without touching the one already shown
    let shown = history.latest().cloned().unwrap();
    let with_code = shown.with_extracted_code("#[test] fn fizz() {}");
    let ordinal = history.next_evaluation_ordinal();
    let kata_eval = KataEvaluation::new(ordinal, "Score: 9/10", "#[test] fn fizz() {}");
    let evaluation = HistoryEvaluation::from_kata_evaluation(&kata_eval).unwrap();
    history
        .replace_latest(with_code.with_evaluation(evaluation))
        .unwrap();

    assert!(!shown.has_extracted_code());
    assert!(!shown.has_evaluation());

    let latest = history.latest().unwrap();
    assert_eq!(latest.user_prompt(), follow_up);
    assert_eq!(latest.extracted_code(), Some("#[test] fn fizz() {}"));
    assert_eq!(latest.evaluation().map(HistoryEvaluation::ordinal), Some(1));
    assert_eq!(history.next_evaluation_ordinal(), 2);

    // The session history survives a serialization round trip intact
    let json = serde_json::to_string(&history).unwrap();
    let restored: SessionHistory = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, history);

    // Conversation state matches the two exchanges
    let conversation = facade
        .solver()
        .get_conversation(reply.conversation_id)
        .await
        .unwrap();
    let roles: Vec<MessageRole> = conversation.messages().iter().map(|m| m.role()).collect();
    assert_eq!(
        roles,
        vec![
            MessageRole::User,
            MessageRole::Assistant,
            MessageRole::User,
            MessageRole::Assistant
        ]
    );
    let summed: i64 = conversation.messages().iter().map(|m| m.token_count()).sum();
    assert_eq!(conversation.total_tokens(), summed);
}

#[test_log::test(tokio::test)]
async fn test_session_restart_clears_history_and_conversation() {
    let facade = common::mock_facade();
    let mut history = SessionHistory::new();

    let reply = facade.start_conversation("Reverse a string").await.unwrap();
    history.record(HistoryEntry::new("Reverse a string", &reply.response).unwrap());

    facade
        .solver()
        .reset_conversation(reply.conversation_id)
        .await
        .unwrap();
    history.clear();

    assert!(history.is_empty());
    let breakdown = facade
        .solver()
        .get_conversation_token_breakdown(reply.conversation_id)
        .await
        .unwrap();
    assert_eq!(breakdown.message_count, 0);
    assert_eq!(breakdown.total_tokens, 0);

    // The same id keeps accepting turns after a reset
    let id = reply.conversation_id.to_string();
    facade
        .continue_conversation(&id, "Try again")
        .await
        .unwrap();
    let count = facade
        .solver()
        .get_conversation_token_breakdown(reply.conversation_id)
        .await
        .unwrap()
        .message_count;
    assert_eq!(count, 2);
}

#[test_log::test(tokio::test)]
async fn test_conversations_survive_export_and_restore() {
    let facade = common::mock_facade();
    let reply = facade.start_conversation("Sum a list").await.unwrap();
    let id = reply.conversation_id.to_string();
    facade.continue_conversation(&id, "Now recursively").await.unwrap();

    let snapshot = serde_json::to_string(&facade.solver().export_conversations().await).unwrap();

    let fresh = common::mock_facade();
    let conversations: Vec<Conversation> = serde_json::from_str(&snapshot).unwrap();
    for conversation in conversations {
        fresh.solver().restore_conversation(conversation).unwrap();
    }

    let original = facade
        .solver()
        .get_conversation(reply.conversation_id)
        .await
        .unwrap();
    let restored = fresh
        .solver()
        .get_conversation(reply.conversation_id)
        .await
        .unwrap();
    assert_eq!(restored, original);

    // A restored conversation can be continued
    fresh
        .continue_conversation(&id, "And iteratively")
        .await
        .unwrap();
    assert_eq!(
        fresh
            .solver()
            .get_conversation_history(reply.conversation_id)
            .await
            .unwrap()
            .len(),
        6
    );
}

#[test_log::test(tokio::test)]
async fn test_missing_conversation_is_reported() {
    let facade = common::mock_facade();

    let result = facade.continue_conversation("missing-id", "hi").await;
    assert!(matches!(result, Err(Error::NotFound(_))));

    let result = facade
        .continue_conversation(&uuid::Uuid::new_v4().to_string(), "hi")
        .await;
    assert!(matches!(result, Err(Error::NotFound(_))));
}
