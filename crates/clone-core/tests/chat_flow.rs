//! End-to-end chat turns against a mocked OpenAI-compatible server.
//!
//! The memory table is loaded from CSV, the query is embedded through the
//! mocked `/embeddings` endpoint, and the completion request is checked for
//! the retrieved memory before the reply is printed by the REPL.

use clone_core::config::OpenAiConfig;
use clone_core::repl::{ExitReason, FAREWELL};
use clone_core::{
    EmbeddingService, MemoryTable, OpenAiChatClient, PromptDispatcher, ReplDriver,
    SemanticMemoryStore,
};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MEMORIES_CSV: &str = "text,embedding\n\
\"User lives in Lisbon\",\"[0.0, 1.0]\"\n\
\"User's dog is named Rex\",\"[1.0, 0.0]\"\n";

fn openai_config(server: &MockServer) -> OpenAiConfig {
    OpenAiConfig {
        api_key: "test-key".to_string(),
        base_url: server.uri(),
        max_retries: 0,
        ..OpenAiConfig::default()
    }
}

async fn mount_embeddings(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"embedding": [0.9, 0.1], "index": 0}],
            "model": "text-embedding-ada-002"
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_memory_grounded_turn() {
    let server = MockServer::start().await;
    mount_embeddings(&server).await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({
            "messages": [
                {"role": "system", "content": "Relevant memories:\n- User's dog is named Rex"},
                {"role": "user", "content": "What is my dog's name?"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "Your dog is Rex."}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = openai_config(&server);
    let table = MemoryTable::from_reader(MEMORIES_CSV.as_bytes(), Path::new("memories.csv")).unwrap();
    let store = SemanticMemoryStore::new(Arc::new(table), EmbeddingService::from_config(&config).unwrap());
    let api = OpenAiChatClient::new(&config).unwrap();
    let mut driver = ReplDriver::new(PromptDispatcher::new(1), store, api);

    let mut output = Vec::new();
    let summary = driver
        .run("What is my dog's name?\nthank you clone\n".as_bytes(), &mut output)
        .await
        .unwrap();
    let output = String::from_utf8(output).unwrap();

    assert_eq!(summary.turns, 1);
    assert_eq!(summary.exit, ExitReason::Sentinel);
    assert!(output.contains("Your dog is Rex.\n"));
    assert!(output.contains(FAREWELL));
    assert_eq!(driver.session().len(), 2);
}

#[tokio::test]
async fn test_auth_failure_keeps_loop_running() {
    let server = MockServer::start().await;
    mount_embeddings(&server).await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}
        })))
        .expect(2)
        .mount(&server)
        .await;

    let config = openai_config(&server);
    let table = MemoryTable::from_reader(MEMORIES_CSV.as_bytes(), Path::new("memories.csv")).unwrap();
    let store = SemanticMemoryStore::new(Arc::new(table), EmbeddingService::from_config(&config).unwrap());
    let api = OpenAiChatClient::new(&config).unwrap();
    let mut driver = ReplDriver::new(PromptDispatcher::default(), store, api);

    let mut output = Vec::new();
    let summary = driver
        .run("first\nsecond\nThank you clone\n".as_bytes(), &mut output)
        .await
        .unwrap();
    let output = String::from_utf8(output).unwrap();

    assert_eq!(summary.failed_turns, 2);
    assert_eq!(summary.turns, 0);
    assert_eq!(output.matches("Error: Authentication rejected").count(), 2);
    assert!(driver.session().is_empty());
}
