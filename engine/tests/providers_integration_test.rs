//! Integration tests for the HTTP-backed providers
//!
//! OpenAI-compatible chat completions (Nebius, OpenAI), Ollama and Tavily are
//! served by a local wiremock server.

use jobplanner_engine::llm::ollama::OllamaProvider;
use jobplanner_engine::llm::openai::OpenAIProvider;
use jobplanner_engine::llm::{invoke_structured, LLMError, LLMProvider, Message, OutputSchema};
use jobplanner_engine::secrets::SecretString;
use jobplanner_engine::tools::{TavilySearch, WebSearchProvider};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use wiremock::{
    matchers::{body_partial_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

#[derive(Debug, Deserialize)]
struct Plan {
    steps: Vec<String>,
}

fn plan_schema() -> OutputSchema {
    OutputSchema::new(
        "plan",
        json!({
            "type": "object",
            "properties": { "steps": { "type": "array", "items": { "type": "string" } } },
            "required": ["steps"]
        }),
    )
}

fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    })
}

fn nebius(uri: &str) -> OpenAIProvider {
    OpenAIProvider::new(
        "nebius",
        uri,
        "Qwen/Qwen3-14B",
        SecretString::new("test-nebius-key"),
        Duration::from_secs(5),
    )
    .unwrap()
}

#[tokio::test]
async fn test_openai_compatible_generate() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("Authorization", "Bearer test-nebius-key"))
        .and(body_partial_json(json!({ "model": "Qwen/Qwen3-14B" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("Hello there")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = nebius(&mock_server.uri());
    let reply = provider.generate(&[Message::user("Hi")]).await.unwrap();
    assert_eq!(reply, "Hello there");
}

#[tokio::test]
async fn test_openai_compatible_structured_uses_json_schema() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({
            "response_format": { "type": "json_schema", "json_schema": { "name": "plan" } }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(
            "<think>two steps</think>\n{\"steps\": [\"list_all_jobs()\", \"Summarize\"]}",
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = nebius(&mock_server.uri());
    let plan: Plan = invoke_structured(&provider, &[Message::user("Plan")], &plan_schema())
        .await
        .unwrap();
    assert_eq!(plan.steps, vec!["list_all_jobs()", "Summarize"]);
}

#[tokio::test]
async fn test_structured_reply_missing_field_is_schema_mismatch() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("{\"plan\": []}")))
        .mount(&mock_server)
        .await;

    let provider = nebius(&mock_server.uri());
    let err = invoke_structured::<Plan>(&provider, &[Message::user("Plan")], &plan_schema())
        .await
        .unwrap_err();
    assert!(matches!(err, LLMError::SchemaMismatch(msg) if msg.starts_with("plan:")));
}

#[tokio::test]
async fn test_openai_compatible_status_mapping() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(401).set_body_string("invalid key sk-abcdefghijklmnopqrstuvwx"),
        )
        .mount(&mock_server)
        .await;

    let provider = nebius(&mock_server.uri());
    match provider.generate(&[Message::user("Hi")]).await {
        Err(LLMError::AuthenticationFailed(msg)) => {
            assert!(!msg.contains("sk-abcdefghijklmnopqrstuvwx"));
        }
        other => panic!("Expected AuthenticationFailed, got: {:?}", other),
    }
}

#[tokio::test]
async fn test_openai_compatible_server_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&mock_server)
        .await;

    let provider = nebius(&mock_server.uri());
    let err = provider.generate(&[Message::user("Hi")]).await.unwrap_err();
    assert!(matches!(err, LLMError::ProviderUnavailable(_)));
}

#[tokio::test]
async fn test_ollama_chat_and_structured() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({ "model": "qwen3:14b", "stream": false, "format": { "required": ["steps"] } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "qwen3:14b",
            "created_at": "2024-01-01T00:00:00Z",
            "message": { "role": "assistant", "content": "{\"steps\": [\"list_all_jobs()\"]}" },
            "done": true
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider =
        OllamaProvider::new(mock_server.uri(), "qwen3:14b", Duration::from_secs(5)).unwrap();
    assert_eq!(provider.name(), "ollama");
    assert!(provider.is_local());

    let plan: Plan = invoke_structured(&provider, &[Message::user("Plan")], &plan_schema())
        .await
        .unwrap();
    assert_eq!(plan.steps, vec!["list_all_jobs()"]);
}

#[tokio::test]
async fn test_ollama_health_check() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "models": [] })))
        .mount(&mock_server)
        .await;

    let provider =
        OllamaProvider::new(mock_server.uri(), "qwen3:14b", Duration::from_secs(5)).unwrap();
    assert!(provider.check_health().await);
}

#[tokio::test]
async fn test_ollama_connection_error() {
    // Nothing listens on port 9
    let provider =
        OllamaProvider::new("http://127.0.0.1:9", "qwen3:14b", Duration::from_secs(2)).unwrap();

    match provider.generate(&[Message::user("Hello")]).await {
        Err(LLMError::ProviderUnavailable(msg)) => {
            assert!(msg.contains("Cannot connect to Ollama"));
        }
        Err(LLMError::NetworkError(_)) | Err(LLMError::Timeout) => {}
        other => panic!("Expected a connection failure, got: {:?}", other),
    }
}

#[tokio::test]
async fn test_tavily_search_formats_results() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/search"))
        .and(body_partial_json(json!({
            "api_key": "tvly-test",
            "query": "rust courses",
            "max_results": 2
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "query": "rust courses",
            "results": [
                { "title": "The Book", "url": "https://doc.rust-lang.org/book/", "content": "Learn Rust." },
                { "title": "Rustlings", "url": "https://github.com/rust-lang/rustlings", "content": "Small exercises." }
            ]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let search = TavilySearch::new(mock_server.uri(), SecretString::new("tvly-test"), 2).unwrap();
    let text = search.search("rust courses").await.unwrap();

    assert_eq!(
        text,
        "Web results for 'rust courses':\n\
         1. The Book\n   https://doc.rust-lang.org/book/\n   Learn Rust.\n\
         2. Rustlings\n   https://github.com/rust-lang/rustlings\n   Small exercises."
    );
}

#[tokio::test]
async fn test_tavily_empty_and_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/search"))
        .and(body_partial_json(json!({ "query": "nothing" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": [] })))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/search"))
        .and(body_partial_json(json!({ "query": "boom" })))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
        .mount(&mock_server)
        .await;

    let search = TavilySearch::new(mock_server.uri(), SecretString::new("tvly-test"), 2).unwrap();

    assert_eq!(
        search.search("nothing").await.unwrap(),
        "No web results found for 'nothing'"
    );

    let err = search.search("boom").await.unwrap_err();
    assert!(matches!(err, sdk::EngineError::WebSearch(msg) if msg.contains("500")));
}
