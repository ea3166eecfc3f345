//! `GroqProvider` against a scripted local chat-completions endpoint.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use llm::{GroqConfig, GroqProvider};
use pipeline::{CompletionError, CompletionProvider, CompletionRequest, ModelName};
use serde_json::{json, Value};
use tokio::net::TcpListener;

const OK_BODY: &str = r#"{"choices":[{"message":{"content":"drafted"}}],"usage":{"total_tokens":42}}"#;

/// One request as the endpoint received it.
#[derive(Debug, Clone)]
struct Received {
    authorization: Option<String>,
    body: Value,
}

/// Replies with the queued `(status, body)` pairs in order and records every
/// request.
#[derive(Clone, Default)]
struct Script {
    replies: Arc<Mutex<VecDeque<(StatusCode, &'static str)>>>,
    received: Arc<Mutex<Vec<Received>>>,
}

impl Script {
    fn received(&self) -> Vec<Received> {
        self.received.lock().unwrap().clone()
    }
}

async fn chat_completions(
    State(script): State<Script>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    script
        .received
        .lock()
        .unwrap()
        .push(Received { authorization, body });

    let (status, body) = script
        .replies
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or((StatusCode::INTERNAL_SERVER_ERROR, "script exhausted"));
    (
        status,
        [
            (header::CONTENT_TYPE, "application/json"),
            (header::RETRY_AFTER, "0"),
        ],
        body,
    )
        .into_response()
}

async fn scripted_server(replies: Vec<(StatusCode, &'static str)>) -> (String, Script) {
    let script = Script {
        replies: Arc::new(Mutex::new(replies.into())),
        ..Script::default()
    };
    let app = Router::new()
        .route("/openai/v1/chat/completions", post(chat_completions))
        .with_state(script.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}/openai/v1"), script)
}

fn provider(base_url: String, api_key: Option<&str>, max_retries: u32) -> GroqProvider {
    GroqProvider::new(GroqConfig {
        api_key: api_key.map(str::to_string),
        base_url,
        timeout: Duration::from_secs(5),
        max_retries,
        initial_backoff: Duration::from_millis(10),
        ..GroqConfig::default()
    })
    .unwrap()
}

fn request() -> CompletionRequest {
    CompletionRequest {
        model: ModelName::new("groq/llama3-8b-8192").unwrap(),
        role: "Content Analyst".into(),
        system: "You are Content Analyst.".into(),
        prompt: "Analyse rust".into(),
    }
}

#[tokio::test]
async fn sends_chat_request_and_parses_reply() {
    let (base, script) = scripted_server(vec![(StatusCode::OK, OK_BODY)]).await;

    let completion = provider(base, Some("secret"), 0)
        .complete(&request())
        .await
        .unwrap();

    assert_eq!(completion.text, "drafted");
    assert_eq!(completion.usage.as_u64(), 42);

    let received = script.received();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].authorization.as_deref(), Some("Bearer secret"));
    let body = &received[0].body;
    assert_eq!(body["model"], json!("llama3-8b-8192"));
    assert_eq!(
        body["messages"],
        json!([
            {"role": "system", "content": "You are Content Analyst."},
            {"role": "user", "content": "Analyse rust"},
        ])
    );
    assert!(body["temperature"].is_number());
}

#[tokio::test]
async fn retries_server_errors_then_succeeds() {
    let (base, script) = scripted_server(vec![
        (StatusCode::SERVICE_UNAVAILABLE, "busy"),
        (StatusCode::OK, OK_BODY),
    ])
    .await;

    let completion = provider(base, Some("k"), 2)
        .complete(&request())
        .await
        .unwrap();

    assert_eq!(completion.text, "drafted");
    assert_eq!(script.received().len(), 2);
}

#[tokio::test]
async fn does_not_retry_client_errors() {
    let (base, script) =
        scripted_server(vec![(StatusCode::UNAUTHORIZED, r#"{"error":"bad key"}"#)]).await;

    let err = provider(base, Some("k"), 3)
        .complete(&request())
        .await
        .unwrap_err();

    match err {
        CompletionError::Status { status, body, .. } => {
            assert_eq!(status, 401);
            assert!(body.contains("bad key"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(script.received().len(), 1);
}

#[tokio::test]
async fn gives_up_after_max_retries() {
    let (base, script) = scripted_server(vec![
        (StatusCode::TOO_MANY_REQUESTS, "slow down"),
        (StatusCode::TOO_MANY_REQUESTS, "slow down"),
    ])
    .await;

    let err = provider(base, Some("k"), 1)
        .complete(&request())
        .await
        .unwrap_err();

    assert!(matches!(err, CompletionError::Status { status: 429, .. }));
    assert_eq!(script.received().len(), 2);
}

#[tokio::test]
async fn missing_api_key_fails_without_a_request() {
    let (base, script) = scripted_server(vec![]).await;
    let provider = provider(base, None, 2);

    assert!(!provider.is_configured());
    let err = provider.complete(&request()).await.unwrap_err();

    assert!(matches!(err, CompletionError::NotConfigured { .. }));
    assert!(script.received().is_empty());
}
