#![allow(missing_docs)]

use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use neuro_agent::{
    ChatMessage, HttpReasoningEngine, InferenceError, InferenceRequest, ReasoningEngine,
};
use futures::StreamExt;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[derive(Clone, Default)]
struct MockState {
    bodies: Arc<Mutex<Vec<Value>>>,
    auth: Arc<Mutex<Vec<Option<String>>>>,
}

async fn handle_completion(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    state.bodies.lock().expect("bodies lock").push(body.clone());
    state.auth.lock().expect("auth lock").push(
        headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(ToString::to_string),
    );
    let prompt = body["messages"][1]["content"].as_str().unwrap_or_default();
    if prompt == "fail" {
        return (StatusCode::SERVICE_UNAVAILABLE, "model loading").into_response();
    }
    if prompt == "garbage" {
        return (StatusCode::OK, "not json").into_response();
    }
    if prompt == "units" {
        return ([(header::CONTENT_TYPE, "text/event-stream")], split_utf8_body()).into_response();
    }
    if body["stream"].as_bool() == Some(true) {
        let stream = [
            r#"data: {"choices":[{"delta":{"role":"assistant"}}]}"#,
            r#"data: {"choices":[{"delta":{"content":"{\"name\": "}}]}"#,
            r#"data: {"choices":[{"delta":{"content":"\"get_status\"}"}}]}"#,
            "data: [DONE]",
        ]
        .join("\n\n");
        return ([(header::CONTENT_TYPE, "text/event-stream")], stream).into_response();
    }
    Json(json!({
        "choices": [{"message": {"role": "assistant", "content": "Loaded."}}]
    }))
    .into_response()
}

/// SSE body delivered in two chunks cut between the two bytes of `µ`.
fn split_utf8_body() -> Body {
    let payload =
        "data: {\"choices\":[{\"delta\":{\"content\":\"Amplitude 40 µV\"}}]}\n\ndata: [DONE]\n\n"
            .as_bytes()
            .to_vec();
    let cut = payload
        .iter()
        .position(|byte| *byte == 0xC2)
        .expect("multi-byte lead")
        + 1;
    let chunks = vec![payload[..cut].to_vec(), payload[cut..].to_vec()];
    Body::from_stream(futures::stream::iter(chunks).then(|chunk| async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        Ok::<_, Infallible>(chunk)
    }))
}

async fn spawn_mock() -> Result<Option<(String, MockState)>> {
    let state = MockState::default();
    let app = Router::new()
        .route("/v1/chat/completions", post(handle_completion))
        .with_state(state.clone());
    let listener = match tokio::net::TcpListener::bind("127.0.0.1:0").await {
        Ok(listener) => listener,
        Err(err) if err.kind() == std::io::ErrorKind::PermissionDenied => {
            eprintln!("skipping llm client tests: local socket bind is not permitted");
            return Ok(None);
        }
        Err(err) => return Err(err.into()),
    };
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(Some((format!("http://{addr}/v1/chat/completions"), state)))
}

fn request(prompt: &str, stream: bool) -> InferenceRequest {
    InferenceRequest {
        messages: vec![ChatMessage::system("instructions"), ChatMessage::user(prompt)],
        temperature: 0.1,
        max_output_tokens: 64,
        stream,
    }
}

#[tokio::test]
async fn batched_completion_returns_message_content() -> Result<()> {
    let Some((url, state)) = spawn_mock().await? else {
        return Ok(());
    };
    let engine = HttpReasoningEngine::new(url, "local-model".to_string(), Some("k-1".to_string()));
    let (fragments, _rx) = mpsc::channel(8);

    let text = engine
        .generate(request("load it", false), fragments, CancellationToken::new())
        .await
        .expect("completion");

    assert_eq!(text, "Loaded.");
    let bodies = state.bodies.lock().expect("bodies lock").clone();
    assert_eq!(bodies[0]["model"], "local-model");
    assert_eq!(bodies[0]["max_tokens"], 64);
    assert_eq!(bodies[0]["messages"][0]["role"], "system");
    assert_eq!(
        state.auth.lock().expect("auth lock")[0].as_deref(),
        Some("Bearer k-1")
    );
    Ok(())
}

#[tokio::test]
async fn streamed_completion_forwards_fragments() -> Result<()> {
    let Some((url, _state)) = spawn_mock().await? else {
        return Ok(());
    };
    let engine = HttpReasoningEngine::new(url, "local-model".to_string(), None);
    let (fragments, mut rx) = mpsc::channel(8);

    let text = engine
        .generate(request("status", true), fragments, CancellationToken::new())
        .await
        .expect("completion");

    assert_eq!(text, r#"{"name": "get_status"}"#);
    let mut received = Vec::new();
    while let Ok(fragment) = rx.try_recv() {
        received.push(fragment);
    }
    assert_eq!(received, vec![r#"{"name": "#.to_string(), r#""get_status"}"#.to_string()]);
    Ok(())
}

#[tokio::test]
async fn streamed_characters_split_across_chunks_stay_intact() -> Result<()> {
    let Some((url, _state)) = spawn_mock().await? else {
        return Ok(());
    };
    let engine = HttpReasoningEngine::new(url, "local-model".to_string(), None);
    let (fragments, mut rx) = mpsc::channel(8);

    let text = engine
        .generate(request("units", true), fragments, CancellationToken::new())
        .await
        .expect("completion");

    assert_eq!(text, "Amplitude 40 µV");
    assert!(!text.contains('\u{FFFD}'));
    assert_eq!(rx.try_recv().ok().as_deref(), Some("Amplitude 40 µV"));
    Ok(())
}

#[tokio::test]
async fn non_success_status_is_reported_with_body() -> Result<()> {
    let Some((url, _state)) = spawn_mock().await? else {
        return Ok(());
    };
    let engine = HttpReasoningEngine::new(url, "m".to_string(), None);
    let (fragments, _rx) = mpsc::channel(8);

    let error = engine
        .generate(request("fail", false), fragments, CancellationToken::new())
        .await
        .expect_err("status error");

    assert!(matches!(
        &error,
        InferenceError::HttpStatus { status: 503, body } if body == "model loading"
    ));
    assert!(!error.is_soft());
    Ok(())
}

#[tokio::test]
async fn undecodable_body_is_a_soft_error() -> Result<()> {
    let Some((url, _state)) = spawn_mock().await? else {
        return Ok(());
    };
    let engine = HttpReasoningEngine::new(url, "m".to_string(), None);
    let (fragments, _rx) = mpsc::channel(8);

    let error = engine
        .generate(request("garbage", false), fragments, CancellationToken::new())
        .await
        .expect_err("malformed");

    assert!(matches!(error, InferenceError::Malformed(_)));
    assert!(error.is_soft());
    Ok(())
}

#[tokio::test]
async fn unreachable_endpoint_is_a_hard_error() {
    let engine = HttpReasoningEngine::new(
        "http://127.0.0.1:9/v1/chat/completions".to_string(),
        "m".to_string(),
        None,
    );
    let (fragments, _rx) = mpsc::channel(8);

    let error = engine
        .generate(request("hi", false), fragments, CancellationToken::new())
        .await
        .expect_err("unreachable");

    assert!(matches!(error, InferenceError::Unreachable(_)));
}

#[tokio::test]
async fn cancelled_token_short_circuits() {
    let engine = HttpReasoningEngine::new(
        "http://127.0.0.1:9/v1/chat/completions".to_string(),
        "m".to_string(),
        None,
    );
    let (fragments, _rx) = mpsc::channel(8);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let error = engine
        .generate(request("hi", false), fragments, cancel)
        .await
        .expect_err("cancelled");

    assert!(matches!(error, InferenceError::Cancelled));
}
