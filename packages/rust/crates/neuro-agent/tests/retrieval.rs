#![allow(missing_docs)]

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::Result;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use neuro_agent::{EmbeddingClient, ExampleRetriever, RetrievalConfig, Retriever};
use serde_json::{Value, json};
use tempfile::TempDir;

const CORPUS: &str = r#"[
  {"id": "bandpass", "instruction": "Apply a bandpass filter from 1 to 40 Hz",
   "tool_call": {"name": "apply_filter", "parameters": {"low": 1.0, "high": 40.0}}, "category": "preprocessing"},
  {"id": "notch", "instruction": "Remove 50 Hz line noise",
   "tool_call": {"name": "apply_notch", "parameters": {"freq": 50.0}}, "category": "preprocessing"},
  {"id": "load", "instruction": "Load the recording subject01.edf",
   "tool_call": {"name": "load_data", "parameters": {"path": "subject01.edf"}}, "category": "data"}
]"#;

fn write_corpus(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("examples.json");
    std::fs::write(&path, CORPUS).expect("write corpus");
    path
}

fn categories(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(ToString::to_string).collect()
}

#[derive(Clone)]
struct EmbedState {
    fail: bool,
    calls: Arc<AtomicUsize>,
}

/// Two-dimensional toy embedding: texts mentioning "filter" point one way, the rest the other.
async fn handle_embed_batch(
    State(state): State<EmbedState>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.calls.fetch_add(1, Ordering::Relaxed);
    if state.fail {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"error": "embed backend unavailable"})),
        );
    }
    let vectors: Vec<Vec<f32>> = body["texts"]
        .as_array()
        .map(|texts| {
            texts
                .iter()
                .map(|text| {
                    if text.as_str().unwrap_or_default().contains("filter") {
                        vec![1.0, 0.0]
                    } else {
                        vec![0.0, 1.0]
                    }
                })
                .collect()
        })
        .unwrap_or_default();
    (StatusCode::OK, Json(json!({"vectors": vectors})))
}

async fn spawn_embedding_mock(fail: bool) -> Result<Option<(String, Arc<AtomicUsize>)>> {
    let calls = Arc::new(AtomicUsize::new(0));
    let app = Router::new()
        .route("/embed/batch", post(handle_embed_batch))
        .with_state(EmbedState {
            fail,
            calls: Arc::clone(&calls),
        });
    let listener = match tokio::net::TcpListener::bind("127.0.0.1:0").await {
        Ok(listener) => listener,
        Err(err) if err.kind() == std::io::ErrorKind::PermissionDenied => {
            eprintln!("skipping retrieval tests: local socket bind is not permitted");
            return Ok(None);
        }
        Err(err) => return Err(err.into()),
    };
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(Some((format!("http://{addr}"), calls)))
}

#[tokio::test]
async fn no_corpus_means_no_retriever() -> Result<()> {
    let retriever = Retriever::from_config(&RetrievalConfig::default()).await?;
    assert!(retriever.is_none());
    Ok(())
}

#[tokio::test]
async fn local_encoder_ranks_and_filters_by_category() -> Result<()> {
    let dir = TempDir::new()?;
    let config = RetrievalConfig {
        corpus_path: Some(write_corpus(&dir)),
        ..RetrievalConfig::default()
    };
    let retriever = Retriever::from_config(&config).await?.expect("retriever");
    assert_eq!(retriever.len(), 3);

    let examples = retriever
        .retrieve("apply a bandpass filter", &categories(&["preprocessing"]))
        .await;

    assert_eq!(examples[0].example_id, "bandpass");
    assert!(examples.iter().all(|example| example.category == "preprocessing"));

    let data_only = retriever
        .retrieve("apply a bandpass filter", &categories(&["data"]))
        .await;
    assert!(data_only.iter().all(|example| example.category == "data"));
    Ok(())
}

#[tokio::test]
async fn missing_corpus_file_is_an_error() {
    let config = RetrievalConfig {
        corpus_path: Some(PathBuf::from("/nonexistent/examples.json")),
        ..RetrievalConfig::default()
    };
    assert!(Retriever::from_config(&config).await.is_err());
}

#[tokio::test]
async fn remote_embeddings_drive_ranking() -> Result<()> {
    let Some((url, calls)) = spawn_embedding_mock(false).await? else {
        return Ok(());
    };
    let dir = TempDir::new()?;
    let config = RetrievalConfig {
        corpus_path: Some(write_corpus(&dir)),
        embedding_base_url: Some(url),
        min_score: 0.5,
        ..RetrievalConfig::default()
    };
    let retriever = Retriever::from_config(&config).await?.expect("retriever");

    let examples = retriever.retrieve("filter please", &BTreeSet::new()).await;

    assert_eq!(examples.len(), 1);
    assert_eq!(examples[0].example_id, "bandpass");
    assert_eq!(calls.load(Ordering::Relaxed), 2, "corpus batch + one query");
    Ok(())
}

#[tokio::test]
async fn unavailable_embedding_service_falls_back_to_local_encoder() -> Result<()> {
    let Some((url, calls)) = spawn_embedding_mock(true).await? else {
        return Ok(());
    };
    let dir = TempDir::new()?;
    let config = RetrievalConfig {
        corpus_path: Some(write_corpus(&dir)),
        embedding_base_url: Some(url),
        ..RetrievalConfig::default()
    };
    let retriever = Retriever::from_config(&config).await?.expect("retriever");

    let examples = retriever
        .retrieve("load the recording subject01.edf", &BTreeSet::new())
        .await;

    assert_eq!(examples[0].example_id, "load");
    assert_eq!(calls.load(Ordering::Relaxed), 1);
    Ok(())
}

#[tokio::test]
async fn embedding_client_degrades_to_none_on_failure() -> Result<()> {
    let Some((url, _calls)) = spawn_embedding_mock(true).await? else {
        return Ok(());
    };
    let client = EmbeddingClient::new(&url, Duration::from_secs(2));
    assert!(client.embed("anything", None).await.is_none());
    assert_eq!(client.embed_batch(&[], None).await, Some(vec![]));
    Ok(())
}
