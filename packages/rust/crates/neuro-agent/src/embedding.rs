//! Remote sentence embeddings over HTTP `POST {base}/embed/batch`.
//!
//! Request `{texts, model?}`, response `{vectors}`. Failures surface as `None` so
//! retrieval can degrade instead of failing the turn.

use std::time::{Duration, Instant};

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::observability::SessionEvent;

#[derive(Serialize)]
struct EmbedRequest<'a> {
    texts: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
}

#[derive(Deserialize)]
struct EmbedResponse {
    #[serde(default)]
    vectors: Vec<Vec<f32>>,
}

#[derive(Debug, Error)]
enum EmbedFailure {
    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),
    #[error("service answered {0}")]
    Status(reqwest::StatusCode),
    #[error("undecodable response: {0}")]
    Decode(#[source] reqwest::Error),
    #[error("expected {expected} vectors, got {got}")]
    CountMismatch { expected: usize, got: usize },
}

#[derive(Clone)]
pub struct EmbeddingClient {
    client: Client,
    endpoint: String,
}

impl EmbeddingClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            client,
            endpoint: format!("{}/embed/batch", base_url.trim_end_matches('/')),
        }
    }

    /// One vector per text, in order. `None` on any failure or count mismatch.
    pub async fn embed_batch(&self, texts: &[String], model: Option<&str>) -> Option<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Some(Vec::new());
        }
        let started = Instant::now();
        let model = model.map(str::trim).filter(|value| !value.is_empty());
        match self.request(texts, model).await {
            Ok(vectors) => {
                tracing::debug!(
                    event = SessionEvent::EmbeddingCompleted.as_str(),
                    texts = texts.len(),
                    elapsed_ms = started.elapsed().as_millis(),
                    "embedding batch completed"
                );
                Some(vectors)
            }
            Err(error) => {
                tracing::debug!(
                    event = SessionEvent::EmbeddingFailed.as_str(),
                    endpoint = %self.endpoint,
                    texts = texts.len(),
                    elapsed_ms = started.elapsed().as_millis(),
                    error = %error,
                    "embedding batch failed"
                );
                None
            }
        }
    }

    pub async fn embed(&self, text: &str, model: Option<&str>) -> Option<Vec<f32>> {
        self.embed_batch(&[text.to_string()], model)
            .await
            .and_then(|mut vectors| vectors.pop())
    }

    async fn request(&self, texts: &[String], model: Option<&str>) -> Result<Vec<Vec<f32>>, EmbedFailure> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&EmbedRequest { texts, model })
            .send()
            .await
            .map_err(EmbedFailure::Request)?;
        let status = response.status();
        if !status.is_success() {
            return Err(EmbedFailure::Status(status));
        }
        let body: EmbedResponse = response.json().await.map_err(EmbedFailure::Decode)?;
        if body.vectors.len() != texts.len() {
            return Err(EmbedFailure::CountMismatch {
                expected: texts.len(),
                got: body.vectors.len(),
            });
        }
        Ok(body.vectors)
    }
}
