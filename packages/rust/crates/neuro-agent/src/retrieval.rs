//! Retrieval adapter: query embedding + example search with a bounded timeout.
//!
//! Retrieval is an enhancement. Every failure (timeout, embedding error,
//! dimension mismatch) degrades to an empty example list.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use neuro_recall::{ExampleCorpus, ExampleIndex, HashEncoder, SearchOptions};
use neuro_types::RetrievedExample;

use crate::config::RetrievalConfig;
use crate::embedding::EmbeddingClient;
use crate::observability::SessionEvent;

/// Source of reference examples for one user message.
#[async_trait]
pub trait ExampleRetriever: Send + Sync {
    /// Top examples for `query`, restricted to `categories` (empty set = no restriction).
    /// Never fails; degraded retrieval returns an empty list.
    async fn retrieve(&self, query: &str, categories: &BTreeSet<String>) -> Vec<RetrievedExample>;
}

#[derive(Clone)]
enum QueryEncoder {
    Local(HashEncoder),
    Remote {
        client: EmbeddingClient,
        model: Option<String>,
    },
}

/// Index-backed retriever.
pub struct Retriever {
    index: Arc<ExampleIndex>,
    encoder: QueryEncoder,
    options: SearchOptions,
    timeout: Duration,
}

impl Retriever {
    /// Retriever using the local hashing encoder for corpus and queries.
    pub fn local(corpus: ExampleCorpus, config: &RetrievalConfig) -> Self {
        let encoder = HashEncoder::new(config.embedding_dim);
        let index = ExampleIndex::build(corpus, &encoder);
        Self {
            index: Arc::new(index),
            encoder: QueryEncoder::Local(encoder),
            options: search_options(config),
            timeout: config.timeout(),
        }
    }

    /// Retriever backed by the embedding service. Falls back to local hashing when
    /// the corpus cannot be embedded remotely.
    pub async fn remote(corpus: ExampleCorpus, client: EmbeddingClient, config: &RetrievalConfig) -> Self {
        let model = config.embedding_model.clone();
        let vectors = client
            .embed_batch(&corpus.instructions(), model.as_deref())
            .await;
        let index = vectors.and_then(|vectors| {
            ExampleIndex::from_embeddings(corpus.clone(), vectors)
                .inspect_err(|error| {
                    tracing::warn!(
                        event = SessionEvent::RetrievalDegraded.as_str(),
                        error = %error,
                        "remote corpus embeddings unusable"
                    );
                })
                .ok()
        });
        match index {
            Some(index) => Self {
                index: Arc::new(index),
                encoder: QueryEncoder::Remote { client, model },
                options: search_options(config),
                timeout: config.timeout(),
            },
            None => {
                tracing::warn!(
                    event = SessionEvent::RetrievalDegraded.as_str(),
                    examples = corpus.len(),
                    "embedding service unavailable at startup; using local hashing encoder"
                );
                Self::local(corpus, config)
            }
        }
    }

    /// Build from config: load the corpus, pick the encoder. `None` when no corpus is configured.
    pub async fn from_config(config: &RetrievalConfig) -> Result<Option<Self>> {
        let Some(path) = config.corpus_path.as_ref() else {
            return Ok(None);
        };
        let corpus = ExampleCorpus::load(path)
            .with_context(|| format!("failed to load example corpus {}", path.display()))?;
        let retriever = match config.embedding_base_url.as_deref() {
            Some(url) => {
                let client = EmbeddingClient::new(url, config.timeout());
                Self::remote(corpus, client, config).await
            }
            None => Self::local(corpus, config),
        };
        Ok(Some(retriever))
    }

    /// Number of indexed examples.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    async fn embed_query(&self, query: &str) -> Option<Vec<f32>> {
        match &self.encoder {
            QueryEncoder::Local(encoder) => {
                let encoder = encoder.clone();
                let query = query.to_string();
                tokio::task::spawn_blocking(move || encoder.encode(&query))
                    .await
                    .ok()
            }
            QueryEncoder::Remote { client, model } => client.embed(query, model.as_deref()).await,
        }
    }

    async fn search(&self, query: &str, categories: &BTreeSet<String>) -> Result<Vec<RetrievedExample>, String> {
        let embedding = self
            .embed_query(query)
            .await
            .ok_or_else(|| "query embedding failed".to_string())?;
        let mut options = self.options.clone();
        if !categories.is_empty() {
            options.categories = Some(categories.clone());
        }
        self.index
            .search(&embedding, query, &options)
            .map_err(|error| error.to_string())
    }
}

fn search_options(config: &RetrievalConfig) -> SearchOptions {
    SearchOptions {
        top_k: config.top_k,
        hybrid_weight: config.hybrid_weight,
        categories: None,
        min_score: config.min_score,
    }
}

#[async_trait]
impl ExampleRetriever for Retriever {
    async fn retrieve(&self, query: &str, categories: &BTreeSet<String>) -> Vec<RetrievedExample> {
        if self.index.is_empty() || self.options.top_k == 0 {
            return Vec::new();
        }
        let started = Instant::now();
        match tokio::time::timeout(self.timeout, self.search(query, categories)).await {
            Ok(Ok(examples)) => {
                tracing::debug!(
                    event = SessionEvent::RetrievalCompleted.as_str(),
                    examples = examples.len(),
                    elapsed_ms = started.elapsed().as_millis(),
                    "retrieval completed"
                );
                examples
            }
            Ok(Err(error)) => {
                tracing::warn!(
                    event = SessionEvent::RetrievalDegraded.as_str(),
                    error = %error,
                    "retrieval failed; continuing without examples"
                );
                Vec::new()
            }
            Err(_) => {
                tracing::warn!(
                    event = SessionEvent::RetrievalDegraded.as_str(),
                    timeout_ms = self.timeout.as_millis(),
                    "retrieval timed out; continuing without examples"
                );
                Vec::new()
            }
        }
    }
}

/// Retriever that never returns examples (no corpus configured).
pub struct NoRetrieval;

#[async_trait]
impl ExampleRetriever for NoRetrieval {
    async fn retrieve(&self, _query: &str, _categories: &BTreeSet<String>) -> Vec<RetrievedExample> {
        Vec::new()
    }
}
