//! In-memory example index with vector, keyword and hybrid scoring.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};

use neuro_types::RetrievedExample;

use crate::encoder::{HashEncoder, cosine_similarity};
use crate::error::{RecallError, RecallResult};
use crate::example::{ExampleCorpus, ReferenceExample};
use crate::lexical::{overlap_ratio, tokenize};

/// Per-query search options.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOptions {
    /// Maximum results.
    pub top_k: usize,
    /// Weight of the keyword score in `[0, 1]`; `None` = vector only.
    pub hybrid_weight: Option<f32>,
    /// Restrict results to these categories; `None` = all.
    pub categories: Option<BTreeSet<String>>,
    /// Drop results scoring below this.
    pub min_score: f32,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            top_k: 3,
            hybrid_weight: None,
            categories: None,
            min_score: 0.0,
        }
    }
}

/// Blend vector and keyword scores: `(1 - w) * vector + w * keyword`.
#[must_use]
pub fn blend_score(vector: f32, keyword: f32, weight: Option<f32>) -> f32 {
    match weight {
        Some(w) => {
            let w = w.clamp(0.0, 1.0);
            (1.0 - w) * vector + w * keyword
        }
        None => vector,
    }
}

#[derive(Debug, Clone)]
struct IndexedExample {
    example: ReferenceExample,
    embedding: Vec<f32>,
    terms: HashSet<String>,
}

/// Read-only index; built once, queried per user message.
#[derive(Debug, Clone, Default)]
pub struct ExampleIndex {
    entries: Vec<IndexedExample>,
    dimension: usize,
}

impl ExampleIndex {
    /// Index a corpus with the local hashing encoder.
    #[must_use]
    pub fn build(corpus: ExampleCorpus, encoder: &HashEncoder) -> Self {
        let embeddings = encoder.encode_batch(&corpus.instructions());
        Self::assemble(corpus, embeddings, encoder.dimension())
    }

    /// Index a corpus with externally computed embeddings (same order as the corpus).
    pub fn from_embeddings(corpus: ExampleCorpus, embeddings: Vec<Vec<f32>>) -> RecallResult<Self> {
        if embeddings.len() != corpus.len() {
            return Err(RecallError::EmbeddingCount {
                expected: corpus.len(),
                actual: embeddings.len(),
            });
        }
        let dimension = embeddings.first().map_or(0, Vec::len);
        if let Some(bad) = embeddings.iter().find(|v| v.len() != dimension) {
            return Err(RecallError::DimensionMismatch {
                expected: dimension,
                actual: bad.len(),
            });
        }
        Ok(Self::assemble(corpus, embeddings, dimension))
    }

    fn assemble(corpus: ExampleCorpus, embeddings: Vec<Vec<f32>>, dimension: usize) -> Self {
        let entries = corpus
            .examples()
            .iter()
            .cloned()
            .zip(embeddings)
            .map(|(example, embedding)| IndexedExample {
                terms: tokenize(&example.instruction).into_iter().collect(),
                example,
                embedding,
            })
            .collect();
        Self { entries, dimension }
    }

    /// Vector dimension (0 for an empty index).
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of indexed examples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Top-K examples for a query, best first; ties break on example id.
    pub fn search(
        &self,
        query_embedding: &[f32],
        query_text: &str,
        options: &SearchOptions,
    ) -> RecallResult<Vec<RetrievedExample>> {
        if self.entries.is_empty() || options.top_k == 0 {
            return Ok(Vec::new());
        }
        if query_embedding.len() != self.dimension {
            return Err(RecallError::DimensionMismatch {
                expected: self.dimension,
                actual: query_embedding.len(),
            });
        }
        let query_terms: HashSet<String> = tokenize(query_text).into_iter().collect();

        let mut scored: Vec<(&IndexedExample, f32)> = self
            .entries
            .iter()
            .filter(|entry| {
                options
                    .categories
                    .as_ref()
                    .is_none_or(|allowed| allowed.contains(&entry.example.category))
            })
            .map(|entry| {
                let vector = cosine_similarity(query_embedding, &entry.embedding);
                let keyword = overlap_ratio(&query_terms, &entry.terms);
                (entry, blend_score(vector, keyword, options.hybrid_weight))
            })
            .filter(|(_, score)| *score >= options.min_score)
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.example.id.cmp(&b.0.example.id))
        });
        scored.truncate(options.top_k);

        Ok(scored
            .into_iter()
            .map(|(entry, score)| entry.example.to_retrieved(score))
            .collect())
    }
}
