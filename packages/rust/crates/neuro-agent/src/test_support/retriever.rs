use std::collections::BTreeSet;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use neuro_types::RetrievedExample;

use crate::retrieval::ExampleRetriever;

/// Returns fixed examples, filtered by category; records each query.
pub struct StaticRetriever {
    examples: Vec<RetrievedExample>,
    queries: Mutex<Vec<(String, BTreeSet<String>)>>,
}

impl StaticRetriever {
    pub fn new(examples: Vec<RetrievedExample>) -> Self {
        Self {
            examples,
            queries: Mutex::new(Vec::new()),
        }
    }

    /// `(query, categories)` of every retrieval so far.
    pub fn queries(&self) -> Vec<(String, BTreeSet<String>)> {
        self.queries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl ExampleRetriever for StaticRetriever {
    async fn retrieve(&self, query: &str, categories: &BTreeSet<String>) -> Vec<RetrievedExample> {
        self.queries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((query.to_string(), categories.clone()));
        self.examples
            .iter()
            .filter(|example| categories.is_empty() || categories.contains(&example.category))
            .cloned()
            .collect()
    }
}
