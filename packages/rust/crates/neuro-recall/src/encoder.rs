//! Feature-hashing text encoder.
//!
//! Maps words and adjacent word pairs into a fixed number of signed buckets,
//! then normalizes to unit length. Texts sharing vocabulary land close together
//! under cosine similarity, which is all the example index needs when no
//! embedding service is configured.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::lexical::tokenize;

const BIGRAM_WEIGHT: f32 = 0.5;

/// Deterministic hashed bag-of-words encoder.
#[derive(Debug, Clone)]
pub struct HashEncoder {
    dimension: usize,
}

impl HashEncoder {
    /// Encoder producing `dimension`-sized vectors (at least 1).
    #[must_use]
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    /// Vector dimension.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Encode `text` into a unit vector (all zeros when it has no terms).
    #[must_use]
    pub fn encode(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0_f32; self.dimension];
        let terms = tokenize(text);
        for term in &terms {
            self.accumulate(&mut embedding, term, 1.0);
        }
        for pair in terms.windows(2) {
            let bigram = format!("{} {}", pair[0], pair[1]);
            self.accumulate(&mut embedding, &bigram, BIGRAM_WEIGHT);
        }
        normalize(&mut embedding);
        embedding
    }

    /// Encode many texts.
    #[must_use]
    pub fn encode_batch(&self, texts: &[String]) -> Vec<Vec<f32>> {
        texts.iter().map(|text| self.encode(text)).collect()
    }

    fn accumulate(&self, embedding: &mut [f32], feature: &str, weight: f32) {
        let mut hasher = DefaultHasher::new();
        feature.hash(&mut hasher);
        let hash = hasher.finish();
        let bucket = usize::try_from(hash % self.dimension as u64).unwrap_or(0);
        let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
        embedding[bucket] += sign * weight;
    }
}

impl Default for HashEncoder {
    fn default() -> Self {
        Self::new(384)
    }
}

fn normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

/// Cosine similarity; 0 for mismatched lengths or zero vectors.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
