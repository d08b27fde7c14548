//! Keyword tokenization and overlap scoring for hybrid search.

use std::collections::HashSet;

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "at", "be", "by", "can", "do", "for", "from", "i", "in", "is", "it",
    "me", "my", "of", "on", "or", "please", "the", "then", "this", "to", "with", "you",
];

/// Lowercase alphanumeric terms, stopwords removed, in input order.
#[must_use]
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|ch: char| !ch.is_alphanumeric() && ch != '.')
        .map(|raw| raw.trim_matches('.').to_lowercase())
        .filter(|term| !term.is_empty() && !STOPWORDS.contains(&term.as_str()))
        .collect()
}

/// Fraction of distinct query terms present in `document`, in `[0, 1]`.
#[must_use]
pub fn keyword_overlap(query: &str, document: &str) -> f32 {
    let query_terms: HashSet<String> = tokenize(query).into_iter().collect();
    if query_terms.is_empty() {
        return 0.0;
    }
    let doc_terms: HashSet<String> = tokenize(document).into_iter().collect();
    overlap_ratio(&query_terms, &doc_terms)
}

#[allow(clippy::cast_precision_loss)]
pub(crate) fn overlap_ratio(query_terms: &HashSet<String>, doc_terms: &HashSet<String>) -> f32 {
    if query_terms.is_empty() {
        return 0.0;
    }
    let hits = query_terms.intersection(doc_terms).count();
    hits as f32 / query_terms.len() as f32
}
