//! Token counting with cl100k_base (GPT-4/3.5 standard), whitespace estimate fallback.

use std::sync::OnceLock;

/// Cached cl100k_base BPE instance - initialized only once.
/// `None` when the model failed to load; callers fall back to estimates.
static CL100K_BASE: OnceLock<Option<tiktoken_rs::CoreBPE>> = OnceLock::new();

fn cl100k_base() -> Option<&'static tiktoken_rs::CoreBPE> {
    CL100K_BASE
        .get_or_init(|| tiktoken_rs::cl100k_base().ok())
        .as_ref()
}

/// Count tokens in `text`.
#[must_use]
pub fn count_tokens(text: &str) -> usize {
    cl100k_base().map_or_else(
        || estimate_token_count(text),
        |bpe| bpe.encode_with_special_tokens(text).len(),
    )
}

/// Truncate `text` to at most `max_tokens` tokens.
#[must_use]
pub fn truncate_to_tokens(text: &str, max_tokens: usize) -> String {
    let Some(bpe) = cl100k_base() else {
        return estimate_truncate(text, max_tokens);
    };
    let tokens = bpe.encode_with_special_tokens(text);
    if tokens.len() <= max_tokens {
        return text.to_string();
    }
    let truncated: Vec<_> = tokens.into_iter().take(max_tokens).collect();
    bpe.decode(truncated)
        .unwrap_or_else(|_| estimate_truncate(text, max_tokens))
}

// ~2 tokens per whitespace-separated word.
fn estimate_token_count(text: &str) -> usize {
    text.split_whitespace().count() * 2
}

fn estimate_truncate(text: &str, max_tokens: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    let target_words = std::cmp::min(max_tokens / 2, words.len());
    words[..target_words].join(" ")
}
