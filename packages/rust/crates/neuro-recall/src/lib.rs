//! neuro-recall - Retrieval index over curated instruction → tool-call examples.
//!
//! Provides the similarity search behind retrieval-augmented prompting:
//! - Example corpus loading (JSON)
//! - Feature-hashing text encoder (no model download, deterministic)
//! - Cosine similarity with an optional keyword-overlap hybrid blend
//! - Category filter, minimum score and top-K truncation
//!
//! # Examples
//!
//! ```rust
//! use neuro_recall::{ExampleCorpus, ExampleIndex, HashEncoder, SearchOptions};
//!
//! let corpus = ExampleCorpus::from_json_str(r#"[
//!   {"id": "f1", "instruction": "bandpass filter 1 to 40 Hz",
//!    "tool_call": {"name": "apply_filter", "parameters": {"low": 1, "high": 40}},
//!    "category": "preprocessing"}
//! ]"#).unwrap();
//! let encoder = HashEncoder::new(256);
//! let index = ExampleIndex::build(corpus, &encoder);
//! let query = "filter between 4 and 30 Hz";
//! let hits = index.search(&encoder.encode(query), query, &SearchOptions::default()).unwrap();
//! assert_eq!(hits[0].reference_tool_call.tool_name, "apply_filter");
//! ```

mod encoder;
mod error;
mod example;
mod index;
mod lexical;

pub use encoder::{HashEncoder, cosine_similarity};
pub use error::{RecallError, RecallResult};
pub use example::{ExampleCorpus, ReferenceExample};
pub use index::{ExampleIndex, SearchOptions, blend_score};
pub use lexical::{keyword_overlap, tokenize};
