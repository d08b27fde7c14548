use std::path::PathBuf;

use thiserror::Error;

/// Result type for retrieval operations.
pub type RecallResult<T> = Result<T, RecallError>;

/// Errors raised while loading or querying the example index.
#[derive(Debug, Error)]
pub enum RecallError {
    /// Corpus file could not be read.
    #[error("failed to read corpus {path}: {source}")]
    Io {
        /// Corpus path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Corpus content is not valid JSON of the expected shape.
    #[error("invalid corpus: {0}")]
    Parse(String),

    /// An example is unusable (empty instruction, duplicate id).
    #[error("invalid example `{id}`: {reason}")]
    InvalidExample {
        /// Example identifier.
        id: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Query or corpus vector has the wrong dimension.
    #[error("embedding dimension mismatch: index uses {expected}, got {actual}")]
    DimensionMismatch {
        /// Index dimension.
        expected: usize,
        /// Offending dimension.
        actual: usize,
    },

    /// Number of supplied embeddings does not match the corpus.
    #[error("expected {expected} corpus embeddings, got {actual}")]
    EmbeddingCount {
        /// Corpus size.
        expected: usize,
        /// Supplied vectors.
        actual: usize,
    },
}
