//! neuro-types - Common type definitions for the neuro-pilot orchestration core.
//!
//! This crate provides the data model shared by the history window, the
//! retrieval index and the agent loop: conversation turns, tool definitions,
//! tool calls, verification results, execution records and backend results.
//!
//! # Schema Singularity
//! Tool-facing types derive `schemars::JsonSchema` so the catalog shown to the
//! reasoning engine and the types used to verify its output come from one place.

#![allow(clippy::doc_markdown)]

mod backend;
mod execution;
mod retrieval;
mod tool;
mod turn;
mod verification;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use backend::{BackendResult, StageSnapshot};
pub use execution::{ExecutionOutcome, ToolExecutionRecord};
pub use retrieval::RetrievedExample;
pub use tool::{ParamKind, ToolCall, ToolDefinition, ToolParameter};
pub use turn::{ConversationTurn, Role};
pub use verification::{ConfirmationGate, VerificationOutcome, VerificationResult};

/// Result type with neuro-specific error
pub type NeuroResult<T> = Result<T, NeuroError>;

/// Unified error type for shared-model operations
#[derive(Debug, Error, Serialize, Deserialize)]
pub enum NeuroError {
    /// A tool definition is internally inconsistent
    #[error("Invalid tool definition `{tool}`: {reason}")]
    InvalidDefinition {
        /// Tool name
        tool: String,
        /// What is wrong with it
        reason: String,
    },

    /// Serialization / canonicalization failures
    #[error("Serialization error: {0}")]
    Serialization(String),
}
