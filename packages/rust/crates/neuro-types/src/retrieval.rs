use serde::{Deserialize, Serialize};

use crate::ToolCall;

/// Reference example returned by similarity search. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedExample {
    /// Corpus identifier.
    pub example_id: String,
    /// Natural-language instruction.
    pub instruction_text: String,
    /// Tool call that satisfies the instruction.
    pub reference_tool_call: ToolCall,
    /// Category of the reference tool.
    pub category: String,
    /// Blended similarity score.
    pub similarity_score: f32,
}
