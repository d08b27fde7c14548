//! Reference examples and the corpus file that holds them.

use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use neuro_types::{RetrievedExample, ToolCall};
use serde::{Deserialize, Serialize};

use crate::error::{RecallError, RecallResult};

/// Curated instruction paired with the tool call that satisfies it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceExample {
    /// Unique identifier.
    pub id: String,
    /// Natural-language instruction.
    pub instruction: String,
    /// Reference tool call.
    pub tool_call: ToolCall,
    /// Tool category used for filtering.
    pub category: String,
}

impl ReferenceExample {
    /// Build an example.
    #[must_use]
    pub fn new(id: &str, instruction: &str, tool_call: ToolCall, category: &str) -> Self {
        Self {
            id: id.to_string(),
            instruction: instruction.to_string(),
            tool_call,
            category: category.to_string(),
        }
    }

    pub(crate) fn to_retrieved(&self, score: f32) -> RetrievedExample {
        RetrievedExample {
            example_id: self.id.clone(),
            instruction_text: self.instruction.clone(),
            reference_tool_call: self.tool_call.clone(),
            category: self.category.clone(),
            similarity_score: score,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CorpusFile {
    Wrapped { examples: Vec<ReferenceExample> },
    Bare(Vec<ReferenceExample>),
}

/// Validated, read-only set of reference examples.
#[derive(Debug, Clone, Default)]
pub struct ExampleCorpus {
    examples: Vec<ReferenceExample>,
}

impl ExampleCorpus {
    /// Validate and wrap examples. Ids must be unique; instructions non-empty.
    pub fn from_examples(examples: Vec<ReferenceExample>) -> RecallResult<Self> {
        let mut seen = HashSet::new();
        for example in &examples {
            if example.instruction.trim().is_empty() {
                return Err(RecallError::InvalidExample {
                    id: example.id.clone(),
                    reason: "empty instruction".to_string(),
                });
            }
            if !seen.insert(example.id.as_str()) {
                return Err(RecallError::InvalidExample {
                    id: example.id.clone(),
                    reason: "duplicate id".to_string(),
                });
            }
        }
        Ok(Self { examples })
    }

    /// Parse `[...]` or `{"examples": [...]}`.
    pub fn from_json_str(content: &str) -> RecallResult<Self> {
        let file: CorpusFile =
            serde_json::from_str(content).map_err(|error| RecallError::Parse(error.to_string()))?;
        let examples = match file {
            CorpusFile::Wrapped { examples } | CorpusFile::Bare(examples) => examples,
        };
        Self::from_examples(examples)
    }

    /// Load a JSON corpus file.
    pub fn load(path: &Path) -> RecallResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| RecallError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    /// Examples in file order.
    #[must_use]
    pub fn examples(&self) -> &[ReferenceExample] {
        &self.examples
    }

    /// Distinct categories.
    #[must_use]
    pub fn categories(&self) -> BTreeSet<&str> {
        self.examples.iter().map(|ex| ex.category.as_str()).collect()
    }

    /// Instruction texts in file order (embedding input).
    #[must_use]
    pub fn instructions(&self) -> Vec<String> {
        self.examples.iter().map(|ex| ex.instruction.clone()).collect()
    }

    /// Number of examples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.examples.len()
    }

    /// Whether the corpus is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }
}
