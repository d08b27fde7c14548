//! Context assembler: one deterministic prompt per loop iteration.
//!
//! Section order is fixed: instructions, current stage, the full schema of every
//! visible tool, retrieved examples (omitted when there are none), then history.

use std::cmp::Ordering;

use neuro_types::{ConversationTurn, RetrievedExample, Role};

use crate::session::ChatMessage;
use crate::tools::VisibleTools;

const DEFAULT_INSTRUCTIONS: &str = "\
You are the control assistant of an EEG analysis workbench. You act only by \
proposing tool calls against the backend, one per step.

To act, reply with exactly one JSON object and nothing else:
{\"name\": \"<tool name>\", \"parameters\": {<parameter>: <value>, ...}}

Use only the tools listed below and only the parameters their schemas declare. \
If no tool fits, the request is already satisfied, or you need more information, \
reply in plain text without any JSON. Tool results come back as observations; \
read them before proposing the next step.";

const NO_TOOLS_NOTICE: &str = "\
No actions are currently available at this stage. Reply in plain text: explain \
what has to happen first and do not propose a tool call.";

/// Reasoning-engine input for one iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    /// System message first, then history in order.
    pub messages: Vec<ChatMessage>,
}

impl Prompt {
    /// Flat `role: content` rendering, used by logs and tests.
    #[must_use]
    pub fn render_text(&self) -> String {
        self.messages
            .iter()
            .map(|message| format!("[{}]\n{}", message.role, message.content))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Builds prompts from instructions, visible tools, examples and history. Holds no state
/// besides the instructions, so identical inputs give byte-identical prompts.
#[derive(Debug, Clone)]
pub struct ContextAssembler {
    instructions: String,
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_INSTRUCTIONS)
    }
}

impl ContextAssembler {
    pub fn new(instructions: impl Into<String>) -> Self {
        Self {
            instructions: instructions.into(),
        }
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    pub fn assemble(
        &self,
        visible: &VisibleTools<'_>,
        examples: &[RetrievedExample],
        history: &[ConversationTurn],
    ) -> Prompt {
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(ChatMessage::system(self.system_text(visible, examples)));
        messages.extend(history.iter().map(history_message));
        Prompt { messages }
    }

    fn system_text(&self, visible: &VisibleTools<'_>, examples: &[RetrievedExample]) -> String {
        let mut text = self.instructions.trim_end().to_string();
        text.push_str("\n\n## Current stage\n");
        text.push_str(&visible.stage().stage);

        text.push_str("\n\n## Available tools\n");
        if visible.is_empty() {
            text.push_str(NO_TOOLS_NOTICE);
        } else {
            for tool in visible.tools() {
                // serde_json::Value maps are sorted, so this rendering is stable.
                text.push_str(&tool.json_schema().to_string());
                text.push('\n');
            }
        }

        if !examples.is_empty() {
            text.push_str("\n## Examples\n");
            for example in ranked(examples) {
                let call = example
                    .reference_tool_call
                    .canonical_json()
                    .unwrap_or_else(|_| example.reference_tool_call.tool_name.clone());
                text.push_str(&format!(
                    "Instruction: {}\nCall: {call}\n",
                    example.instruction_text.trim()
                ));
            }
        }
        text.trim_end().to_string()
    }
}

fn ranked(examples: &[RetrievedExample]) -> Vec<&RetrievedExample> {
    let mut ordered: Vec<&RetrievedExample> = examples.iter().collect();
    ordered.sort_by(|left, right| {
        right
            .similarity_score
            .partial_cmp(&left.similarity_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| left.example_id.cmp(&right.example_id))
    });
    ordered
}

fn history_message(turn: &ConversationTurn) -> ChatMessage {
    match turn.role {
        Role::User => ChatMessage::user(turn.content.clone()),
        Role::Assistant => ChatMessage::assistant(turn.content.clone()),
        Role::Tool => {
            let tool = turn.tool_name.as_deref().unwrap_or("tool");
            ChatMessage::user(format!("Observation ({tool}): {}", turn.content))
        }
    }
}

#[cfg(test)]
mod tests {
    use neuro_types::{StageSnapshot, ToolCall, ToolDefinition};

    use super::*;
    use crate::tools::ToolCatalog;

    fn example(id: &str, score: f32) -> RetrievedExample {
        RetrievedExample {
            example_id: id.to_string(),
            instruction_text: format!("instruction {id}"),
            reference_tool_call: ToolCall::new("apply_filter").with_param("low", 1),
            category: "preprocessing".to_string(),
            similarity_score: score,
        }
    }

    #[test]
    fn examples_are_ranked_by_score_then_id() {
        let examples = vec![example("b", 0.5), example("c", 0.9), example("a", 0.5)];
        let ids: Vec<&str> = ranked(&examples)
            .into_iter()
            .map(|example| example.example_id.as_str())
            .collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn observation_turns_become_user_messages() {
        let catalog = ToolCatalog::new(vec![ToolDefinition::new("get_status", "Status", "info")])
            .unwrap();
        let stage = StageSnapshot::new("empty", &["get_status"]);
        let history = vec![ConversationTurn::observation("get_status", "ok")];
        let prompt = ContextAssembler::default().assemble(&catalog.visible(&stage), &[], &history);
        assert_eq!(prompt.messages[1].role, "user");
        assert_eq!(prompt.messages[1].content, "Observation (get_status): ok");
    }
}
