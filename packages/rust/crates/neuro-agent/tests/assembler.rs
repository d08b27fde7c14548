#![allow(missing_docs)]

use neuro_agent::{ContextAssembler, ToolCatalog, eeg_catalog};
use neuro_types::{ConversationTurn, RetrievedExample, StageSnapshot, ToolCall};

fn example(id: &str, score: f32) -> RetrievedExample {
    RetrievedExample {
        example_id: id.to_string(),
        instruction_text: format!("instruction {id}"),
        reference_tool_call: ToolCall::new("get_status"),
        category: "info".to_string(),
        similarity_score: score,
    }
}

#[test]
fn identical_inputs_give_identical_prompts() {
    let catalog = ToolCatalog::new(eeg_catalog()).expect("catalog");
    let stage = StageSnapshot::new("data_loaded", &["apply_filter", "get_status", "clear_dataset"]);
    let visible = catalog.visible(&stage);
    let history = vec![
        ConversationTurn::user("filter 1-40"),
        ConversationTurn::assistant(r#"{"name": "apply_filter"}"#),
        ConversationTurn::observation("apply_filter", "Rejected"),
    ];
    let examples = vec![example("b", 0.4), example("a", 0.9)];
    let assembler = ContextAssembler::default();

    let first = assembler.assemble(&visible, &examples, &history);
    let second = assembler.assemble(&visible, &examples, &history);

    assert_eq!(first, second);
    assert_eq!(first.messages.len(), 4);
    assert_eq!(first.messages[0].role, "system");
    assert_eq!(first.messages[3].role, "user");
}

#[test]
fn system_prompt_lists_only_visible_tools() {
    let catalog = ToolCatalog::new(eeg_catalog()).expect("catalog");
    let stage = StageSnapshot::new("empty", &["load_data", "get_status"]);
    let visible = catalog.visible(&stage);

    let prompt = ContextAssembler::default().assemble(&visible, &[], &[]);
    let system = &prompt.messages[0].content;

    assert!(system.contains("## Current stage\nempty"));
    assert!(system.contains("\"load_data\""));
    assert!(system.contains("\"get_status\""));
    assert!(!system.contains("\"run_training\""));
    assert!(!system.contains("## Examples"));
}

#[test]
fn empty_visible_set_gets_the_no_tools_notice() {
    let catalog = ToolCatalog::new(eeg_catalog()).expect("catalog");
    let stage = StageSnapshot::new("unavailable", &[]);
    let visible = catalog.visible(&stage);

    let prompt = ContextAssembler::new("Custom instructions.").assemble(&visible, &[example("a", 0.5)], &[]);
    let system = &prompt.messages[0].content;

    assert!(system.starts_with("Custom instructions."));
    assert!(system.contains("No actions are currently available"));
    assert!(system.contains("## Examples\nInstruction: instruction a\nCall: "));
}
