#![allow(missing_docs)]

use neuro_agent::{
    ResponseShape, ToolCatalog, ValidatorSet, Verifier, eeg_catalog, parse_tool_call,
};
use neuro_types::{ConfirmationGate, StageSnapshot, ToolCall, VerificationOutcome};
use serde_json::json;

const THRESHOLD: f32 = 0.55;

fn catalog() -> ToolCatalog {
    ToolCatalog::new(eeg_catalog()).expect("catalog")
}

fn verifier() -> Verifier {
    Verifier::new(ValidatorSet::eeg_defaults(), THRESHOLD)
}

fn clean() -> ResponseShape {
    ResponseShape {
        clean_output: true,
        hedging: false,
    }
}

fn call(name: &str, parameters: serde_json::Value) -> ToolCall {
    serde_json::from_value(json!({"name": name, "parameters": parameters})).expect("call")
}

#[test]
fn parsed_call_round_trips_through_canonical_json() {
    let original = call("apply_filter", json!({"low": 1.0, "high": 40.0}));
    let text = format!(
        "```json\n{}\n```",
        original.canonical_json().expect("canonical json")
    );

    let parsed = parse_tool_call(&text);

    assert_eq!(parsed.call, Some(original));
    assert!(parsed.is_clean());
}

#[test]
fn parser_keeps_first_call_and_counts_the_rest() {
    let parsed = parse_tool_call(
        r#"First {"name": "load_data", "parameters": {"path": "a.edf"}} then {"name": "get_status"}"#,
    );

    assert_eq!(parsed.call.as_ref().map(|c| c.tool_name.as_str()), Some("load_data"));
    assert_eq!(parsed.extra_blocks, 1);
    assert!(!parsed.is_clean());
    assert!(parsed.prose.contains("First"));
}

#[test]
fn parser_treats_plain_text_and_non_calls_as_no_call() {
    assert!(parse_tool_call("The data looks clean.").call.is_none());
    assert!(parse_tool_call(r#"{"answer": 42}"#).call.is_none());
    assert!(parse_tool_call(r#"{"name": "", "parameters": {}}"#).call.is_none());
    assert!(parse_tool_call(r#"{"name": "x", "parameters": [1]}"#).call.is_none());
    assert!(parse_tool_call("").call.is_none());
}

#[test]
fn parser_finds_call_nested_in_other_json() {
    let parsed = parse_tool_call(r#"{"action": {"name": "get_status", "parameters": null}}"#);
    assert_eq!(parsed.call, Some(ToolCall::new("get_status")));
}

#[test]
fn parser_skips_unclosed_braces_before_a_valid_call() {
    let parsed = parse_tool_call(
        "Using template {low..high here.\n{\"name\":\"apply_filter\",\"parameters\":{\"low\":4,\"high\":40}}",
    );
    assert_eq!(
        parsed.call,
        Some(call("apply_filter", json!({"low": 4, "high": 40})))
    );
    assert!(parsed.prose.starts_with("Using template {low..high here."));

    let parsed = parse_tool_call(
        r#"Trying {"name": "apply_filter", "parameters": {"low": 4
Corrected: {"name": "apply_filter", "parameters": {"low": 4, "high": 40}}"#,
    );
    assert_eq!(
        parsed.call,
        Some(call("apply_filter", json!({"low": 4, "high": 40})))
    );
    assert_eq!(parsed.extra_blocks, 0);
}

#[test]
fn accepted_call_has_full_confidence() {
    let catalog = catalog();
    let stage = StageSnapshot::new("data_loaded", &["apply_filter"]);
    let visible = catalog.visible(&stage);

    let verification = verifier().verify(
        &call("apply_filter", json!({"low": 1.0, "high": 40.0})),
        &visible,
        clean(),
        None,
    );

    assert_eq!(verification.result.outcome, VerificationOutcome::Accept);
    assert!((verification.result.confidence - 1.0).abs() < 1e-6);
}

#[test]
fn hidden_tool_is_rejected_with_available_list() {
    let catalog = catalog();
    let stage = StageSnapshot::new("empty", &["load_data", "get_status"]);
    let visible = catalog.visible(&stage);

    let verification = verifier().verify(&call("run_training", json!({})), &visible, clean(), None);

    assert_eq!(verification.result.outcome, VerificationOutcome::Reject);
    assert!(verification.result.confidence.abs() < f32::EPSILON);
    assert!(verification.result.reason.contains("load_data, get_status"));
}

#[test]
fn schema_and_validator_failures_are_rejections() {
    let catalog = catalog();
    let stage = StageSnapshot::new("data_loaded", &["apply_filter", "resample", "load_data"]);
    let visible = catalog.visible(&stage);
    let verifier = verifier();

    let wrong_type = verifier.verify(
        &call("apply_filter", json!({"low": "one", "high": 40.0})),
        &visible,
        clean(),
        None,
    );
    assert_eq!(wrong_type.result.outcome, VerificationOutcome::Reject);
    assert!(wrong_type.result.reason.contains("`low` must be a number"));

    let unknown = verifier.verify(
        &call("apply_filter", json!({"low": 1.0, "high": 40.0, "order": 4})),
        &visible,
        clean(),
        None,
    );
    assert!(unknown.result.reason.contains("order"));

    let inverted = verifier.verify(
        &call("apply_filter", json!({"low": 40.0, "high": 1.0})),
        &visible,
        clean(),
        None,
    );
    assert_eq!(inverted.result.outcome, VerificationOutcome::Reject);

    let nyquist = verifier.verify(
        &call("apply_filter", json!({"low": 1.0, "high": 100.0, "sampling_rate": 128.0})),
        &visible,
        clean(),
        None,
    );
    assert_eq!(nyquist.result.outcome, VerificationOutcome::Reject);

    let empty_path = verifier.verify(&call("load_data", json!({"path": "  "})), &visible, clean(), None);
    assert_eq!(empty_path.result.outcome, VerificationOutcome::Reject);
}

#[test]
fn destructive_tool_needs_confirmation_until_signature_matches() {
    let catalog = catalog();
    let stage = StageSnapshot::new("preprocessed", &["clear_dataset"]);
    let visible = catalog.visible(&stage);
    let verifier = verifier();
    let clear = ToolCall::new("clear_dataset");

    let first = verifier.verify(&clear, &visible, clean(), None);
    assert_eq!(first.result.outcome, VerificationOutcome::NeedsConfirmation);
    assert_eq!(first.result.gate, Some(ConfirmationGate::Destructive));

    let other = verifier.verify(&clear, &visible, clean(), Some("reset_model:{}"));
    assert_eq!(other.result.outcome, VerificationOutcome::NeedsConfirmation);

    let confirmed = verifier.verify(&clear, &visible, clean(), Some(&clear.signature()));
    assert_eq!(confirmed.result.outcome, VerificationOutcome::Accept);
}

#[test]
fn sloppy_response_is_low_confidence_and_name_is_canonicalized() {
    let catalog = catalog();
    let stage = StageSnapshot::new("empty", &["load_data"]);
    let visible = catalog.visible(&stage);

    let verification = verifier().verify(
        &call("Load-Data", json!({"path": "s01.edf"})),
        &visible,
        ResponseShape {
            clean_output: false,
            hedging: true,
        },
        None,
    );

    assert_eq!(verification.result.outcome, VerificationOutcome::NeedsConfirmation);
    assert_eq!(verification.result.gate, Some(ConfirmationGate::LowConfidence));
    assert!(verification.result.confidence < THRESHOLD);
    assert_eq!(verification.call.tool_name, "load_data");
}

#[test]
fn custom_validators_run_after_the_schema() {
    let catalog = catalog();
    let stage = StageSnapshot::new("data_loaded", &["apply_notch"]);
    let visible = catalog.visible(&stage);
    let validators = ValidatorSet::eeg_defaults().with("apply_notch", |call: &ToolCall| {
        match call.param_f64("freq") {
            Some(freq) if (freq - 50.0).abs() < f64::EPSILON || (freq - 60.0).abs() < f64::EPSILON => Ok(()),
            _ => Err("only mains frequencies are allowed".to_string()),
        }
    });
    let verifier = Verifier::new(validators, THRESHOLD);

    let rejected = verifier.verify(&call("apply_notch", json!({"freq": 42.0})), &visible, clean(), None);
    assert_eq!(rejected.result.reason, "only mains frequencies are allowed");
    let accepted = verifier.verify(&call("apply_notch", json!({"freq": 60.0})), &visible, clean(), None);
    assert_eq!(accepted.result.outcome, VerificationOutcome::Accept);
}
