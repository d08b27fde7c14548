#![allow(missing_docs)]

use std::sync::Arc;

use neuro_agent::test_support::{
    EegBackendSim, ScriptStep, ScriptedEngine, collect_events, sim_orchestrator, test_config,
};
use neuro_agent::{AgentEvent, TerminationReason, run_stdio, spawn_session};
use serde_json::{Value, json};

fn final_reason(events: &[AgentEvent]) -> Option<TerminationReason> {
    events.iter().find_map(|event| match event {
        AgentEvent::FinalText { reason, .. } => Some(*reason),
        _ => None,
    })
}

#[tokio::test]
async fn handle_runs_turns_in_submission_order() {
    let engine = Arc::new(ScriptedEngine::new([
        ScriptStep::call("load_data", json!({"path": "s01.edf"})),
        ScriptStep::call("apply_notch", json!({"freq": 50.0})),
    ]));
    let backend = Arc::new(EegBackendSim::new());
    let handle = spawn_session(sim_orchestrator(test_config(), &engine, &backend).expect("orchestrator"));

    let first = handle.submit("load s01.edf").await.expect("submit");
    let second = handle.submit("remove 50 Hz noise").await.expect("submit");
    let first = collect_events(first).await;
    let second = collect_events(second).await;

    assert_eq!(final_reason(&first), Some(TerminationReason::SuccessCap));
    assert_eq!(final_reason(&second), Some(TerminationReason::SuccessCap));
    assert_eq!(
        backend.calls().iter().map(|(op, _)| op.as_str()).collect::<Vec<_>>(),
        vec!["load_data", "apply_notch"]
    );
    let metrics = handle.metrics();
    assert_eq!(metrics.turns_total, 2);
    assert_eq!(metrics.dispatches_total, 2);
    assert!(!handle.session_id().is_empty());
}

#[tokio::test]
async fn handle_cancel_stops_the_running_turn() {
    let engine = Arc::new(ScriptedEngine::new([ScriptStep::Hang("Thinking".to_string())]));
    let backend = Arc::new(EegBackendSim::new());
    let handle = spawn_session(sim_orchestrator(test_config(), &engine, &backend).expect("orchestrator"));

    let mut receiver = handle.submit("describe the data").await.expect("submit");
    let mut events = Vec::new();
    while let Some(event) = receiver.recv().await {
        if matches!(event, AgentEvent::PartialText { .. }) {
            handle.cancel();
        }
        events.push(event);
    }

    assert_eq!(final_reason(&events), Some(TerminationReason::Cancelled));
}

#[tokio::test]
async fn handle_cancel_targets_the_running_turn_not_the_queued_one() {
    let engine = Arc::new(ScriptedEngine::new([
        ScriptStep::Hang("Checking".to_string()),
        ScriptStep::call("get_status", json!({})),
    ]));
    let backend = Arc::new(EegBackendSim::new());
    let handle = spawn_session(sim_orchestrator(test_config(), &engine, &backend).expect("orchestrator"));

    let mut running = handle.submit("what is loaded?").await.expect("submit");
    let queued = handle.submit("show the status").await.expect("submit");
    let mut first = Vec::new();
    while let Some(event) = running.recv().await {
        if matches!(event, AgentEvent::PartialText { .. }) {
            handle.cancel();
        }
        first.push(event);
    }
    let second = collect_events(queued).await;

    assert_eq!(final_reason(&first), Some(TerminationReason::Cancelled));
    assert_eq!(final_reason(&second), Some(TerminationReason::SuccessCap));
    assert_eq!(backend.calls_to("get_status"), 1);
}

#[tokio::test]
async fn handle_confirm_and_decline_resolve_parked_calls() {
    let engine = Arc::new(ScriptedEngine::new([
        ScriptStep::call("clear_dataset", json!({})),
        ScriptStep::call("clear_dataset", json!({})),
    ]));
    let backend = Arc::new(EegBackendSim::at_stage("data_loaded"));
    let handle = spawn_session(sim_orchestrator(test_config(), &engine, &backend).expect("orchestrator"));

    let parked = collect_events(handle.submit("clear it").await.expect("submit")).await;
    assert_eq!(final_reason(&parked), Some(TerminationReason::AwaitingConfirmation));
    let declined = collect_events(handle.decline().await.expect("decline")).await;
    assert_eq!(final_reason(&declined), Some(TerminationReason::ConfirmationDeclined));
    assert_eq!(backend.calls_to("clear_dataset"), 0);

    collect_events(handle.submit("clear it").await.expect("submit")).await;
    let confirmed = collect_events(handle.confirm().await.expect("confirm")).await;
    assert_eq!(final_reason(&confirmed), Some(TerminationReason::SuccessCap));
    assert_eq!(backend.calls_to("clear_dataset"), 1);

    let metrics = handle.metrics();
    assert_eq!(metrics.confirmations_requested_total, 2);
    assert_eq!(metrics.confirmations_accepted_total, 1);
    assert_eq!(metrics.confirmations_declined_total, 1);
}

#[tokio::test]
async fn stdio_writes_every_event_as_a_json_line() {
    let engine = Arc::new(ScriptedEngine::new([
        ScriptStep::call("load_data", json!({"path": "s01.edf"})),
        ScriptStep::call("clear_dataset", json!({})),
    ]));
    let backend = Arc::new(EegBackendSim::new());
    let handle = spawn_session(sim_orchestrator(test_config(), &engine, &backend).expect("orchestrator"));

    let input: &[u8] = b"load s01.edf\n\n  clear everything  \n/confirm\n/metrics\n";
    let mut output: Vec<u8> = Vec::new();
    run_stdio(handle, input, &mut output).await.expect("stdio");

    let lines: Vec<Value> = String::from_utf8(output)
        .expect("utf8")
        .lines()
        .map(|line| serde_json::from_str(line).expect("json line"))
        .collect();
    let finals: Vec<&str> = lines
        .iter()
        .filter(|line| line["type"] == "final_text")
        .filter_map(|line| line["reason"].as_str())
        .collect();
    assert_eq!(finals, vec!["success_cap", "awaiting_confirmation", "success_cap"]);
    assert!(lines.iter().any(|line| line["type"] == "confirmation_required"
        && line["tool_name"] == "clear_dataset"
        && line["gate"] == "destructive"));
    let metrics = lines.last().expect("metrics line");
    assert_eq!(metrics["dispatches_total"], 2);
    assert_eq!(backend.stage_name(), "empty");
}
