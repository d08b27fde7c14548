#![allow(missing_docs)]

use std::sync::Arc;

use neuro_agent::test_support::{
    EegBackendSim, ScriptStep, ScriptedEngine, sim_orchestrator, test_config,
};
use neuro_agent::{AgentConfig, EventSink, TerminationReason};
use serde_json::json;
use tokio_util::sync::CancellationToken;

fn lenient_failure_cap() -> AgentConfig {
    AgentConfig {
        max_consecutive_failures: 10,
        ..test_config()
    }
}

#[tokio::test]
async fn identical_failing_calls_trip_loop_detection() {
    let engine = Arc::new(ScriptedEngine::repeating(ScriptStep::call(
        "apply_filter",
        json!({"low": 1.0, "high": 40.0}),
    )));
    let backend = Arc::new(EegBackendSim::at_stage("data_loaded"));
    backend.fail_operation("apply_filter", "filter kernel diverged");
    let mut orchestrator =
        sim_orchestrator(lenient_failure_cap(), &engine, &backend).expect("orchestrator");

    let outcome = orchestrator
        .run_turn("filter it", &EventSink::discard(), &CancellationToken::new())
        .await;

    assert_eq!(outcome.reason, TerminationReason::LoopBreak);
    assert_eq!(backend.calls_to("apply_filter"), 3, "no fourth dispatch");
    assert_eq!(orchestrator.counters().loop_break_count, 1);
    assert!(outcome.final_text.contains("failed 3 times in a row"));
    assert!(outcome.final_text.contains("filter kernel diverged"));
}

#[tokio::test]
async fn loop_detection_wins_when_both_guards_trip_together() {
    let engine = Arc::new(ScriptedEngine::repeating(ScriptStep::call(
        "apply_notch",
        json!({"freq": 50.0}),
    )));
    let backend = Arc::new(EegBackendSim::at_stage("data_loaded"));
    backend.fail_operation("apply_notch", "no data");
    let mut orchestrator =
        sim_orchestrator(test_config(), &engine, &backend).expect("orchestrator");

    let outcome = orchestrator
        .run_turn("remove line noise", &EventSink::discard(), &CancellationToken::new())
        .await;

    assert_eq!(outcome.reason, TerminationReason::LoopBreak);
    assert_eq!(backend.calls_to("apply_notch"), 3);
}

#[tokio::test]
async fn varied_parameters_do_not_count_as_a_loop() {
    let engine = Arc::new(ScriptedEngine::new([
        ScriptStep::call("apply_notch", json!({"freq": 50.0})),
        ScriptStep::call("apply_notch", json!({"freq": 60.0})),
        ScriptStep::call("apply_notch", json!({"freq": 50.0})),
        ScriptStep::text("The notch filter keeps failing; please check the recording."),
    ]));
    let backend = Arc::new(EegBackendSim::at_stage("data_loaded"));
    backend.fail_operation("apply_notch", "no data");
    let mut orchestrator =
        sim_orchestrator(lenient_failure_cap(), &engine, &backend).expect("orchestrator");

    let outcome = orchestrator
        .run_turn("remove line noise", &EventSink::discard(), &CancellationToken::new())
        .await;

    assert_eq!(outcome.reason, TerminationReason::Responded);
    assert_eq!(backend.calls_to("apply_notch"), 3);
    assert_eq!(orchestrator.counters().loop_break_count, 0);
    assert_eq!(orchestrator.counters().consecutive_tool_failures, 3);
}

#[tokio::test]
async fn failed_executions_hit_the_failure_cap() {
    let engine = Arc::new(ScriptedEngine::new([
        ScriptStep::call("apply_notch", json!({"freq": 50.0})),
        ScriptStep::call("apply_notch", json!({"freq": 60.0})),
        ScriptStep::call("apply_notch", json!({"freq": 55.0})),
    ]));
    let backend = Arc::new(EegBackendSim::at_stage("data_loaded"));
    backend.fail_operation("apply_notch", "no data");
    let mut orchestrator =
        sim_orchestrator(test_config(), &engine, &backend).expect("orchestrator");

    let outcome = orchestrator
        .run_turn("remove line noise", &EventSink::discard(), &CancellationToken::new())
        .await;

    assert_eq!(outcome.reason, TerminationReason::FailureCap);
    assert_eq!(outcome.dispatched.len(), 3);
    assert!(outcome.final_text.contains("Last problem: `apply_notch` failed: error: no data"));
}

#[tokio::test]
async fn failure_cap_stops_first_when_loop_threshold_exceeds_it() {
    let engine = Arc::new(ScriptedEngine::repeating(ScriptStep::call(
        "apply_filter",
        json!({"low": 1.0, "high": 40.0}),
    )));
    let backend = Arc::new(EegBackendSim::at_stage("data_loaded"));
    backend.fail_operation("apply_filter", "filter kernel diverged");
    let config = AgentConfig {
        max_consecutive_failures: 3,
        loop_break_threshold: 5,
        ..test_config()
    };
    assert!(!config.loop_break_reachable());
    let mut orchestrator = sim_orchestrator(config, &engine, &backend).expect("orchestrator");

    let outcome = orchestrator
        .run_turn("filter it", &EventSink::discard(), &CancellationToken::new())
        .await;

    assert_eq!(outcome.reason, TerminationReason::FailureCap);
    assert_eq!(backend.calls_to("apply_filter"), 3);
    assert_eq!(orchestrator.counters().loop_break_count, 0);
}
