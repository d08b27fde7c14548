use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use neuro_agent::{
    AgentConfig, BackendFacade, ExampleRetriever, ExecutionMode, HttpBackend, HttpReasoningEngine,
    LowConfidenceAction, Orchestrator, Retriever, RuntimeSettings, SessionHandle, spawn_session,
};

use crate::cli::{ModeArg, SessionOverrides};
use crate::resolve::{non_empty_env, resolve_positive_u32, resolve_string};

fn parse_execution_mode(raw: &str, source: &str) -> Result<ExecutionMode> {
    ExecutionMode::parse(raw)
        .ok_or_else(|| anyhow!("invalid {source}: '{raw}' (expected one of: single, multi)"))
}

/// Defaults, then settings files, then `NEURO_AGENT_*` env, then CLI flags.
pub(crate) fn resolve_config(
    overrides: &SessionOverrides,
    runtime_settings: &RuntimeSettings,
) -> Result<AgentConfig> {
    let mut config = AgentConfig::default();
    runtime_settings.apply_to(&mut config);

    config.inference_url = resolve_string(
        overrides.inference_url.clone(),
        "NEURO_AGENT_INFERENCE_URL",
        &config.inference_url,
    );
    config.model = resolve_string(overrides.model.clone(), "NEURO_AGENT_MODEL", &config.model);
    config.backend_url = resolve_string(
        overrides.backend_url.clone(),
        "NEURO_AGENT_BACKEND_URL",
        &config.backend_url,
    );
    config.max_iterations = resolve_positive_u32(
        overrides.max_iterations,
        "NEURO_AGENT_MAX_ITERATIONS",
        config.max_iterations,
    );

    if let Some(mode) = overrides.mode {
        config.execution_mode = match mode {
            ModeArg::Single => ExecutionMode::Single,
            ModeArg::Multi => ExecutionMode::Multi,
        };
    } else if let Some(raw) = non_empty_env("NEURO_AGENT_EXECUTION_MODE") {
        config.execution_mode = parse_execution_mode(&raw, "NEURO_AGENT_EXECUTION_MODE")?;
    }
    if let Some(raw) = non_empty_env("NEURO_AGENT_LOW_CONFIDENCE_ACTION") {
        config.low_confidence_action = LowConfidenceAction::parse(&raw).ok_or_else(|| {
            anyhow!(
                "invalid NEURO_AGENT_LOW_CONFIDENCE_ACTION: '{raw}' (expected one of: confirm, self_correct)"
            )
        })?;
    }
    if let Some(path) = overrides.corpus.clone() {
        config.retrieval.corpus_path = Some(path);
    }
    Ok(config)
}

/// Wire HTTP engine, HTTP backend and (optional) retrieval into a running session.
pub(crate) async fn build_session(
    overrides: &SessionOverrides,
    runtime_settings: &RuntimeSettings,
) -> Result<SessionHandle> {
    let config = resolve_config(overrides, runtime_settings)?;
    tracing::info!(
        inference_url = %config.inference_url,
        model = %config.model,
        backend_url = %config.backend_url,
        mode = config.execution_mode.as_str(),
        max_iterations = config.max_iterations,
        "building agent session"
    );

    let backend: Arc<dyn BackendFacade> = Arc::new(HttpBackend::new(
        &config.backend_url,
        config.tool_timeout(true),
    ));
    let engine = Arc::new(HttpReasoningEngine::new(
        config.inference_url.clone(),
        config.model.clone(),
        config.resolve_api_key(),
    ));
    let retriever = Retriever::from_config(&config.retrieval).await?;

    let mut builder = Orchestrator::builder(config, backend, engine);
    if let Some(retriever) = retriever {
        tracing::info!(examples = retriever.len(), "example retrieval enabled");
        let retriever: Arc<dyn ExampleRetriever> = Arc::new(retriever);
        builder = builder.retriever(retriever);
    }
    let orchestrator = builder
        .build()
        .context("tool registry does not cover the catalog")?;
    Ok(spawn_session(orchestrator))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_overrides_apply_over_settings() {
        let settings: RuntimeSettings =
            serde_yaml::from_str("agent:\n  max_iterations: 4\n  execution_mode: multi\n")
                .unwrap_or_default();
        let overrides = SessionOverrides {
            mode: Some(ModeArg::Single),
            backend_url: Some("http://127.0.0.1:9999".to_string()),
            ..SessionOverrides::default()
        };
        let config = resolve_config(&overrides, &settings).expect("config");
        assert_eq!(config.execution_mode, ExecutionMode::Single);
        assert_eq!(config.backend_url, "http://127.0.0.1:9999");
    }
}
