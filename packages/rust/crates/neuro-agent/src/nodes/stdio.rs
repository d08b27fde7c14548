use neuro_agent::{RuntimeSettings, run_stdio};
use tokio::io::BufReader;

use crate::agent_builder::build_session;
use crate::cli::SessionOverrides;

pub(crate) async fn run_stdio_mode(
    overrides: &SessionOverrides,
    runtime_settings: &RuntimeSettings,
) -> anyhow::Result<()> {
    let handle = build_session(overrides, runtime_settings).await?;
    tracing::info!(session_id = %handle.session_id(), "stdio session ready");
    run_stdio(
        handle,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    )
    .await
}
