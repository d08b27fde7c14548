//! neuro-agent CLI: repl (interactive / one-shot), stdio, or catalog dump.
//!
//! Settings come from `packages/conf/settings.yaml` and `<PRJ_CONFIG_HOME>/neuro-agent/settings.yaml`;
//! `NEURO_AGENT_*` env vars and CLI flags override them.
//!
//! Logging: set `RUST_LOG=neuro_agent=info` (or `warn`, `debug`) to see agent logs on stderr.

mod agent_builder;
mod cli;
mod nodes;
mod resolve;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use neuro_agent::{load_runtime_settings, set_config_home_override};

use crate::cli::{Cli, Command};
use crate::nodes::{run_catalog_mode, run_repl_mode, run_stdio_mode};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    if let Some(conf_dir) = cli.conf.clone() {
        set_config_home_override(conf_dir);
    }
    let runtime_settings = load_runtime_settings();

    // RUST_LOG overrides; --verbose => debug; else info
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if cli.verbose {
            "neuro_agent=debug"
        } else {
            "neuro_agent=info"
        })
    });
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    match cli.command {
        Command::Repl { query, overrides } => {
            run_repl_mode(query, &overrides, &runtime_settings).await
        }
        Command::Stdio { overrides } => run_stdio_mode(&overrides, &runtime_settings).await,
        Command::Catalog => run_catalog_mode(),
    }
}
