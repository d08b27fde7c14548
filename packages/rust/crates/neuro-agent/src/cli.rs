use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "neuro-agent")]
#[command(
    about = "EEG analysis agent: local LLM + backend tools. Repl (interactive / one-shot), stdio, or catalog."
)]
pub(crate) struct Cli {
    /// Override config directory (user settings live in `<conf>/neuro-agent/settings.yaml`).
    #[arg(long, global = true)]
    pub(crate) conf: Option<PathBuf>,

    /// Debug-level logs on stderr (ignored when RUST_LOG is set).
    #[arg(long, global = true)]
    pub(crate) verbose: bool,

    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub(crate) enum ModeArg {
    Single,
    Multi,
}

/// Per-run overrides shared by the session-driving commands.
#[derive(Debug, Clone, Default, Args)]
pub(crate) struct SessionOverrides {
    /// Reference example corpus (JSON); enables retrieval.
    #[arg(long)]
    pub(crate) corpus: Option<PathBuf>,

    /// EEG backend facade base URL.
    #[arg(long)]
    pub(crate) backend_url: Option<String>,

    /// Chat completions endpoint.
    #[arg(long)]
    pub(crate) inference_url: Option<String>,

    /// Model id sent to the inference endpoint.
    #[arg(long)]
    pub(crate) model: Option<String>,

    /// Single or multi action per message.
    #[arg(long, value_enum)]
    pub(crate) mode: Option<ModeArg>,

    /// Iteration ceiling per message.
    #[arg(long)]
    pub(crate) max_iterations: Option<u32>,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Interactive prompt, or one-shot with --query. Destructive actions ask for yes/no.
    Repl {
        /// Run one message and exit.
        #[arg(long)]
        query: Option<String>,

        #[command(flatten)]
        overrides: SessionOverrides,
    },
    /// Read instructions from stdin, write events to stdout as JSON lines. Exit on EOF.
    Stdio {
        #[command(flatten)]
        overrides: SessionOverrides,
    },
    /// Print the tool catalog as JSON schemas.
    Catalog,
}
