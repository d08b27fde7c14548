use std::io::Write;

use anyhow::Result;
use neuro_agent::{AgentEvent, RuntimeSettings, SessionHandle};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::agent_builder::build_session;
use crate::cli::SessionOverrides;

const EXIT_COMMANDS: [&str; 2] = ["exit", "quit"];

pub(crate) async fn run_repl_mode(
    query: Option<String>,
    overrides: &SessionOverrides,
    runtime_settings: &RuntimeSettings,
) -> Result<()> {
    let handle = build_session(overrides, runtime_settings).await?;
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    if let Some(query) = query {
        let events = handle.submit(query.trim()).await?;
        return drive_turn(&handle, events, &mut input).await;
    }

    eprintln!("neuro-agent session {} (Ctrl+C cancels a turn, `exit` quits)", handle.session_id());
    loop {
        prompt("> ")?;
        let Some(line) = input.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if EXIT_COMMANDS.contains(&line) {
            break;
        }
        let events = handle.submit(line).await?;
        drive_turn(&handle, events, &mut input).await?;
    }
    Ok(())
}

/// Print one turn's events; a confirmation request is answered inline and the
/// follow-up turn is driven the same way.
async fn drive_turn(
    handle: &SessionHandle,
    mut events: UnboundedReceiver<AgentEvent>,
    input: &mut Lines<BufReader<Stdin>>,
) -> Result<()> {
    loop {
        let mut awaiting_answer = false;
        let mut streamed = false;
        loop {
            let event = tokio::select! {
                event = events.recv() => event,
                _ = tokio::signal::ctrl_c() => {
                    handle.cancel();
                    continue;
                }
            };
            let Some(event) = event else { break };
            match event {
                AgentEvent::PartialText { text } => {
                    streamed = true;
                    print!("{text}");
                    std::io::stdout().flush()?;
                }
                AgentEvent::StatusUpdate { state, detail, .. } => {
                    tracing::debug!(state = state.as_str(), detail = ?detail, "agent status");
                }
                AgentEvent::ToolStarted {
                    tool_name,
                    long_running,
                    ..
                } => {
                    if long_running {
                        eprintln!("[running {tool_name}; this may take a while]");
                    } else {
                        eprintln!("[running {tool_name}]");
                    }
                }
                AgentEvent::ToolFinished { record } => {
                    eprintln!("[{}: {}]", record.tool_name, record.output_summary);
                }
                AgentEvent::ConfirmationRequired {
                    tool_name,
                    parameters,
                    reason,
                    ..
                } => {
                    let parameters = serde_json::to_string(&parameters).unwrap_or_default();
                    eprintln!("[confirmation needed for {tool_name} {parameters}: {reason}]");
                    awaiting_answer = true;
                }
                AgentEvent::Error { message } => eprintln!("[error: {message}]"),
                AgentEvent::FinalText { text, .. } => {
                    if streamed {
                        println!();
                    }
                    println!("{text}");
                }
            }
        }
        if !awaiting_answer {
            return Ok(());
        }
        prompt("Proceed? [yes/no] ")?;
        let answer = input.next_line().await?.unwrap_or_default();
        events = if is_affirmative(&answer) {
            handle.confirm().await?
        } else {
            handle.decline().await?
        };
    }
}

fn is_affirmative(answer: &str) -> bool {
    matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes" | "confirm" | "ok"
    )
}

fn prompt(text: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    write!(stderr, "{text}")?;
    stderr.flush()
}
