//! Process command: run the full pipeline for one URL.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::{Orchestrator, WorkflowState};

/// Thread id used for pipeline runs started from the CLI.
const CLI_THREAD: &str = "cli";

pub async fn run_process(url: &str, settings: Settings) -> anyhow::Result<()> {
    let orchestrator = Orchestrator::new(settings)?;

    Output::header("Processing meeting");
    Output::kv("URL", url);
    println!();

    let outcome = orchestrator.handle_turn(CLI_THREAD, url).await;

    for event in &outcome.events {
        Output::info(event);
    }
    println!();

    match outcome.state {
        WorkflowState::Failed => {
            Output::error(&outcome.response);
            anyhow::bail!("pipeline failed");
        }
        _ => {
            Output::success(&outcome.response);
            Ok(())
        }
    }
}
