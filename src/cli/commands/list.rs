//! List command: show processed meetings.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;

pub async fn run_list(settings: Settings) -> anyhow::Result<()> {
    let orchestrator = Orchestrator::new(settings)?;
    let meetings = orchestrator.meetings().list_meetings().await?;

    if meetings.is_empty() {
        Output::info("No meetings processed yet.");
        return Ok(());
    }

    Output::header(&format!("Meetings ({})", meetings.len()));
    for meeting in meetings {
        let title = meeting.title.unwrap_or_else(|| "Untitled meeting".to_string());
        Output::meeting_info(&title, &meeting.url, meeting.chunk_count);
    }

    Ok(())
}
