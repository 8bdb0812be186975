//! Show command: print the stored summary and transcript for a meeting.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;

pub async fn run_show(url: &str, settings: Settings) -> anyhow::Result<()> {
    let orchestrator = Orchestrator::new(settings)?;

    let Some(meeting) = orchestrator.meetings().find_by_url(url).await? else {
        Output::error(&format!("No meeting found for {}", url));
        anyhow::bail!("meeting not found");
    };

    let title = meeting
        .summary
        .metadata
        .meeting_title
        .as_deref()
        .unwrap_or("Untitled meeting");

    Output::header(title);
    Output::kv("URL", &meeting.url);
    Output::kv("Meeting id", &meeting.id.to_string());
    if let Some(date) = &meeting.summary.metadata.date {
        Output::kv("Date", date);
    }
    if !meeting.summary.attendees.is_empty() {
        Output::kv("Attendees", &meeting.summary.attendees.join(", "));
    }

    Output::header("Summary");
    println!("{}", meeting.summary.summary);

    if !meeting.summary.action_items.is_empty() {
        Output::header("Action items");
        for item in &meeting.summary.action_items {
            let task = item.task.as_deref().unwrap_or("(unspecified)");
            let owner = item.owner.as_deref().unwrap_or("unassigned");
            match &item.due {
                Some(due) => Output::list_item(&format!("{} [{}] (due {})", task, owner, due)),
                None => Output::list_item(&format!("{} [{}]", task, owner)),
            }
        }
    }

    let chunk_count = orchestrator.chunks().chunk_count(meeting.id).await?;
    println!();
    Output::kv("Indexed chunks", &chunk_count.to_string());

    Output::header("Transcript");
    println!("{}", meeting.transcript);

    Ok(())
}
