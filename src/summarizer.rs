//! Structured meeting summarization.
//!
//! Maps raw transcript text onto the meeting summary schema. Fields the
//! transcript does not mention stay null/empty; only total extraction failure
//! is an error.

use crate::error::{MoteError, Result};
use crate::openai::create_client;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs, ResponseFormat,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// High-level facts about the meeting.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MeetingMetadata {
    pub meeting_title: Option<String>,
    pub date: Option<String>,
    pub project: Option<String>,
}

/// A single follow-up task. Every field is optional; transcripts often name
/// a task without an owner or a date.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionItem {
    pub task: Option<String>,
    pub owner: Option<String>,
    pub due: Option<String>,
}

/// Derived observations about the meeting.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Insights {
    pub topics: Option<Vec<String>>,
    pub priority: Option<String>,
    pub decisions: Option<Vec<String>>,
    pub notes: Option<String>,
}

/// Structured summary of one meeting.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MeetingSummary {
    pub metadata: MeetingMetadata,
    pub attendees: Vec<String>,
    pub summary: String,
    pub action_items: Vec<ActionItem>,
    pub insights: Insights,
    /// The original meeting URL.
    pub url: String,
}

/// Trait for structured summary extraction.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Produce a structured summary from a raw transcript.
    async fn summarize(&self, transcript: &str, url: &str) -> Result<MeetingSummary>;
}

const SYSTEM_PROMPT: &str = r#"You are an AI specialist focused on data extraction.
Your ONLY job is to take a raw meeting transcript and convert it into the structured JSON format required.

Respond with a single JSON object of this shape:
{
  "metadata": {"meeting_title": string|null, "date": string|null, "project": string|null},
  "attendees": [string],
  "summary": string,
  "action_items": [{"task": string|null, "owner": string|null, "due": string|null}],
  "insights": {"topics": [string]|null, "priority": string|null, "decisions": [string]|null, "notes": string|null}
}

Populate every field from the transcript text. If information is missing for a
specific field, use null or an appropriate empty value. Output JSON only."#;

/// LLM-backed summarizer.
pub struct OpenAiSummarizer {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
}

impl OpenAiSummarizer {
    pub fn new(model: &str) -> Self {
        Self {
            client: create_client(),
            model: model.to_string(),
        }
    }

    /// Parse the LLM response into a summary, tolerating markdown fences and
    /// surrounding prose.
    fn parse_summary(response: &str) -> Result<MeetingSummary> {
        let json_start = response.find('{');
        let json_end = response.rfind('}');

        let json_str = match (json_start, json_end) {
            (Some(start), Some(end)) if end > start => &response[start..=end],
            _ => response,
        };

        serde_json::from_str(json_str).map_err(|e| {
            let preview: String = response.chars().take(500).collect();
            MoteError::Summarization(format!(
                "Failed to parse summary response: {}. Response was: {}",
                e, preview
            ))
        })
    }
}

impl Default for OpenAiSummarizer {
    fn default() -> Self {
        Self::new("gpt-4o-mini")
    }
}

#[async_trait]
impl Summarizer for OpenAiSummarizer {
    #[instrument(skip(self, transcript), fields(len = transcript.len()))]
    async fn summarize(&self, transcript: &str, url: &str) -> Result<MeetingSummary> {
        info!("Summarizing transcript ({} chars)", transcript.len());

        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(SYSTEM_PROMPT)
                .build()
                .map_err(|e| MoteError::Summarization(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(format!("Meeting URL: {}\n\nTranscript:\n{}", url, transcript))
                .build()
                .map_err(|e| MoteError::Summarization(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .response_format(ResponseFormat::JsonObject)
            .temperature(0.2)
            .build()
            .map_err(|e| MoteError::Summarization(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| MoteError::OpenAI(format!("Summarization API error: {}", e)))?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| MoteError::Summarization("Empty response from LLM".to_string()))?;

        debug!("Summary response ({} chars)", content.len());

        let mut summary = Self::parse_summary(content)?;
        summary.url = url.to_string();
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_summary() {
        let json = r#"{
            "metadata": {"meeting_title": "Q3 Planning", "date": "2025-07-01", "project": "Atlas"},
            "attendees": ["Ada", "Grace"],
            "summary": "Planned the Q3 roadmap.",
            "action_items": [{"task": "Draft RFC", "owner": "Ada", "due": null}],
            "insights": {"topics": ["roadmap"], "priority": "high", "decisions": [], "notes": null}
        }"#;

        let summary = OpenAiSummarizer::parse_summary(json).unwrap();
        assert_eq!(summary.metadata.meeting_title.as_deref(), Some("Q3 Planning"));
        assert_eq!(summary.attendees, vec!["Ada", "Grace"]);
        assert_eq!(summary.action_items.len(), 1);
        assert_eq!(summary.action_items[0].owner.as_deref(), Some("Ada"));
        assert!(summary.action_items[0].due.is_none());
    }

    #[test]
    fn test_parse_summary_with_markdown() {
        let response = r#"Here is the extraction:

```json
{"metadata": {}, "attendees": [], "summary": "Short sync.", "action_items": [], "insights": {}}
```

All fields populated."#;

        let summary = OpenAiSummarizer::parse_summary(response).unwrap();
        assert_eq!(summary.summary, "Short sync.");
        assert!(summary.action_items.is_empty());
    }

    #[test]
    fn test_parse_summary_missing_fields_default() {
        // Missing keys fall back to empty values rather than failing
        let summary = OpenAiSummarizer::parse_summary(r#"{"summary": "Standup."}"#).unwrap();
        assert_eq!(summary.summary, "Standup.");
        assert!(summary.attendees.is_empty());
        assert!(summary.insights.topics.is_none());
        assert!(summary.metadata.meeting_title.is_none());
    }

    #[test]
    fn test_parse_summary_rejects_garbage() {
        assert!(OpenAiSummarizer::parse_summary("not json at all").is_err());
    }
}
