//! Workflow orchestrator for Mote.
//!
//! Drives one conversational turn through a fixed pipeline:
//! dedup-check, extraction, summarization, persistence, indexing. The step
//! ordering and short-circuits are data in an explicit state machine, not
//! model-decided branching. Steps run strictly in sequence; a step never
//! starts before the previous one's side effects are observable.

use crate::chunking::{ChunkingConfig, RecursiveChunker};
use crate::config::Settings;
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::{MoteError, Result};
use crate::extraction::{find_url, Extractor, ScraperExtractor};
use crate::indexer::Indexer;
use crate::session::{MemorySessions, ThreadSessions};
use crate::store::{ChunkStore, MeetingStore, SqliteStore};
use crate::summarizer::{OpenAiSummarizer, Summarizer};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Fixed confirmation emitted when the whole pipeline succeeds.
pub const CONFIRMATION: &str =
    "Your meeting has been processed, summarized, saved, and indexed successfully.";

/// Terminal (or resting) state of one orchestrator turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    /// No URL in the input; the turn ends by asking for one.
    AwaitingUrl,
    CheckingExisting,
    Extracting,
    Summarizing,
    Persisting,
    Indexing,
    /// Pipeline finished (possibly degraded: saved but not indexed).
    Done,
    /// A step failed; committed side effects stay committed.
    Failed,
}

impl std::fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            WorkflowState::AwaitingUrl => "awaiting_url",
            WorkflowState::CheckingExisting => "checking_existing",
            WorkflowState::Extracting => "extracting",
            WorkflowState::Summarizing => "summarizing",
            WorkflowState::Persisting => "persisting",
            WorkflowState::Indexing => "indexing",
            WorkflowState::Done => "done",
            WorkflowState::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// Result of one orchestrator turn: progress events followed by a final
/// response, plus the state the workflow ended in.
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    pub state: WorkflowState,
    /// Ordered progress updates, as streamed to the chat boundary.
    pub events: Vec<String>,
    /// Final user-facing text.
    pub response: String,
}

/// The workflow orchestrator.
pub struct Orchestrator {
    settings: Settings,
    meetings: Arc<dyn MeetingStore>,
    chunks: Arc<dyn ChunkStore>,
    extractor: Arc<dyn Extractor>,
    summarizer: Arc<dyn Summarizer>,
    embedder: Arc<dyn Embedder>,
    sessions: Arc<dyn ThreadSessions>,
    indexer: Indexer,
}

impl Orchestrator {
    /// Create an orchestrator with the default collaborators.
    pub fn new(settings: Settings) -> Result<Self> {
        let store = Arc::new(SqliteStore::new(&settings.sqlite_path())?);
        let embedder: Arc<dyn Embedder> = Arc::new(OpenAIEmbedder::with_config(
            &settings.embedding.model,
            settings.embedding.dimensions as usize,
        ));

        Ok(Self::with_components(
            settings.clone(),
            store.clone(),
            store,
            Arc::new(ScraperExtractor::new(settings.extraction.clone())),
            Arc::new(OpenAiSummarizer::new(&settings.summarization.model)),
            embedder,
            Arc::new(MemorySessions::new()),
        ))
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        meetings: Arc<dyn MeetingStore>,
        chunks: Arc<dyn ChunkStore>,
        extractor: Arc<dyn Extractor>,
        summarizer: Arc<dyn Summarizer>,
        embedder: Arc<dyn Embedder>,
        sessions: Arc<dyn ThreadSessions>,
    ) -> Self {
        let chunker = RecursiveChunker::new(ChunkingConfig {
            chunk_size: settings.chunking.chunk_size,
            chunk_overlap: settings.chunking.chunk_overlap,
        });

        let indexer = Indexer::new(
            meetings.clone(),
            chunks.clone(),
            embedder.clone(),
            chunker,
        );

        Self {
            settings,
            meetings,
            chunks,
            extractor,
            summarizer,
            embedder,
            sessions,
            indexer,
        }
    }

    /// The meeting registry.
    pub fn meetings(&self) -> Arc<dyn MeetingStore> {
        self.meetings.clone()
    }

    /// The chunk store.
    pub fn chunks(&self) -> Arc<dyn ChunkStore> {
        self.chunks.clone()
    }

    /// The per-thread session state.
    pub fn sessions(&self) -> Arc<dyn ThreadSessions> {
        self.sessions.clone()
    }

    /// The settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Run one conversational turn through the pipeline.
    ///
    /// Every terminal failure becomes a `Failed` outcome carrying a short
    /// explanation plus the internal error detail; steps already committed
    /// are never rolled back. Re-running the same URL is always safe: the
    /// meeting upsert and the chunk replacement are both idempotent by URL.
    #[instrument(skip(self, message), fields(thread_id = %thread_id))]
    pub async fn handle_turn(&self, thread_id: &str, message: &str) -> TurnOutcome {
        let mut events = Vec::new();

        // AwaitingUrl: without a URL there is nothing to do this turn.
        let Some(url) = find_url(message) else {
            return TurnOutcome {
                state: WorkflowState::AwaitingUrl,
                events,
                response: "Please share a YouTube or Zoom meeting URL to process.".to_string(),
            };
        };

        // CheckingExisting: dedup by exact URL match.
        events.push("Checking if meeting exists...".to_string());
        match self.meetings.find_by_url(&url).await {
            Ok(Some(meeting)) => {
                info!("Meeting already exists for {}", url);
                self.sessions.set_url(thread_id, &url);
                return TurnOutcome {
                    state: WorkflowState::Done,
                    events,
                    response: format!(
                        "This meeting has already been processed (id {}). Ask me anything about it.",
                        meeting.id
                    ),
                };
            }
            Ok(None) => {}
            Err(e) => {
                return Self::fail(events, "I couldn't check the meeting database.", &e);
            }
        }

        // Extracting
        events.push("Extracting transcript...".to_string());
        let transcript = match self.extractor.extract(&url).await {
            Ok(t) => t,
            Err(MoteError::UnsupportedUrl(url)) => {
                return Self::fail(
                    events,
                    "Unsupported URL type. I can process YouTube and Zoom meeting links.",
                    &MoteError::UnsupportedUrl(url),
                );
            }
            Err(e) => {
                return Self::fail(events, "I couldn't extract the transcript.", &e);
            }
        };
        self.sessions.set_url(thread_id, &url);

        // Summarizing
        events.push("Summarizing transcript...".to_string());
        let summary = match self.summarizer.summarize(&transcript, &url).await {
            Ok(s) => s,
            Err(e) => {
                return Self::fail(events, "I couldn't summarize the transcript.", &e);
            }
        };

        // Persisting: summary embedding is best-effort, the upsert is not.
        events.push("Generating summary embedding...".to_string());
        let summary_json = serde_json::to_string(&summary).unwrap_or_default();
        let embedding = match self.embedder.embed(&summary_json).await {
            Ok(vector) => Some(vector),
            Err(e) => {
                warn!("Summary embedding failed, storing null embedding: {}", e);
                None
            }
        };

        events.push("Saving to database...".to_string());
        if let Err(e) = self
            .meetings
            .upsert_meeting(&url, &transcript, &summary, embedding.as_deref())
            .await
        {
            return Self::fail(events, "I couldn't save the meeting.", &e);
        }

        // Indexing: the backend is only eventually consistent, so resolve
        // the id through the retrying lookup instead of assuming the
        // just-written row is already visible.
        events.push("Generating knowledge base...".to_string());
        let attempts = self.settings.registry.lookup_attempts;
        let backoff = Duration::from_millis(self.settings.registry.lookup_backoff_ms);

        let meeting_id = match self
            .meetings
            .find_id_by_url_with_retry(&url, attempts, backoff)
            .await
        {
            Ok(Some(id)) => id,
            Ok(None) => {
                warn!("Meeting not found after {} lookup attempts: {}", attempts, url);
                return Self::degraded(events, "the meeting record could not be located");
            }
            Err(e) => {
                warn!("Id lookup failed for {}: {}", url, e);
                return Self::degraded(events, &e.to_string());
            }
        };

        match self.indexer.reindex(meeting_id, &transcript).await {
            Ok(outcome) => {
                info!("Indexing outcome for {}: {}", url, outcome);
                TurnOutcome {
                    state: WorkflowState::Done,
                    events,
                    response: CONFIRMATION.to_string(),
                }
            }
            Err(e) => {
                warn!("Indexing failed for {}: {}", url, e);
                Self::degraded(events, &e.to_string())
            }
        }
    }

    /// Terminal failure: short explanation plus the internal detail.
    fn fail(events: Vec<String>, message: &str, detail: &MoteError) -> TurnOutcome {
        TurnOutcome {
            state: WorkflowState::Failed,
            events,
            response: format!("{} ({})", message, detail),
        }
    }

    /// Degraded completion: summary and persistence succeeded, the search
    /// index did not.
    fn degraded(events: Vec<String>, detail: &str) -> TurnOutcome {
        TurnOutcome {
            state: WorkflowState::Done,
            events,
            response: format!(
                "Your meeting has been processed, summarized, and saved, but search \
                 indexing failed: {}. Resubmitting the URL will retry it.",
                detail
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;
    use crate::summarizer::MeetingSummary;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const ZOOM_URL: &str = "https://zoom.us/rec/abc";

    struct StubExtractor {
        calls: AtomicUsize,
        behavior: ExtractBehavior,
    }

    enum ExtractBehavior {
        Transcript(String),
        NetworkError,
    }

    impl StubExtractor {
        fn transcript(text: &str) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                behavior: ExtractBehavior::Transcript(text.to_string()),
            }
        }

        fn failing() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                behavior: ExtractBehavior::NetworkError,
            }
        }
    }

    #[async_trait]
    impl Extractor for StubExtractor {
        async fn extract(&self, url: &str) -> Result<String> {
            // Mirror the real dispatch: unsupported families never count as
            // a network call.
            if !url.contains("zoom.us") && !url.contains("youtu") {
                return Err(MoteError::UnsupportedUrl(url.to_string()));
            }
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.behavior {
                ExtractBehavior::Transcript(t) => Ok(t.clone()),
                ExtractBehavior::NetworkError => {
                    Err(MoteError::Extraction("connection refused".to_string()))
                }
            }
        }
    }

    struct StubSummarizer {
        fail: bool,
    }

    #[async_trait]
    impl Summarizer for StubSummarizer {
        async fn summarize(&self, _transcript: &str, url: &str) -> Result<MeetingSummary> {
            if self.fail {
                return Err(MoteError::Summarization("model unavailable".to_string()));
            }
            Ok(MeetingSummary {
                summary: "Team sync about the launch.".to_string(),
                url: url.to_string(),
                ..Default::default()
            })
        }
    }

    struct StubEmbedder {
        fail_single: bool,
        fail_batch: bool,
    }

    #[async_trait]
    impl Embedder for StubEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            if self.fail_single {
                return Err(MoteError::Embedding("single embed down".to_string()));
            }
            Ok(vec![1.0, 0.0])
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            if self.fail_batch {
                return Err(MoteError::Embedding("batch embed down".to_string()));
            }
            Ok(texts.iter().map(|_| vec![0.0, 1.0]).collect())
        }

        fn dimensions(&self) -> usize {
            2
        }
    }

    struct Harness {
        orchestrator: Orchestrator,
        store: Arc<SqliteStore>,
        extractor: Arc<StubExtractor>,
    }

    fn harness(
        extractor: StubExtractor,
        summarizer: StubSummarizer,
        embedder: StubEmbedder,
    ) -> Harness {
        let mut settings = Settings::default();
        settings.chunking.chunk_size = 80;
        settings.chunking.chunk_overlap = 10;
        settings.registry.lookup_attempts = 3;
        settings.registry.lookup_backoff_ms = 10;

        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let extractor = Arc::new(extractor);

        let orchestrator = Orchestrator::with_components(
            settings,
            store.clone(),
            store.clone(),
            extractor.clone(),
            Arc::new(summarizer),
            Arc::new(embedder),
            Arc::new(MemorySessions::new()),
        );

        Harness {
            orchestrator,
            store,
            extractor,
        }
    }

    fn default_harness() -> Harness {
        harness(
            StubExtractor::transcript(
                "Welcome everyone. Today we review the launch plan. \
                 Marketing owns the blog post. Engineering ships Friday. ",
            ),
            StubSummarizer { fail: false },
            StubEmbedder {
                fail_single: false,
                fail_batch: false,
            },
        )
    }

    #[tokio::test]
    async fn test_no_url_asks_for_one() {
        let h = default_harness();

        let outcome = h.orchestrator.handle_turn("t1", "hello there").await;

        assert_eq!(outcome.state, WorkflowState::AwaitingUrl);
        assert!(outcome.response.contains("URL"));
        assert_eq!(h.extractor.calls.load(Ordering::SeqCst), 0);
        assert!(h.store.list_meetings().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_url_fails_without_writes() {
        let h = default_harness();

        let outcome = h
            .orchestrator
            .handle_turn("t1", "process https://example.com/video please")
            .await;

        assert_eq!(outcome.state, WorkflowState::Failed);
        assert!(outcome.response.contains("Unsupported URL type"));
        assert_eq!(h.extractor.calls.load(Ordering::SeqCst), 0);
        assert!(h.store.list_meetings().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_happy_path_reaches_confirmation() {
        let h = default_harness();

        let outcome = h
            .orchestrator
            .handle_turn("t1", &format!("summarize {}", ZOOM_URL))
            .await;

        assert_eq!(outcome.state, WorkflowState::Done);
        assert_eq!(outcome.response, CONFIRMATION);

        // Progress events arrive in pipeline order
        assert_eq!(outcome.events.first().unwrap(), "Checking if meeting exists...");
        assert!(outcome.events.contains(&"Saving to database...".to_string()));

        let meeting = h.store.find_by_url(ZOOM_URL).await.unwrap().unwrap();
        assert!(meeting.embedding.is_some());
        assert!(h.store.chunk_count(meeting.id).await.unwrap() > 0);

        assert_eq!(
            h.orchestrator.sessions().get_url("t1").as_deref(),
            Some(ZOOM_URL)
        );
    }

    #[tokio::test]
    async fn test_resubmission_short_circuits() {
        let h = default_harness();

        let first = h.orchestrator.handle_turn("t1", ZOOM_URL).await;
        assert_eq!(first.response, CONFIRMATION);

        let meeting = h.store.find_by_url(ZOOM_URL).await.unwrap().unwrap();
        let chunks_before = h.store.chunk_count(meeting.id).await.unwrap();

        let second = h.orchestrator.handle_turn("t2", ZOOM_URL).await;

        assert_eq!(second.state, WorkflowState::Done);
        assert!(second.response.contains("already been processed"));

        // Extraction ran exactly once across both turns
        assert_eq!(h.extractor.calls.load(Ordering::SeqCst), 1);

        // One meeting row, chunk set untouched
        assert_eq!(h.store.list_meetings().await.unwrap().len(), 1);
        assert_eq!(h.store.chunk_count(meeting.id).await.unwrap(), chunks_before);

        // The dedup hit still binds the URL to the new thread
        assert_eq!(
            h.orchestrator.sessions().get_url("t2").as_deref(),
            Some(ZOOM_URL)
        );
    }

    #[tokio::test]
    async fn test_extraction_failure_persists_nothing() {
        let h = harness(
            StubExtractor::failing(),
            StubSummarizer { fail: false },
            StubEmbedder {
                fail_single: false,
                fail_batch: false,
            },
        );

        let outcome = h.orchestrator.handle_turn("t1", ZOOM_URL).await;

        assert_eq!(outcome.state, WorkflowState::Failed);
        assert!(outcome.response.contains("couldn't extract"));
        assert!(h.store.list_meetings().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_summarization_failure_persists_nothing() {
        let h = harness(
            StubExtractor::transcript("Some transcript text."),
            StubSummarizer { fail: true },
            StubEmbedder {
                fail_single: false,
                fail_batch: false,
            },
        );

        let outcome = h.orchestrator.handle_turn("t1", ZOOM_URL).await;

        assert_eq!(outcome.state, WorkflowState::Failed);
        assert!(h.store.list_meetings().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_summary_embedding_failure_is_best_effort() {
        let h = harness(
            StubExtractor::transcript("A transcript long enough to chunk and index properly."),
            StubSummarizer { fail: false },
            StubEmbedder {
                fail_single: true,
                fail_batch: false,
            },
        );

        let outcome = h.orchestrator.handle_turn("t1", ZOOM_URL).await;

        // Persistence proceeds with a null embedding and indexing still runs
        assert_eq!(outcome.state, WorkflowState::Done);
        assert_eq!(outcome.response, CONFIRMATION);

        let meeting = h.store.find_by_url(ZOOM_URL).await.unwrap().unwrap();
        assert!(meeting.embedding.is_none());
        assert!(h.store.chunk_count(meeting.id).await.unwrap() > 0);
    }

    #[tokio::test]
    async fn test_chunk_embedding_failure_degrades_to_saved_only() {
        let h = harness(
            StubExtractor::transcript("A transcript long enough to chunk and index properly."),
            StubSummarizer { fail: false },
            StubEmbedder {
                fail_single: false,
                fail_batch: true,
            },
        );

        let outcome = h.orchestrator.handle_turn("t1", ZOOM_URL).await;

        assert_eq!(outcome.state, WorkflowState::Done);
        assert!(outcome.response.contains("indexing failed"));

        // Meeting saved, index empty
        let meeting = h.store.find_by_url(ZOOM_URL).await.unwrap().unwrap();
        assert_eq!(h.store.chunk_count(meeting.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_degraded_run_leaves_resubmittable_state() {
        // A degraded run commits the meeting row; resubmitting the URL hits
        // the dedup check without duplicating anything.
        let h = harness(
            StubExtractor::transcript("A transcript long enough to chunk and index properly."),
            StubSummarizer { fail: false },
            StubEmbedder {
                fail_single: false,
                fail_batch: true,
            },
        );

        let first = h.orchestrator.handle_turn("t1", ZOOM_URL).await;
        assert!(first.response.contains("indexing failed"));

        let second = h.orchestrator.handle_turn("t1", ZOOM_URL).await;
        assert_eq!(second.state, WorkflowState::Done);
        assert!(second.response.contains("already been processed"));
        assert_eq!(h.store.list_meetings().await.unwrap().len(), 1);
    }
}
