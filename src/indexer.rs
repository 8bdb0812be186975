//! Replace-index pipeline for meeting transcripts.
//!
//! Rebuilds the full chunk set for one meeting: fetch metadata, chunk, embed
//! in one batch, delete the old rows, insert the new ones. The chunk set is
//! always replaced as a unit; there is no partial update path.

use crate::chunking::RecursiveChunker;
use crate::embedding::Embedder;
use crate::error::Result;
use crate::store::{ChunkRecord, ChunkStore, MeetingStore};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Outcome of a reindex run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexOutcome {
    /// The transcript produced zero chunks; nothing was written.
    NothingToIndex,
    /// The chunk set was replaced with this many rows.
    Indexed(usize),
}

impl std::fmt::Display for IndexOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexOutcome::NothingToIndex => write!(f, "Transcript too short to chunk."),
            IndexOutcome::Indexed(n) => {
                write!(f, "Successfully indexed {} chunks with metadata.", n)
            }
        }
    }
}

/// Indexer for the transcript search index.
pub struct Indexer {
    meetings: Arc<dyn MeetingStore>,
    chunks: Arc<dyn ChunkStore>,
    embedder: Arc<dyn Embedder>,
    chunker: RecursiveChunker,
}

impl Indexer {
    pub fn new(
        meetings: Arc<dyn MeetingStore>,
        chunks: Arc<dyn ChunkStore>,
        embedder: Arc<dyn Embedder>,
        chunker: RecursiveChunker,
    ) -> Self {
        Self {
            meetings,
            chunks,
            embedder,
            chunker,
        }
    }

    /// Rebuild the search index rows for one meeting's transcript.
    ///
    /// Embedding failure aborts before any write. Deleting the old rows is
    /// best-effort: a failure there leaves stale rows alongside the new ones
    /// rather than losing the new data. Two concurrent reindexes of the same
    /// meeting may interleave their delete/insert steps; callers accept that
    /// risk.
    #[instrument(skip(self, transcript), fields(len = transcript.len()))]
    pub async fn reindex(&self, meeting_id: Uuid, transcript: &str) -> Result<IndexOutcome> {
        // Metadata enrichment is non-critical; fall back to an empty object.
        let metadata = match self.meetings.get_metadata(meeting_id).await {
            Ok(Value::Object(map)) => map,
            Ok(_) => Map::new(),
            Err(e) => {
                warn!("Failed to fetch metadata for {}: {}", meeting_id, e);
                Map::new()
            }
        };

        let chunks = self.chunker.chunk(transcript);
        if chunks.is_empty() {
            info!("Nothing to index for meeting {}", meeting_id);
            return Ok(IndexOutcome::NothingToIndex);
        }

        info!("Embedding {} chunks for meeting {}", chunks.len(), meeting_id);
        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        let records: Vec<ChunkRecord> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| {
                // Meeting metadata merged under the synthetic fields; the
                // synthetic keys always win.
                let mut merged = metadata.clone();
                merged.insert("source".to_string(), Value::from("transcript"));
                merged.insert("chunk_index".to_string(), Value::from(chunk.index as i64));

                ChunkRecord::new(
                    meeting_id,
                    chunk.index as i64,
                    chunk.content,
                    embedding,
                    Value::Object(merged),
                )
            })
            .collect();

        // Clean up old chunks. Best-effort: stale duplicates beat lost data.
        if let Err(e) = self.chunks.delete_by_meeting(meeting_id).await {
            warn!("Failed to delete old chunks for {}: {}", meeting_id, e);
        }

        let inserted = self.chunks.insert_chunks(&records).await?;
        info!("Indexed {} chunks for meeting {}", inserted, meeting_id);

        Ok(IndexOutcome::Indexed(inserted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::ChunkingConfig;
    use crate::error::MoteError;
    use crate::store::{Meeting, MeetingOverview, SqliteStore};
    use crate::summarizer::MeetingSummary;
    use async_trait::async_trait;

    /// Embedder returning fixed-size vectors without network access.
    struct StubEmbedder {
        fail: bool,
    }

    #[async_trait]
    impl Embedder for StubEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            self.embed_batch(&[text.to_string()])
                .await
                .map(|mut v| v.remove(0))
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            if self.fail {
                return Err(MoteError::Embedding("stub failure".to_string()));
            }
            Ok(texts.iter().map(|t| vec![t.len() as f32, 1.0]).collect())
        }

        fn dimensions(&self) -> usize {
            2
        }
    }

    /// Registry stub that serves canned metadata.
    struct StubRegistry {
        metadata: Result<Value>,
    }

    #[async_trait]
    impl MeetingStore for StubRegistry {
        async fn find_by_url(&self, _url: &str) -> Result<Option<Meeting>> {
            Ok(None)
        }

        async fn find_id_by_url(&self, _url: &str) -> Result<Option<Uuid>> {
            Ok(None)
        }

        async fn upsert_meeting(
            &self,
            _url: &str,
            _transcript: &str,
            _summary: &MeetingSummary,
            _embedding: Option<&[f32]>,
        ) -> Result<Uuid> {
            Ok(Uuid::new_v4())
        }

        async fn get_metadata(&self, _meeting_id: Uuid) -> Result<Value> {
            match &self.metadata {
                Ok(v) => Ok(v.clone()),
                Err(_) => Err(MoteError::Store("metadata unavailable".to_string())),
            }
        }

        async fn list_meetings(&self) -> Result<Vec<MeetingOverview>> {
            Ok(Vec::new())
        }
    }

    fn indexer_with(
        metadata: Result<Value>,
        store: Arc<SqliteStore>,
        fail_embeddings: bool,
    ) -> Indexer {
        Indexer::new(
            Arc::new(StubRegistry { metadata }),
            store,
            Arc::new(StubEmbedder {
                fail: fail_embeddings,
            }),
            RecursiveChunker::new(ChunkingConfig {
                chunk_size: 60,
                chunk_overlap: 10,
            }),
        )
    }

    fn transcript() -> String {
        "We discussed the launch. Marketing owns the blog post. \
         Engineering ships on Friday. Everyone agreed on the timeline. "
            .repeat(4)
    }

    #[tokio::test]
    async fn test_empty_transcript_writes_nothing() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let indexer = indexer_with(Ok(serde_json::json!({})), Arc::clone(&store), false);
        let meeting_id = Uuid::new_v4();

        let outcome = indexer.reindex(meeting_id, "   \n\n  ").await.unwrap();

        assert_eq!(outcome, IndexOutcome::NothingToIndex);
        assert_eq!(store.chunk_count(meeting_id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_reindex_replaces_chunk_set() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let indexer = indexer_with(Ok(serde_json::json!({})), Arc::clone(&store), false);
        let meeting_id = Uuid::new_v4();

        let first = indexer.reindex(meeting_id, &transcript()).await.unwrap();
        let IndexOutcome::Indexed(k) = first else {
            panic!("expected indexed outcome");
        };
        assert!(k > 1);

        // Shorter transcript must leave exactly its own chunk count behind
        let second = indexer
            .reindex(meeting_id, "One short remark.")
            .await
            .unwrap();
        assert_eq!(second, IndexOutcome::Indexed(1));
        assert_eq!(store.chunk_count(meeting_id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_chunk_metadata_merges_meeting_fields() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let metadata = serde_json::json!({
            "metadata": {"meeting_title": "Launch sync"},
            "summary": "Launch discussion",
            // A colliding key must not override the synthetic field
            "source": "meetinglist",
        });
        let indexer = indexer_with(Ok(metadata), Arc::clone(&store), false);
        let meeting_id = Uuid::new_v4();

        indexer.reindex(meeting_id, &transcript()).await.unwrap();

        let chunks = store.get_by_meeting(meeting_id).await.unwrap();
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.metadata["source"], "transcript");
            assert_eq!(chunk.metadata["chunk_index"], i as i64);
            assert_eq!(chunk.metadata["summary"], "Launch discussion");
        }
    }

    #[tokio::test]
    async fn test_metadata_fetch_failure_is_non_fatal() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let indexer = indexer_with(
            Err(MoteError::Store("down".to_string())),
            Arc::clone(&store),
            false,
        );
        let meeting_id = Uuid::new_v4();

        let outcome = indexer.reindex(meeting_id, &transcript()).await.unwrap();
        assert!(matches!(outcome, IndexOutcome::Indexed(_)));

        let chunks = store.get_by_meeting(meeting_id).await.unwrap();
        assert_eq!(chunks[0].metadata["source"], "transcript");
    }

    #[tokio::test]
    async fn test_embedding_failure_aborts_without_writes() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let meeting_id = Uuid::new_v4();

        // Seed an existing index so we can observe it surviving the failure
        let ok_indexer = indexer_with(Ok(serde_json::json!({})), Arc::clone(&store), false);
        ok_indexer.reindex(meeting_id, &transcript()).await.unwrap();
        let before = store.chunk_count(meeting_id).await.unwrap();

        let failing = indexer_with(Ok(serde_json::json!({})), Arc::clone(&store), true);
        let result = failing.reindex(meeting_id, &transcript()).await;

        assert!(matches!(result, Err(MoteError::Embedding(_))));
        assert_eq!(store.chunk_count(meeting_id).await.unwrap(), before);
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(
            IndexOutcome::NothingToIndex.to_string(),
            "Transcript too short to chunk."
        );
        assert_eq!(
            IndexOutcome::Indexed(7).to_string(),
            "Successfully indexed 7 chunks with metadata."
        );
    }
}
