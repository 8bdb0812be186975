//! Storage abstraction for meetings and their search-index chunks.
//!
//! Two concerns live here: the meeting registry (one row per URL, upsert
//! keyed on URL uniqueness) and the chunk store (the replace-index primitives
//! used by the indexer). The registry assumes eventual read-after-write
//! consistency and exposes a bounded-retry id lookup to compensate.

mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::summarizer::MeetingSummary;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// A persisted meeting record, keyed by source URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meeting {
    /// Internal id, assigned on first insert.
    pub id: Uuid,
    /// Source URL. Unique: at most one meeting row per URL.
    pub url: String,
    /// Raw transcript text.
    pub transcript: String,
    /// Structured summary.
    pub summary: MeetingSummary,
    /// Embedding of the serialized summary. None when generation failed.
    pub embedding: Option<Vec<f32>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One search-index row for a transcript chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// Unique row id.
    pub id: Uuid,
    /// Meeting this chunk belongs to.
    pub meeting_id: Uuid,
    /// 0-based position within the meeting's transcript.
    pub chunk_index: i64,
    /// Text content of this chunk.
    pub content: String,
    /// Embedding vector.
    pub embedding: Vec<f32>,
    /// Meeting metadata merged with the synthetic chunk fields.
    pub metadata: serde_json::Value,
    /// When this row was written.
    pub indexed_at: DateTime<Utc>,
}

impl ChunkRecord {
    /// Create a new chunk record.
    pub fn new(
        meeting_id: Uuid,
        chunk_index: i64,
        content: String,
        embedding: Vec<f32>,
        metadata: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            meeting_id,
            chunk_index,
            content,
            embedding,
            metadata,
            indexed_at: Utc::now(),
        }
    }
}

/// Summary line for one meeting, used by listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeetingOverview {
    pub url: String,
    pub title: Option<String>,
    pub chunk_count: u32,
    pub updated_at: DateTime<Utc>,
}

/// Meeting registry: lookup/create/update of meeting records.
#[async_trait]
pub trait MeetingStore: Send + Sync {
    /// Find a meeting by exact URL match.
    async fn find_by_url(&self, url: &str) -> Result<Option<Meeting>>;

    /// Resolve a meeting id by URL.
    async fn find_id_by_url(&self, url: &str) -> Result<Option<Uuid>>;

    /// Insert or update the meeting for a URL.
    ///
    /// A second upsert for the same URL overwrites transcript, summary, and
    /// embedding rather than creating a duplicate row. Returns the meeting id.
    async fn upsert_meeting(
        &self,
        url: &str,
        transcript: &str,
        summary: &MeetingSummary,
        embedding: Option<&[f32]>,
    ) -> Result<Uuid>;

    /// Fetch the stored metadata (summary JSON) for a meeting id.
    async fn get_metadata(&self, meeting_id: Uuid) -> Result<serde_json::Value>;

    /// List all known meetings, most recently updated first.
    async fn list_meetings(&self) -> Result<Vec<MeetingOverview>>;

    /// Resolve a meeting id, retrying to cover the read-after-write window
    /// behind a just-committed insert.
    ///
    /// Returns a definitive None only after exhausting all attempts.
    async fn find_id_by_url_with_retry(
        &self,
        url: &str,
        attempts: u32,
        backoff: Duration,
    ) -> Result<Option<Uuid>> {
        for attempt in 0..attempts.max(1) {
            if let Some(id) = self.find_id_by_url(url).await? {
                return Ok(Some(id));
            }
            if attempt + 1 < attempts {
                tokio::time::sleep(backoff).await;
            }
        }
        Ok(None)
    }
}

/// Chunk store: the replace-index primitives.
#[async_trait]
pub trait ChunkStore: Send + Sync {
    /// Delete all chunk rows for a meeting. Returns the number deleted.
    async fn delete_by_meeting(&self, meeting_id: Uuid) -> Result<usize>;

    /// Bulk-insert chunk rows. All-or-nothing.
    async fn insert_chunks(&self, records: &[ChunkRecord]) -> Result<usize>;

    /// Get all chunks for a meeting, ordered by chunk index.
    async fn get_by_meeting(&self, meeting_id: Uuid) -> Result<Vec<ChunkRecord>>;

    /// Count chunk rows for a meeting.
    async fn chunk_count(&self, meeting_id: Uuid) -> Result<usize>;
}
