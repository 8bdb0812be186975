//! SQLite-backed meeting registry and chunk store.
//!
//! Embeddings are stored as little-endian f32 BLOBs; summaries and chunk
//! metadata as JSON text.

use super::{ChunkRecord, ChunkStore, Meeting, MeetingOverview, MeetingStore};
use crate::error::{MoteError, Result};
use crate::summarizer::MeetingSummary;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info, instrument};
use uuid::Uuid;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS meetings (
    id TEXT PRIMARY KEY,
    url TEXT NOT NULL UNIQUE,
    transcript TEXT NOT NULL,
    metadata TEXT NOT NULL,
    embedding BLOB,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS transcript_chunks (
    id TEXT PRIMARY KEY,
    meeting_id TEXT NOT NULL,
    chunk_index INTEGER NOT NULL,
    content TEXT NOT NULL,
    embedding BLOB NOT NULL,
    metadata TEXT NOT NULL,
    indexed_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_chunks_meeting_id ON transcript_chunks(meeting_id);
"#;

/// SQLite-based store implementing both registry and chunk traits.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a store at the given path.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // WAL for better concurrent read behavior
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized SQLite store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| MoteError::Store(format!("Failed to acquire lock: {}", e)))
    }

    /// Serialize embedding to bytes.
    fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    /// Deserialize embedding from bytes.
    fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| {
                let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
                f32::from_le_bytes(arr)
            })
            .collect()
    }

    fn parse_timestamp(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now())
    }

    fn row_to_meeting(row: &rusqlite::Row<'_>) -> rusqlite::Result<Meeting> {
        let id_str: String = row.get(0)?;
        let metadata_json: String = row.get(3)?;
        let embedding_bytes: Option<Vec<u8>> = row.get(4)?;
        let created_at_str: String = row.get(5)?;
        let updated_at_str: String = row.get(6)?;

        Ok(Meeting {
            id: Uuid::parse_str(&id_str).unwrap_or_default(),
            url: row.get(1)?,
            transcript: row.get(2)?,
            summary: serde_json::from_str::<MeetingSummary>(&metadata_json).unwrap_or_default(),
            embedding: embedding_bytes.map(|b| Self::bytes_to_embedding(&b)),
            created_at: Self::parse_timestamp(&created_at_str),
            updated_at: Self::parse_timestamp(&updated_at_str),
        })
    }
}

#[async_trait]
impl MeetingStore for SqliteStore {
    #[instrument(skip(self))]
    async fn find_by_url(&self, url: &str) -> Result<Option<Meeting>> {
        let conn = self.lock()?;

        let meeting = conn
            .query_row(
                r#"
                SELECT id, url, transcript, metadata, embedding, created_at, updated_at
                FROM meetings
                WHERE url = ?1
                "#,
                params![url],
                Self::row_to_meeting,
            )
            .optional()?;

        Ok(meeting)
    }

    async fn find_id_by_url(&self, url: &str) -> Result<Option<Uuid>> {
        let conn = self.lock()?;

        let id: Option<String> = conn
            .query_row(
                "SELECT id FROM meetings WHERE url = ?1",
                params![url],
                |row| row.get(0),
            )
            .optional()?;

        Ok(id.and_then(|s| Uuid::parse_str(&s).ok()))
    }

    #[instrument(skip(self, transcript, summary, embedding))]
    async fn upsert_meeting(
        &self,
        url: &str,
        transcript: &str,
        summary: &MeetingSummary,
        embedding: Option<&[f32]>,
    ) -> Result<Uuid> {
        let conn = self.lock()?;

        let metadata_json = serde_json::to_string(summary)?;
        let embedding_bytes = embedding.map(Self::embedding_to_bytes);
        let now = Utc::now().to_rfc3339();

        conn.execute(
            r#"
            INSERT INTO meetings (id, url, transcript, metadata, embedding, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            ON CONFLICT(url) DO UPDATE SET
                transcript = excluded.transcript,
                metadata = excluded.metadata,
                embedding = excluded.embedding,
                updated_at = excluded.updated_at
            "#,
            params![
                Uuid::new_v4().to_string(),
                url,
                transcript,
                metadata_json,
                embedding_bytes,
                now,
            ],
        )?;

        // The insert id is discarded on conflict, so read the winner back.
        let id: String = conn.query_row(
            "SELECT id FROM meetings WHERE url = ?1",
            params![url],
            |row| row.get(0),
        )?;

        let id = Uuid::parse_str(&id)
            .map_err(|e| MoteError::Store(format!("Corrupt meeting id for {}: {}", url, e)))?;

        info!("Upserted meeting {} for {}", id, url);
        Ok(id)
    }

    async fn get_metadata(&self, meeting_id: Uuid) -> Result<serde_json::Value> {
        let conn = self.lock()?;

        let metadata_json: Option<String> = conn
            .query_row(
                "SELECT metadata FROM meetings WHERE id = ?1",
                params![meeting_id.to_string()],
                |row| row.get(0),
            )
            .optional()?;

        match metadata_json {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Err(MoteError::MeetingNotFound(meeting_id.to_string())),
        }
    }

    #[instrument(skip(self))]
    async fn list_meetings(&self) -> Result<Vec<MeetingOverview>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT m.url, m.metadata, m.updated_at,
                   (SELECT COUNT(*) FROM transcript_chunks c WHERE c.meeting_id = m.id) AS chunk_count
            FROM meetings m
            ORDER BY m.updated_at DESC
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            let metadata_json: String = row.get(1)?;
            let updated_at_str: String = row.get(2)?;
            Ok((
                row.get::<_, String>(0)?,
                metadata_json,
                updated_at_str,
                row.get::<_, u32>(3)?,
            ))
        })?;

        let mut meetings = Vec::new();
        for row in rows {
            let (url, metadata_json, updated_at_str, chunk_count) = row?;
            let summary: MeetingSummary =
                serde_json::from_str(&metadata_json).unwrap_or_default();
            meetings.push(MeetingOverview {
                url,
                title: summary.metadata.meeting_title,
                chunk_count,
                updated_at: Self::parse_timestamp(&updated_at_str),
            });
        }

        Ok(meetings)
    }
}

#[async_trait]
impl ChunkStore for SqliteStore {
    #[instrument(skip(self))]
    async fn delete_by_meeting(&self, meeting_id: Uuid) -> Result<usize> {
        let conn = self.lock()?;

        let deleted = conn.execute(
            "DELETE FROM transcript_chunks WHERE meeting_id = ?1",
            params![meeting_id.to_string()],
        )?;

        info!("Deleted {} chunks for meeting {}", deleted, meeting_id);
        Ok(deleted)
    }

    #[instrument(skip(self, records))]
    async fn insert_chunks(&self, records: &[ChunkRecord]) -> Result<usize> {
        let conn = self.lock()?;

        let tx = conn.unchecked_transaction()?;

        for record in records {
            let embedding_bytes = Self::embedding_to_bytes(&record.embedding);
            let metadata_json = serde_json::to_string(&record.metadata)?;

            tx.execute(
                r#"
                INSERT INTO transcript_chunks
                (id, meeting_id, chunk_index, content, embedding, metadata, indexed_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
                params![
                    record.id.to_string(),
                    record.meeting_id.to_string(),
                    record.chunk_index,
                    record.content,
                    embedding_bytes,
                    metadata_json,
                    record.indexed_at.to_rfc3339(),
                ],
            )?;
        }

        tx.commit()?;
        info!("Inserted {} chunks", records.len());
        Ok(records.len())
    }

    #[instrument(skip(self))]
    async fn get_by_meeting(&self, meeting_id: Uuid) -> Result<Vec<ChunkRecord>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT id, meeting_id, chunk_index, content, embedding, metadata, indexed_at
            FROM transcript_chunks
            WHERE meeting_id = ?1
            ORDER BY chunk_index
            "#,
        )?;

        let chunks = stmt.query_map(params![meeting_id.to_string()], |row| {
            let id_str: String = row.get(0)?;
            let meeting_id_str: String = row.get(1)?;
            let embedding_bytes: Vec<u8> = row.get(4)?;
            let metadata_json: String = row.get(5)?;
            let indexed_at_str: String = row.get(6)?;

            Ok(ChunkRecord {
                id: Uuid::parse_str(&id_str).unwrap_or_default(),
                meeting_id: Uuid::parse_str(&meeting_id_str).unwrap_or_default(),
                chunk_index: row.get(2)?,
                content: row.get(3)?,
                embedding: Self::bytes_to_embedding(&embedding_bytes),
                metadata: serde_json::from_str(&metadata_json)
                    .unwrap_or(serde_json::Value::Null),
                indexed_at: Self::parse_timestamp(&indexed_at_str),
            })
        })?;

        let result: Vec<ChunkRecord> = chunks.filter_map(|c| c.ok()).collect();
        debug!("Found {} chunks for meeting {}", result.len(), meeting_id);
        Ok(result)
    }

    async fn chunk_count(&self, meeting_id: Uuid) -> Result<usize> {
        let conn = self.lock()?;

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM transcript_chunks WHERE meeting_id = ?1",
            params![meeting_id.to_string()],
            |row| row.get(0),
        )?;

        Ok(count as usize)
    }
}
