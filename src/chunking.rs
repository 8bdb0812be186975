//! Transcript chunking for semantic indexing.
//!
//! Splits a raw transcript into overlapping, bounded-size chunks, preferring
//! natural boundaries (paragraph breaks, line breaks, sentence endings) over
//! hard cuts.

use serde::{Deserialize, Serialize};

/// Boundary candidates in priority order. A chunk is cut at the last
/// occurrence of the highest-priority separator found in its window.
const SEPARATORS: [&str; 5] = ["\n\n", "\n", ". ", "! ", "? "];

/// A chunk of transcript text with its ordinal position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptChunk {
    /// 0-based position of this chunk within the transcript.
    pub index: usize,
    /// Text content of this chunk.
    pub content: String,
}

/// Configuration for chunking.
#[derive(Debug, Clone)]
pub struct ChunkingConfig {
    /// Target chunk size in characters.
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in characters.
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1200,
            chunk_overlap: 200,
        }
    }
}

/// Recursive character chunker.
///
/// Walks the text in windows of `chunk_size`, cutting each window at the
/// best available boundary and backing up by `chunk_overlap` before starting
/// the next one. Output is deterministic for identical input.
pub struct RecursiveChunker {
    config: ChunkingConfig,
}

impl RecursiveChunker {
    pub fn new(config: ChunkingConfig) -> Self {
        Self { config }
    }

    /// Split text into overlapping pieces.
    ///
    /// Empty or whitespace-only input produces no pieces.
    pub fn split(&self, text: &str) -> Vec<String> {
        let text = text.trim();
        if text.is_empty() {
            return Vec::new();
        }

        let size = self.config.chunk_size.max(1);
        let overlap = self.config.chunk_overlap.min(size.saturating_sub(1));

        let mut pieces = Vec::new();
        let mut start = 0usize;

        while start < text.len() {
            let window_end = floor_char_boundary(text, start + size);

            let end = if window_end >= text.len() {
                text.len()
            } else {
                find_boundary(&text[start..window_end])
                    .map(|rel| start + rel)
                    .unwrap_or(window_end)
            };

            let piece = text[start..end].trim();
            if !piece.is_empty() {
                pieces.push(piece.to_string());
            }

            if end >= text.len() {
                break;
            }

            // Back up by the overlap, but always make forward progress.
            let mut next = end.saturating_sub(overlap).max(start + 1);
            while next < text.len() && !text.is_char_boundary(next) {
                next += 1;
            }
            start = next;
        }

        pieces
    }

    /// Split text into ordered chunks with contiguous 0-based indices.
    pub fn chunk(&self, text: &str) -> Vec<TranscriptChunk> {
        self.split(text)
            .into_iter()
            .enumerate()
            .map(|(index, content)| TranscriptChunk { index, content })
            .collect()
    }
}

impl Default for RecursiveChunker {
    fn default() -> Self {
        Self::new(ChunkingConfig::default())
    }
}

/// Find the best cut position inside a window, or None for a hard split.
///
/// Tries separators in priority order and takes the last occurrence. A cut
/// in the first half of the window is rejected so that boundary splitting
/// cannot degrade into a stream of tiny chunks.
fn find_boundary(window: &str) -> Option<usize> {
    for sep in SEPARATORS {
        if let Some(pos) = window.rfind(sep) {
            let cut = pos + sep.len();
            if pos > 0 && cut * 2 >= window.len() && cut < window.len() {
                return Some(cut);
            }
        }
    }
    None
}

/// Largest char boundary at or below `index`.
fn floor_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    let mut index = index;
    while !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}
