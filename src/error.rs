//! Error types for Mote.

use thiserror::Error;

/// Library-level error type for Mote operations.
#[derive(Error, Debug)]
pub enum MoteError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unsupported URL type: {0}")]
    UnsupportedUrl(String),

    #[error("Transcript extraction failed: {0}")]
    Extraction(String),

    #[error("Summarization failed: {0}")]
    Summarization(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Meeting not found: {0}")]
    MeetingNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for Mote operations.
pub type Result<T> = std::result::Result<T, MoteError>;
