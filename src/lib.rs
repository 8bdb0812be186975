//! Mote - Meeting Transcript Processing and Indexing
//!
//! A CLI tool and chat backend that turns meeting recordings into searchable
//! knowledge: paste a YouTube or Zoom link, get back a structured summary and
//! an indexed transcript.
//!
//! The name "Mote" comes from the Norwegian word "møte" for "meeting."
//!
//! # Overview
//!
//! Mote allows you to:
//! - Extract transcripts from YouTube videos and Zoom recordings
//! - Summarize meetings into structured metadata, action items, and insights
//! - Build a chunked, embedded knowledge base from each transcript
//! - Drive the whole pipeline from a chat thread or the command line
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management
//! - `extraction` - Transcript extraction (YouTube, Zoom)
//! - `summarizer` - Structured meeting summarization
//! - `chunking` - Transcript chunking
//! - `embedding` - Embedding generation
//! - `store` - Meeting registry and chunk store
//! - `indexer` - Replace-then-insert chunk indexing
//! - `session` - Per-thread session state
//! - `orchestrator` - Workflow coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use mote::config::Settings;
//! use mote::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     // Process a meeting recording end to end
//!     let outcome = orchestrator
//!         .handle_turn("thread-1", "https://zoom.us/rec/share/abc123")
//!         .await;
//!     println!("{}", outcome.response);
//!
//!     Ok(())
//! }
//! ```

pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod extraction;
pub mod indexer;
pub mod openai;
pub mod orchestrator;
pub mod session;
pub mod store;
pub mod summarizer;

pub use error::{MoteError, Result};
