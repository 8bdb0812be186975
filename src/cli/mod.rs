//! CLI module for Mote.

pub mod commands;
mod output;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Mote - Meeting Transcript Agent
///
/// Extract, summarize, and semantically index YouTube/Zoom meeting
/// transcripts. The name "Mote" comes from the Norwegian word "møte"
/// for "meeting."
#[derive(Parser, Debug)]
#[command(name = "mote")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full pipeline for a meeting URL
    Process {
        /// YouTube or Zoom meeting URL
        url: String,
    },

    /// Show the stored summary and transcript for a meeting
    Show {
        /// Meeting URL
        url: String,
    },

    /// List processed meetings
    List,

    /// Start the HTTP API server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "8000")]
        port: u16,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,
}
