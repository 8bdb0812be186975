//! Configuration module for Mote.
//!
//! Handles loading and managing application settings.

mod settings;

pub use settings::{
    ChunkingSettings, EmbeddingSettings, ExtractionSettings, GeneralSettings, RegistrySettings,
    Settings, StoreSettings, SummarizationSettings,
};
