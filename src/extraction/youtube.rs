//! YouTube transcript source.

use super::{fetch_from_scraper, host_matches, url_host, SourceKind, TranscriptSource};
use crate::config::ExtractionSettings;
use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{info, instrument};

/// Transcript source backed by the YouTube caption scraper service.
pub struct YoutubeTranscriptSource {
    api_url: String,
    timeout: Duration,
}

impl YoutubeTranscriptSource {
    pub fn new(settings: &ExtractionSettings) -> Self {
        Self {
            api_url: settings.youtube_api_url.clone(),
            timeout: Duration::from_secs(settings.timeout_seconds),
        }
    }
}

#[async_trait]
impl TranscriptSource for YoutubeTranscriptSource {
    fn kind(&self) -> SourceKind {
        SourceKind::YouTube
    }

    fn can_handle(&self, url: &str) -> bool {
        match url_host(url) {
            Some(host) => host_matches(&host, "youtube.com") || host_matches(&host, "youtu.be"),
            None => false,
        }
    }

    #[instrument(skip(self))]
    async fn fetch_transcript(&self, url: &str) -> Result<String> {
        info!("Fetching YouTube transcript for {}", url);
        fetch_from_scraper(&self.api_url, url, self.timeout).await
    }
}
