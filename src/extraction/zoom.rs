//! Zoom recording transcript source.

use super::{fetch_from_scraper, host_matches, url_host, SourceKind, TranscriptSource};
use crate::config::ExtractionSettings;
use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{info, instrument};

/// Transcript source backed by the Zoom recording scraper service.
pub struct ZoomTranscriptSource {
    api_url: String,
    timeout: Duration,
}

impl ZoomTranscriptSource {
    pub fn new(settings: &ExtractionSettings) -> Self {
        Self {
            api_url: settings.zoom_api_url.clone(),
            timeout: Duration::from_secs(settings.timeout_seconds),
        }
    }
}

#[async_trait]
impl TranscriptSource for ZoomTranscriptSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Zoom
    }

    fn can_handle(&self, url: &str) -> bool {
        match url_host(url) {
            Some(host) => host_matches(&host, "zoom.us"),
            None => false,
        }
    }

    #[instrument(skip(self))]
    async fn fetch_transcript(&self, url: &str) -> Result<String> {
        info!("Fetching Zoom transcript for {}", url);
        fetch_from_scraper(&self.api_url, url, self.timeout).await
    }
}
