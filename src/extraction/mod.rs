//! Transcript extraction from meeting URLs.
//!
//! Provides a trait-based interface over the external scraper services that
//! turn a YouTube or Zoom recording URL into raw transcript text. Any other
//! URL family is rejected up front, without a network call.

mod youtube;
mod zoom;

pub use youtube::YoutubeTranscriptSource;
pub use zoom::ZoomTranscriptSource;

use crate::config::ExtractionSettings;
use crate::error::{MoteError, Result};
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::time::Duration;

/// Type of meeting source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    YouTube,
    Zoom,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::YouTube => write!(f, "youtube"),
            SourceKind::Zoom => write!(f, "zoom"),
        }
    }
}

/// Trait for transcript source providers.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// Get the source kind.
    fn kind(&self) -> SourceKind;

    /// Check if this source recognizes the given URL.
    fn can_handle(&self, url: &str) -> bool;

    /// Fetch the raw transcript for a meeting URL.
    async fn fetch_transcript(&self, url: &str) -> Result<String>;
}

/// Response shape shared by both scraper services.
#[derive(Debug, Deserialize)]
struct ScraperResponse {
    #[serde(default)]
    transcript: String,
}

/// Call a scraper service: `GET <base>?url=<meeting url>`.
///
/// One bounded attempt; a timeout or HTTP error surfaces as a step failure.
pub(crate) async fn fetch_from_scraper(
    base_url: &str,
    meeting_url: &str,
    timeout: Duration,
) -> Result<String> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;

    let response = client
        .get(base_url)
        .query(&[("url", meeting_url)])
        .send()
        .await
        .map_err(|e| MoteError::Extraction(format!("Failed to fetch transcript: {}", e)))?;

    let response = response
        .error_for_status()
        .map_err(|e| MoteError::Extraction(format!("Scraper returned error: {}", e)))?;

    let body: ScraperResponse = response
        .json()
        .await
        .map_err(|e| MoteError::Extraction(format!("Invalid scraper response: {}", e)))?;

    Ok(body.transcript)
}

/// Host of a URL, if it parses at all.
fn url_host(input: &str) -> Option<String> {
    url::Url::parse(input.trim())
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_ascii_lowercase()))
}

/// Check whether a host is the given domain or a subdomain of it.
fn host_matches(host: &str, domain: &str) -> bool {
    host == domain || host.ends_with(&format!(".{}", domain))
}

/// Extraction collaborator consumed by the orchestrator.
///
/// Dispatches a URL to the right scraper, or rejects it up front.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Fetch the transcript for a meeting URL.
    ///
    /// Unrecognized URL families fail with `UnsupportedUrl` before any
    /// network call happens.
    async fn extract(&self, url: &str) -> Result<String>;
}

/// Extractor backed by the external scraper services.
pub struct ScraperExtractor {
    settings: ExtractionSettings,
}

impl ScraperExtractor {
    pub fn new(settings: ExtractionSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl Extractor for ScraperExtractor {
    async fn extract(&self, url: &str) -> Result<String> {
        match detect_source(url, &self.settings) {
            Some(source) => source.fetch_transcript(url).await,
            None => Err(MoteError::UnsupportedUrl(url.to_string())),
        }
    }
}

/// Detect the appropriate transcript source for the given URL.
///
/// Returns None for URL families neither scraper supports.
pub fn detect_source(url: &str, settings: &ExtractionSettings) -> Option<Box<dyn TranscriptSource>> {
    let youtube = YoutubeTranscriptSource::new(settings);
    if youtube.can_handle(url) {
        return Some(Box::new(youtube));
    }

    let zoom = ZoomTranscriptSource::new(settings);
    if zoom.can_handle(url) {
        return Some(Box::new(zoom));
    }

    None
}

/// Find the first http(s) URL in free-form chat text.
pub fn find_url(text: &str) -> Option<String> {
    let url_regex = Regex::new(r#"https?://[^\s<>"']+"#).expect("Invalid regex");
    url_regex
        .find(text)
        .map(|m| m.as_str().trim_end_matches(['.', ',', ')', ']']).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> ExtractionSettings {
        ExtractionSettings::default()
    }

    #[test]
    fn test_detects_youtube_urls() {
        let source = detect_source("https://www.youtube.com/watch?v=dQw4w9WgXcQ", &settings());
        assert_eq!(source.unwrap().kind(), SourceKind::YouTube);

        let source = detect_source("https://youtu.be/dQw4w9WgXcQ", &settings());
        assert_eq!(source.unwrap().kind(), SourceKind::YouTube);
    }

    #[test]
    fn test_detects_zoom_urls() {
        let source = detect_source("https://zoom.us/rec/abc", &settings());
        assert_eq!(source.unwrap().kind(), SourceKind::Zoom);

        let source = detect_source("https://us02web.zoom.us/rec/share/xyz", &settings());
        assert_eq!(source.unwrap().kind(), SourceKind::Zoom);
    }

    #[test]
    fn test_rejects_other_urls() {
        assert!(detect_source("https://example.com/video", &settings()).is_none());
        assert!(detect_source("https://vimeo.com/12345", &settings()).is_none());
        assert!(detect_source("not a url", &settings()).is_none());
        // Lookalike domains must not match
        assert!(detect_source("https://notzoom.us.evil.com/rec/abc", &settings()).is_none());
    }

    #[test]
    fn test_find_url_in_chat_text() {
        assert_eq!(
            find_url("please process https://zoom.us/rec/abc for me"),
            Some("https://zoom.us/rec/abc".to_string())
        );
        assert_eq!(
            find_url("check this: https://youtu.be/xyz."),
            Some("https://youtu.be/xyz".to_string())
        );
        assert_eq!(find_url("no link here"), None);
    }
}
