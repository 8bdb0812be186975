//! Per-thread session state.
//!
//! Tracks the most recently referenced meeting URL for each conversation
//! thread. The in-memory implementation is process-lifetime only; nothing
//! here survives a restart.

use std::collections::HashMap;
use std::sync::RwLock;

/// Thread-id to meeting-URL session mapping.
pub trait ThreadSessions: Send + Sync {
    /// Get the last known meeting URL for a thread.
    fn get_url(&self, thread_id: &str) -> Option<String>;

    /// Remember the meeting URL for a thread. Last write wins.
    fn set_url(&self, thread_id: &str, url: &str);
}

/// In-memory session store.
#[derive(Default)]
pub struct MemorySessions {
    urls: RwLock<HashMap<String, String>>,
}

impl MemorySessions {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ThreadSessions for MemorySessions {
    fn get_url(&self, thread_id: &str) -> Option<String> {
        self.urls
            .read()
            .ok()
            .and_then(|map| map.get(thread_id).cloned())
    }

    fn set_url(&self, thread_id: &str, url: &str) {
        if let Ok(mut map) = self.urls.write() {
            map.insert(thread_id.to_string(), url.to_string());
        }
    }
}
