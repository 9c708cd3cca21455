//! Human-confirmed verdicts keyed by exact URL.

use parking_lot::RwLock;
use std::collections::HashMap;

/// In-memory feedback map shared by the engine and the feedback endpoint.
///
/// Keys are the URL exactly as submitted: `http://x.com` and `http://x.com/`
/// are unrelated entries. Writes are last-writer-wins and visible to every
/// read that starts after `set` returns.
#[derive(Debug, Default)]
pub struct FeedbackStore {
    entries: RwLock<HashMap<String, bool>>,
}

impl FeedbackStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated from persisted feedback.
    pub fn from_entries(entries: HashMap<String, bool>) -> Self {
        Self {
            entries: RwLock::new(entries),
        }
    }

    /// The confirmed verdict for `url`, if any. `true` means phishing.
    pub fn get(&self, url: &str) -> Option<bool> {
        self.entries.read().get(url).copied()
    }

    /// Record a verdict, returning the one it replaced.
    pub fn set(&self, url: &str, verdict: bool) -> Option<bool> {
        self.entries.write().insert(url.to_string(), verdict)
    }

    /// Put back the value `set` replaced, removing the entry if there was none.
    pub fn restore(&self, url: &str, previous: Option<bool>) {
        let mut entries = self.entries.write();
        match previous {
            Some(verdict) => {
                entries.insert(url.to_string(), verdict);
            }
            None => {
                entries.remove(url);
            }
        }
    }

    /// Copy of every entry, for persistence.
    pub fn snapshot(&self) -> HashMap<String, bool> {
        self.entries.read().clone()
    }

    /// Number of URLs with feedback.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether no feedback has been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
