//! Durable copy of the feedback map.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{persistence_error, read_or_init, write_json_atomic};
use crate::analysis::FeedbackStore;
use crate::error::Result;

/// JSON object file mirroring a [`FeedbackStore`].
pub struct FeedbackFile {
    path: PathBuf,
    /// Serializes snapshot-and-write so a slower writer cannot overwrite a
    /// newer snapshot with an older one.
    write_lock: Mutex<()>,
}

impl FeedbackFile {
    /// Create a handle for `path`. Nothing is read until [`load`](Self::load).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read persisted feedback, initialising an empty file if absent.
    pub async fn load(&self) -> Result<HashMap<String, bool>> {
        let contents = read_or_init(&self.path, "{}").await?;
        let entries: HashMap<String, bool> =
            serde_json::from_str(&contents).map_err(|e| persistence_error(&self.path, e))?;

        info!(path = %self.path.display(), entries = entries.len(), "Feedback loaded");
        Ok(entries)
    }

    /// Set `url` to `verdict` and persist the store.
    ///
    /// The change only takes effect if it reaches disk: on a failed write the
    /// store is rolled back to the value it held before. Returns the replaced
    /// verdict.
    pub async fn record(&self, store: &FeedbackStore, url: &str, verdict: bool) -> Result<Option<bool>> {
        let _guard = self.write_lock.lock().await;
        let previous = store.set(url, verdict);

        if let Err(e) = self.write_snapshot(store).await {
            store.restore(url, previous);
            warn!(url = %url, error = %e, "Feedback not persisted, change rolled back");
            return Err(e);
        }
        Ok(previous)
    }

    async fn write_snapshot(&self, store: &FeedbackStore) -> Result<()> {
        let snapshot = store.snapshot();
        write_json_atomic(&self.path, &snapshot).await?;

        debug!(path = %self.path.display(), entries = snapshot.len(), "Feedback persisted");
        Ok(())
    }
}
