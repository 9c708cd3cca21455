//! JSON-file persistence for feedback and the detection log.

mod detection_log;
mod feedback_file;

pub use detection_log::{AuditSink, DetectionLog, DetectionRecord};
pub use feedback_file::FeedbackFile;

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::error::{PhishguardError, Result};

fn persistence_error(path: &Path, err: impl std::fmt::Display) -> PhishguardError {
    PhishguardError::Persistence(format!("{}: {}", path.display(), err))
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Read `path`, writing `empty` to it first if it does not exist.
async fn read_or_init(path: &Path, empty: &str) -> Result<String> {
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => Ok(contents),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tokio::fs::write(path, empty)
                .await
                .map_err(|e| persistence_error(path, e))?;
            Ok(empty.to_string())
        }
        Err(e) => Err(persistence_error(path, e)),
    }
}

/// Replace `path` with the pretty-printed JSON of `value`.
///
/// The document is written beside the target and renamed over it, so a
/// crash mid-write leaves the previous version intact.
async fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let body = serde_json::to_vec_pretty(value)?;
    write_atomic(path, body).await
}

/// Replace `path` with `body` via a temporary file and rename.
async fn write_atomic(path: &Path, body: Vec<u8>) -> Result<()> {
    let temp = temp_path(path);

    tokio::fs::write(&temp, body)
        .await
        .map_err(|e| persistence_error(&temp, e))?;
    tokio::fs::rename(&temp, path)
        .await
        .map_err(|e| persistence_error(path, e))
}
