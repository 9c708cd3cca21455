//! Append-only log of completed checks.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::{AsyncSeekExt, AsyncWriteExt};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{persistence_error, read_or_init, write_atomic};
use crate::analysis::FeatureSet;
use crate::error::Result;

/// One completed check as written to the detection log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionRecord {
    pub url: String,
    pub is_phishing: bool,
    /// ISO-8601 time the verdict was produced
    pub timestamp: DateTime<Utc>,
    pub features: FeatureSet,
}

impl DetectionRecord {
    /// Create a record stamped with the current time.
    pub fn now(url: impl Into<String>, is_phishing: bool, features: FeatureSet) -> Self {
        Self {
            url: url.into(),
            is_phishing,
            timestamp: Utc::now(),
            features,
        }
    }
}

/// Destination for detection records.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Append one record.
    async fn append(&self, record: DetectionRecord) -> Result<()>;
}

/// Closing bytes of the on-disk array.
const ARRAY_CLOSE: &[u8] = b"\n]";

/// Where the next record goes.
#[derive(Debug)]
struct LogTail {
    /// Byte offset of the closing `\n]`
    offset: u64,
    /// Records in the file
    count: usize,
}

/// Detection log kept as a JSON array on disk.
///
/// The file holds one record per line between `[` and `]`. An append
/// overwrites the closing bracket with the new line and a fresh bracket, so
/// the cost of a write does not grow with the size of the log.
pub struct DetectionLog {
    path: PathBuf,
    tail: Mutex<LogTail>,
}

impl DetectionLog {
    /// Open the log at `path`, initialising an empty array if absent.
    ///
    /// Existing records are rewritten one per line before any append.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let contents = read_or_init(&path, "[]").await?;
        let records: Vec<DetectionRecord> =
            serde_json::from_str(&contents).map_err(|e| persistence_error(&path, e))?;

        let mut body = b"[".to_vec();
        for (i, record) in records.iter().enumerate() {
            if i > 0 {
                body.push(b',');
            }
            body.extend_from_slice(b"\n  ");
            body.extend(serde_json::to_vec(record)?);
        }
        let offset = body.len() as u64;
        body.extend_from_slice(ARRAY_CLOSE);
        write_atomic(&path, body).await?;

        info!(path = %path.display(), records = records.len(), "Detection log opened");
        Ok(Self {
            path,
            tail: Mutex::new(LogTail {
                offset,
                count: records.len(),
            }),
        })
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of records written.
    pub async fn len(&self) -> usize {
        self.tail.lock().await.count
    }

    /// Read every record back from disk, oldest first.
    pub async fn records(&self) -> Result<Vec<DetectionRecord>> {
        let _tail = self.tail.lock().await;
        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| persistence_error(&self.path, e))?;
        serde_json::from_str(&contents).map_err(|e| persistence_error(&self.path, e))
    }

    async fn write_at(&self, offset: u64, bytes: &[u8]) -> std::io::Result<()> {
        let mut file = OpenOptions::new().write(true).open(&self.path).await?;
        file.seek(SeekFrom::Start(offset)).await?;
        file.write_all(bytes).await?;
        file.set_len(offset + bytes.len() as u64).await?;
        file.flush().await
    }
}

#[async_trait]
impl AuditSink for DetectionLog {
    async fn append(&self, record: DetectionRecord) -> Result<()> {
        let line = serde_json::to_vec(&record)?;
        let mut tail = self.tail.lock().await;

        let mut entry = Vec::with_capacity(line.len() + 6);
        if tail.count > 0 {
            entry.push(b',');
        }
        entry.extend_from_slice(b"\n  ");
        entry.extend(line);
        let written = entry.len() as u64;
        entry.extend_from_slice(ARRAY_CLOSE);

        if let Err(e) = self.write_at(tail.offset, &entry).await {
            // Put the closing bracket back where the last good record ends
            if let Err(repair) = self.write_at(tail.offset, ARRAY_CLOSE).await {
                warn!(path = %self.path.display(), error = %repair, "Detection log left unterminated");
            }
            return Err(persistence_error(&self.path, e));
        }

        tail.offset += written;
        tail.count += 1;
        debug!(url = %record.url, records = tail.count, "Detection logged");
        Ok(())
    }
}
