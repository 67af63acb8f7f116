//! Durable audit log writing newline-delimited JSON.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::trace;

use crate::entry::AuditEntry;
use crate::error::{JournalError, JournalResult};

/// Append-only sink for audit entries.
///
/// Implementations must preserve append order and never rewrite an entry.
#[async_trait]
pub trait AuditLog: Send + Sync + std::fmt::Debug {
    /// Appends an entry after every previously appended one.
    async fn append(&self, entry: &AuditEntry) -> JournalResult<()>;

    /// Returns all entries, oldest first.
    async fn read_all(&self) -> JournalResult<Vec<AuditEntry>>;
}

/// File-backed audit log. One JSON document per line.
#[derive(Debug)]
pub struct FileAuditLog {
    path: PathBuf,
    file: Mutex<tokio::fs::File>,
}

impl FileAuditLog {
    /// Opens (or creates) the log at `path`. Existing entries are kept.
    ///
    /// # Errors
    ///
    /// Propagates I/O errors encountered while preparing the file.
    pub async fn open(path: impl Into<PathBuf>) -> JournalResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;

        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// Returns the underlying path of the log file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl AuditLog for FileAuditLog {
    async fn append(&self, entry: &AuditEntry) -> JournalResult<()> {
        let mut line = serde_json::to_vec(entry)?;
        line.push(b'\n');
        let mut guard = self.file.lock().await;
        guard.write_all(&line).await?;
        guard.flush().await?;
        trace!(path = %self.path.display(), action = entry.action(), "audit entry appended");
        Ok(())
    }

    async fn read_all(&self) -> JournalResult<Vec<AuditEntry>> {
        // Holding the writer lock keeps a concurrent append from being read half-written.
        let _guard = self.file.lock().await;
        let data = fs::read(&self.path).await?;

        data.split(|byte| *byte == b'\n')
            .enumerate()
            .filter(|(_, chunk)| !chunk.is_empty())
            .map(|(index, chunk)| {
                serde_json::from_slice(chunk).map_err(|source| JournalError::Corrupt {
                    line: index + 1,
                    source,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use safeout_handlers::ExecutionResult;
    use serde_json::json;
    use uuid::Uuid;

    use super::*;
    use crate::entry::Outcome;

    fn temp_path() -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("safe-outputs-audit-{}.ndjson", Uuid::new_v4()));
        path
    }

    #[tokio::test]
    async fn append_and_read_back_in_order() {
        let path = temp_path();
        let log = FileAuditLog::open(&path).await.unwrap();

        log.append(&AuditEntry::accepted(
            "create-issue",
            json!({"type": "create-issue", "title": "one"}),
            ExecutionResult::ok().with_number(1),
        ))
        .await
        .unwrap();
        log.append(&AuditEntry::rejected(
            "create-issue",
            json!({"type": "create-issue", "title": "two"}),
            "Max count (1) exceeded for `create-issue`",
        ))
        .await
        .unwrap();

        let entries = log.read_all().await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].outcome(), Outcome::Accepted);
        assert_eq!(entries[1].outcome(), Outcome::Rejected);
        assert_eq!(entries[1].request()["title"], "two");

        let raw = std::fs::read_to_string(&path).unwrap();
        assert_eq!(raw.lines().count(), 2);

        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn reopening_keeps_existing_entries() {
        let path = temp_path();
        {
            let log = FileAuditLog::open(&path).await.unwrap();
            log.append(&AuditEntry::rejected("noop", json!({}), "Unknown type"))
                .await
                .unwrap();
        }

        let log = FileAuditLog::open(&path).await.unwrap();
        log.append(&AuditEntry::rejected("noop", json!({}), "Unknown type"))
            .await
            .unwrap();
        assert_eq!(log.read_all().await.unwrap().len(), 2);

        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn concurrent_appends_produce_whole_lines() {
        let path = temp_path();
        let log = Arc::new(FileAuditLog::open(&path).await.unwrap());

        let tasks: Vec<_> = (0..32)
            .map(|n| {
                let log = Arc::clone(&log);
                tokio::spawn(async move {
                    log.append(&AuditEntry::accepted(
                        "add-comment",
                        json!({"type": "add-comment", "body": format!("comment {n}")}),
                        ExecutionResult::ok(),
                    ))
                    .await
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(log.read_all().await.unwrap().len(), 32);
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn corrupt_lines_are_reported() {
        let path = temp_path();
        std::fs::write(&path, "not json\n").unwrap();
        let log = FileAuditLog::open(&path).await.unwrap();

        let err = log.read_all().await.unwrap_err();
        assert!(matches!(err, JournalError::Corrupt { line: 1, .. }));

        let _ = std::fs::remove_file(path);
    }
}
