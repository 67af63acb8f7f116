//! In-process audit log for tests and embedding.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::entry::AuditEntry;
use crate::error::JournalResult;
use crate::journal::AuditLog;

/// Audit log that keeps entries in memory for the life of the process.
#[derive(Debug, Default)]
pub struct MemoryAuditLog {
    entries: RwLock<Vec<AuditEntry>>,
}

impl MemoryAuditLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries recorded so far.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns `true` when nothing has been recorded.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl AuditLog for MemoryAuditLog {
    async fn append(&self, entry: &AuditEntry) -> JournalResult<()> {
        self.entries.write().await.push(entry.clone());
        Ok(())
    }

    async fn read_all(&self) -> JournalResult<Vec<AuditEntry>> {
        Ok(self.entries.read().await.clone())
    }
}
