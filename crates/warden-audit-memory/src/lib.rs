//! In-memory audit log implementation.
//!
//! This implementation is suitable for:
//! - Single process deployments
//! - Development and testing
//! - Embedding the engine in a CLI
//!
//! Entries live only as long as the process. For durable auditing, implement
//! `AuditLog` over a database.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use warden_audit::{AuditEntry, AuditLog, AuditLogError, AuditLogFilter, AuditLogId};

/// Append-only, in-process audit log.
///
/// Each `record` takes the write lock for a single push, so concurrent writers
/// never interleave partial entries.
#[derive(Clone, Default)]
pub struct MemoryAuditLog {
    entries: Arc<RwLock<Vec<AuditEntry>>>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded entries.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Snapshot of all entries in insertion order.
    pub async fn entries(&self) -> Vec<AuditEntry> {
        self.entries.read().await.clone()
    }
}

#[async_trait]
impl AuditLog for MemoryAuditLog {
    async fn record(&self, entry: AuditEntry) -> Result<(), AuditLogError> {
        self.entries.write().await.push(entry);
        Ok(())
    }

    async fn query(&self, filter: AuditLogFilter) -> Result<Vec<AuditEntry>, AuditLogError> {
        let entries = self.entries.read().await;

        let mut matched: Vec<AuditEntry> = entries
            .iter()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        // Newest first; ids are v7 so they break timestamp ties in insertion order.
        matched.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.0.cmp(&a.id.0)));

        let offset = filter.offset.unwrap_or(0) as usize;
        let limit = filter.limit.map(|l| l as usize).unwrap_or(usize::MAX);
        Ok(matched.into_iter().skip(offset).take(limit).collect())
    }

    async fn get(&self, id: AuditLogId) -> Result<AuditEntry, AuditLogError> {
        self.entries
            .read()
            .await
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or(AuditLogError::NotFound(id))
    }

    async fn count(&self, filter: AuditLogFilter) -> Result<u64, AuditLogError> {
        let entries = self.entries.read().await;
        Ok(entries.iter().filter(|e| filter.matches(e)).count() as u64)
    }
}
