use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::audit::AuditSink;
use domain::{AuditEntry, AuditEvent, DomainError, UserId};
use tokio::sync::RwLock;

#[derive(Default)]
struct Log {
    next_id: i64,
    entries: Vec<AuditEntry>,
}

#[derive(Default)]
pub struct InMemoryAuditSink {
    log: RwLock<Log>,
}

impl InMemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far, in recording order
    pub async fn entries(&self) -> Vec<AuditEntry> {
        self.log.read().await.entries.clone()
    }
}

#[async_trait]
impl AuditSink for InMemoryAuditSink {
    async fn record(&self, event: AuditEvent) -> Result<(), DomainError> {
        let mut log = self.log.write().await;
        log.next_id += 1;
        let entry = event.into_entry(log.next_id);
        log.entries.push(entry);
        Ok(())
    }

    async fn find_by_user(
        &self,
        user_id: UserId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<AuditEntry>, DomainError> {
        let log = self.log.read().await;
        Ok(log
            .entries
            .iter()
            .rev()
            .filter(|e| e.user_id == Some(user_id))
            .skip(usize::try_from(offset).unwrap_or(0))
            .take(usize::try_from(limit).unwrap_or(0))
            .cloned()
            .collect())
    }

    async fn purge_before(&self, cutoff: DateTime<Utc>) -> Result<u64, DomainError> {
        let mut log = self.log.write().await;
        let before = log.entries.len();
        log.entries.retain(|e| e.created_at >= cutoff);
        Ok((before - log.entries.len()) as u64)
    }
}
