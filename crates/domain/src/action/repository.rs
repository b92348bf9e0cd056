use super::{Action, ActionStatistics, ActionStatus, NewAction, StatusChange};
use crate::DomainError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Repository interface for the action queue
#[async_trait]
pub trait ActionRepository: Send + Sync {
    /// Insert with status `pending` and `created_at = now`
    async fn insert(&self, action: &NewAction, now: DateTime<Utc>) -> Result<Action, DomainError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Action>, DomainError>;

    /// Pending actions of the given devices, oldest created first
    async fn find_pending_for_devices(&self, device_ids: &[i64])
    -> Result<Vec<Action>, DomainError>;

    /// Most recent actions of one device, newest first
    async fn find_by_device(&self, device_id: i64, limit: i64) -> Result<Vec<Action>, DomainError>;

    /// Compare-and-set status update.
    ///
    /// Writes `change` only if the stored status still equals `expected`;
    /// returns `None` when it does not (or the row is gone).
    async fn update_status(
        &self,
        id: i64,
        expected: ActionStatus,
        change: &StatusChange,
    ) -> Result<Option<Action>, DomainError>;

    /// Counts of actions of the given devices created at or after `since`
    async fn statistics(
        &self,
        device_ids: &[i64],
        since: DateTime<Utc>,
    ) -> Result<ActionStatistics, DomainError>;

    /// Delete terminal actions created before `cutoff`; returns rows removed
    async fn purge_terminal_before(&self, cutoff: DateTime<Utc>) -> Result<u64, DomainError>;
}
