use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::DomainError;
use domain::action::{
    Action, ActionRepository, ActionStatistics, ActionStatus, NewAction, StatusChange,
};
use tokio::sync::RwLock;

#[derive(Default)]
struct Table {
    next_id: i64,
    rows: BTreeMap<i64, Action>,
}

#[derive(Default)]
pub struct InMemoryActionRepository {
    table: RwLock<Table>,
}

impl InMemoryActionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every action queued for a deleted device.
    pub(crate) async fn remove_device(&self, device_id: i64) {
        self.table.write().await.rows.retain(|_, a| a.device_id != device_id);
    }
}

#[async_trait]
impl ActionRepository for InMemoryActionRepository {
    async fn insert(&self, action: &NewAction, now: DateTime<Utc>) -> Result<Action, DomainError> {
        let mut table = self.table.write().await;
        table.next_id += 1;
        let created = action.clone().into_action(table.next_id, now);
        table.rows.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Action>, DomainError> {
        Ok(self.table.read().await.rows.get(&id).cloned())
    }

    async fn find_pending_for_devices(
        &self,
        device_ids: &[i64],
    ) -> Result<Vec<Action>, DomainError> {
        let table = self.table.read().await;
        let mut pending: Vec<Action> = table
            .rows
            .values()
            .filter(|a| a.status == ActionStatus::Pending && device_ids.contains(&a.device_id))
            .cloned()
            .collect();
        pending.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(pending)
    }

    async fn find_by_device(&self, device_id: i64, limit: i64) -> Result<Vec<Action>, DomainError> {
        let table = self.table.read().await;
        let mut actions: Vec<Action> = table
            .rows
            .values()
            .filter(|a| a.device_id == device_id)
            .cloned()
            .collect();
        actions.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        actions.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(actions)
    }

    async fn update_status(
        &self,
        id: i64,
        expected: ActionStatus,
        change: &StatusChange,
    ) -> Result<Option<Action>, DomainError> {
        let mut table = self.table.write().await;
        match table.rows.get_mut(&id) {
            Some(action) if action.status == expected => {
                action.apply(change);
                Ok(Some(action.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn statistics(
        &self,
        device_ids: &[i64],
        since: DateTime<Utc>,
    ) -> Result<ActionStatistics, DomainError> {
        let table = self.table.read().await;
        Ok(ActionStatistics::tally(table.rows.values().filter(|a| {
            device_ids.contains(&a.device_id) && a.created_at >= since
        })))
    }

    async fn purge_terminal_before(&self, cutoff: DateTime<Utc>) -> Result<u64, DomainError> {
        let mut table = self.table.write().await;
        let before = table.rows.len();
        table
            .rows
            .retain(|_, a| !(a.status.is_terminal() && a.created_at < cutoff));
        Ok((before - table.rows.len()) as u64)
    }
}
