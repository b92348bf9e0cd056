use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use tracing::{debug, info, warn};

use domain::action::{Action, ActionRepository, ActionStatistics, ActionStatus, NewAction, StatusChange};
use domain::{AuditEvent, DomainError, RequestContext};

use crate::audit::AuditRecorder;
use crate::device::DeviceRegistry;

/// Per-device command queue.
///
/// Devices pull their work; nothing here pushes, waits or retries. Every
/// ownership decision is delegated to the [`DeviceRegistry`].
pub struct ActionQueue {
    actions: Arc<dyn ActionRepository>,
    registry: Arc<DeviceRegistry>,
    audit: AuditRecorder,
}

impl ActionQueue {
    pub fn new(
        actions: Arc<dyn ActionRepository>,
        registry: Arc<DeviceRegistry>,
        audit: AuditRecorder,
    ) -> Self {
        Self {
            actions,
            registry,
            audit,
        }
    }

    /// Queues a new `pending` action for a device the caller owns.
    pub async fn enqueue(
        &self,
        ctx: &RequestContext,
        action: NewAction,
    ) -> Result<Action, DomainError> {
        action.validate()?;
        self.registry.authorize(action.device_id, ctx.user_id).await?;

        let created = self.actions.insert(&action, ctx.now).await?;
        info!(
            action_id = created.id,
            device_id = created.device_id,
            action_type = %created.action_type,
            "Action enqueued"
        );

        self.audit
            .record(AuditEvent::device_action(
                ctx,
                created.device_id,
                &created.action_type,
                created.action_data.as_ref(),
            ))
            .await;
        Ok(created)
    }

    /// Fetches an action whose device belongs to the caller.
    pub async fn get_by_id(&self, ctx: &RequestContext, action_id: i64) -> Result<Action, DomainError> {
        let not_found = || DomainError::NotFound(format!("Action {action_id} not found"));

        let action = self
            .actions
            .find_by_id(action_id)
            .await?
            .ok_or_else(not_found)?;
        if !self.registry.is_owned_by(action.device_id, ctx.user_id).await? {
            return Err(not_found());
        }
        Ok(action)
    }

    /// Pending actions across all of the caller's devices, oldest first.
    pub async fn list_pending_for_user(&self, ctx: &RequestContext) -> Result<Vec<Action>, DomainError> {
        let device_ids = self.registry.owned_device_ids(ctx.user_id).await?;
        if device_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.actions.find_pending_for_devices(&device_ids).await
    }

    /// Most recent actions of one device.
    ///
    /// Performs no ownership check; the caller decides which trust
    /// boundary applies.
    pub async fn list_for_device(&self, device_id: i64, limit: i64) -> Result<Vec<Action>, DomainError> {
        if limit < 1 {
            return Err(DomainError::InvalidInput(format!(
                "limit must be at least 1, got {limit}"
            )));
        }
        self.actions.find_by_device(device_id, limit).await
    }

    /// Moves an action along its lifecycle.
    ///
    /// Fails with `Conflict` when the transition has no edge, including any
    /// attempt to leave a terminal state, and when a concurrent update
    /// changed the status first.
    pub async fn update_status(
        &self,
        ctx: &RequestContext,
        action_id: i64,
        status: &str,
        response_data: Option<Value>,
        error_message: Option<String>,
    ) -> Result<Action, DomainError> {
        let next = ActionStatus::parse(status)?;
        let current = self.get_by_id(ctx, action_id).await?;
        current.status.ensure_transition(next)?;

        let change = StatusChange::new(next, ctx.now)
            .with_response(response_data)
            .with_error(error_message);

        let updated = self
            .actions
            .update_status(action_id, current.status, &change)
            .await?
            .ok_or_else(|| {
                warn!(action_id, expected = %current.status, "Action status changed concurrently");
                DomainError::Conflict(format!(
                    "Action {action_id} was modified concurrently"
                ))
            })?;
        info!(action_id, from = %current.status, to = %updated.status, "Action status updated");

        self.audit
            .record(AuditEvent::action_status_updated(ctx, &updated))
            .await;
        Ok(updated)
    }

    /// Per-status counts of the caller's actions created in the last `days`.
    pub async fn statistics(
        &self,
        ctx: &RequestContext,
        days: i64,
    ) -> Result<ActionStatistics, DomainError> {
        let since = window_start(ctx.now, days)?;
        let device_ids = self.registry.owned_device_ids(ctx.user_id).await?;
        if device_ids.is_empty() {
            return Ok(ActionStatistics::default());
        }
        self.actions.statistics(&device_ids, since).await
    }

    /// Deletes terminal actions older than the retention window.
    pub async fn purge_older_than(
        &self,
        retention_days: i64,
        now: DateTime<Utc>,
    ) -> Result<u64, DomainError> {
        let cutoff = window_start(now, retention_days)?;
        let removed = self.actions.purge_terminal_before(cutoff).await?;
        debug!(removed, %cutoff, "Purged terminal actions");
        Ok(removed)
    }
}

/// Start of a window of whole days ending at `now`.
pub(crate) fn window_start(now: DateTime<Utc>, days: i64) -> Result<DateTime<Utc>, DomainError> {
    if days < 1 {
        return Err(DomainError::InvalidInput(format!(
            "window must be at least 1 day, got {days}"
        )));
    }
    Duration::try_days(days)
        .and_then(|d| now.checked_sub_signed(d))
        .ok_or_else(|| DomainError::InvalidInput(format!("window of {days} days is out of range")))
}
