use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::DomainError;
use crate::action::Action;
use crate::context::{RequestContext, UserId};

/// A recorded audit event as stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: i64,
    pub user_id: Option<UserId>,
    pub action: String,
    pub resource_type: Option<String>,
    pub resource_id: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub details: Option<Value>,
    pub created_at: DateTime<Utc>,
}

/// A state-changing event to be recorded.
///
/// `user_id` is `None` for system events such as retention purges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub user_id: Option<UserId>,
    pub action: String,
    pub resource_type: Option<String>,
    pub resource_id: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub details: Option<Value>,
    pub occurred_at: DateTime<Utc>,
}

impl AuditEvent {
    /// Event caused by the caller of `ctx`
    pub fn by(ctx: &RequestContext, action: impl Into<String>) -> Self {
        Self {
            user_id: Some(ctx.user_id),
            action: action.into(),
            resource_type: None,
            resource_id: None,
            ip_address: ctx.ip_address.clone(),
            user_agent: ctx.user_agent.clone(),
            details: None,
            occurred_at: ctx.now,
        }
    }

    /// Event without a human actor
    pub fn system(action: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            user_id: None,
            action: action.into(),
            resource_type: None,
            resource_id: None,
            ip_address: None,
            user_agent: None,
            details: None,
            occurred_at: now,
        }
    }

    pub fn on(mut self, resource_type: impl Into<String>, resource_id: impl ToString) -> Self {
        self.resource_type = Some(resource_type.into());
        self.resource_id = Some(resource_id.to_string());
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn device_action(
        ctx: &RequestContext,
        device_id: i64,
        action_type: &str,
        action_data: Option<&Value>,
    ) -> Self {
        Self::by(ctx, "device_action")
            .on("device", device_id)
            .with_details(json!({ "action_type": action_type, "details": action_data }))
    }

    pub fn action_status_updated(ctx: &RequestContext, action: &Action) -> Self {
        Self::by(ctx, "action_status_update")
            .on("action", action.id)
            .with_details(json!({ "device_id": action.device_id, "status": action.status }))
    }

    pub fn sensor_recorded(ctx: &RequestContext, device_id: i64, sensor_type: &str) -> Self {
        Self::by(ctx, "sensor_record")
            .on("device", device_id)
            .with_details(json!({ "sensor_type": sensor_type }))
    }

    pub fn sensor_batch_recorded(ctx: &RequestContext, saved: u64, device_ids: &[i64]) -> Self {
        Self::by(ctx, "sensor_batch_record")
            .with_details(json!({ "saved_count": saved, "device_ids": device_ids }))
    }

    pub fn device_created(ctx: &RequestContext, device_id: i64) -> Self {
        Self::by(ctx, "device_create").on("device", device_id)
    }

    pub fn device_updated(ctx: &RequestContext, device_id: i64) -> Self {
        Self::by(ctx, "device_update").on("device", device_id)
    }

    pub fn device_deleted(ctx: &RequestContext, device_id: i64) -> Self {
        Self::by(ctx, "device_delete").on("device", device_id)
    }

    pub fn retention_purged(now: DateTime<Utc>, details: Value) -> Self {
        Self::system("retention_purge", now).with_details(details)
    }

    pub fn into_entry(self, id: i64) -> AuditEntry {
        AuditEntry {
            id,
            user_id: self.user_id,
            action: self.action,
            resource_type: self.resource_type,
            resource_id: self.resource_id,
            ip_address: self.ip_address,
            user_agent: self.user_agent,
            details: self.details,
            created_at: self.occurred_at,
        }
    }
}

/// Destination for audit events.
///
/// Failures here must never fail the operation that produced the event;
/// callers log and continue.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, event: AuditEvent) -> Result<(), DomainError>;

    /// Entries of one user, newest first
    async fn find_by_user(
        &self,
        user_id: UserId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<AuditEntry>, DomainError>;

    async fn purge_before(&self, cutoff: DateTime<Utc>) -> Result<u64, DomainError>;
}
