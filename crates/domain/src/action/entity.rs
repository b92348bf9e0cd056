use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ActionStatus;
use crate::error::{DomainError, Result};
use crate::validation::ensure_max_chars;

const MAX_ACTION_TYPE_LEN: usize = 100;

/// A command queued for one device.
///
/// The owning user is never stored on the action; it is always derived
/// through `device_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub id: i64,
    pub device_id: i64,
    pub action_type: String,
    pub action_data: Option<Value>,
    pub status: ActionStatus,
    pub created_at: DateTime<Utc>,
    pub executed_at: Option<DateTime<Utc>>,
    pub response_data: Option<Value>,
    pub error_message: Option<String>,
}

impl Action {
    /// Applies a status change: status and `executed_at` always,
    /// response and error only when provided.
    pub fn apply(&mut self, change: &StatusChange) {
        self.status = change.status;
        self.executed_at = Some(change.executed_at);
        if let Some(response) = &change.response_data {
            self.response_data = Some(response.clone());
        }
        if let Some(error) = &change.error_message {
            self.error_message = Some(error.clone());
        }
    }
}

/// Request to enqueue an action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAction {
    pub device_id: i64,
    pub action_type: String,
    #[serde(default)]
    pub action_data: Option<Value>,
}

impl NewAction {
    pub fn new(device_id: i64, action_type: impl Into<String>, action_data: Option<Value>) -> Self {
        Self {
            device_id,
            action_type: action_type.into(),
            action_data,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.action_type.trim().is_empty() {
            return Err(DomainError::InvalidInput(
                "action_type is required".to_string(),
            ));
        }
        ensure_max_chars("action_type", &self.action_type, MAX_ACTION_TYPE_LEN)
    }

    pub fn into_action(self, id: i64, now: DateTime<Utc>) -> Action {
        Action {
            id,
            device_id: self.device_id,
            action_type: self.action_type,
            action_data: self.action_data,
            status: ActionStatus::Pending,
            created_at: now,
            executed_at: None,
            response_data: None,
            error_message: None,
        }
    }
}

/// The columns written by a status transition.
///
/// Only the optional fields that are set get written, so a transition
/// without a response keeps whatever response was stored before.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusChange {
    pub status: ActionStatus,
    pub executed_at: DateTime<Utc>,
    pub response_data: Option<Value>,
    pub error_message: Option<String>,
}

impl StatusChange {
    pub fn new(status: ActionStatus, executed_at: DateTime<Utc>) -> Self {
        Self {
            status,
            executed_at,
            response_data: None,
            error_message: None,
        }
    }

    pub fn with_response(mut self, response_data: Option<Value>) -> Self {
        self.response_data = response_data;
        self
    }

    pub fn with_error(mut self, error_message: Option<String>) -> Self {
        self.error_message = error_message;
        self
    }
}

/// Per-status action counts for a window
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionStatistics {
    pub total: i64,
    pub pending: i64,
    pub sent: i64,
    pub completed: i64,
    pub failed: i64,
}

impl ActionStatistics {
    pub fn tally<'a>(actions: impl IntoIterator<Item = &'a Action>) -> Self {
        let mut stats = Self::default();
        for action in actions {
            stats.total += 1;
            match action.status {
                ActionStatus::Pending => stats.pending += 1,
                ActionStatus::Sent => stats.sent += 1,
                ActionStatus::Completed => stats.completed += 1,
                ActionStatus::Failed => stats.failed += 1,
            }
        }
        stats
    }
}
