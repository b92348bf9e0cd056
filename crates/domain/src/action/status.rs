use crate::error::{DomainError, Result};
use serde::{Deserialize, Serialize};

/// Lifecycle of a queued device action
///
/// ```text
/// pending --> sent --> completed
///    |          \----> failed
///    +--> completed
///    +--> failed
/// ```
///
/// `completed` and `failed` are terminal: no transition leaves them,
/// including re-entering the same terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionStatus {
    Pending,
    Sent,
    Completed,
    Failed,
}

impl ActionStatus {
    pub const ALL: [ActionStatus; 4] = [Self::Pending, Self::Sent, Self::Completed, Self::Failed];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Sent => "sent",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Parses one of the four legal status names.
    pub fn parse(value: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|s| s.as_str() == value)
            .ok_or_else(|| {
                DomainError::InvalidInput(format!(
                    "Invalid status '{value}'. Must be one of: pending, sent, completed, failed"
                ))
            })
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    pub fn can_transition_to(&self, next: ActionStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Sent)
                | (Self::Pending, Self::Completed)
                | (Self::Pending, Self::Failed)
                | (Self::Sent, Self::Completed)
                | (Self::Sent, Self::Failed)
        )
    }

    /// Checks a requested transition, failing with `Conflict` when the
    /// lifecycle has no such edge.
    pub fn ensure_transition(&self, next: ActionStatus) -> Result<()> {
        if self.can_transition_to(next) {
            return Ok(());
        }
        let reason = if self.is_terminal() {
            format!("action is already {self} and cannot change to {next}")
        } else {
            format!("cannot change action from {self} to {next}")
        };
        Err(DomainError::Conflict(reason))
    }
}

impl Default for ActionStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl std::fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
