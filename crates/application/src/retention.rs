use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use tracing::info;

use domain::{AuditEvent, DomainError};

use crate::action::{ActionQueue, window_start};
use crate::audit::AuditRecorder;
use crate::telemetry::TelemetryService;

/// Retention windows in days
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    pub action_days: i64,
    pub telemetry_days: i64,
    pub audit_days: i64,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            action_days: 30,
            telemetry_days: 90,
            audit_days: 365,
        }
    }
}

/// Rows removed by one purge run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PurgeReport {
    pub actions: u64,
    pub readings: u64,
    pub audit_entries: u64,
}

/// Runs the age-based deletes of every store.
///
/// Only terminal actions are eligible; readings and audit entries are
/// removed purely by age.
pub struct RetentionService {
    actions: Arc<ActionQueue>,
    telemetry: Arc<TelemetryService>,
    audit: AuditRecorder,
    policy: RetentionPolicy,
}

impl RetentionService {
    pub fn new(
        actions: Arc<ActionQueue>,
        telemetry: Arc<TelemetryService>,
        audit: AuditRecorder,
        policy: RetentionPolicy,
    ) -> Self {
        Self {
            actions,
            telemetry,
            audit,
            policy,
        }
    }

    pub fn policy(&self) -> RetentionPolicy {
        self.policy
    }

    pub async fn run(&self, now: DateTime<Utc>) -> Result<PurgeReport, DomainError> {
        let audit_cutoff = window_start(now, self.policy.audit_days)?;

        let report = PurgeReport {
            actions: self
                .actions
                .purge_older_than(self.policy.action_days, now)
                .await?,
            readings: self
                .telemetry
                .purge_older_than(self.policy.telemetry_days, now)
                .await?,
            audit_entries: self.audit.sink().purge_before(audit_cutoff).await?,
        };
        info!(
            actions = report.actions,
            readings = report.readings,
            audit_entries = report.audit_entries,
            "Retention purge finished"
        );

        self.audit
            .record(AuditEvent::retention_purged(
                now,
                json!({
                    "actions": report.actions,
                    "readings": report.readings,
                    "audit_entries": report.audit_entries,
                    "policy_days": {
                        "actions": self.policy.action_days,
                        "telemetry": self.policy.telemetry_days,
                        "audit": self.policy.audit_days,
                    },
                }),
            ))
            .await;
        Ok(report)
    }
}
