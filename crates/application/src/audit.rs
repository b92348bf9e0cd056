use std::sync::Arc;

use domain::{AuditEntry, AuditEvent, DomainError, RequestContext};
use domain::audit::AuditSink;
use tracing::{debug, warn};

/// Fire-and-forget front of the audit sink.
///
/// A failing sink is logged and otherwise ignored so that the primary
/// operation keeps its result.
#[derive(Clone)]
pub struct AuditRecorder {
    sink: Arc<dyn AuditSink>,
}

impl AuditRecorder {
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self { sink }
    }

    pub fn sink(&self) -> &Arc<dyn AuditSink> {
        &self.sink
    }

    pub async fn record(&self, event: AuditEvent) {
        let action = event.action.clone();
        match self.sink.record(event).await {
            Ok(()) => debug!(audit_action = %action, "Audit event recorded"),
            Err(e) => warn!(audit_action = %action, error = %e, "Failed to record audit event"),
        }
    }

    /// The caller's own audit entries, newest first.
    pub async fn list_for_user(
        &self,
        ctx: &RequestContext,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<AuditEntry>, DomainError> {
        if limit < 1 || offset < 0 {
            return Err(DomainError::InvalidInput(format!(
                "invalid page: limit {limit}, offset {offset}"
            )));
        }
        self.sink.find_by_user(ctx.user_id, limit, offset).await
    }
}
