use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::audit::AuditSink;
use domain::{AuditEntry, AuditEvent, DomainError, UserId};
use serde_json::Value as JsonValue;
use sqlx::{FromRow, PgPool};

use super::store_error;

#[derive(FromRow)]
struct AuditRow {
    id: i64,
    user_id: Option<i64>,
    action: String,
    resource_type: Option<String>,
    resource_id: Option<String>,
    ip_address: Option<String>,
    user_agent: Option<String>,
    details: Option<JsonValue>,
    created_at: DateTime<Utc>,
}

/// Audit sink writing to the `system_logs` table
pub struct PostgresAuditSink {
    pool: PgPool,
}

impl PostgresAuditSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditSink for PostgresAuditSink {
    async fn record(&self, event: AuditEvent) -> Result<(), DomainError> {
        sqlx::query(
            "INSERT INTO system_logs \
             (user_id, action, resource_type, resource_id, ip_address, user_agent, details, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(event.user_id.map(|u| u.value()))
        .bind(&event.action)
        .bind(&event.resource_type)
        .bind(&event.resource_id)
        .bind(&event.ip_address)
        .bind(&event.user_agent)
        .bind(&event.details)
        .bind(event.occurred_at)
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(())
    }

    async fn find_by_user(
        &self,
        user_id: UserId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<AuditEntry>, DomainError> {
        let rows = sqlx::query_as::<_, AuditRow>(
            "SELECT id, user_id, action, resource_type, resource_id, ip_address, user_agent, \
                    details, created_at \
             FROM system_logs WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3",
        )
        .bind(user_id.value())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(rows
            .into_iter()
            .map(|row| AuditEntry {
                id: row.id,
                user_id: row.user_id.map(UserId::new),
                action: row.action,
                resource_type: row.resource_type,
                resource_id: row.resource_id,
                ip_address: row.ip_address,
                user_agent: row.user_agent,
                details: row.details,
                created_at: row.created_at,
            })
            .collect())
    }

    async fn purge_before(&self, cutoff: DateTime<Utc>) -> Result<u64, DomainError> {
        let result = sqlx::query("DELETE FROM system_logs WHERE created_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(store_error)?;

        Ok(result.rows_affected())
    }
}
