use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::DomainError;
use domain::action::{
    Action, ActionRepository, ActionStatistics, ActionStatus, NewAction, StatusChange,
};
use serde_json::Value as JsonValue;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use super::store_error;

const ACTION_COLUMNS: &str = "id, device_id, action_type, action_data, status, created_at, \
     executed_at, response_data, error_message";

#[derive(FromRow)]
struct ActionRow {
    id: i64,
    device_id: i64,
    action_type: String,
    action_data: Option<JsonValue>,
    status: String,
    created_at: DateTime<Utc>,
    executed_at: Option<DateTime<Utc>>,
    response_data: Option<JsonValue>,
    error_message: Option<String>,
}

impl TryFrom<ActionRow> for Action {
    type Error = DomainError;

    fn try_from(row: ActionRow) -> Result<Self, Self::Error> {
        let status = ActionStatus::parse(&row.status).map_err(|e| {
            DomainError::StoreUnavailable(format!("Stored action {} is invalid: {}", row.id, e))
        })?;
        Ok(Action {
            id: row.id,
            device_id: row.device_id,
            action_type: row.action_type,
            action_data: row.action_data,
            status,
            created_at: row.created_at,
            executed_at: row.executed_at,
            response_data: row.response_data,
            error_message: row.error_message,
        })
    }
}

fn into_actions(rows: Vec<ActionRow>) -> Result<Vec<Action>, DomainError> {
    rows.into_iter().map(Action::try_from).collect()
}

/// PostgreSQL implementation of ActionRepository (`device_actions` table)
pub struct PostgresActionRepository {
    pool: PgPool,
}

impl PostgresActionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ActionRepository for PostgresActionRepository {
    async fn insert(&self, action: &NewAction, now: DateTime<Utc>) -> Result<Action, DomainError> {
        let sql = format!(
            "INSERT INTO device_actions (device_id, action_type, action_data, status, created_at) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {ACTION_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ActionRow>(&sql)
            .bind(action.device_id)
            .bind(&action.action_type)
            .bind(&action.action_data)
            .bind(ActionStatus::Pending.as_str())
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .map_err(store_error)?;

        row.try_into()
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Action>, DomainError> {
        let sql = format!("SELECT {ACTION_COLUMNS} FROM device_actions WHERE id = $1");
        let row = sqlx::query_as::<_, ActionRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;

        row.map(Action::try_from).transpose()
    }

    async fn find_pending_for_devices(
        &self,
        device_ids: &[i64],
    ) -> Result<Vec<Action>, DomainError> {
        let sql = format!(
            "SELECT {ACTION_COLUMNS} FROM device_actions \
             WHERE device_id = ANY($1) AND status = $2 \
             ORDER BY created_at ASC, id ASC"
        );
        let rows = sqlx::query_as::<_, ActionRow>(&sql)
            .bind(device_ids)
            .bind(ActionStatus::Pending.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(store_error)?;

        into_actions(rows)
    }

    async fn find_by_device(&self, device_id: i64, limit: i64) -> Result<Vec<Action>, DomainError> {
        let sql = format!(
            "SELECT {ACTION_COLUMNS} FROM device_actions WHERE device_id = $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2"
        );
        let rows = sqlx::query_as::<_, ActionRow>(&sql)
            .bind(device_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(store_error)?;

        into_actions(rows)
    }

    async fn update_status(
        &self,
        id: i64,
        expected: ActionStatus,
        change: &StatusChange,
    ) -> Result<Option<Action>, DomainError> {
        // Optional columns are only written when provided
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE device_actions SET status = ");
        qb.push_bind(change.status.as_str());
        qb.push(", executed_at = ");
        qb.push_bind(change.executed_at);
        if let Some(response) = &change.response_data {
            qb.push(", response_data = ");
            qb.push_bind(response.clone());
        }
        if let Some(error) = &change.error_message {
            qb.push(", error_message = ");
            qb.push_bind(error.clone());
        }
        qb.push(" WHERE id = ");
        qb.push_bind(id);
        qb.push(" AND status = ");
        qb.push_bind(expected.as_str());
        qb.push(" RETURNING ");
        qb.push(ACTION_COLUMNS);

        let row = qb
            .build_query_as::<ActionRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;

        row.map(Action::try_from).transpose()
    }

    async fn statistics(
        &self,
        device_ids: &[i64],
        since: DateTime<Utc>,
    ) -> Result<ActionStatistics, DomainError> {
        let (total, pending, sent, completed, failed): (i64, i64, i64, i64, i64) =
            sqlx::query_as(
                "SELECT COUNT(*), \
                        COUNT(*) FILTER (WHERE status = 'pending'), \
                        COUNT(*) FILTER (WHERE status = 'sent'), \
                        COUNT(*) FILTER (WHERE status = 'completed'), \
                        COUNT(*) FILTER (WHERE status = 'failed') \
                 FROM device_actions WHERE device_id = ANY($1) AND created_at >= $2",
            )
            .bind(device_ids)
            .bind(since)
            .fetch_one(&self.pool)
            .await
            .map_err(store_error)?;

        Ok(ActionStatistics {
            total,
            pending,
            sent,
            completed,
            failed,
        })
    }

    async fn purge_terminal_before(&self, cutoff: DateTime<Utc>) -> Result<u64, DomainError> {
        let result = sqlx::query(
            "DELETE FROM device_actions WHERE status IN ($1, $2) AND created_at < $3",
        )
        .bind(ActionStatus::Completed.as_str())
        .bind(ActionStatus::Failed.as_str())
        .bind(cutoff)
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(result.rows_affected())
    }
}
