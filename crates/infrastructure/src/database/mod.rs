mod action_repository;
mod audit_sink;
mod device_repository;
mod telemetry_repository;

pub mod entities;

use domain::DomainError;
use sea_orm::{DbErr, RuntimeErr, SqlErr};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use crate::config::DatabaseConfig;

pub use action_repository::PostgresActionRepository;
pub use audit_sink::PostgresAuditSink;
pub use device_repository::SeaOrmDeviceRepository;
pub use telemetry_repository::PostgresTelemetryRepository;

/// Opens the shared connection pool.
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.url)
        .await?;
    info!(max_connections = config.max_connections, "Connected to PostgreSQL");
    Ok(pool)
}

// string_data_right_truncation: a value wider than its varchar column
const VALUE_TOO_LONG: &str = "22001";

fn is_value_too_long(db: &dyn sqlx::error::DatabaseError) -> bool {
    db.code().as_deref() == Some(VALUE_TOO_LONG)
}

/// Maps a sqlx failure onto the domain taxonomy.
pub(crate) fn store_error(e: sqlx::Error) -> DomainError {
    match &e {
        sqlx::Error::Database(db) if is_value_too_long(&**db) => {
            DomainError::InvalidInput(db.message().to_string())
        }
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            DomainError::Conflict(db.message().to_string())
        }
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            DomainError::NotFound(db.message().to_string())
        }
        _ => DomainError::StoreUnavailable(format!("Database error: {}", e)),
    }
}

pub(crate) fn orm_error(e: DbErr) -> DomainError {
    if let DbErr::Exec(RuntimeErr::SqlxError(sqlx::Error::Database(db)))
    | DbErr::Query(RuntimeErr::SqlxError(sqlx::Error::Database(db))) = &e
    {
        if is_value_too_long(&**db) {
            return DomainError::InvalidInput(db.message().to_string());
        }
    }
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(msg)) => DomainError::Conflict(msg),
        Some(SqlErr::ForeignKeyConstraintViolation(msg)) => DomainError::NotFound(msg),
        _ => DomainError::StoreUnavailable(format!("Database error: {}", e)),
    }
}
