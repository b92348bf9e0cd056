//! Infrastructure layer - Storage, authentication and configuration adapters

pub mod auth;
pub mod config;
pub mod database;
pub mod memory;

pub use auth::JwtAuthenticator;
pub use config::ServerConfig;
pub use database::{
    PostgresActionRepository, PostgresAuditSink, PostgresTelemetryRepository,
    SeaOrmDeviceRepository,
};
pub use memory::{
    InMemoryActionRepository, InMemoryAuditSink, InMemoryDeviceRepository,
    InMemoryTelemetryRepository,
};
