use std::sync::Arc;

use application::{
    ActionQueue, AuditRecorder, DeviceRegistry, RetentionPolicy, RetentionService,
    TelemetryService,
};
use domain::action::ActionRepository;
use domain::audit::AuditSink;
use domain::auth::Authenticator;
use domain::device::DeviceRepository;
use domain::telemetry::TelemetryRepository;
use infrastructure::{
    InMemoryActionRepository, InMemoryAuditSink, InMemoryDeviceRepository,
    InMemoryTelemetryRepository, PostgresActionRepository, PostgresAuditSink,
    PostgresTelemetryRepository, SeaOrmDeviceRepository,
};
use sea_orm::SqlxPostgresConnector;
use sqlx::PgPool;

/// The four stores every use case is built on
pub struct Stores {
    pub devices: Arc<dyn DeviceRepository>,
    pub actions: Arc<dyn ActionRepository>,
    pub readings: Arc<dyn TelemetryRepository>,
    pub audit: Arc<dyn AuditSink>,
}

impl Stores {
    /// Devices through sea-orm, everything else through sqlx, one shared pool.
    pub fn postgres(pool: PgPool) -> Self {
        let orm = SqlxPostgresConnector::from_sqlx_postgres_pool(pool.clone());
        Self {
            devices: Arc::new(SeaOrmDeviceRepository::new(orm)),
            actions: Arc::new(PostgresActionRepository::new(pool.clone())),
            readings: Arc::new(PostgresTelemetryRepository::new(pool.clone())),
            audit: Arc::new(PostgresAuditSink::new(pool)),
        }
    }

    /// Process-local stores, lost on exit
    pub fn in_memory() -> Self {
        let actions = Arc::new(InMemoryActionRepository::new());
        let readings = Arc::new(InMemoryTelemetryRepository::new());
        Self {
            devices: Arc::new(InMemoryDeviceRepository::with_cascade(
                actions.clone(),
                readings.clone(),
            )),
            actions,
            readings,
            audit: Arc::new(InMemoryAuditSink::new()),
        }
    }
}

pub struct AppState {
    pub registry: Arc<DeviceRegistry>,
    pub actions: Arc<ActionQueue>,
    pub telemetry: Arc<TelemetryService>,
    pub retention: Arc<RetentionService>,
    pub audit: AuditRecorder,
    pub authenticator: Arc<dyn Authenticator>,
}

impl AppState {
    pub fn new(
        stores: Stores,
        authenticator: Arc<dyn Authenticator>,
        policy: RetentionPolicy,
    ) -> Self {
        let audit = AuditRecorder::new(stores.audit);
        let registry = Arc::new(DeviceRegistry::new(stores.devices, audit.clone()));
        let actions = Arc::new(ActionQueue::new(
            stores.actions,
            registry.clone(),
            audit.clone(),
        ));
        let telemetry = Arc::new(TelemetryService::new(
            stores.readings,
            registry.clone(),
            audit.clone(),
        ));
        let retention = Arc::new(RetentionService::new(
            actions.clone(),
            telemetry.clone(),
            audit.clone(),
            policy,
        ));

        Self {
            registry,
            actions,
            telemetry,
            retention,
            audit,
            authenticator,
        }
    }
}
