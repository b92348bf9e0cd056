#![allow(dead_code)]

use std::sync::Arc;

use application::{ActionQueue, AuditRecorder, DeviceRegistry, TelemetryService};
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use domain::audit::AuditSink;
use domain::device::{Device, MacAddress, NewDevice};
use domain::{AuditEntry, AuditEvent, DomainError, RequestContext, UserId};
use infrastructure::{
    InMemoryActionRepository, InMemoryAuditSink, InMemoryDeviceRepository,
    InMemoryTelemetryRepository,
};

pub const ALICE: i64 = 1;
pub const BOB: i64 = 2;

/// Every use case wired to in-memory stores
pub struct Hub {
    pub devices: Arc<InMemoryDeviceRepository>,
    pub actions: Arc<InMemoryActionRepository>,
    pub readings: Arc<InMemoryTelemetryRepository>,
    pub audit_log: Arc<InMemoryAuditSink>,
    pub registry: Arc<DeviceRegistry>,
    pub queue: ActionQueue,
    pub telemetry: TelemetryService,
}

impl Hub {
    pub fn new() -> Self {
        Self::with_audit_sink(Arc::new(InMemoryAuditSink::new()))
    }

    fn with_audit_sink(audit_log: Arc<InMemoryAuditSink>) -> Self {
        Self::build(audit_log.clone(), AuditRecorder::new(audit_log))
    }

    /// Same wiring, but every audit write fails
    pub fn with_failing_audit() -> Self {
        Self::build(
            Arc::new(InMemoryAuditSink::new()),
            AuditRecorder::new(Arc::new(FailingAuditSink)),
        )
    }

    fn build(audit_log: Arc<InMemoryAuditSink>, audit: AuditRecorder) -> Self {
        let actions = Arc::new(InMemoryActionRepository::new());
        let readings = Arc::new(InMemoryTelemetryRepository::new());
        let devices = Arc::new(InMemoryDeviceRepository::with_cascade(
            actions.clone(),
            readings.clone(),
        ));
        let registry = Arc::new(DeviceRegistry::new(devices.clone(), audit.clone()));

        Self {
            queue: ActionQueue::new(actions.clone(), registry.clone(), audit.clone()),
            telemetry: TelemetryService::new(readings.clone(), registry.clone(), audit),
            devices,
            actions,
            readings,
            audit_log,
            registry,
        }
    }

    pub async fn add_device(&self, owner: i64, n: u8) -> Device {
        let mac = MacAddress::new(format!("AA:BB:CC:DD:EE:{n:02X}")).unwrap();
        self.registry
            .register(&ctx(owner), NewDevice::new(format!("Device {n}"), format!("esp-{n}"), mac))
            .await
            .unwrap()
    }

    pub async fn audit_actions(&self) -> Vec<String> {
        self.audit_log
            .entries()
            .await
            .into_iter()
            .map(|e| e.action)
            .collect()
    }
}

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 5, 9, 0, 0).unwrap()
}

pub fn ctx(user: i64) -> RequestContext {
    RequestContext::new(UserId::new(user), base_time())
}

/// Context `minutes` after the base time
pub fn ctx_at(user: i64, minutes: i64) -> RequestContext {
    RequestContext::new(UserId::new(user), base_time() + Duration::minutes(minutes))
}

pub struct FailingAuditSink;

#[async_trait]
impl AuditSink for FailingAuditSink {
    async fn record(&self, _event: AuditEvent) -> Result<(), DomainError> {
        Err(DomainError::StoreUnavailable("audit store down".into()))
    }

    async fn find_by_user(
        &self,
        _user_id: UserId,
        _limit: i64,
        _offset: i64,
    ) -> Result<Vec<AuditEntry>, DomainError> {
        Err(DomainError::StoreUnavailable("audit store down".into()))
    }

    async fn purge_before(&self, _cutoff: DateTime<Utc>) -> Result<u64, DomainError> {
        Err(DomainError::StoreUnavailable("audit store down".into()))
    }
}
