use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::device::{Device, DeviceRepository, NewDevice};
use domain::{DomainError, UserId};
use tokio::sync::RwLock;

use super::{InMemoryActionRepository, InMemoryTelemetryRepository};

#[derive(Default)]
struct Table {
    next_id: i64,
    rows: BTreeMap<i64, Device>,
}

/// Tables that reference a device and go with it on delete
struct Dependents {
    actions: Arc<InMemoryActionRepository>,
    readings: Arc<InMemoryTelemetryRepository>,
}

#[derive(Default)]
pub struct InMemoryDeviceRepository {
    table: RwLock<Table>,
    dependents: Option<Dependents>,
}

impl InMemoryDeviceRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deleting a device also removes its actions and readings,
    /// like the foreign keys do in Postgres.
    pub fn with_cascade(
        actions: Arc<InMemoryActionRepository>,
        readings: Arc<InMemoryTelemetryRepository>,
    ) -> Self {
        Self {
            table: RwLock::default(),
            dependents: Some(Dependents { actions, readings }),
        }
    }
}

#[async_trait]
impl DeviceRepository for InMemoryDeviceRepository {
    async fn insert(
        &self,
        user_id: UserId,
        device: &NewDevice,
        now: DateTime<Utc>,
    ) -> Result<Device, DomainError> {
        let mut table = self.table.write().await;
        if table
            .rows
            .values()
            .any(|d| d.mac_address == device.mac_address)
        {
            return Err(DomainError::Conflict(format!(
                "Device with MAC address {} already exists",
                device.mac_address
            )));
        }

        table.next_id += 1;
        let created = device.clone().into_device(table.next_id, user_id, now);
        table.rows.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Device>, DomainError> {
        Ok(self.table.read().await.rows.get(&id).cloned())
    }

    async fn find_by_user(&self, user_id: UserId) -> Result<Vec<Device>, DomainError> {
        let table = self.table.read().await;
        let mut devices: Vec<Device> = table
            .rows
            .values()
            .filter(|d| d.is_owned_by(user_id))
            .cloned()
            .collect();
        devices.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(devices)
    }

    async fn save(&self, device: &Device) -> Result<Option<Device>, DomainError> {
        let mut table = self.table.write().await;
        match table.rows.get_mut(&device.id) {
            Some(stored) => {
                *stored = device.clone();
                Ok(Some(stored.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: i64, user_id: UserId) -> Result<bool, DomainError> {
        let mut table = self.table.write().await;
        let owned = table.rows.get(&id).is_some_and(|d| d.is_owned_by(user_id));
        if owned {
            table.rows.remove(&id);
            if let Some(dependents) = &self.dependents {
                dependents.actions.remove_device(id).await;
                dependents.readings.remove_device(id).await;
            }
        }
        Ok(owned)
    }
}
