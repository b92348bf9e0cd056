use std::sync::Arc;

use tracing::{debug, info};

use domain::device::{
    Device, DeviceRepository, DeviceStatistics, DeviceUpdate, NewDevice, validate_ssid,
};
use domain::{AuditEvent, DomainError, RequestContext, UserId};

use crate::audit::AuditRecorder;

/// Device identity and ownership.
///
/// This is the single authorization gate of the system: action and
/// telemetry use cases ask the registry whether a device belongs to the
/// caller and never compare owners themselves.
pub struct DeviceRegistry {
    devices: Arc<dyn DeviceRepository>,
    audit: AuditRecorder,
}

impl DeviceRegistry {
    pub fn new(devices: Arc<dyn DeviceRepository>, audit: AuditRecorder) -> Self {
        Self { devices, audit }
    }

    /// Looks a device up, optionally scoped to an owner.
    ///
    /// A device owned by someone else is reported as `NotFound`, exactly
    /// like a missing one.
    pub async fn resolve(
        &self,
        device_id: i64,
        user_id: Option<UserId>,
    ) -> Result<Device, DomainError> {
        let device = self.devices.find_by_id(device_id).await?;
        match device {
            Some(d) if user_id.is_none_or(|u| d.is_owned_by(u)) => Ok(d),
            _ => Err(DomainError::NotFound(format!("Device {device_id} not found"))),
        }
    }

    pub async fn is_owned_by(&self, device_id: i64, user_id: UserId) -> Result<bool, DomainError> {
        match self.resolve(device_id, Some(user_id)).await {
            Ok(_) => Ok(true),
            Err(DomainError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Ownership gate for operations that act on a device.
    ///
    /// Absent and foreign devices both fail with `Unauthorized`.
    pub async fn authorize(&self, device_id: i64, user_id: UserId) -> Result<(), DomainError> {
        if self.is_owned_by(device_id, user_id).await? {
            return Ok(());
        }
        debug!(device_id, user_id = %user_id, "Device access denied");
        Err(DomainError::Unauthorized(format!(
            "Device {device_id} not found or not authorized"
        )))
    }

    /// Row ids of every device the user owns
    pub async fn owned_device_ids(&self, user_id: UserId) -> Result<Vec<i64>, DomainError> {
        let devices = self.devices.find_by_user(user_id).await?;
        Ok(devices.into_iter().map(|d| d.id).collect())
    }

    pub async fn register(
        &self,
        ctx: &RequestContext,
        device: NewDevice,
    ) -> Result<Device, DomainError> {
        device.validate()?;
        let created = self.devices.insert(ctx.user_id, &device, ctx.now).await?;
        info!(device_id = created.id, mac = %created.mac_address, user_id = %ctx.user_id, "Device registered");

        self.audit
            .record(AuditEvent::device_created(ctx, created.id))
            .await;
        Ok(created)
    }

    pub async fn list(&self, ctx: &RequestContext) -> Result<Vec<Device>, DomainError> {
        self.devices.find_by_user(ctx.user_id).await
    }

    pub async fn get(&self, ctx: &RequestContext, device_id: i64) -> Result<Device, DomainError> {
        self.resolve(device_id, Some(ctx.user_id)).await
    }

    pub async fn update(
        &self,
        ctx: &RequestContext,
        device_id: i64,
        changes: DeviceUpdate,
    ) -> Result<Device, DomainError> {
        changes.validate()?;
        let mut device = self.resolve(device_id, Some(ctx.user_id)).await?;
        device.apply(&changes, ctx.now);
        let saved = self.persist(device).await?;

        self.audit
            .record(AuditEvent::device_updated(ctx, saved.id))
            .await;
        Ok(saved)
    }

    /// Records that Wi-Fi credentials were delivered to the device.
    pub async fn configure_wifi(
        &self,
        ctx: &RequestContext,
        device_id: i64,
        ssid: &str,
    ) -> Result<Device, DomainError> {
        validate_ssid(ssid)?;
        let mut device = self.resolve(device_id, Some(ctx.user_id)).await?;
        device.configure_wifi(ssid, ctx.now);
        let saved = self.persist(device).await?;
        info!(device_id, ssid, "Device Wi-Fi configuration recorded");

        self.audit
            .record(AuditEvent::device_updated(ctx, saved.id).with_details(serde_json::json!({
                "last_ssid": ssid
            })))
            .await;
        Ok(saved)
    }

    /// Deletes an owned device. Its actions and readings go with it through
    /// the store's cascade.
    pub async fn delete(&self, ctx: &RequestContext, device_id: i64) -> Result<(), DomainError> {
        self.resolve(device_id, Some(ctx.user_id)).await?;
        if !self.devices.delete(device_id, ctx.user_id).await? {
            return Err(DomainError::NotFound(format!("Device {device_id} not found")));
        }
        info!(device_id, user_id = %ctx.user_id, "Device deleted");

        self.audit
            .record(AuditEvent::device_deleted(ctx, device_id))
            .await;
        Ok(())
    }

    pub async fn statistics(&self, ctx: &RequestContext) -> Result<DeviceStatistics, DomainError> {
        let devices = self.devices.find_by_user(ctx.user_id).await?;
        Ok(DeviceStatistics::tally(&devices))
    }

    async fn persist(&self, device: Device) -> Result<Device, DomainError> {
        let id = device.id;
        self.devices
            .save(&device)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Device {id} not found")))
    }
}
