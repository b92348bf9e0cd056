use super::{Device, NewDevice};
use crate::DomainError;
use crate::context::UserId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Repository interface for device persistence
///
/// Ownership checks are not performed here; callers go through
/// `DeviceRegistry`, which is the only place that compares owners.
#[async_trait]
pub trait DeviceRepository: Send + Sync {
    /// Insert a new device. Fails with `Conflict` when the MAC address is taken.
    async fn insert(
        &self,
        user_id: UserId,
        device: &NewDevice,
        now: DateTime<Utc>,
    ) -> Result<Device, DomainError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Device>, DomainError>;

    /// All devices of a user, newest first
    async fn find_by_user(&self, user_id: UserId) -> Result<Vec<Device>, DomainError>;

    /// Persist a device whose mutable fields were changed in memory.
    /// Returns `None` when the row no longer exists.
    async fn save(&self, device: &Device) -> Result<Option<Device>, DomainError>;

    /// Returns whether a row was deleted
    async fn delete(&self, id: i64, user_id: UserId) -> Result<bool, DomainError>;
}
