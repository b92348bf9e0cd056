use crate::database::entities::devices;
use crate::database::orm_error;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::device::{Device, DeviceRepository, DeviceStatus, MacAddress, NewDevice};
use domain::{DomainError, UserId};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, NotSet, QueryFilter,
    QueryOrder, Set, Unchanged,
};

/// Devices table through SeaORM
pub struct SeaOrmDeviceRepository {
    db: DatabaseConnection,
}

impl SeaOrmDeviceRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn model_to_device(model: devices::Model) -> Result<Device, DomainError> {
        let corrupt = |e: DomainError| {
            DomainError::StoreUnavailable(format!("Stored device {} is invalid: {}", model.id, e))
        };
        let mac_address = MacAddress::new(model.mac_address.clone()).map_err(corrupt)?;
        let status = DeviceStatus::parse(&model.status).map_err(corrupt)?;

        Ok(Device {
            id: model.id,
            user_id: UserId::new(model.user_id),
            name: model.name,
            hardware_id: model.device_id,
            mac_address,
            device_type: model.device_type,
            service_uuid: model.service_uuid,
            status,
            last_ssid: model.last_ssid,
            last_configured: model.last_configured,
            rssi: model.rssi,
            is_connected: model.is_connected,
            location: model.location,
            description: model.description,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

#[async_trait]
impl DeviceRepository for SeaOrmDeviceRepository {
    async fn insert(
        &self,
        user_id: UserId,
        device: &NewDevice,
        now: DateTime<Utc>,
    ) -> Result<Device, DomainError> {
        let active_model = devices::ActiveModel {
            id: NotSet,
            user_id: Set(user_id.value()),
            name: Set(device.name.clone()),
            device_id: Set(device.hardware_id.clone()),
            mac_address: Set(device.mac_address.to_string()),
            device_type: Set(device.device_type_or_default().to_string()),
            service_uuid: Set(device.service_uuid_or_default().to_string()),
            status: Set(DeviceStatus::NotConfigured.as_str().to_string()),
            last_ssid: Set(None),
            last_configured: Set(None),
            rssi: Set(None),
            is_connected: Set(false),
            location: Set(device.location.clone()),
            description: Set(device.description.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = active_model.insert(&self.db).await.map_err(|e| {
            match orm_error(e) {
                DomainError::Conflict(_) => DomainError::Conflict(format!(
                    "Device with MAC address {} already exists",
                    device.mac_address
                )),
                other => other,
            }
        })?;
        Self::model_to_device(model)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Device>, DomainError> {
        let model = devices::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(orm_error)?;

        model.map(Self::model_to_device).transpose()
    }

    async fn find_by_user(&self, user_id: UserId) -> Result<Vec<Device>, DomainError> {
        let models = devices::Entity::find()
            .filter(devices::Column::UserId.eq(user_id.value()))
            .order_by_desc(devices::Column::CreatedAt)
            .order_by_desc(devices::Column::Id)
            .all(&self.db)
            .await
            .map_err(orm_error)?;

        models.into_iter().map(Self::model_to_device).collect()
    }

    async fn save(&self, device: &Device) -> Result<Option<Device>, DomainError> {
        let active_model = devices::ActiveModel {
            id: Unchanged(device.id),
            user_id: Unchanged(device.user_id.value()),
            name: Set(device.name.clone()),
            device_id: Unchanged(device.hardware_id.clone()),
            mac_address: Unchanged(device.mac_address.to_string()),
            device_type: Set(device.device_type.clone()),
            service_uuid: Unchanged(device.service_uuid.clone()),
            status: Set(device.status.as_str().to_string()),
            last_ssid: Set(device.last_ssid.clone()),
            last_configured: Set(device.last_configured),
            rssi: Set(device.rssi),
            is_connected: Set(device.is_connected),
            location: Set(device.location.clone()),
            description: Set(device.description.clone()),
            created_at: Unchanged(device.created_at),
            updated_at: Set(device.updated_at),
        };

        match active_model.update(&self.db).await {
            Ok(model) => Self::model_to_device(model).map(Some),
            Err(DbErr::RecordNotUpdated) => Ok(None),
            Err(e) => Err(orm_error(e)),
        }
    }

    async fn delete(&self, id: i64, user_id: UserId) -> Result<bool, DomainError> {
        let result = devices::Entity::delete_many()
            .filter(devices::Column::Id.eq(id))
            .filter(devices::Column::UserId.eq(user_id.value()))
            .exec(&self.db)
            .await
            .map_err(orm_error)?;
        Ok(result.rows_affected > 0)
    }
}
