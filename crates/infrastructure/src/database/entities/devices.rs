use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "devices")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub device_id: String, // hardware identifier, not the row id
    #[sea_orm(unique)]
    pub mac_address: String,
    pub device_type: String,
    pub service_uuid: String,
    pub status: String,
    pub last_ssid: Option<String>,
    pub last_configured: Option<DateTimeUtc>,
    pub rssi: Option<i32>,
    pub is_connected: bool,
    pub location: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
