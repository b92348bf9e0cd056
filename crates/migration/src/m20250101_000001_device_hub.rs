use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create devices table
        manager
            .create_table(
                Table::create()
                    .table(Devices::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Devices::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Devices::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Devices::Name).string_len(100).not_null())
                    .col(ColumnDef::new(Devices::DeviceId).string_len(100).not_null())
                    .col(
                        ColumnDef::new(Devices::MacAddress)
                            .string_len(17)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Devices::DeviceType)
                            .string_len(50)
                            .not_null()
                            .default("ESP32"),
                    )
                    .col(
                        ColumnDef::new(Devices::ServiceUuid)
                            .string_len(36)
                            .not_null()
                            .default("12345678-1234-1234-1234-1234567890ab"),
                    )
                    .col(
                        ColumnDef::new(Devices::Status)
                            .string_len(20)
                            .not_null()
                            .default("not_configured"),
                    )
                    .col(ColumnDef::new(Devices::LastSsid).string_len(100))
                    .col(ColumnDef::new(Devices::LastConfigured).timestamp_with_time_zone())
                    .col(ColumnDef::new(Devices::Rssi).integer())
                    .col(
                        ColumnDef::new(Devices::IsConnected)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Devices::Location).string_len(200))
                    .col(ColumnDef::new(Devices::Description).text())
                    .col(
                        ColumnDef::new(Devices::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Devices::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Create device_actions table
        manager
            .create_table(
                Table::create()
                    .table(DeviceActions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DeviceActions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DeviceActions::DeviceId).big_integer().not_null())
                    .col(
                        ColumnDef::new(DeviceActions::ActionType)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(ColumnDef::new(DeviceActions::ActionData).json_binary())
                    .col(
                        ColumnDef::new(DeviceActions::Status)
                            .string_len(20)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(DeviceActions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(DeviceActions::ExecutedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(DeviceActions::ResponseData).json_binary())
                    .col(ColumnDef::new(DeviceActions::ErrorMessage).text())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_action_device")
                            .from(DeviceActions::Table, DeviceActions::DeviceId)
                            .to(Devices::Table, Devices::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create sensor_data table
        manager
            .create_table(
                Table::create()
                    .table(SensorData::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SensorData::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SensorData::DeviceId).big_integer().not_null())
                    .col(ColumnDef::new(SensorData::SensorType).string_len(50).not_null())
                    .col(ColumnDef::new(SensorData::SensorValue).double().not_null())
                    .col(ColumnDef::new(SensorData::Unit).string_len(20))
                    .col(
                        ColumnDef::new(SensorData::Timestamp)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(SensorData::Metadata).json_binary())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sensor_device")
                            .from(SensorData::Table, SensorData::DeviceId)
                            .to(Devices::Table, Devices::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create system_logs table; user_id is NULL for system events
        manager
            .create_table(
                Table::create()
                    .table(SystemLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SystemLogs::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SystemLogs::UserId).big_integer())
                    .col(ColumnDef::new(SystemLogs::Action).string_len(100).not_null())
                    .col(ColumnDef::new(SystemLogs::ResourceType).string_len(50))
                    .col(ColumnDef::new(SystemLogs::ResourceId).string_len(100))
                    .col(ColumnDef::new(SystemLogs::IpAddress).string_len(45))
                    .col(ColumnDef::new(SystemLogs::UserAgent).text())
                    .col(ColumnDef::new(SystemLogs::Details).json_binary())
                    .col(
                        ColumnDef::new(SystemLogs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_devices_user")
                    .table(Devices::Table)
                    .col(Devices::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_actions_device_status")
                    .table(DeviceActions::Table)
                    .col(DeviceActions::DeviceId)
                    .col(DeviceActions::Status)
                    .col(DeviceActions::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_sensor_device_type_time")
                    .table(SensorData::Table)
                    .col(SensorData::DeviceId)
                    .col(SensorData::SensorType)
                    .col(SensorData::Timestamp)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_system_logs_user_time")
                    .table(SystemLogs::Table)
                    .col(SystemLogs::UserId)
                    .col(SystemLogs::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SystemLogs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SensorData::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(DeviceActions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Devices::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Devices {
    Table,
    Id,
    UserId,
    Name,
    DeviceId,
    MacAddress,
    DeviceType,
    ServiceUuid,
    Status,
    LastSsid,
    LastConfigured,
    Rssi,
    IsConnected,
    Location,
    Description,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum DeviceActions {
    Table,
    Id,
    DeviceId,
    ActionType,
    ActionData,
    Status,
    CreatedAt,
    ExecutedAt,
    ResponseData,
    ErrorMessage,
}

#[derive(DeriveIden)]
enum SensorData {
    Table,
    Id,
    DeviceId,
    SensorType,
    SensorValue,
    Unit,
    Timestamp,
    Metadata,
}

#[derive(DeriveIden)]
enum SystemLogs {
    Table,
    Id,
    UserId,
    Action,
    ResourceType,
    ResourceId,
    IpAddress,
    UserAgent,
    Details,
    CreatedAt,
}
