mod common;

use chrono::Duration;
use common::{ALICE, BOB, Hub, base_time, ctx, ctx_at};
use domain::action::{ActionRepository, NewAction};
use domain::device::{DeviceStatus, DeviceUpdate, MacAddress, NewDevice};
use domain::telemetry::NewReading;
use domain::{DomainError, UserId};

#[tokio::test]
async fn test_register_applies_defaults_and_audits() {
    let hub = Hub::new();
    let mac = MacAddress::new("aa-bb-cc-00-11-22").unwrap();

    let device = hub
        .registry
        .register(&ctx(ALICE), NewDevice::new("Porch", "esp-porch", mac))
        .await
        .unwrap();

    assert_eq!(device.mac_address.as_str(), "AA:BB:CC:00:11:22");
    assert_eq!(device.device_type, "ESP32");
    assert_eq!(device.status, DeviceStatus::NotConfigured);
    assert_eq!(device.user_id, UserId::new(ALICE));
    assert_eq!(hub.audit_actions().await, vec!["device_create"]);
}

#[tokio::test]
async fn test_duplicate_mac_is_a_conflict_across_users() {
    let hub = Hub::new();
    hub.add_device(ALICE, 7).await;

    let mac = MacAddress::new("AA:BB:CC:DD:EE:07").unwrap();
    let result = hub
        .registry
        .register(&ctx(BOB), NewDevice::new("Copy", "esp-copy", mac))
        .await;
    assert!(matches!(result, Err(DomainError::Conflict(_))));
}

#[tokio::test]
async fn test_list_is_owner_scoped_and_newest_first() {
    let hub = Hub::new();
    for (n, minutes) in [(1u8, 0i64), (2, 5)] {
        let mac = MacAddress::new(format!("00:00:00:00:00:{n:02X}")).unwrap();
        hub.registry
            .register(
                &ctx_at(ALICE, minutes),
                NewDevice::new(format!("Device {n}"), format!("esp-{n}"), mac),
            )
            .await
            .unwrap();
    }
    hub.add_device(BOB, 9).await;

    let names: Vec<String> = hub
        .registry
        .list(&ctx(ALICE))
        .await
        .unwrap()
        .into_iter()
        .map(|d| d.name)
        .collect();
    assert_eq!(names, ["Device 2", "Device 1"]);
}

#[tokio::test]
async fn test_foreign_owner_sees_not_found() {
    let hub = Hub::new();
    let device = hub.add_device(ALICE, 1).await;

    assert!(matches!(
        hub.registry.get(&ctx(BOB), device.id).await,
        Err(DomainError::NotFound(_))
    ));
    assert!(matches!(
        hub.registry
            .update(&ctx(BOB), device.id, DeviceUpdate::default())
            .await,
        Err(DomainError::NotFound(_))
    ));
    assert!(matches!(
        hub.registry.delete(&ctx(BOB), device.id).await,
        Err(DomainError::NotFound(_))
    ));
    assert!(hub.registry.get(&ctx(ALICE), device.id).await.is_ok());
}

#[tokio::test]
async fn test_update_changes_only_given_fields() {
    let hub = Hub::new();
    let device = hub.add_device(ALICE, 1).await;

    let changes = DeviceUpdate {
        status: Some(DeviceStatus::Online),
        rssi: Some(-55),
        is_connected: Some(true),
        ..Default::default()
    };
    let updated = hub
        .registry
        .update(&ctx_at(ALICE, 10), device.id, changes)
        .await
        .unwrap();

    assert_eq!(updated.name, device.name);
    assert_eq!(updated.status, DeviceStatus::Online);
    assert_eq!(updated.rssi, Some(-55));
    assert_eq!(updated.updated_at, base_time() + Duration::minutes(10));
    assert_eq!(updated.created_at, device.created_at);

    let blank_name = DeviceUpdate {
        name: Some(" ".into()),
        ..Default::default()
    };
    assert!(matches!(
        hub.registry.update(&ctx(ALICE), device.id, blank_name).await,
        Err(DomainError::InvalidInput(_))
    ));
}

#[tokio::test]
async fn test_wifi_configuration_marks_device_configured() {
    let hub = Hub::new();
    let device = hub.add_device(ALICE, 1).await;

    let configured = hub
        .registry
        .configure_wifi(&ctx_at(ALICE, 1), device.id, "HomeNet")
        .await
        .unwrap();
    assert_eq!(configured.status, DeviceStatus::Configured);
    assert_eq!(configured.last_ssid.as_deref(), Some("HomeNet"));
    assert_eq!(
        configured.last_configured,
        Some(base_time() + Duration::minutes(1))
    );

    assert!(matches!(
        hub.registry.configure_wifi(&ctx(ALICE), device.id, "").await,
        Err(DomainError::InvalidInput(_))
    ));
}

#[tokio::test]
async fn test_delete_removes_device_and_revokes_access() {
    let hub = Hub::new();
    let device = hub.add_device(ALICE, 1).await;

    hub.registry.delete(&ctx(ALICE), device.id).await.unwrap();

    assert!(!hub.registry.is_owned_by(device.id, UserId::new(ALICE)).await.unwrap());
    assert!(matches!(
        hub.registry.authorize(device.id, UserId::new(ALICE)).await,
        Err(DomainError::Unauthorized(_))
    ));
    assert_eq!(
        hub.audit_actions().await,
        vec!["device_create", "device_delete"]
    );
}

#[tokio::test]
async fn test_delete_takes_actions_and_readings_with_it() {
    let hub = Hub::new();
    let device = hub.add_device(ALICE, 1).await;
    let kept = hub.add_device(ALICE, 2).await;

    let action = hub
        .queue
        .enqueue(&ctx(ALICE), NewAction::new(device.id, "reboot", None))
        .await
        .unwrap();
    for id in [device.id, kept.id] {
        hub.telemetry
            .record(&ctx(ALICE), NewReading::new(id, "temperature", 20.0))
            .await
            .unwrap();
    }

    hub.registry.delete(&ctx(ALICE), device.id).await.unwrap();

    assert!(hub.actions.find_by_id(action.id).await.unwrap().is_none());
    assert_eq!(hub.readings.len().await, 1);
}

#[tokio::test]
async fn test_oversized_fields_are_invalid_input() {
    let hub = Hub::new();
    let mac = MacAddress::new("AA:BB:CC:00:11:33").unwrap();

    let result = hub
        .registry
        .register(&ctx(ALICE), NewDevice::new("n".repeat(101), "esp-long", mac))
        .await;
    assert!(matches!(result, Err(DomainError::InvalidInput(_))));

    let device = hub.add_device(ALICE, 1).await;
    let update = DeviceUpdate {
        location: Some("l".repeat(201)),
        ..DeviceUpdate::default()
    };
    let result = hub.registry.update(&ctx(ALICE), device.id, update).await;
    assert!(matches!(result, Err(DomainError::InvalidInput(_))));

    let result = hub
        .registry
        .configure_wifi(&ctx(ALICE), device.id, &"s".repeat(101))
        .await;
    assert!(matches!(result, Err(DomainError::InvalidInput(_))));
}

#[tokio::test]
async fn test_statistics_tally_callers_devices() {
    let hub = Hub::new();
    let first = hub.add_device(ALICE, 1).await;
    hub.add_device(ALICE, 2).await;
    hub.add_device(BOB, 3).await;
    hub.registry
        .configure_wifi(&ctx(ALICE), first.id, "HomeNet")
        .await
        .unwrap();

    let stats = hub.registry.statistics(&ctx(ALICE)).await.unwrap();
    assert_eq!(stats.total, 2);
    assert_eq!(stats.configured, 1);
    assert_eq!(stats.not_configured, 1);
    assert_eq!(stats.connected, 0);

    let ids = hub.registry.owned_device_ids(UserId::new(BOB)).await.unwrap();
    assert_eq!(ids.len(), 1);
}
