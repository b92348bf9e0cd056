mod common;

use std::sync::Arc;

use application::{AuditRecorder, RetentionPolicy, RetentionService};
use chrono::Duration;
use common::{ALICE, Hub, base_time, ctx};
use domain::action::NewAction;
use domain::telemetry::NewReading;

#[tokio::test]
async fn test_purge_run_covers_every_store_and_is_audited() {
    let hub = Hub::new();
    let device = hub.add_device(ALICE, 1).await;

    let done = hub
        .queue
        .enqueue(&ctx(ALICE), NewAction::new(device.id, "reboot", None))
        .await
        .unwrap();
    hub.queue
        .update_status(&ctx(ALICE), done.id, "completed", None, None)
        .await
        .unwrap();
    hub.queue
        .enqueue(&ctx(ALICE), NewAction::new(device.id, "reboot", None))
        .await
        .unwrap();
    hub.telemetry
        .record(&ctx(ALICE), NewReading::new(device.id, "temperature", 20.0))
        .await
        .unwrap();

    let service = RetentionService::new(
        Arc::new(hub.queue),
        Arc::new(hub.telemetry),
        AuditRecorder::new(hub.audit_log.clone()),
        RetentionPolicy {
            action_days: 1,
            telemetry_days: 1,
            audit_days: 1,
        },
    );

    let report = service.run(base_time() + Duration::days(2)).await.unwrap();
    assert_eq!(report.actions, 1);
    assert_eq!(report.readings, 1);
    // device_create, device_action x2, action_status_update, sensor_record
    assert_eq!(report.audit_entries, 5);

    let entries = hub.audit_log.entries().await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].action, "retention_purge");
    assert_eq!(entries[0].user_id, None);
    assert_eq!(entries[0].details.as_ref().unwrap()["actions"], 1);
}

#[test]
fn test_default_policy_windows() {
    let policy = RetentionPolicy::default();
    assert_eq!(
        (policy.action_days, policy.telemetry_days, policy.audit_days),
        (30, 90, 365)
    );
}
