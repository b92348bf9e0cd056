mod common;

use std::sync::Arc;

use application::{ActionQueue, AuditRecorder, DeviceRegistry};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use common::{ALICE, BOB, Hub, base_time, ctx, ctx_at};
use domain::action::{
    Action, ActionRepository, ActionStatistics, ActionStatus, NewAction, StatusChange,
};
use domain::{DomainError, UserId};
use infrastructure::{InMemoryAuditSink, InMemoryDeviceRepository};
use mockall::mock;
use serde_json::json;

fn wifi_action(device_id: i64) -> NewAction {
    NewAction::new(
        device_id,
        "set_wifi",
        Some(json!({"ssid": "X", "password": "Y"})),
    )
}

#[tokio::test]
async fn test_enqueue_creates_pending_action_and_audits() {
    let hub = Hub::new();
    let device = hub.add_device(ALICE, 1).await;

    let action = hub
        .queue
        .enqueue(&ctx(ALICE), wifi_action(device.id))
        .await
        .unwrap();

    assert_eq!(action.status, ActionStatus::Pending);
    assert_eq!(action.created_at, base_time());
    assert_eq!(action.executed_at, None);

    let entries = hub.audit_log.entries().await;
    let last = entries.last().unwrap();
    assert_eq!(last.action, "device_action");
    assert_eq!(last.resource_id.as_deref(), Some(device.id.to_string().as_str()));
    assert_eq!(
        last.details,
        Some(json!({"action_type": "set_wifi", "details": {"ssid": "X", "password": "Y"}}))
    );
}

#[tokio::test]
async fn test_enqueue_rejects_foreign_and_missing_devices_alike() {
    let hub = Hub::new();
    let device = hub.add_device(ALICE, 1).await;

    let foreign = hub.queue.enqueue(&ctx(BOB), wifi_action(device.id)).await;
    let missing = hub.queue.enqueue(&ctx(BOB), wifi_action(9999)).await;

    assert!(matches!(foreign, Err(DomainError::Unauthorized(_))));
    assert!(matches!(missing, Err(DomainError::Unauthorized(_))));
    assert!(hub.queue.list_for_device(device.id, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_enqueue_requires_action_type() {
    let hub = Hub::new();
    let device = hub.add_device(ALICE, 1).await;

    let result = hub
        .queue
        .enqueue(&ctx(ALICE), NewAction::new(device.id, "  ", None))
        .await;
    assert!(matches!(result, Err(DomainError::InvalidInput(_))));
}

#[tokio::test]
async fn test_payload_round_trips_and_stays_with_owner() {
    let hub = Hub::new();
    let device = hub.add_device(ALICE, 1).await;
    let created = hub
        .queue
        .enqueue(&ctx(ALICE), wifi_action(device.id))
        .await
        .unwrap();

    let fetched = hub.queue.get_by_id(&ctx(ALICE), created.id).await.unwrap();
    assert_eq!(fetched.action_data, Some(json!({"ssid": "X", "password": "Y"})));

    let other = hub.queue.get_by_id(&ctx(BOB), created.id).await;
    assert!(matches!(other, Err(DomainError::NotFound(_))));
    assert!(hub.queue.list_pending_for_user(&ctx(BOB)).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_pending_list_is_fifo_across_devices() {
    let hub = Hub::new();
    let first = hub.add_device(ALICE, 1).await;
    let second = hub.add_device(ALICE, 2).await;

    // Interleave creation times across both devices
    let plan = [(second.id, 0), (first.id, 1), (second.id, 2), (first.id, 3)];
    let mut expected = Vec::new();
    for (device_id, minute) in plan {
        let action = hub
            .queue
            .enqueue(&ctx_at(ALICE, minute), NewAction::new(device_id, "ping", None))
            .await
            .unwrap();
        expected.push(action.id);
    }

    // A non-pending action must not show up
    hub.queue
        .update_status(&ctx_at(ALICE, 5), expected[1], "sent", None, None)
        .await
        .unwrap();
    expected.remove(1);

    let pending: Vec<i64> = hub
        .queue
        .list_pending_for_user(&ctx(ALICE))
        .await
        .unwrap()
        .into_iter()
        .map(|a| a.id)
        .collect();
    assert_eq!(pending, expected);
}

#[tokio::test]
async fn test_list_for_device_is_newest_first_and_bounded() {
    let hub = Hub::new();
    let device = hub.add_device(ALICE, 1).await;
    for minute in 0..5 {
        hub.queue
            .enqueue(
                &ctx_at(ALICE, minute),
                NewAction::new(device.id, format!("step-{minute}"), None),
            )
            .await
            .unwrap();
    }

    let recent = hub.queue.list_for_device(device.id, 2).await.unwrap();
    let types: Vec<&str> = recent.iter().map(|a| a.action_type.as_str()).collect();
    assert_eq!(types, ["step-4", "step-3"]);

    assert!(matches!(
        hub.queue.list_for_device(device.id, 0).await,
        Err(DomainError::InvalidInput(_))
    ));
}

#[tokio::test]
async fn test_lifecycle_stamps_execution_time_on_every_transition() {
    let hub = Hub::new();
    let device = hub.add_device(ALICE, 1).await;
    let action = hub
        .queue
        .enqueue(&ctx(ALICE), wifi_action(device.id))
        .await
        .unwrap();

    let sent = hub
        .queue
        .update_status(&ctx_at(ALICE, 1), action.id, "sent", None, None)
        .await
        .unwrap();
    assert_eq!(sent.status, ActionStatus::Sent);
    assert_eq!(sent.executed_at, Some(base_time() + Duration::minutes(1)));

    let done = hub
        .queue
        .update_status(
            &ctx_at(ALICE, 2),
            action.id,
            "completed",
            Some(json!({"connected": true})),
            None,
        )
        .await
        .unwrap();
    assert_eq!(done.status, ActionStatus::Completed);
    assert_eq!(done.executed_at, Some(base_time() + Duration::minutes(2)));
    assert_eq!(done.response_data, Some(json!({"connected": true})));
    assert_eq!(done.error_message, None);

    let updates = hub
        .audit_actions()
        .await
        .into_iter()
        .filter(|a| a == "action_status_update")
        .count();
    assert_eq!(updates, 2);
}

#[tokio::test]
async fn test_direct_failure_from_pending_keeps_error_only() {
    let hub = Hub::new();
    let device = hub.add_device(ALICE, 1).await;
    let action = hub
        .queue
        .enqueue(&ctx(ALICE), wifi_action(device.id))
        .await
        .unwrap();

    let failed = hub
        .queue
        .update_status(
            &ctx(ALICE),
            action.id,
            "failed",
            None,
            Some("device unreachable".into()),
        )
        .await
        .unwrap();
    assert_eq!(failed.status, ActionStatus::Failed);
    assert_eq!(failed.error_message.as_deref(), Some("device unreachable"));
    assert_eq!(failed.response_data, None);
}

#[tokio::test]
async fn test_terminal_states_reject_every_transition() {
    let hub = Hub::new();
    let device = hub.add_device(ALICE, 1).await;

    for terminal in ["completed", "failed"] {
        let action = hub
            .queue
            .enqueue(&ctx(ALICE), wifi_action(device.id))
            .await
            .unwrap();
        hub.queue
            .update_status(&ctx(ALICE), action.id, terminal, None, None)
            .await
            .unwrap();

        for next in ["pending", "sent", "completed", "failed"] {
            let result = hub
                .queue
                .update_status(&ctx_at(ALICE, 9), action.id, next, None, None)
                .await;
            assert!(
                matches!(result, Err(DomainError::Conflict(_))),
                "{terminal} -> {next} should be rejected"
            );
        }

        // The rejected attempts did not touch the stored row
        let stored = hub.queue.get_by_id(&ctx(ALICE), action.id).await.unwrap();
        assert_eq!(stored.status.as_str(), terminal);
        assert_eq!(stored.executed_at, Some(base_time()));
    }
}

#[tokio::test]
async fn test_sent_cannot_go_back_or_repeat() {
    let hub = Hub::new();
    let device = hub.add_device(ALICE, 1).await;
    let action = hub
        .queue
        .enqueue(&ctx(ALICE), wifi_action(device.id))
        .await
        .unwrap();
    hub.queue
        .update_status(&ctx(ALICE), action.id, "sent", None, None)
        .await
        .unwrap();

    for next in ["pending", "sent"] {
        let result = hub
            .queue
            .update_status(&ctx(ALICE), action.id, next, None, None)
            .await;
        assert!(matches!(result, Err(DomainError::Conflict(_))));
    }
}

#[tokio::test]
async fn test_update_status_validates_name_and_ownership() {
    let hub = Hub::new();
    let device = hub.add_device(ALICE, 1).await;
    let action = hub
        .queue
        .enqueue(&ctx(ALICE), wifi_action(device.id))
        .await
        .unwrap();

    let bad_name = hub
        .queue
        .update_status(&ctx(ALICE), action.id, "done", None, None)
        .await;
    assert!(matches!(bad_name, Err(DomainError::InvalidInput(_))));

    let foreign = hub
        .queue
        .update_status(&ctx(BOB), action.id, "sent", None, None)
        .await;
    assert!(matches!(foreign, Err(DomainError::NotFound(_))));

    let stored = hub.queue.get_by_id(&ctx(ALICE), action.id).await.unwrap();
    assert_eq!(stored.status, ActionStatus::Pending);
}

mock! {
    Actions {}

    #[async_trait]
    impl ActionRepository for Actions {
        async fn insert(&self, action: &NewAction, now: DateTime<Utc>) -> Result<Action, DomainError>;
        async fn find_by_id(&self, id: i64) -> Result<Option<Action>, DomainError>;
        async fn find_pending_for_devices(&self, device_ids: &[i64]) -> Result<Vec<Action>, DomainError>;
        async fn find_by_device(&self, device_id: i64, limit: i64) -> Result<Vec<Action>, DomainError>;
        async fn update_status(&self, id: i64, expected: ActionStatus, change: &StatusChange) -> Result<Option<Action>, DomainError>;
        async fn statistics(&self, device_ids: &[i64], since: DateTime<Utc>) -> Result<ActionStatistics, DomainError>;
        async fn purge_terminal_before(&self, cutoff: DateTime<Utc>) -> Result<u64, DomainError>;
    }
}

#[tokio::test]
async fn test_losing_a_concurrent_update_is_a_conflict() {
    let audit = AuditRecorder::new(Arc::new(InMemoryAuditSink::new()));
    let registry = Arc::new(DeviceRegistry::new(
        Arc::new(InMemoryDeviceRepository::new()),
        audit.clone(),
    ));
    let device = {
        let mac = domain::device::MacAddress::new("10:20:30:40:50:60").unwrap();
        registry
            .register(&ctx(ALICE), domain::device::NewDevice::new("Lamp", "esp-lamp", mac))
            .await
            .unwrap()
    };

    let stored = NewAction::new(device.id, "toggle", None).into_action(7, base_time());
    let mut actions = MockActions::new();
    actions
        .expect_find_by_id()
        .returning(move |_| Ok(Some(stored.clone())));
    actions
        .expect_update_status()
        .withf(|id, expected, change| {
            *id == 7 && *expected == ActionStatus::Pending && change.status == ActionStatus::Sent
        })
        .times(1)
        .returning(|_, _, _| Ok(None));

    let queue = ActionQueue::new(Arc::new(actions), registry, audit);
    let result = queue
        .update_status(&ctx(ALICE), 7, "sent", None, None)
        .await;
    assert!(matches!(result, Err(DomainError::Conflict(_))));
}

#[tokio::test]
async fn test_store_failures_propagate() {
    let audit = AuditRecorder::new(Arc::new(InMemoryAuditSink::new()));
    let registry = Arc::new(DeviceRegistry::new(
        Arc::new(InMemoryDeviceRepository::new()),
        audit.clone(),
    ));
    let mut actions = MockActions::new();
    actions
        .expect_find_by_device()
        .returning(|_, _| Err(DomainError::StoreUnavailable("connection reset".into())));

    let queue = ActionQueue::new(Arc::new(actions), registry, audit);
    let err = queue.list_for_device(1, 10).await.unwrap_err();
    assert!(err.is_store_failure());
}

#[tokio::test]
async fn test_audit_failure_does_not_fail_the_operation() {
    let hub = Hub::with_failing_audit();
    let device = hub.add_device(ALICE, 1).await;

    let action = hub
        .queue
        .enqueue(&ctx(ALICE), wifi_action(device.id))
        .await
        .unwrap();
    let sent = hub
        .queue
        .update_status(&ctx(ALICE), action.id, "sent", None, None)
        .await
        .unwrap();
    assert_eq!(sent.status, ActionStatus::Sent);
}

#[tokio::test]
async fn test_statistics_count_caller_actions_in_window() {
    let hub = Hub::new();
    let mine = hub.add_device(ALICE, 1).await;
    let theirs = hub.add_device(BOB, 2).await;

    let a = hub.queue.enqueue(&ctx(ALICE), wifi_action(mine.id)).await.unwrap();
    hub.queue.enqueue(&ctx(ALICE), wifi_action(mine.id)).await.unwrap();
    hub.queue.enqueue(&ctx(BOB), wifi_action(theirs.id)).await.unwrap();
    hub.queue
        .update_status(&ctx(ALICE), a.id, "completed", None, None)
        .await
        .unwrap();

    let stats = hub.queue.statistics(&ctx(ALICE), 7).await.unwrap();
    assert_eq!(stats.total, 2);
    assert_eq!(stats.pending, 1);
    assert_eq!(stats.completed, 1);

    assert!(matches!(
        hub.queue.statistics(&ctx(ALICE), 0).await,
        Err(DomainError::InvalidInput(_))
    ));
}

#[tokio::test]
async fn test_purge_only_removes_old_terminal_actions() {
    let hub = Hub::new();
    let device = hub.add_device(ALICE, 1).await;

    let old_done = hub.queue.enqueue(&ctx(ALICE), wifi_action(device.id)).await.unwrap();
    let old_sent = hub.queue.enqueue(&ctx(ALICE), wifi_action(device.id)).await.unwrap();
    let old_pending = hub.queue.enqueue(&ctx(ALICE), wifi_action(device.id)).await.unwrap();
    hub.queue
        .update_status(&ctx(ALICE), old_done.id, "completed", None, None)
        .await
        .unwrap();
    hub.queue
        .update_status(&ctx(ALICE), old_sent.id, "sent", None, None)
        .await
        .unwrap();

    let later = base_time() + Duration::days(31);
    let removed = hub.queue.purge_older_than(30, later).await.unwrap();
    assert_eq!(removed, 1);

    let ctx_later = domain::RequestContext::new(UserId::new(ALICE), later);
    assert!(hub.queue.get_by_id(&ctx_later, old_done.id).await.is_err());
    assert!(hub.queue.get_by_id(&ctx_later, old_sent.id).await.is_ok());
    assert!(hub.queue.get_by_id(&ctx_later, old_pending.id).await.is_ok());
}
