// Integration tests for manual work queue intervention: all-or-nothing
// batches, rule checks against stored state and reprocessing

mod common;

use chrono::{Duration, Utc};
use imgsrv_core::logging_facility::init_test_capture;
use imgsrv_core::model::{
    WorkQueue, WorkQueueField, WorkQueuePriority, WorkQueueStatus, WorkQueueType, WorkQueueUidField,
};
use imgsrv_core::types::schema::EVENT_END_ERROR;
use imgsrv_core::{ExErrorKind, SelectCriteria, UpdateColumns};
use imgsrv_engine::WorkQueueController;
use imgsrv_store::adaptor::WorkQueueUidAdaptor;
use imgsrv_store::EntityAdaptor;

#[test]
fn test_delete_items_removes_entries_and_uids() {
    let store = common::new_store();
    let partition = common::add_partition(&store, "DEL1");
    let controller = WorkQueueController::new(store.clone());
    let first = common::add_item(&store, &partition, WorkQueueType::StudyProcess);
    let second = common::add_item(&store, &partition, WorkQueueType::AutoRoute);
    common::add_uids(&store, &first, 3);

    let deleted = controller
        .delete_items(&[first.clone(), second.clone()])
        .unwrap();

    assert!(deleted);
    assert!(controller.get(&first.key).unwrap().is_none());
    assert!(controller.get(&second.key).unwrap().is_none());
    assert!(controller.uids(&first).unwrap().is_empty());
}

#[test]
fn test_batches_handle_repeated_entries_once() {
    let store = common::new_store();
    let partition = common::add_partition(&store, "REPEAT");
    let controller = WorkQueueController::new(store.clone());
    let failed = common::add_item(&store, &partition, WorkQueueType::StudyProcess);
    let failed = common::set_state(&store, &failed, WorkQueueStatus::Failed, None, None);
    let other = common::add_item(&store, &partition, WorkQueueType::AutoRoute);

    let reset = controller
        .reset_items(&[failed.clone(), failed.clone()], Utc::now(), None)
        .unwrap();
    assert!(reset);
    let stored = controller.get(&failed.key).unwrap().unwrap();
    assert_eq!(stored.work_queue_status, WorkQueueStatus::Pending);

    let deleted = controller
        .delete_items(&[other.clone(), failed.clone(), other.clone()])
        .unwrap();
    assert!(deleted);
    assert!(controller.get(&other.key).unwrap().is_none());
    assert!(controller.get(&failed.key).unwrap().is_none());
}

#[test]
fn test_delete_items_is_atomic_when_one_entry_is_claimed() {
    let capture = init_test_capture();

    // Given: Three entries with UIDs, the second claimed by a processor
    let store = common::new_store();
    let partition = common::add_partition(&store, "DEL_ATOMIC");
    let controller = WorkQueueController::new(store.clone());
    let mut items: Vec<_> = (0..3)
        .map(|_| common::add_item(&store, &partition, WorkQueueType::StudyProcess))
        .collect();
    for item in &items {
        common::add_uids(&store, item, 2);
    }
    items[1] = common::set_state(
        &store,
        &items[1],
        WorkQueueStatus::InProgress,
        Some("node-3"),
        Some(Utc::now()),
    );

    // When: All three are deleted as one batch
    let err = controller.delete_items(&items).unwrap_err();

    // Then: The claimed entry refused the delete
    assert_eq!(err.kind(), ExErrorKind::ConstraintViolation);
    let request_id = err.request_id().expect("controller errors carry a request id");

    // And: Every entry and every UID is still there
    for item in &items {
        assert!(controller.get(&item.key).unwrap().is_some());
        assert_eq!(controller.uids(item).unwrap().len(), 2);
    }

    // And: The failure was logged once, by the controller
    let claimed_key = items[1].key.to_string();
    let errors = capture.count_events(|e| {
        e.event.as_deref() == Some(EVENT_END_ERROR)
            && e.field("error").map(|m| m.contains(&claimed_key)).unwrap_or(false)
    });
    assert_eq!(errors, 1);
    assert_eq!(
        capture.count_events(|e| {
            e.op.as_deref() == Some("delete_work_queue_items")
                && e.event.as_deref() == Some(EVENT_END_ERROR)
                && e.field("request_id") == Some(request_id.as_str())
                && e.field("error").map(|m| m.contains(&claimed_key)).unwrap_or(false)
        }),
        1
    );
}

#[test]
fn test_delete_items_returns_false_when_an_entry_vanished() {
    let store = common::new_store();
    let partition = common::add_partition(&store, "DEL_GONE");
    let controller = WorkQueueController::new(store.clone());
    let kept = common::add_item(&store, &partition, WorkQueueType::StudyProcess);
    let gone = common::add_item(&store, &partition, WorkQueueType::StudyProcess);
    assert!(controller.delete_items(&[gone.clone()]).unwrap());

    let deleted = controller.delete_items(&[kept.clone(), gone]).unwrap();

    assert!(!deleted);
    assert!(controller.get(&kept.key).unwrap().is_some());
}

#[test]
fn test_empty_batches_do_nothing() {
    let store = common::new_store();
    let controller = WorkQueueController::new(store);
    let now = Utc::now();

    assert!(!controller.delete_items(&[]).unwrap());
    assert!(!controller.reschedule_items(&[], now, None, None).unwrap());
    assert!(!controller.reset_items(&[], now, None).unwrap());
}

#[test]
fn test_reschedule_clears_failures_and_keeps_priority() {
    let store = common::new_store();
    let partition = common::add_partition(&store, "RESCHED");
    let controller = WorkQueueController::new(store.clone());
    let item = common::add_item(&store, &partition, WorkQueueType::StudyProcess);
    let queue: EntityAdaptor<WorkQueue> = EntityAdaptor::new(store.clone());
    queue
        .update(
            &item.key,
            &UpdateColumns::new()
                .set(WorkQueueField::FailureCount, 2)
                .set(WorkQueueField::FailureDescription, "timeout"),
        )
        .unwrap();
    let scheduled = Utc::now() + Duration::minutes(30);

    let changed = controller
        .reschedule_items(&[item.clone()], scheduled, Some(scheduled + Duration::minutes(5)), None)
        .unwrap();

    assert!(changed);
    let stored = controller.get(&item.key).unwrap().unwrap();
    assert_eq!(stored.scheduled_time.timestamp_millis(), scheduled.timestamp_millis());
    assert_eq!(stored.failure_count, 0);
    assert_eq!(stored.failure_description, None);
    assert_eq!(stored.work_queue_priority, item.work_queue_priority);
    assert!(stored.last_updated_time.is_some());
}

#[test]
fn test_reschedule_refuses_whole_batch_for_in_progress_entry() {
    let store = common::new_store();
    let partition = common::add_partition(&store, "RESCHED_NO");
    let controller = WorkQueueController::new(store.clone());
    let pending = common::add_item(&store, &partition, WorkQueueType::StudyProcess);
    let running = common::add_item(&store, &partition, WorkQueueType::StudyProcess);
    let running = common::set_state(
        &store,
        &running,
        WorkQueueStatus::InProgress,
        Some("node-1"),
        Some(Utc::now()),
    );
    let scheduled = Utc::now() + Duration::hours(1);

    let changed = controller
        .reschedule_items(
            &[pending.clone(), running],
            scheduled,
            None,
            Some(WorkQueuePriority::High),
        )
        .unwrap();

    assert!(!changed);
    let stored = controller.get(&pending.key).unwrap().unwrap();
    assert_eq!(
        stored.scheduled_time.timestamp_millis(),
        pending.scheduled_time.timestamp_millis()
    );
    assert_eq!(stored.work_queue_priority, pending.work_queue_priority);
}

#[test]
fn test_reset_returns_failed_entry_to_pending() {
    let store = common::new_store();
    let partition = common::add_partition(&store, "RESET");
    let controller = WorkQueueController::new(store.clone());
    let item = common::add_item(&store, &partition, WorkQueueType::StudyProcess);
    common::add_uids(&store, &item, 2);
    let uids: WorkQueueUidAdaptor = EntityAdaptor::new(store.clone());
    uids.update_where(
        &SelectCriteria::new().equal_to(WorkQueueUidField::WorkQueueKey, &item.key),
        &UpdateColumns::new()
            .set(WorkQueueUidField::Failed, true)
            .set(WorkQueueUidField::FailureCount, 3),
    )
    .unwrap();
    let item = common::set_state(&store, &item, WorkQueueStatus::Failed, Some("node-2"), None);

    let changed = controller.reset_items(&[item.clone()], Utc::now(), None).unwrap();

    assert!(changed);
    let stored = controller.get(&item.key).unwrap().unwrap();
    assert_eq!(stored.work_queue_status, WorkQueueStatus::Pending);
    assert_eq!(stored.processor_id, None);
    for uid in controller.uids(&item).unwrap() {
        assert!(!uid.failed);
        assert_eq!(uid.failure_count, 0);
    }
}

#[test]
fn test_reset_refuses_active_entry() {
    let store = common::new_store();
    let partition = common::add_partition(&store, "RESET_NO");
    let controller = WorkQueueController::new(store.clone());
    let item = common::add_item(&store, &partition, WorkQueueType::StudyProcess);
    let item = common::set_state(&store, &item, WorkQueueStatus::Idle, None, Some(Utc::now()));

    let changed = controller.reset_items(&[item.clone()], Utc::now(), None).unwrap();

    assert!(!changed);
    let stored = controller.get(&item.key).unwrap().unwrap();
    assert_eq!(stored.work_queue_status, WorkQueueStatus::Idle);
}

#[test]
fn test_reprocess_replaces_failed_entry_and_keeps_uids() {
    let store = common::new_store();
    let partition = common::add_partition(&store, "REPROC");
    let controller = WorkQueueController::new(store.clone());
    let item = common::add_item(&store, &partition, WorkQueueType::StudyProcess);
    common::add_uids(&store, &item, 3);
    let item = common::set_state(&store, &item, WorkQueueStatus::Failed, None, None);

    assert!(controller.reprocess_item(&item).unwrap());

    assert!(controller.get(&item.key).unwrap().is_none());
    let replacements = controller
        .find(&SelectCriteria::new().equal_to(WorkQueueField::StudyStorageKey, &item.study_storage_key))
        .unwrap();
    assert_eq!(replacements.len(), 1);
    let replacement = &replacements[0];
    assert_eq!(replacement.work_queue_type, WorkQueueType::ReprocessStudy);
    assert_eq!(replacement.work_queue_status, WorkQueueStatus::Pending);
    assert_eq!(controller.uids(replacement).unwrap().len(), 3);
}

#[test]
fn test_reprocess_ignores_entries_that_did_not_fail() {
    let store = common::new_store();
    let partition = common::add_partition(&store, "REPROC_NO");
    let controller = WorkQueueController::new(store.clone());
    let item = common::add_item(&store, &partition, WorkQueueType::StudyProcess);

    assert!(!controller.reprocess_item(&item).unwrap());
    assert!(controller.get(&item.key).unwrap().is_some());
}

#[test]
fn test_overview_counts_entries_per_processor() {
    let store = common::new_store();
    let partition = common::add_partition(&store, "OVERVIEW");
    let controller = WorkQueueController::new(store.clone());
    for processor in ["node-a", "node-a", "node-b"] {
        let item = common::add_item(&store, &partition, WorkQueueType::StudyProcess);
        common::set_state(&store, &item, WorkQueueStatus::InProgress, Some(processor), None);
    }
    common::add_item(&store, &partition, WorkQueueType::StudyProcess);

    let overview = controller.overview().unwrap();

    assert_eq!(overview.len(), 2);
    assert_eq!(overview["node-a"], 2);
    assert_eq!(overview["node-b"], 1);
}
