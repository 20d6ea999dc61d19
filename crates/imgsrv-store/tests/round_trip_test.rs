// Integration tests for adaptor round trips and the "no rows matched" paths

mod common;

use chrono::{Duration, Utc};
use imgsrv_core::model::{
    Device, DeviceField, DeviceType, DuplicateSopPolicy, EntityKey, ServerPartition,
    ServerPartitionField, WorkQueue, WorkQueueField, WorkQueueStatus, WorkQueueType,
};
use imgsrv_core::{ExErrorKind, SelectCriteria, UpdateColumns};
use imgsrv_store::adaptor::{DeviceAdaptor, ServerPartitionAdaptor, WorkQueueAdaptor};
use imgsrv_store::EntityAdaptor;

#[test]
fn test_add_then_get_returns_equal_entity() {
    // Given: A store and a partition adaptor
    let store = common::new_store();
    let partitions: ServerPartitionAdaptor = EntityAdaptor::new(store.clone());

    // When: A partition is added with a few non-default columns
    let added = partitions
        .add(
            &ServerPartition::columns("ARCHIVE", "archive", 11112)
                .set(ServerPartitionField::DuplicateSopPolicy, DuplicateSopPolicy::AcceptLatest)
                .set(ServerPartitionField::AuditDeleteStudy, true),
        )
        .unwrap();

    // Then: The key is set and the stored row reads back identically
    assert!(!added.key.as_str().is_empty());
    let loaded = partitions.get(&added.key).unwrap().expect("partition should exist");
    assert_eq!(loaded, added);
    assert_eq!(loaded.duplicate_sop_policy, DuplicateSopPolicy::AcceptLatest);
    assert!(loaded.audit_delete_study);
}

#[test]
fn test_unset_columns_take_table_defaults() {
    let store = common::new_store();
    let partition = common::add_partition(&store, "DEFAULTS");

    assert!(partition.enabled);
    assert_eq!(partition.default_remote_port, 104);
    assert_eq!(partition.duplicate_sop_policy, DuplicateSopPolicy::RejectDuplicates);
    assert!(!partition.audit_delete_study);
}

#[test]
fn test_timestamps_and_optional_keys_round_trip() {
    let store = common::new_store();
    let partition = common::add_partition(&store, "TIMES");
    let devices: DeviceAdaptor = EntityAdaptor::new(store.clone());
    let queue: WorkQueueAdaptor = EntityAdaptor::new(store.clone());

    let device = devices
        .add(
            &Device::columns(&partition.key, "CT01", "10.0.0.5", 104)
                .set(DeviceField::DeviceType, DeviceType::Modality),
        )
        .unwrap();

    let scheduled = Utc::now();
    let item = queue
        .add(
            &WorkQueue::columns(&partition.key, &EntityKey::generate(), WorkQueueType::AutoRoute, scheduled)
                .set(WorkQueueField::DeviceKey, &device.key)
                .set(WorkQueueField::ExpirationTime, scheduled + Duration::minutes(4)),
        )
        .unwrap();

    let loaded = queue.get(&item.key).unwrap().unwrap();
    assert_eq!(loaded, item);
    assert_eq!(loaded.device_key, Some(device.key.clone()));
    assert_eq!(loaded.scheduled_time.timestamp_millis(), scheduled.timestamp_millis());
    assert_eq!(loaded.work_queue_status, WorkQueueStatus::Pending);
    assert!(loaded.last_updated_time.is_none());
}

#[test]
fn test_delete_then_get_returns_none() {
    let store = common::new_store();
    let partition = common::add_partition(&store, "GONE");
    let devices: DeviceAdaptor = EntityAdaptor::new(store.clone());
    let device = devices
        .add(&Device::columns(&partition.key, "WS1", "10.0.0.9", 104))
        .unwrap();

    assert!(devices.delete(&device.key).unwrap());
    assert!(devices.get(&device.key).unwrap().is_none());

    // Deleting again matches nothing
    assert!(!devices.delete(&device.key).unwrap());
}

#[test]
fn test_update_unknown_key_returns_false_and_changes_nothing() {
    let store = common::new_store();
    let partition = common::add_partition(&store, "STABLE");
    let partitions: ServerPartitionAdaptor = EntityAdaptor::new(store.clone());

    let changed = partitions
        .update(
            &EntityKey::generate(),
            &UpdateColumns::new().set(ServerPartitionField::Description, "changed"),
        )
        .unwrap();

    assert!(!changed);
    assert_eq!(partitions.find_all().unwrap(), vec![partition]);
}

#[test]
fn test_update_where_without_match_returns_false_and_changes_nothing() {
    let store = common::new_store();
    let partition = common::add_partition(&store, "QUIET");
    let devices: DeviceAdaptor = EntityAdaptor::new(store.clone());
    let before = devices
        .add(&Device::columns(&partition.key, "WS2", "10.0.0.10", 104))
        .unwrap();

    let changed = devices
        .update_where(
            &SelectCriteria::new().equal_to(DeviceField::AeTitle, "NOBODY"),
            &UpdateColumns::new().set(DeviceField::Enabled, false),
        )
        .unwrap();

    assert!(!changed);
    assert_eq!(devices.get(&before.key).unwrap(), Some(before));
}

#[test]
fn test_update_writes_only_assigned_columns() {
    let store = common::new_store();
    let partition = common::add_partition(&store, "SPARSE");
    let devices: DeviceAdaptor = EntityAdaptor::new(store.clone());
    let device = devices
        .add(
            &Device::columns(&partition.key, "WS3", "10.0.0.11", 104)
                .set(DeviceField::Description, "reading room"),
        )
        .unwrap();

    let changed = devices
        .update(&device.key, &UpdateColumns::new().set(DeviceField::Port, 4006u16))
        .unwrap();

    assert!(changed);
    let loaded = devices.get(&device.key).unwrap().unwrap();
    assert_eq!(loaded.port, 4006);
    assert_eq!(loaded.description, "reading room");
}

#[test]
fn test_save_writes_whole_entity() {
    let store = common::new_store();
    let partition = common::add_partition(&store, "SAVE");
    let devices: DeviceAdaptor = EntityAdaptor::new(store.clone());
    let mut device = devices
        .add(&Device::columns(&partition.key, "WS4", "10.0.0.12", 104))
        .unwrap();

    device.allow_query = false;
    device.last_accessed_time = Some(Utc::now());
    assert!(devices.save(&device).unwrap());

    let loaded = devices.get(&device.key).unwrap().unwrap();
    assert!(!loaded.allow_query);
    assert_eq!(
        loaded.last_accessed_time.map(|t| t.timestamp_millis()),
        device.last_accessed_time.map(|t| t.timestamp_millis())
    );
}

#[test]
fn test_delete_where_removes_every_match() {
    let store = common::new_store();
    let partition = common::add_partition(&store, "BULK");
    let devices: DeviceAdaptor = EntityAdaptor::new(store.clone());
    for (ae, enabled) in [("A1", true), ("A2", false), ("A3", false)] {
        devices
            .add(&Device::columns(&partition.key, ae, "10.0.1.1", 104).set(DeviceField::Enabled, enabled))
            .unwrap();
    }

    let disabled = SelectCriteria::new().equal_to(DeviceField::Enabled, false);
    assert!(devices.delete_where(&disabled).unwrap());
    assert_eq!(devices.count(&disabled).unwrap(), 0);
    assert_eq!(devices.count(&SelectCriteria::new()).unwrap(), 1);
    assert!(!devices.delete_where(&disabled).unwrap());
}

#[test]
fn test_duplicate_ae_title_is_constraint_violation() {
    let store = common::new_store();
    common::add_partition(&store, "TWICE");
    let partitions: ServerPartitionAdaptor = EntityAdaptor::new(store.clone());

    let err = partitions
        .add(&ServerPartition::columns("TWICE", "twice2", 105))
        .unwrap_err();

    assert_eq!(err.kind(), ExErrorKind::ConstraintViolation);
    assert_eq!(err.entity(), Some("ServerPartition"));
    assert_eq!(partitions.count(&SelectCriteria::new()).unwrap(), 1);
}

#[test]
fn test_find_one_follows_sort_order() {
    let store = common::new_store();
    let partition = common::add_partition(&store, "SORTED");
    let devices: DeviceAdaptor = EntityAdaptor::new(store.clone());
    for ae in ["M3", "M1", "M2"] {
        devices
            .add(&Device::columns(&partition.key, ae, "10.0.2.1", 104))
            .unwrap();
    }

    let first = devices
        .find_one(&SelectCriteria::new().sort_asc(DeviceField::AeTitle))
        .unwrap()
        .unwrap();
    assert_eq!(first.ae_title, "M1");

    let last = devices
        .find_one(&SelectCriteria::new().sort_desc(DeviceField::AeTitle))
        .unwrap()
        .unwrap();
    assert_eq!(last.ae_title, "M3");

    let listed: Vec<_> = devices
        .find_by_partition(&partition.key)
        .unwrap()
        .into_iter()
        .map(|d| d.ae_title)
        .collect();
    assert_eq!(listed, vec!["M1", "M2", "M3"]);
}
