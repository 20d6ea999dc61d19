use chrono::{DateTime, Utc};
use imgsrv_core::model::{
    EntityKey, ServerPartition, Study, WorkQueue, WorkQueueField, WorkQueueStatus, WorkQueueType,
    WorkQueueUid,
};
use imgsrv_core::UpdateColumns;
use imgsrv_engine::{PartitionSettings, ServerPartitionController};
use imgsrv_store::adaptor::{WorkQueueAdaptor, WorkQueueUidAdaptor};
use imgsrv_store::{EntityAdaptor, PersistentStore};

#[allow(dead_code)]
pub fn new_store() -> PersistentStore {
    PersistentStore::open_in_memory().expect("in-memory store should open")
}

#[allow(dead_code)]
pub fn add_partition(store: &PersistentStore, ae_title: &str) -> ServerPartition {
    ServerPartitionController::new(store.clone())
        .add_partition(
            &PartitionSettings::new(ae_title, ae_title.to_lowercase(), 104),
            &[],
        )
        .expect("partition insert should succeed")
}

#[allow(dead_code)]
pub fn add_study(store: &PersistentStore, partition: &ServerPartition, uid: &str) -> Study {
    EntityAdaptor::<Study>::new(store.clone())
        .add(&Study::columns(&partition.key, &EntityKey::generate(), uid))
        .expect("study insert should succeed")
}

/// Pending entry for a fresh study storage, scheduled now
#[allow(dead_code)]
pub fn add_item(store: &PersistentStore, partition: &ServerPartition, kind: WorkQueueType) -> WorkQueue {
    let queue: WorkQueueAdaptor = EntityAdaptor::new(store.clone());
    queue
        .add(&WorkQueue::columns(
            &partition.key,
            &EntityKey::generate(),
            kind,
            Utc::now(),
        ))
        .expect("work queue insert should succeed")
}

/// Force an entry into a state and return it as stored
#[allow(dead_code)]
pub fn set_state(
    store: &PersistentStore,
    item: &WorkQueue,
    status: WorkQueueStatus,
    processor: Option<&str>,
    last_updated: Option<DateTime<Utc>>,
) -> WorkQueue {
    let queue: WorkQueueAdaptor = EntityAdaptor::new(store.clone());
    let changed = queue
        .update(
            &item.key,
            &UpdateColumns::new()
                .set(WorkQueueField::WorkQueueStatus, status)
                .set(WorkQueueField::ProcessorId, processor)
                .set(WorkQueueField::LastUpdatedTime, last_updated),
        )
        .expect("state update should succeed");
    assert!(changed);
    queue
        .get(&item.key)
        .expect("reload should succeed")
        .expect("entry should exist")
}

#[allow(dead_code)]
pub fn add_uids(store: &PersistentStore, item: &WorkQueue, count: usize) -> Vec<WorkQueueUid> {
    let uids: WorkQueueUidAdaptor = EntityAdaptor::new(store.clone());
    (0..count)
        .map(|i| {
            uids.add(&WorkQueueUid::columns(
                &item.key,
                "1.2.840.1",
                format!("1.2.840.1.{}", i),
            ))
            .expect("uid insert should succeed")
        })
        .collect()
}
