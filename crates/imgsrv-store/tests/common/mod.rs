use chrono::Utc;
use imgsrv_core::model::{
    DataAccessGroup, EntityKey, ServerPartition, Study, StudyDataAccess, WorkQueue, WorkQueueType,
};
use imgsrv_store::adaptor::{
    DataAccessGroupAdaptor, ServerPartitionAdaptor, StudyDataAccessAdaptor, WorkQueueAdaptor,
};
use imgsrv_store::{EntityAdaptor, PersistentStore};

/// Fresh migrated in-memory store
#[allow(dead_code)]
pub fn new_store() -> PersistentStore {
    PersistentStore::open_in_memory().expect("in-memory store should open")
}

#[allow(dead_code)]
pub fn add_partition(store: &PersistentStore, ae_title: &str) -> ServerPartition {
    let adaptor: ServerPartitionAdaptor = EntityAdaptor::new(store.clone());
    adaptor
        .add(&ServerPartition::columns(ae_title, ae_title.to_lowercase(), 104))
        .expect("partition insert should succeed")
}

/// Study with a fresh study storage key
#[allow(dead_code)]
pub fn add_study(store: &PersistentStore, partition: &ServerPartition, uid: &str) -> Study {
    let adaptor: EntityAdaptor<Study> = EntityAdaptor::new(store.clone());
    adaptor
        .add(&Study::columns(&partition.key, &EntityKey::generate(), uid))
        .expect("study insert should succeed")
}

#[allow(dead_code)]
pub fn add_work_queue(store: &PersistentStore, partition: &ServerPartition, kind: WorkQueueType) -> WorkQueue {
    let adaptor: WorkQueueAdaptor = EntityAdaptor::new(store.clone());
    adaptor
        .add(&WorkQueue::columns(
            &partition.key,
            &EntityKey::generate(),
            kind,
            Utc::now(),
        ))
        .expect("work queue insert should succeed")
}

/// Grant the authority group `oid` access to a study
#[allow(dead_code)]
pub fn grant(store: &PersistentStore, study: &Study, oid: &str) -> DataAccessGroup {
    let groups: DataAccessGroupAdaptor = EntityAdaptor::new(store.clone());
    let ctx = store.open_read_context().expect("read context");
    let existing = groups.find_by_oid_in(&ctx, oid).expect("group lookup");
    drop(ctx);

    let group = match existing {
        Some(group) => group,
        None => groups
            .add(&DataAccessGroup::columns(oid))
            .expect("group insert should succeed"),
    };

    let links: StudyDataAccessAdaptor = EntityAdaptor::new(store.clone());
    links
        .add(&StudyDataAccess::columns(&study.study_storage_key, &group.key))
        .expect("grant insert should succeed");
    group
}
