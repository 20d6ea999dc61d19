//! Entity model
//!
//! Every persisted record implements [`Entity`], naming its table and a
//! [`Field`] enum with one variant per column. Criteria and update columns are
//! typed by that enum, so a predicate on the wrong entity does not compile.

mod codes;
pub mod data_access;
pub mod device;
pub mod filesystem;
pub mod key;
pub mod partition;
pub mod service_lock;
pub mod study;
pub mod value;
pub mod work_queue;

pub use data_access::{
    DataAccessGroup, DataAccessGroupField, ServerPartitionDataAccess,
    ServerPartitionDataAccessField, StudyDataAccess, StudyDataAccessField,
};
pub use device::{Device, DeviceField, DeviceType};
pub use filesystem::{Filesystem, FilesystemField, FilesystemTier};
pub use key::EntityKey;
pub use partition::{DuplicateSopPolicy, ServerPartition, ServerPartitionField};
pub use service_lock::{ServiceLock, ServiceLockField, ServiceLockType};
pub use study::{Study, StudyField};
pub use value::Value;
pub use work_queue::{
    WorkQueue, WorkQueueField, WorkQueuePriority, WorkQueueStatus, WorkQueueType, WorkQueueUid,
    WorkQueueUidField,
};

/// A column of an entity's table
pub trait Field: Copy + Eq + std::hash::Hash + std::fmt::Debug + Send + Sync + 'static {
    /// The primary key column
    const KEY: Self;
    /// Every column, key first
    const ALL: &'static [Self];

    fn column(self) -> &'static str;
}

/// A persisted record
pub trait Entity: Clone + std::fmt::Debug + Send + 'static {
    type Field: Field;

    /// Type name used in logs and errors
    const NAME: &'static str;
    /// Table the entity is stored in
    const TABLE: &'static str;

    fn key(&self) -> &EntityKey;
}
