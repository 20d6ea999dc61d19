//! Entity-specific adaptors
//!
//! Each is the generic adaptor plus lookups that entity is commonly queried
//! by and a `save` that writes a whole domain object back under its key.

use chrono::{DateTime, Utc};
use imgsrv_core::errors::Result;
use imgsrv_core::model::{
    DataAccessGroup, DataAccessGroupField, Device, DeviceField, EntityKey, Filesystem,
    FilesystemField, FilesystemTier, ServerPartition, ServerPartitionDataAccess,
    ServerPartitionDataAccessField, ServerPartitionField, ServiceLock, ServiceLockField,
    ServiceLockType, StudyDataAccess, StudyDataAccessField, WorkQueue, WorkQueueField,
    WorkQueueStatus, WorkQueueUid, WorkQueueUidField,
};
use imgsrv_core::SelectCriteria;

use super::EntityAdaptor;
use crate::context::{PersistenceContext, UpdateContext};

pub type ServerPartitionAdaptor = EntityAdaptor<ServerPartition>;
pub type DeviceAdaptor = EntityAdaptor<Device>;
pub type FilesystemAdaptor = EntityAdaptor<Filesystem>;
pub type ServiceLockAdaptor = EntityAdaptor<ServiceLock>;
pub type WorkQueueAdaptor = EntityAdaptor<WorkQueue>;
pub type WorkQueueUidAdaptor = EntityAdaptor<WorkQueueUid>;
pub type DataAccessGroupAdaptor = EntityAdaptor<DataAccessGroup>;
pub type StudyDataAccessAdaptor = EntityAdaptor<StudyDataAccess>;
pub type ServerPartitionDataAccessAdaptor = EntityAdaptor<ServerPartitionDataAccess>;

impl EntityAdaptor<ServerPartition> {
    pub fn find_by_ae_title(&self, ae_title: &str) -> Result<Option<ServerPartition>> {
        self.find_one(&by_partition_ae_title(ae_title))
    }

    pub fn find_by_ae_title_in(
        &self,
        ctx: &impl PersistenceContext,
        ae_title: &str,
    ) -> Result<Option<ServerPartition>> {
        self.find_one_in(ctx, &by_partition_ae_title(ae_title))
    }

    /// All partitions ordered by AE title
    pub fn find_sorted(&self) -> Result<Vec<ServerPartition>> {
        self.find(&SelectCriteria::new().sort_asc(ServerPartitionField::AeTitle))
    }

    pub fn save(&self, partition: &ServerPartition) -> Result<bool> {
        self.update(&partition.key, &partition.to_columns())
    }

    pub fn save_in(&self, ctx: &UpdateContext<'_>, partition: &ServerPartition) -> Result<bool> {
        self.update_in(ctx, &partition.key, &partition.to_columns())
    }
}

fn by_partition_ae_title(ae_title: &str) -> SelectCriteria<ServerPartition> {
    SelectCriteria::new().equal_to(ServerPartitionField::AeTitle, ae_title)
}

impl EntityAdaptor<Device> {
    /// Devices of a partition ordered by AE title
    pub fn find_by_partition(&self, partition: &EntityKey) -> Result<Vec<Device>> {
        self.find(
            &SelectCriteria::new()
                .equal_to(DeviceField::ServerPartitionKey, partition)
                .sort_asc(DeviceField::AeTitle),
        )
    }

    pub fn find_by_ae_title_in(
        &self,
        ctx: &impl PersistenceContext,
        partition: &EntityKey,
        ae_title: &str,
    ) -> Result<Option<Device>> {
        self.find_one_in(
            ctx,
            &SelectCriteria::new()
                .equal_to(DeviceField::ServerPartitionKey, partition)
                .equal_to(DeviceField::AeTitle, ae_title),
        )
    }

    pub fn save(&self, device: &Device) -> Result<bool> {
        self.update(&device.key, &device.to_columns())
    }
}

impl EntityAdaptor<Filesystem> {
    pub fn find_by_tier(&self, tier: FilesystemTier) -> Result<Vec<Filesystem>> {
        self.find(
            &SelectCriteria::new()
                .equal_to(FilesystemField::FilesystemTier, tier)
                .sort_asc(FilesystemField::FilesystemPath),
        )
    }

    /// Enabled filesystems that accept new files
    pub fn find_writable(&self) -> Result<Vec<Filesystem>> {
        self.find(
            &SelectCriteria::new()
                .equal_to(FilesystemField::Enabled, true)
                .equal_to(FilesystemField::ReadOnly, false),
        )
    }

    pub fn save(&self, filesystem: &Filesystem) -> Result<bool> {
        self.update(&filesystem.key, &filesystem.to_columns())
    }
}

impl EntityAdaptor<ServiceLock> {
    pub fn find_by_type(&self, lock_type: ServiceLockType) -> Result<Vec<ServiceLock>> {
        self.find(&SelectCriteria::new().equal_to(ServiceLockField::ServiceLockType, lock_type))
    }

    /// Enabled, unlocked entries scheduled at or before `now`, oldest first
    pub fn find_due(&self, now: DateTime<Utc>) -> Result<Vec<ServiceLock>> {
        self.find(
            &SelectCriteria::new()
                .equal_to(ServiceLockField::Enabled, true)
                .equal_to(ServiceLockField::Locked, false)
                .less_or_equal(ServiceLockField::ScheduledTime, now)
                .sort_asc(ServiceLockField::ScheduledTime),
        )
    }

    pub fn save(&self, lock: &ServiceLock) -> Result<bool> {
        self.update(&lock.key, &lock.to_columns())
    }
}

impl EntityAdaptor<WorkQueue> {
    pub fn find_by_status(&self, status: WorkQueueStatus) -> Result<Vec<WorkQueue>> {
        self.find(
            &SelectCriteria::new()
                .equal_to(WorkQueueField::WorkQueueStatus, status)
                .sort_asc(WorkQueueField::ScheduledTime),
        )
    }

    pub fn find_by_study_storage_in(
        &self,
        ctx: &impl PersistenceContext,
        study_storage: &EntityKey,
    ) -> Result<Vec<WorkQueue>> {
        self.find_in(
            ctx,
            &SelectCriteria::new()
                .equal_to(WorkQueueField::StudyStorageKey, study_storage)
                .sort_asc(WorkQueueField::ScheduledTime),
        )
    }

    pub fn save(&self, item: &WorkQueue) -> Result<bool> {
        self.update(&item.key, &item.to_columns())
    }
}

impl EntityAdaptor<WorkQueueUid> {
    pub fn find_by_work_queue(&self, work_queue: &EntityKey) -> Result<Vec<WorkQueueUid>> {
        self.find(&by_work_queue(work_queue))
    }

    /// Delete the UIDs of one work queue entry; `false` when it had none
    pub fn delete_for_work_queue_in(
        &self,
        ctx: &UpdateContext<'_>,
        work_queue: &EntityKey,
    ) -> Result<bool> {
        self.delete_where_in(ctx, &by_work_queue(work_queue))
    }
}

fn by_work_queue(work_queue: &EntityKey) -> SelectCriteria<WorkQueueUid> {
    SelectCriteria::new().equal_to(WorkQueueUidField::WorkQueueKey, work_queue)
}

impl EntityAdaptor<DataAccessGroup> {
    pub fn find_by_oid_in(
        &self,
        ctx: &impl PersistenceContext,
        authority_group_oid: &str,
    ) -> Result<Option<DataAccessGroup>> {
        self.find_one_in(
            ctx,
            &SelectCriteria::new().equal_to(DataAccessGroupField::AuthorityGroupOid, authority_group_oid),
        )
    }
}

impl EntityAdaptor<StudyDataAccess> {
    pub fn find_by_study_storage(&self, study_storage: &EntityKey) -> Result<Vec<StudyDataAccess>> {
        self.find(&SelectCriteria::new().equal_to(StudyDataAccessField::StudyStorageKey, study_storage))
    }
}

impl EntityAdaptor<ServerPartitionDataAccess> {
    pub fn find_by_partition_in(
        &self,
        ctx: &impl PersistenceContext,
        partition: &EntityKey,
    ) -> Result<Vec<ServerPartitionDataAccess>> {
        self.find_in(ctx, &by_partition_access(partition))
    }

    pub fn delete_for_partition_in(&self, ctx: &UpdateContext<'_>, partition: &EntityKey) -> Result<bool> {
        self.delete_where_in(ctx, &by_partition_access(partition))
    }
}

fn by_partition_access(partition: &EntityKey) -> SelectCriteria<ServerPartitionDataAccess> {
    SelectCriteria::new().equal_to(ServerPartitionDataAccessField::ServerPartitionKey, partition)
}
