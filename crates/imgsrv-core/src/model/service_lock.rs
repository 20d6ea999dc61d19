use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::codes::{code_enum, entity_fields};
use super::{Entity, EntityKey};
use crate::criteria::UpdateColumns;

code_enum! {
    /// Scheduled maintenance services guarded by a lock row
    ServiceLockType {
        FilesystemDelete => "FilesystemDelete",
        FilesystemReinventory => "FilesystemReinventory",
        FilesystemStudyProcess => "FilesystemStudyProcess",
        FilesystemLosslessCompress => "FilesystemLosslessCompress",
        FilesystemRebuildXml => "FilesystemRebuildXml",
        PurgeAlerts => "PurgeAlerts",
        ImportFiles => "ImportFiles",
    }
}

/// Schedule and exclusive lock for one maintenance service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceLock {
    pub key: EntityKey,
    pub service_lock_type: ServiceLockType,
    pub locked: bool,
    pub scheduled_time: DateTime<Utc>,
    pub enabled: bool,
    pub filesystem_key: Option<EntityKey>,
    pub processor_id: Option<String>,
}

entity_fields! {
    /// Columns of [`ServiceLock`]
    ServiceLockField {
        Key => "key",
        ServiceLockType => "service_lock_type",
        Locked => "locked",
        ScheduledTime => "scheduled_time",
        Enabled => "enabled",
        FilesystemKey => "filesystem_key",
        ProcessorId => "processor_id",
    }
}

impl Entity for ServiceLock {
    type Field = ServiceLockField;
    const NAME: &'static str = "ServiceLock";
    const TABLE: &'static str = "service_lock";

    fn key(&self) -> &EntityKey {
        &self.key
    }
}

impl ServiceLock {
    pub fn columns(
        lock_type: ServiceLockType,
        scheduled_time: DateTime<Utc>,
    ) -> UpdateColumns<ServiceLock> {
        UpdateColumns::new()
            .set(ServiceLockField::ServiceLockType, lock_type)
            .set(ServiceLockField::ScheduledTime, scheduled_time)
    }

    pub fn to_columns(&self) -> UpdateColumns<ServiceLock> {
        use ServiceLockField as F;
        UpdateColumns::new()
            .set(F::ServiceLockType, self.service_lock_type)
            .set(F::Locked, self.locked)
            .set(F::ScheduledTime, self.scheduled_time)
            .set(F::Enabled, self.enabled)
            .set(F::FilesystemKey, self.filesystem_key.as_ref())
            .set(F::ProcessorId, self.processor_id.as_deref())
    }
}
