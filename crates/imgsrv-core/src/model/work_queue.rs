use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::codes::{code_enum, entity_fields};
use super::{Entity, EntityKey};
use crate::criteria::UpdateColumns;

code_enum! {
    /// Kind of job a work queue entry asks the processing service to run
    WorkQueueType {
        StudyProcess => "StudyProcess",
        AutoRoute => "AutoRoute",
        DeleteStudy => "DeleteStudy",
        WebDeleteStudy => "WebDeleteStudy",
        WebMoveStudy => "WebMoveStudy",
        WebEditStudy => "WebEditStudy",
        CleanupStudy => "CleanupStudy",
        CompressStudy => "CompressStudy",
        MigrateStudy => "MigrateStudy",
        PurgeStudy => "PurgeStudy",
        ReprocessStudy => "ReprocessStudy",
        ReconcileStudy => "ReconcileStudy",
    }
}

code_enum! {
    /// Processing state of a work queue entry
    WorkQueueStatus {
        Idle => "Idle",
        Pending => "Pending",
        InProgress => "In Progress",
        Completed => "Completed",
        Failed => "Failed",
    }
}

code_enum! {
    WorkQueuePriority {
        Low => "Low",
        Medium => "Medium",
        High => "High",
        Stat => "Stat",
    }
}

impl WorkQueueStatus {
    /// Completed and Failed entries are never picked up again
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkQueueStatus::Completed | WorkQueueStatus::Failed)
    }
}

/// An asynchronous job record consumed by the processing service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkQueue {
    pub key: EntityKey,
    pub server_partition_key: EntityKey,
    pub study_storage_key: EntityKey,
    pub work_queue_type: WorkQueueType,
    pub work_queue_status: WorkQueueStatus,
    pub work_queue_priority: WorkQueuePriority,
    /// Id of the processor that claimed the entry
    pub processor_id: Option<String>,
    pub scheduled_time: DateTime<Utc>,
    pub expiration_time: Option<DateTime<Utc>>,
    pub inserted_time: DateTime<Utc>,
    pub last_updated_time: Option<DateTime<Utc>>,
    pub failure_count: i32,
    pub failure_description: Option<String>,
    pub device_key: Option<EntityKey>,
}

entity_fields! {
    /// Columns of [`WorkQueue`]
    WorkQueueField {
        Key => "key",
        ServerPartitionKey => "server_partition_key",
        StudyStorageKey => "study_storage_key",
        WorkQueueType => "work_queue_type",
        WorkQueueStatus => "work_queue_status",
        WorkQueuePriority => "work_queue_priority",
        ProcessorId => "processor_id",
        ScheduledTime => "scheduled_time",
        ExpirationTime => "expiration_time",
        InsertedTime => "inserted_time",
        LastUpdatedTime => "last_updated_time",
        FailureCount => "failure_count",
        FailureDescription => "failure_description",
        DeviceKey => "device_key",
    }
}

impl Entity for WorkQueue {
    type Field = WorkQueueField;
    const NAME: &'static str = "WorkQueue";
    const TABLE: &'static str = "work_queue";

    fn key(&self) -> &EntityKey {
        &self.key
    }
}

impl WorkQueue {
    /// Columns for a new pending entry scheduled at `scheduled_time`
    pub fn columns(
        partition: &EntityKey,
        study_storage: &EntityKey,
        work_queue_type: WorkQueueType,
        scheduled_time: DateTime<Utc>,
    ) -> UpdateColumns<WorkQueue> {
        UpdateColumns::new()
            .set(WorkQueueField::ServerPartitionKey, partition)
            .set(WorkQueueField::StudyStorageKey, study_storage)
            .set(WorkQueueField::WorkQueueType, work_queue_type)
            .set(WorkQueueField::WorkQueueStatus, WorkQueueStatus::Pending)
            .set(WorkQueueField::ScheduledTime, scheduled_time)
            .set(WorkQueueField::InsertedTime, scheduled_time)
    }

    pub fn to_columns(&self) -> UpdateColumns<WorkQueue> {
        use WorkQueueField as F;
        UpdateColumns::new()
            .set(F::ServerPartitionKey, &self.server_partition_key)
            .set(F::StudyStorageKey, &self.study_storage_key)
            .set(F::WorkQueueType, self.work_queue_type)
            .set(F::WorkQueueStatus, self.work_queue_status)
            .set(F::WorkQueuePriority, self.work_queue_priority)
            .set(F::ProcessorId, self.processor_id.as_deref())
            .set(F::ScheduledTime, self.scheduled_time)
            .set(F::ExpirationTime, self.expiration_time)
            .set(F::InsertedTime, self.inserted_time)
            .set(F::LastUpdatedTime, self.last_updated_time)
            .set(F::FailureCount, self.failure_count)
            .set(F::FailureDescription, self.failure_description.as_deref())
            .set(F::DeviceKey, self.device_key.as_ref())
    }

    /// Whether a processor has claimed this entry
    pub fn is_claimed(&self) -> bool {
        self.processor_id
            .as_deref()
            .map(|id| !id.is_empty())
            .unwrap_or(false)
    }
}

/// One SOP instance belonging to a work queue entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkQueueUid {
    pub key: EntityKey,
    pub work_queue_key: EntityKey,
    pub series_instance_uid: String,
    pub sop_instance_uid: String,
    pub failed: bool,
    pub failure_count: i32,
}

entity_fields! {
    /// Columns of [`WorkQueueUid`]
    WorkQueueUidField {
        Key => "key",
        WorkQueueKey => "work_queue_key",
        SeriesInstanceUid => "series_instance_uid",
        SopInstanceUid => "sop_instance_uid",
        Failed => "failed",
        FailureCount => "failure_count",
    }
}

impl Entity for WorkQueueUid {
    type Field = WorkQueueUidField;
    const NAME: &'static str = "WorkQueueUid";
    const TABLE: &'static str = "work_queue_uid";

    fn key(&self) -> &EntityKey {
        &self.key
    }
}

impl WorkQueueUid {
    pub fn columns(
        work_queue: &EntityKey,
        series_instance_uid: impl Into<String>,
        sop_instance_uid: impl Into<String>,
    ) -> UpdateColumns<WorkQueueUid> {
        UpdateColumns::new()
            .set(WorkQueueUidField::WorkQueueKey, work_queue)
            .set(WorkQueueUidField::SeriesInstanceUid, series_instance_uid.into())
            .set(WorkQueueUidField::SopInstanceUid, sop_instance_uid.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_progress_code_has_space() {
        assert_eq!(WorkQueueStatus::InProgress.as_str(), "In Progress");
        assert_eq!(
            "In Progress".parse::<WorkQueueStatus>().unwrap(),
            WorkQueueStatus::InProgress
        );
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(WorkQueueStatus::Completed.is_terminal());
        assert!(WorkQueueStatus::Failed.is_terminal());
        assert!(!WorkQueueStatus::Pending.is_terminal());
    }

    #[test]
    fn test_status_serializes_as_code() {
        let json = serde_json::to_string(&WorkQueueStatus::InProgress).unwrap();
        assert_eq!(json, "\"In Progress\"");
    }
}
