//! Manual intervention rules for work queue entries

use chrono::{DateTime, Duration, Utc};

use crate::model::{WorkQueue, WorkQueueStatus, WorkQueueType};

/// An unfinished entry untouched for this long is considered stuck
pub const INACTIVITY_TIMEOUT_MINUTES: i64 = 20;

/// Whether the processing service is still plausibly working on the entry
///
/// Terminal entries are never active. Others are active while either their
/// last update or their scheduled time is within the inactivity timeout.
pub fn is_active(item: &WorkQueue, now: DateTime<Utc>) -> bool {
    if item.work_queue_status.is_terminal() {
        return false;
    }
    let horizon = now - Duration::minutes(INACTIVITY_TIMEOUT_MINUTES);
    let recently_updated = item
        .last_updated_time
        .map(|t| t > horizon)
        .unwrap_or(false);
    recently_updated || item.scheduled_time > horizon
}

/// Pending and idle entries can be given a new schedule
pub fn can_reschedule(item: &WorkQueue) -> bool {
    matches!(
        item.work_queue_status,
        WorkQueueStatus::Pending | WorkQueueStatus::Idle
    )
}

pub fn can_reset(item: &WorkQueue, now: DateTime<Utc>) -> bool {
    match item.work_queue_status {
        WorkQueueStatus::Failed => true,
        WorkQueueStatus::InProgress => !item.is_claimed(),
        _ => !is_active(item, now),
    }
}

pub fn can_delete(item: &WorkQueue, now: DateTime<Utc>) -> bool {
    match item.work_queue_status {
        WorkQueueStatus::Failed | WorkQueueStatus::Completed => true,
        WorkQueueStatus::InProgress => !item.is_claimed(),
        _ => {
            matches!(
                item.work_queue_type,
                WorkQueueType::WebMoveStudy
                    | WorkQueueType::WebEditStudy
                    | WorkQueueType::AutoRoute
                    | WorkQueueType::WebDeleteStudy
            ) || !is_active(item, now)
        }
    }
}

/// Only failed study-processing entries can be reprocessed
pub fn can_reprocess(item: &WorkQueue) -> bool {
    item.work_queue_status == WorkQueueStatus::Failed
        && item.work_queue_type == WorkQueueType::StudyProcess
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EntityKey, WorkQueuePriority};

    fn item(status: WorkQueueStatus, kind: WorkQueueType, now: DateTime<Utc>) -> WorkQueue {
        WorkQueue {
            key: EntityKey::generate(),
            server_partition_key: EntityKey::generate(),
            study_storage_key: EntityKey::generate(),
            work_queue_type: kind,
            work_queue_status: status,
            work_queue_priority: WorkQueuePriority::Medium,
            processor_id: None,
            scheduled_time: now,
            expiration_time: None,
            inserted_time: now,
            last_updated_time: Some(now),
            failure_count: 0,
            failure_description: None,
            device_key: None,
        }
    }

    #[test]
    fn test_reschedule_only_pending_or_idle() {
        let now = Utc::now();
        assert!(can_reschedule(&item(WorkQueueStatus::Pending, WorkQueueType::StudyProcess, now)));
        assert!(can_reschedule(&item(WorkQueueStatus::Idle, WorkQueueType::StudyProcess, now)));
        assert!(!can_reschedule(&item(WorkQueueStatus::Failed, WorkQueueType::StudyProcess, now)));
    }

    #[test]
    fn test_reset_failed_and_unclaimed() {
        let now = Utc::now();
        assert!(can_reset(&item(WorkQueueStatus::Failed, WorkQueueType::StudyProcess, now), now));

        let mut claimed = item(WorkQueueStatus::InProgress, WorkQueueType::StudyProcess, now);
        claimed.processor_id = Some("node-1".into());
        assert!(!can_reset(&claimed, now));
        claimed.processor_id = None;
        assert!(can_reset(&claimed, now));
    }

    #[test]
    fn test_reset_refuses_active_pending_but_allows_stuck() {
        let now = Utc::now();
        let active = item(WorkQueueStatus::Pending, WorkQueueType::StudyProcess, now);
        assert!(!can_reset(&active, now));

        let mut stuck = active.clone();
        stuck.scheduled_time = now - Duration::hours(2);
        stuck.last_updated_time = Some(now - Duration::hours(2));
        assert!(can_reset(&stuck, now));
    }

    #[test]
    fn test_delete_web_initiated_pending() {
        let now = Utc::now();
        assert!(can_delete(&item(WorkQueueStatus::Pending, WorkQueueType::WebMoveStudy, now), now));
        assert!(!can_delete(&item(WorkQueueStatus::Pending, WorkQueueType::StudyProcess, now), now));
        assert!(can_delete(&item(WorkQueueStatus::Completed, WorkQueueType::StudyProcess, now), now));
    }

    #[test]
    fn test_reprocess_requires_failed_study_process() {
        let now = Utc::now();
        assert!(can_reprocess(&item(WorkQueueStatus::Failed, WorkQueueType::StudyProcess, now)));
        assert!(!can_reprocess(&item(WorkQueueStatus::Failed, WorkQueueType::AutoRoute, now)));
        assert!(!can_reprocess(&item(WorkQueueStatus::Pending, WorkQueueType::StudyProcess, now)));
    }
}
