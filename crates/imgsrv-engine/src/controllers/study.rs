//! Study browsing and study-level requests on behalf of a user

use chrono::{Duration, Utc};
use imgsrv_core::errors::Result;
use imgsrv_core::model::{
    Device, EntityKey, Study, WorkQueue, WorkQueueField, WorkQueueStatus, WorkQueueType,
};
use imgsrv_core::{DomainError, Entity, Principal, SelectCriteria, UpdateColumns};
use imgsrv_store::adaptor::WorkQueueAdaptor;
use imgsrv_store::{EntityAdaptor, PersistentStore, StudyAdaptor};

use super::logged;

/// A move request not picked up within this window expires
pub const MOVE_EXPIRATION_MINUTES: i64 = 4;

/// Study operations seen through the data-access rights of one principal
#[derive(Debug, Clone)]
pub struct StudyController {
    store: PersistentStore,
    studies: StudyAdaptor,
    work_queue: WorkQueueAdaptor,
}

impl StudyController {
    pub fn new(store: PersistentStore, principal: &Principal) -> Self {
        Self {
            studies: StudyAdaptor::for_principal(store.clone(), principal),
            work_queue: EntityAdaptor::new(store.clone()),
            store,
        }
    }

    pub fn studies(&self, criteria: &SelectCriteria<Study>) -> Result<Vec<Study>> {
        self.studies.find(criteria)
    }

    /// One page of visible studies; `start_index` is 0-based
    pub fn studies_range(
        &self,
        criteria: &SelectCriteria<Study>,
        start_index: usize,
        max_rows: usize,
    ) -> Result<Vec<Study>> {
        self.studies.find_range(criteria, start_index, max_rows)
    }

    pub fn study_count(&self, criteria: &SelectCriteria<Study>) -> Result<usize> {
        self.studies.count(criteria)
    }

    pub fn get(&self, key: &EntityKey) -> Result<Option<Study>> {
        self.studies.get(key)
    }

    /// `false` when the study is gone or not visible to the principal
    pub fn update_study(&self, study: &Study, columns: &UpdateColumns<Study>) -> Result<bool> {
        logged("update_study", || {
            let ctx = self.store.open_update_context()?;
            let changed = self.studies.update_in(&ctx, &study.key, columns)?;
            if changed {
                ctx.commit()?;
            }
            Ok(changed)
        })
    }

    pub fn is_scheduled_for_edit(&self, study: &Study) -> Result<bool> {
        self.is_in_work_queue(study, WorkQueueType::WebEditStudy)
    }

    pub fn is_scheduled_for_delete(&self, study: &Study) -> Result<bool> {
        self.is_in_work_queue(study, WorkQueueType::WebDeleteStudy)
    }

    fn is_in_work_queue(&self, study: &Study, kind: WorkQueueType) -> Result<bool> {
        let waiting = self.work_queue.count(
            &SelectCriteria::new()
                .equal_to(WorkQueueField::WorkQueueType, kind)
                .equal_to(WorkQueueField::ServerPartitionKey, &study.server_partition_key)
                .equal_to(WorkQueueField::StudyStorageKey, &study.study_storage_key)
                .is_in(
                    WorkQueueField::WorkQueueStatus,
                    [WorkQueueStatus::Pending, WorkQueueStatus::Idle],
                ),
        )?;
        Ok(waiting > 0)
    }

    /// Queue a request to send the study to `device`
    ///
    /// # Errors
    ///
    /// `NotFound` when the study is not visible to the principal.
    pub fn move_study(&self, study: &Study, device: &Device) -> Result<WorkQueue> {
        logged("move_study", || {
            let ctx = self.store.open_update_context()?;
            if self.studies.get_in(&ctx, &study.key)?.is_none() {
                return Err(DomainError::EntityNotFound {
                    entity: Study::NAME,
                    key: study.key.to_string(),
                }
                .into());
            }
            let scheduled = Utc::now();
            let columns = WorkQueue::columns(
                &study.server_partition_key,
                &study.study_storage_key,
                WorkQueueType::WebMoveStudy,
                scheduled,
            )
            .set(WorkQueueField::FailureCount, 0)
            .set(WorkQueueField::DeviceKey, &device.key)
            .set(
                WorkQueueField::ExpirationTime,
                scheduled + Duration::minutes(MOVE_EXPIRATION_MINUTES),
            );
            let entry = self.work_queue.add_in(&ctx, &columns)?;
            ctx.commit()?;
            Ok(entry)
        })
    }
}
