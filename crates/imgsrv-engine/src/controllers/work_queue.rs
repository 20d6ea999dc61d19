//! Manual work queue intervention
//!
//! Every batch operation is all-or-nothing: it reloads each entry inside one
//! update context, checks the intervention rule against the stored state and
//! commits only if every entry passed. A refused or vanished entry makes the
//! whole batch return `false` with nothing written. An entry listed more than
//! once in a batch is handled once.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use imgsrv_core::errors::Result;
use imgsrv_core::model::{
    EntityKey, Value, WorkQueue, WorkQueueField, WorkQueuePriority, WorkQueueStatus,
    WorkQueueType, WorkQueueUid, WorkQueueUidField,
};
use imgsrv_core::rules::work_queue as rules;
use imgsrv_core::{SelectCriteria, UpdateColumns};
use imgsrv_store::adaptor::{WorkQueueAdaptor, WorkQueueUidAdaptor};
use imgsrv_store::{EntityAdaptor, PersistentStore, UpdateContext};

use super::logged;

/// Work queue operations for the administration surface
#[derive(Debug, Clone)]
pub struct WorkQueueController {
    store: PersistentStore,
    items: WorkQueueAdaptor,
    uids: WorkQueueUidAdaptor,
}

impl WorkQueueController {
    pub fn new(store: PersistentStore) -> Self {
        Self {
            items: EntityAdaptor::new(store.clone()),
            uids: EntityAdaptor::new(store.clone()),
            store,
        }
    }

    pub fn find(&self, criteria: &SelectCriteria<WorkQueue>) -> Result<Vec<WorkQueue>> {
        self.items.find(criteria)
    }

    pub fn get(&self, key: &EntityKey) -> Result<Option<WorkQueue>> {
        self.items.get(key)
    }

    pub fn uids(&self, item: &WorkQueue) -> Result<Vec<WorkQueueUid>> {
        self.uids.find_by_work_queue(&item.key)
    }

    /// Delete entries together with their UIDs
    ///
    /// Returns `false` for an empty batch or when any entry no longer exists;
    /// in both cases nothing is deleted.
    pub fn delete_items(&self, items: &[WorkQueue]) -> Result<bool> {
        if items.is_empty() {
            return Ok(false);
        }
        logged("delete_work_queue_items", || {
            let ctx = self.store.open_update_context()?;
            for key in distinct_keys(items) {
                self.uids.delete_for_work_queue_in(&ctx, key)?;
                if !self.items.delete_in(&ctx, key)? {
                    tracing::debug!(key = key.as_str(), "work queue entry vanished");
                    return Ok(false);
                }
            }
            ctx.commit()?;
            Ok(true)
        })
    }

    /// Give entries a new schedule and clear their failure state
    ///
    /// `priority` of `None` keeps each entry's current priority. Only pending
    /// and idle entries can be rescheduled.
    pub fn reschedule_items(
        &self,
        items: &[WorkQueue],
        scheduled: DateTime<Utc>,
        expiration: Option<DateTime<Utc>>,
        priority: Option<WorkQueuePriority>,
    ) -> Result<bool> {
        if items.is_empty() {
            return Ok(false);
        }
        let mut columns = UpdateColumns::new()
            .set(WorkQueueField::ScheduledTime, scheduled)
            .set(WorkQueueField::ExpirationTime, expiration)
            .set(WorkQueueField::FailureCount, 0)
            .set(WorkQueueField::FailureDescription, Value::Null)
            .set(WorkQueueField::LastUpdatedTime, Utc::now());
        if let Some(priority) = priority {
            columns.assign(WorkQueueField::WorkQueuePriority, priority);
        }

        logged("reschedule_work_queue_items", || {
            let ctx = self.store.open_update_context()?;
            for key in distinct_keys(items) {
                match self.items.get_in(&ctx, key)? {
                    Some(current) if rules::can_reschedule(&current) => {}
                    _ => return Ok(false),
                }
                if !self.items.update_in(&ctx, key, &columns)? {
                    return Ok(false);
                }
            }
            ctx.commit()?;
            Ok(true)
        })
    }

    /// Put entries back to pending so the processing service retries them
    ///
    /// Clears the processor claim and failure state of each entry and of its
    /// UIDs.
    pub fn reset_items(
        &self,
        items: &[WorkQueue],
        scheduled: DateTime<Utc>,
        expiration: Option<DateTime<Utc>>,
    ) -> Result<bool> {
        if items.is_empty() {
            return Ok(false);
        }
        let now = Utc::now();
        let columns = UpdateColumns::new()
            .set(WorkQueueField::WorkQueueStatus, WorkQueueStatus::Pending)
            .set(WorkQueueField::ProcessorId, Value::Null)
            .set(WorkQueueField::ScheduledTime, scheduled)
            .set(WorkQueueField::ExpirationTime, expiration)
            .set(WorkQueueField::FailureCount, 0)
            .set(WorkQueueField::FailureDescription, Value::Null)
            .set(WorkQueueField::LastUpdatedTime, now);
        let uid_columns = UpdateColumns::new()
            .set(WorkQueueUidField::Failed, false)
            .set(WorkQueueUidField::FailureCount, 0);

        logged("reset_work_queue_items", || {
            let ctx = self.store.open_update_context()?;
            for key in distinct_keys(items) {
                match self.items.get_in(&ctx, key)? {
                    Some(current) if rules::can_reset(&current, now) => {}
                    _ => return Ok(false),
                }
                self.items.update_in(&ctx, key, &columns)?;
                self.uids.update_where_in(
                    &ctx,
                    &SelectCriteria::new().equal_to(WorkQueueUidField::WorkQueueKey, key),
                    &uid_columns,
                )?;
            }
            ctx.commit()?;
            Ok(true)
        })
    }

    /// Replace a failed study-processing entry with a reprocess entry
    ///
    /// The new entry takes over the instances the failed one still had.
    /// Returns `false` when the entry is gone or not eligible.
    pub fn reprocess_item(&self, item: &WorkQueue) -> Result<bool> {
        logged("reprocess_work_queue_item", || {
            let ctx = self.store.open_update_context()?;
            let current = match self.items.get_in(&ctx, &item.key)? {
                Some(current) if rules::can_reprocess(&current) => current,
                _ => return Ok(false),
            };

            let remaining = self.uids.find_in(
                &ctx,
                &SelectCriteria::new().equal_to(WorkQueueUidField::WorkQueueKey, &current.key),
            )?;
            self.uids.delete_for_work_queue_in(&ctx, &current.key)?;
            if !self.items.delete_in(&ctx, &current.key)? {
                return Ok(false);
            }

            let replacement = self.queue_reprocess(&ctx, &current)?;
            for uid in &remaining {
                self.uids.add_in(
                    &ctx,
                    &WorkQueueUid::columns(
                        &replacement.key,
                        uid.series_instance_uid.as_str(),
                        uid.sop_instance_uid.as_str(),
                    ),
                )?;
            }
            tracing::debug!(
                failed = current.key.as_str(),
                replacement = replacement.key.as_str(),
                uids = remaining.len(),
                "queued reprocess"
            );
            ctx.commit()?;
            Ok(true)
        })
    }

    fn queue_reprocess(&self, ctx: &UpdateContext<'_>, failed: &WorkQueue) -> Result<WorkQueue> {
        let columns = WorkQueue::columns(
            &failed.server_partition_key,
            &failed.study_storage_key,
            WorkQueueType::ReprocessStudy,
            Utc::now(),
        )
        .set(
            WorkQueueField::FailureDescription,
            format!("User reprocesses failed {}", failed.work_queue_type),
        );
        self.items.add_in(ctx, &columns)
    }

    /// Number of entries claimed by each processor
    pub fn overview(&self) -> Result<BTreeMap<String, usize>> {
        let claimed = self
            .items
            .find(&SelectCriteria::new().is_not_null(WorkQueueField::ProcessorId))?;
        let mut counts = BTreeMap::new();
        for item in claimed {
            if let Some(processor) = item.processor_id.filter(|id| !id.is_empty()) {
                *counts.entry(processor).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }
}

/// Keys of `items` in first-seen order, without repeats
fn distinct_keys(items: &[WorkQueue]) -> Vec<&EntityKey> {
    let mut seen = BTreeSet::new();
    items
        .iter()
        .map(|item| &item.key)
        .filter(|key| seen.insert(*key))
        .collect()
}
