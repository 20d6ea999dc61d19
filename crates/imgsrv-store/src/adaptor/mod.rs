//! Generic entity adaptor
//!
//! [`EntityAdaptor`] gives uniform find/get/add/update/delete access to any
//! entity. Every operation comes in two forms:
//!
//! - self-contained (`add`, `find`, ...): opens its own context, commits on
//!   success and releases it on every path
//! - `*_in`: runs inside a context the caller already holds; the caller
//!   decides whether to commit
//!
//! Self-contained mutations log a failure once, with the entity and
//! operation, and return it. Reads return their errors without logging.

mod specialized;
mod study;

use std::marker::PhantomData;
use std::time::Instant;

use imgsrv_core::errors::Result;
use imgsrv_core::model::EntityKey;
use imgsrv_core::{log_op_end, log_op_error, log_op_start, SelectCriteria, UpdateColumns};

use crate::broker::{EntityBroker, ReadBroker, Table};
use crate::context::{PersistenceContext, PersistentStore, UpdateContext};

pub use specialized::{
    DataAccessGroupAdaptor, DeviceAdaptor, FilesystemAdaptor, ServerPartitionAdaptor,
    ServerPartitionDataAccessAdaptor, ServiceLockAdaptor, StudyDataAccessAdaptor,
    WorkQueueAdaptor, WorkQueueUidAdaptor,
};
pub use study::{DataAccessFilter, StudyAdaptor};

/// Adjusts criteria before they reach the broker
///
/// Used for row-level restrictions such as data-access filtering.
pub trait QueryHook<E: Table>: Send + Sync {
    fn on_querying(&self, criteria: SelectCriteria<E>) -> SelectCriteria<E>;

    /// Whether `on_querying` can hide rows; a restricting hook also guards
    /// lookups by key
    fn restricts(&self) -> bool {
        true
    }
}

/// Hook that leaves every query unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFilter;

impl<E: Table> QueryHook<E> for NoFilter {
    fn on_querying(&self, criteria: SelectCriteria<E>) -> SelectCriteria<E> {
        criteria
    }

    fn restricts(&self) -> bool {
        false
    }
}

/// CRUD access to one entity type through a store
pub struct EntityAdaptor<E, H = NoFilter> {
    store: PersistentStore,
    hook: H,
    _entity: PhantomData<fn() -> E>,
}

impl<E, H: Clone> Clone for EntityAdaptor<E, H> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            hook: self.hook.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E: Table> EntityAdaptor<E, NoFilter> {
    pub fn new(store: PersistentStore) -> Self {
        Self::with_hook(store, NoFilter)
    }
}

impl<E: Table, H: QueryHook<E>> EntityAdaptor<E, H> {
    pub fn with_hook(store: PersistentStore, hook: H) -> Self {
        Self {
            store,
            hook,
            _entity: PhantomData,
        }
    }

    pub fn store(&self) -> &PersistentStore {
        &self.store
    }

    fn prepare(&self, criteria: &SelectCriteria<E>) -> SelectCriteria<E> {
        self.hook.on_querying(criteria.clone())
    }

    /// Log the outcome of a self-contained mutation
    fn finish<T>(&self, op: &'static str, started: Instant, result: Result<T>) -> Result<T> {
        let duration_ms = started.elapsed().as_millis() as u64;
        match result {
            Ok(value) => {
                log_op_end!(op, duration_ms = duration_ms, entity = E::NAME);
                Ok(value)
            }
            Err(err) => {
                let err = if err.entity().is_none() {
                    err.with_entity(E::NAME)
                } else {
                    err
                };
                log_op_error!(op, &err, duration_ms = duration_ms, entity = E::NAME);
                Err(err)
            }
        }
    }

    // ---- reads ----

    /// Every entity matching the criteria
    pub fn find(&self, criteria: &SelectCriteria<E>) -> Result<Vec<E>> {
        let ctx = self.store.open_read_context()?;
        self.find_in(&ctx, criteria)
    }

    pub fn find_all(&self) -> Result<Vec<E>> {
        self.find(&SelectCriteria::new())
    }

    pub fn find_in(&self, ctx: &impl PersistenceContext, criteria: &SelectCriteria<E>) -> Result<Vec<E>> {
        ctx.read_broker::<E>().find(&self.prepare(criteria))
    }

    /// One page of matches; `start_index` is 0-based
    pub fn find_range(
        &self,
        criteria: &SelectCriteria<E>,
        start_index: usize,
        max_rows: usize,
    ) -> Result<Vec<E>> {
        let ctx = self.store.open_read_context()?;
        self.find_range_in(&ctx, criteria, start_index, max_rows)
    }

    pub fn find_range_in(
        &self,
        ctx: &impl PersistenceContext,
        criteria: &SelectCriteria<E>,
        start_index: usize,
        max_rows: usize,
    ) -> Result<Vec<E>> {
        // brokers count rows from 1
        ctx.read_broker::<E>()
            .find_range(&self.prepare(criteria), start_index.saturating_add(1), max_rows)
    }

    pub fn count(&self, criteria: &SelectCriteria<E>) -> Result<usize> {
        let ctx = self.store.open_read_context()?;
        self.count_in(&ctx, criteria)
    }

    pub fn count_in(&self, ctx: &impl PersistenceContext, criteria: &SelectCriteria<E>) -> Result<usize> {
        ctx.read_broker::<E>().count(&self.prepare(criteria))
    }

    pub fn find_one(&self, criteria: &SelectCriteria<E>) -> Result<Option<E>> {
        let ctx = self.store.open_read_context()?;
        self.find_one_in(&ctx, criteria)
    }

    pub fn find_one_in(
        &self,
        ctx: &impl PersistenceContext,
        criteria: &SelectCriteria<E>,
    ) -> Result<Option<E>> {
        ctx.read_broker::<E>().find_one(&self.prepare(criteria))
    }

    pub fn get(&self, key: &EntityKey) -> Result<Option<E>> {
        let ctx = self.store.open_read_context()?;
        self.get_in(&ctx, key)
    }

    pub fn get_in(&self, ctx: &impl PersistenceContext, key: &EntityKey) -> Result<Option<E>> {
        let broker = ctx.read_broker::<E>();
        if self.hook.restricts() {
            broker.find_one(&self.prepare(&SelectCriteria::by_key(key)))
        } else {
            broker.load(key)
        }
    }

    // ---- mutations ----

    /// Insert and commit; returns the entity as stored
    pub fn add(&self, columns: &UpdateColumns<E>) -> Result<E> {
        let started = Instant::now();
        log_op_start!("add", entity = E::NAME);
        let result: Result<E> = (|| {
            let ctx = self.store.open_update_context()?;
            let entity = self.add_in(&ctx, columns)?;
            ctx.commit()?;
            Ok(entity)
        })();
        self.finish("add", started, result)
    }

    pub fn add_in(&self, ctx: &UpdateContext<'_>, columns: &UpdateColumns<E>) -> Result<E> {
        ctx.broker::<E>().insert(columns)
    }

    /// Update one entity; `false` (nothing committed) when the key is unknown
    pub fn update(&self, key: &EntityKey, columns: &UpdateColumns<E>) -> Result<bool> {
        let started = Instant::now();
        log_op_start!("update", entity = E::NAME, entity_key = key.as_str());
        let result: Result<bool> = (|| {
            let ctx = self.store.open_update_context()?;
            let changed = self.update_in(&ctx, key, columns)?;
            if changed {
                ctx.commit()?;
            }
            Ok(changed)
        })();
        self.finish("update", started, result)
    }

    pub fn update_in(
        &self,
        ctx: &UpdateContext<'_>,
        key: &EntityKey,
        columns: &UpdateColumns<E>,
    ) -> Result<bool> {
        if self.hook.restricts() && self.get_in(ctx, key)?.is_none() {
            return Ok(false);
        }
        ctx.broker::<E>().update(key, columns)
    }

    /// Update every matching entity; `false` (nothing committed) when none
    /// match
    pub fn update_where(&self, criteria: &SelectCriteria<E>, columns: &UpdateColumns<E>) -> Result<bool> {
        let started = Instant::now();
        log_op_start!("update_where", entity = E::NAME);
        let result: Result<bool> = (|| {
            let ctx = self.store.open_update_context()?;
            let changed = self.update_where_in(&ctx, criteria, columns)?;
            if changed {
                ctx.commit()?;
            }
            Ok(changed)
        })();
        self.finish("update_where", started, result)
    }

    pub fn update_where_in(
        &self,
        ctx: &UpdateContext<'_>,
        criteria: &SelectCriteria<E>,
        columns: &UpdateColumns<E>,
    ) -> Result<bool> {
        let rows = ctx
            .broker::<E>()
            .update_where(&self.prepare(criteria), columns)?;
        Ok(rows > 0)
    }

    /// Delete one entity; `false` when the key is unknown
    pub fn delete(&self, key: &EntityKey) -> Result<bool> {
        let started = Instant::now();
        log_op_start!("delete", entity = E::NAME, entity_key = key.as_str());
        let result: Result<bool> = (|| {
            let ctx = self.store.open_update_context()?;
            let deleted = self.delete_in(&ctx, key)?;
            if deleted {
                ctx.commit()?;
            }
            Ok(deleted)
        })();
        self.finish("delete", started, result)
    }

    pub fn delete_in(&self, ctx: &UpdateContext<'_>, key: &EntityKey) -> Result<bool> {
        if self.hook.restricts() && self.get_in(ctx, key)?.is_none() {
            return Ok(false);
        }
        ctx.broker::<E>().delete(key)
    }

    /// Delete every matching entity; `false` when none match
    pub fn delete_where(&self, criteria: &SelectCriteria<E>) -> Result<bool> {
        let started = Instant::now();
        log_op_start!("delete_where", entity = E::NAME);
        let result: Result<bool> = (|| {
            let ctx = self.store.open_update_context()?;
            let deleted = self.delete_where_in(&ctx, criteria)?;
            if deleted {
                ctx.commit()?;
            }
            Ok(deleted)
        })();
        self.finish("delete_where", started, result)
    }

    pub fn delete_where_in(&self, ctx: &UpdateContext<'_>, criteria: &SelectCriteria<E>) -> Result<bool> {
        let rows = ctx.broker::<E>().delete_where(&self.prepare(criteria))?;
        Ok(rows > 0)
    }
}

impl<E, H: std::fmt::Debug> std::fmt::Debug for EntityAdaptor<E, H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityAdaptor")
            .field("entity", &std::any::type_name::<E>())
            .field("hook", &self.hook)
            .finish()
    }
}
