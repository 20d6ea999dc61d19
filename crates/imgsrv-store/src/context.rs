//! Persistent store and persistence contexts
//!
//! A [`PersistentStore`] owns one SQLite connection. Work happens inside a
//! context that holds the connection for its whole lifetime:
//!
//! - [`ReadContext`]: a deferred transaction that is always rolled back
//! - [`UpdateContext`]: an immediate transaction that is rolled back unless
//!   [`UpdateContext::commit`] is reached
//!
//! Contexts are exclusive. Opening a second context on the thread that
//! already holds one blocks forever, so code that needs several operations in
//! one unit of work passes the open context down instead.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use imgsrv_core::errors::{ExError, ExErrorKind};
use imgsrv_core::types::schema::{EVENT_CONTEXT_COMMIT, EVENT_CONTEXT_DISCARD, EVENT_CONTEXT_OPEN};
use imgsrv_core::types::ContextId;
use rusqlite::Connection;
use tracing::{debug, warn};

use crate::broker::{SqliteBroker, SqliteUpdateBroker, Table};
use crate::config::StoreConfig;
use crate::db;
use crate::errors::{from_rusqlite, Result};
use crate::migrations::{applied_migrations, apply_migrations};

/// Handle to the image server database
///
/// Cheap to clone; every clone shares the same connection.
#[derive(Clone)]
pub struct PersistentStore {
    conn: Arc<Mutex<Connection>>,
}

impl std::fmt::Debug for PersistentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistentStore").finish_non_exhaustive()
    }
}

impl PersistentStore {
    /// Open (creating if needed) and migrate the configured database
    pub fn open(config: &StoreConfig) -> Result<Self> {
        let mut conn = db::open_configured(config)?;
        apply_migrations(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Fresh migrated in-memory database
    pub fn open_in_memory() -> Result<Self> {
        Self::open(&StoreConfig::in_memory())
    }

    /// Ids of the migrations applied to this database, oldest first
    pub fn migrations(&self) -> Result<Vec<String>> {
        let conn = self.lock("migrations")?;
        Ok(applied_migrations(&conn)?
            .into_iter()
            .map(|(id, _)| id)
            .collect())
    }

    /// Take the connection, recovering it if a previous holder panicked
    ///
    /// A panicking holder's context has normally rolled back on drop already;
    /// any transaction still open on a recovered connection is rolled back
    /// here before the connection is handed out.
    fn lock(&self, op: &'static str) -> Result<MutexGuard<'_, Connection>> {
        match self.conn.lock() {
            Ok(conn) => Ok(conn),
            Err(poisoned) => {
                warn!(
                    component = module_path!(),
                    op = op,
                    "store connection lock was poisoned; recovering"
                );
                self.conn.clear_poison();
                let conn = poisoned.into_inner();
                if !conn.is_autocommit() {
                    conn.execute_batch("ROLLBACK")
                        .map_err(|e| from_rusqlite(e).with_op(op))?;
                }
                Ok(conn)
            }
        }
    }

    pub fn open_read_context(&self) -> Result<ReadContext<'_>> {
        let conn = self.lock("open_read_context")?;
        let id = ContextId::new();
        conn.execute_batch("BEGIN DEFERRED")
            .map_err(|e| from_rusqlite(e).with_op("open_read_context").with_context_id(id.clone()))?;
        debug!(
            component = module_path!(),
            event = EVENT_CONTEXT_OPEN,
            context_id = %id,
            mode = "read",
        );
        Ok(ReadContext { conn, id })
    }

    pub fn open_update_context(&self) -> Result<UpdateContext<'_>> {
        let conn = self.lock("open_update_context")?;
        let id = ContextId::new();
        conn.execute_batch("BEGIN IMMEDIATE").map_err(|e| {
            from_rusqlite(e)
                .with_op("open_update_context")
                .with_context_id(id.clone())
        })?;
        debug!(
            component = module_path!(),
            event = EVENT_CONTEXT_OPEN,
            context_id = %id,
            mode = "update",
        );
        Ok(UpdateContext {
            conn,
            id,
            state: ContextState::Open,
            opened: Instant::now(),
        })
    }
}

/// Operations available on every kind of context
pub trait PersistenceContext {
    fn id(&self) -> &ContextId;

    /// Broker for queries on one entity type
    fn read_broker<E: Table>(&self) -> SqliteBroker<'_, E>;
}

/// Read-only unit of work
pub struct ReadContext<'s> {
    conn: MutexGuard<'s, Connection>,
    id: ContextId,
}

impl<'s> ReadContext<'s> {
    pub fn broker<E: Table>(&self) -> SqliteBroker<'_, E> {
        SqliteBroker::new(&self.conn, &self.id)
    }
}

impl<'s> PersistenceContext for ReadContext<'s> {
    fn id(&self) -> &ContextId {
        &self.id
    }

    fn read_broker<E: Table>(&self) -> SqliteBroker<'_, E> {
        self.broker()
    }
}

impl<'s> Drop for ReadContext<'s> {
    fn drop(&mut self) {
        if self.conn.is_autocommit() {
            return;
        }
        if let Err(e) = self.conn.execute_batch("ROLLBACK") {
            warn!(context_id = %self.id, error = %e, "failed to release read context");
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    Open,
    Committed,
    Discarded,
}

/// Read-write unit of work
///
/// Dropping an open context rolls it back. The only way to make its changes
/// visible is [`commit`](UpdateContext::commit), which consumes it.
pub struct UpdateContext<'s> {
    conn: MutexGuard<'s, Connection>,
    id: ContextId,
    state: ContextState,
    opened: Instant,
}

impl<'s> UpdateContext<'s> {
    pub fn broker<E: Table>(&self) -> SqliteUpdateBroker<'_, E> {
        SqliteUpdateBroker::new(&self.conn, &self.id)
    }

    pub fn state(&self) -> ContextState {
        self.state
    }

    /// Make every change done through this context durable
    ///
    /// # Errors
    ///
    /// `ContextClosed` when SQLite already ended the transaction (some
    /// failures roll back implicitly), or the commit's own persistence error.
    /// Either way nothing was committed.
    pub fn commit(mut self) -> Result<()> {
        if self.conn.is_autocommit() {
            self.state = ContextState::Discarded;
            return Err(ExError::new(ExErrorKind::ContextClosed)
                .with_op("commit")
                .with_context_id(self.id.clone())
                .with_message("transaction was already ended by the database"));
        }

        self.conn
            .execute_batch("COMMIT")
            .map_err(|e| from_rusqlite(e).with_op("commit").with_context_id(self.id.clone()))?;

        self.state = ContextState::Committed;
        let duration_ms = self.opened.elapsed().as_millis() as u64;
        debug!(
            component = module_path!(),
            event = EVENT_CONTEXT_COMMIT,
            context_id = %self.id,
            duration_ms = duration_ms,
        );
        Ok(())
    }

    /// Roll back explicitly; same as dropping the context
    pub fn discard(mut self) {
        self.rollback();
    }

    fn rollback(&mut self) {
        if self.state != ContextState::Open {
            return;
        }
        self.state = ContextState::Discarded;
        if !self.conn.is_autocommit() {
            if let Err(e) = self.conn.execute_batch("ROLLBACK") {
                warn!(context_id = %self.id, error = %e, "rollback failed");
            }
        }
        let duration_ms = self.opened.elapsed().as_millis() as u64;
        debug!(
            component = module_path!(),
            event = EVENT_CONTEXT_DISCARD,
            context_id = %self.id,
            duration_ms = duration_ms,
        );
    }
}

impl<'s> PersistenceContext for UpdateContext<'s> {
    fn id(&self) -> &ContextId {
        &self.id
    }

    fn read_broker<E: Table>(&self) -> SqliteBroker<'_, E> {
        SqliteBroker::new(&self.conn, &self.id)
    }
}

impl<'s> Drop for UpdateContext<'s> {
    fn drop(&mut self) {
        self.rollback();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::{EntityBroker, ReadBroker};
    use imgsrv_core::model::{Filesystem, FilesystemTier};
    use imgsrv_core::SelectCriteria;

    #[test]
    fn test_open_reports_applied_migrations() {
        let store = PersistentStore::open_in_memory().unwrap();
        assert_eq!(store.migrations().unwrap(), vec!["001_initial_schema".to_string()]);
    }

    #[test]
    fn test_committed_changes_are_visible() {
        let store = PersistentStore::open_in_memory().unwrap();
        let ctx = store.open_update_context().unwrap();
        ctx.broker::<Filesystem>()
            .insert(&Filesystem::columns("/data/fs1", FilesystemTier::Tier1))
            .unwrap();
        ctx.commit().unwrap();

        let read = store.open_read_context().unwrap();
        let count = read.broker::<Filesystem>().count(&SelectCriteria::new()).unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_dropped_context_discards_changes() {
        let store = PersistentStore::open_in_memory().unwrap();
        {
            let ctx = store.open_update_context().unwrap();
            ctx.broker::<Filesystem>()
                .insert(&Filesystem::columns("/data/fs1", FilesystemTier::Tier1))
                .unwrap();
            assert_eq!(ctx.state(), ContextState::Open);
        }

        let read = store.open_read_context().unwrap();
        let count = read.broker::<Filesystem>().count(&SelectCriteria::new()).unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_update_context_sees_its_own_writes() {
        let store = PersistentStore::open_in_memory().unwrap();
        let ctx = store.open_update_context().unwrap();
        let fs = ctx
            .broker::<Filesystem>()
            .insert(&Filesystem::columns("/data/fs2", FilesystemTier::Tier2))
            .unwrap();
        let seen = ctx.read_broker::<Filesystem>().load(&fs.key).unwrap();
        assert_eq!(seen, Some(fs));
        ctx.discard();
    }

    #[test]
    fn test_store_recovers_after_panic_inside_context() {
        let store = PersistentStore::open_in_memory().unwrap();
        let shared = store.clone();
        let handle = std::thread::spawn(move || {
            let ctx = shared.open_update_context().unwrap();
            ctx.broker::<Filesystem>()
                .insert(&Filesystem::columns("/data/lost", FilesystemTier::Tier1))
                .unwrap();
            panic!("worker failed mid-transaction");
        });
        assert!(handle.join().is_err());

        let read = store.open_read_context().unwrap();
        let count = read.broker::<Filesystem>().count(&SelectCriteria::new()).unwrap();
        assert_eq!(count, 0);
        drop(read);

        let ctx = store.open_update_context().unwrap();
        ctx.broker::<Filesystem>()
            .insert(&Filesystem::columns("/data/fs3", FilesystemTier::Tier3))
            .unwrap();
        ctx.commit().unwrap();
    }

    #[test]
    fn test_contexts_can_be_reopened_after_release() {
        let store = PersistentStore::open_in_memory().unwrap();
        for _ in 0..3 {
            let ctx = store.open_update_context().unwrap();
            drop(ctx);
            let read = store.open_read_context().unwrap();
            drop(read);
        }
    }
}
