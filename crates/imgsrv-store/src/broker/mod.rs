//! Entity brokers
//!
//! A broker executes typed criteria and column bags against one table. Read
//! contexts hand out [`SqliteBroker`], which only implements [`ReadBroker`];
//! update contexts hand out [`SqliteUpdateBroker`], which adds the mutating
//! [`EntityBroker`] operations. Mutation through a read context therefore does
//! not compile.

mod mapping;
pub(crate) mod sql;

use std::marker::PhantomData;

use imgsrv_core::errors::{ExError, ExErrorKind, Result};
use imgsrv_core::model::{Entity, EntityKey};
use imgsrv_core::types::ContextId;
use imgsrv_core::{SelectCriteria, UpdateColumns};
use rusqlite::{params_from_iter, Connection, OptionalExtension, Row};

use crate::errors::from_rusqlite;
use sql::{CompiledSql, Page};

/// An entity that can be decoded from a row of its table
pub trait Table: Entity {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

/// Query operations on one entity type
pub trait ReadBroker<E: Table> {
    /// Every row matching the criteria, in criteria order
    fn find(&self, criteria: &SelectCriteria<E>) -> Result<Vec<E>>;

    /// At most `max_rows` matches starting at `start_row`
    ///
    /// `start_row` is 1-based: the first match is row 1.
    fn find_range(
        &self,
        criteria: &SelectCriteria<E>,
        start_row: usize,
        max_rows: usize,
    ) -> Result<Vec<E>>;

    fn count(&self, criteria: &SelectCriteria<E>) -> Result<usize>;

    /// First match in criteria order
    fn find_one(&self, criteria: &SelectCriteria<E>) -> Result<Option<E>>;

    fn load(&self, key: &EntityKey) -> Result<Option<E>>;
}

/// Mutating operations on one entity type
pub trait EntityBroker<E: Table>: ReadBroker<E> {
    /// Insert a row with a fresh key and return it as stored
    fn insert(&self, columns: &UpdateColumns<E>) -> Result<E>;

    /// Returns `false` when no row has this key
    fn update(&self, key: &EntityKey, columns: &UpdateColumns<E>) -> Result<bool>;

    /// Number of rows updated
    fn update_where(&self, criteria: &SelectCriteria<E>, columns: &UpdateColumns<E>)
        -> Result<usize>;

    /// Returns `false` when no row has this key
    fn delete(&self, key: &EntityKey) -> Result<bool>;

    /// Number of rows deleted
    fn delete_where(&self, criteria: &SelectCriteria<E>) -> Result<usize>;
}

/// Read-only broker bound to a context's connection
pub struct SqliteBroker<'c, E> {
    conn: &'c Connection,
    context_id: &'c ContextId,
    _entity: PhantomData<fn() -> E>,
}

impl<'c, E: Table> SqliteBroker<'c, E> {
    pub(crate) fn new(conn: &'c Connection, context_id: &'c ContextId) -> Self {
        Self {
            conn,
            context_id,
            _entity: PhantomData,
        }
    }

    fn annotate(&self, err: ExError, op: &str) -> ExError {
        let err = if err.op().is_none() || err.op() == Some("sqlite") {
            err.with_op(op)
        } else {
            err
        };
        let err = if err.entity().is_none() {
            err.with_entity(E::NAME)
        } else {
            err
        };
        err.with_context_id(self.context_id.clone())
    }

    fn query(&self, compiled: &CompiledSql) -> Result<Vec<E>> {
        let mut stmt = self.conn.prepare_cached(&compiled.sql).map_err(from_rusqlite)?;
        let rows = stmt
            .query_map(params_from_iter(compiled.params.iter()), |row| E::from_row(row))
            .map_err(from_rusqlite)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(from_rusqlite)
    }

    fn execute(&self, compiled: &CompiledSql) -> Result<usize> {
        let mut stmt = self.conn.prepare_cached(&compiled.sql).map_err(from_rusqlite)?;
        stmt.execute(params_from_iter(compiled.params.iter()))
            .map_err(from_rusqlite)
    }
}

impl<'c, E: Table> ReadBroker<E> for SqliteBroker<'c, E> {
    fn find(&self, criteria: &SelectCriteria<E>) -> Result<Vec<E>> {
        sql::select(criteria, None)
            .and_then(|compiled| self.query(&compiled))
            .map_err(|e| self.annotate(e, "find"))
    }

    fn find_range(
        &self,
        criteria: &SelectCriteria<E>,
        start_row: usize,
        max_rows: usize,
    ) -> Result<Vec<E>> {
        if start_row == 0 {
            return Err(self.annotate(
                ExError::new(ExErrorKind::InvalidInput).with_message("start row is 1-based"),
                "find_range",
            ));
        }
        let page = Page {
            offset: start_row - 1,
            limit: max_rows,
        };
        sql::select(criteria, Some(page))
            .and_then(|compiled| self.query(&compiled))
            .map_err(|e| self.annotate(e, "find_range"))
    }

    fn count(&self, criteria: &SelectCriteria<E>) -> Result<usize> {
        let result = sql::count(criteria).and_then(|compiled| {
            let count: i64 = self
                .conn
                .query_row(&compiled.sql, params_from_iter(compiled.params.iter()), |row| {
                    row.get(0)
                })
                .map_err(from_rusqlite)?;
            usize::try_from(count).map_err(|_| {
                ExError::new(ExErrorKind::Internal).with_message(format!("negative count {}", count))
            })
        });
        result.map_err(|e| self.annotate(e, "count"))
    }

    fn find_one(&self, criteria: &SelectCriteria<E>) -> Result<Option<E>> {
        let page = Page {
            offset: 0,
            limit: 1,
        };
        sql::select(criteria, Some(page))
            .and_then(|compiled| self.query(&compiled))
            .map(|rows| rows.into_iter().next())
            .map_err(|e| self.annotate(e, "find_one"))
    }

    fn load(&self, key: &EntityKey) -> Result<Option<E>> {
        let compiled = sql::load::<E>(key);
        self.conn
            .query_row(&compiled.sql, params_from_iter(compiled.params.iter()), |row| {
                E::from_row(row)
            })
            .optional()
            .map_err(from_rusqlite)
            .map_err(|e| self.annotate(e.with_entity_id(key.as_str()), "load"))
    }
}

/// Read-write broker bound to an update context's transaction
pub struct SqliteUpdateBroker<'c, E> {
    read: SqliteBroker<'c, E>,
}

impl<'c, E: Table> SqliteUpdateBroker<'c, E> {
    pub(crate) fn new(conn: &'c Connection, context_id: &'c ContextId) -> Self {
        Self {
            read: SqliteBroker::new(conn, context_id),
        }
    }
}

fn require_columns<E: Entity>(columns: &UpdateColumns<E>) -> Result<()> {
    columns.validate()?;
    if columns.is_empty() {
        return Err(ExError::new(ExErrorKind::InvalidInput)
            .with_entity(E::NAME)
            .with_message("no columns to update"));
    }
    Ok(())
}

impl<'c, E: Table> ReadBroker<E> for SqliteUpdateBroker<'c, E> {
    fn find(&self, criteria: &SelectCriteria<E>) -> Result<Vec<E>> {
        self.read.find(criteria)
    }

    fn find_range(
        &self,
        criteria: &SelectCriteria<E>,
        start_row: usize,
        max_rows: usize,
    ) -> Result<Vec<E>> {
        self.read.find_range(criteria, start_row, max_rows)
    }

    fn count(&self, criteria: &SelectCriteria<E>) -> Result<usize> {
        self.read.count(criteria)
    }

    fn find_one(&self, criteria: &SelectCriteria<E>) -> Result<Option<E>> {
        self.read.find_one(criteria)
    }

    fn load(&self, key: &EntityKey) -> Result<Option<E>> {
        self.read.load(key)
    }
}

impl<'c, E: Table> EntityBroker<E> for SqliteUpdateBroker<'c, E> {
    fn insert(&self, columns: &UpdateColumns<E>) -> Result<E> {
        let key = EntityKey::generate();
        let result = columns.validate().and_then(|_| {
            self.read.execute(&sql::insert(&key, columns))?;
            self.read.load(&key)?.ok_or_else(|| {
                ExError::new(ExErrorKind::Internal).with_message("inserted row is not readable")
            })
        });
        result.map_err(|e| self.read.annotate(e.with_entity_id(key.as_str()), "insert"))
    }

    fn update(&self, key: &EntityKey, columns: &UpdateColumns<E>) -> Result<bool> {
        require_columns(columns)
            .and_then(|_| self.read.execute(&sql::update_by_key(key, columns)))
            .map(|changed| changed > 0)
            .map_err(|e| self.read.annotate(e.with_entity_id(key.as_str()), "update"))
    }

    fn update_where(
        &self,
        criteria: &SelectCriteria<E>,
        columns: &UpdateColumns<E>,
    ) -> Result<usize> {
        require_columns(columns)
            .and_then(|_| sql::update_where(criteria, columns))
            .and_then(|compiled| self.read.execute(&compiled))
            .map_err(|e| self.read.annotate(e, "update_where"))
    }

    fn delete(&self, key: &EntityKey) -> Result<bool> {
        self.read
            .execute(&sql::delete_by_key::<E>(key))
            .map(|deleted| deleted > 0)
            .map_err(|e| self.read.annotate(e.with_entity_id(key.as_str()), "delete"))
    }

    fn delete_where(&self, criteria: &SelectCriteria<E>) -> Result<usize> {
        sql::delete_where(criteria)
            .and_then(|compiled| self.read.execute(&compiled))
            .map_err(|e| self.read.annotate(e, "delete_where"))
    }
}
