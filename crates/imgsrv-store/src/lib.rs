//! Image server store - SQLite persistence behind typed brokers
//!
//! Provides:
//! - `PersistentStore`, an explicitly constructed handle to one database
//! - Read and update persistence contexts (units of work)
//! - Brokers that compile `SelectCriteria` / `UpdateColumns` to SQL
//! - `EntityAdaptor`, uniform CRUD over any entity with an optional query hook
//! - Embedded, checksummed schema migrations

pub mod adaptor;
pub mod broker;
pub mod config;
pub mod context;
pub mod db;
pub mod errors;
pub mod migrations;

pub use adaptor::{DataAccessFilter, EntityAdaptor, NoFilter, QueryHook, StudyAdaptor};
pub use broker::{EntityBroker, ReadBroker, SqliteBroker, SqliteUpdateBroker, Table};
pub use config::{JournalMode, StoreConfig};
pub use context::{ContextState, PersistenceContext, PersistentStore, ReadContext, UpdateContext};
pub use errors::Result;
