//! Schema migration command
//!
//! Opening the store already brings the schema up to date, so this only
//! reports what the database now records.

use imgsrv_store::PersistentStore;
use serde_json::json;

use super::{print_json, CliResult};

pub fn execute(store: &PersistentStore) -> CliResult {
    let applied = store.migrations()?;
    tracing::info!(count = applied.len(), "schema up to date");
    print_json(&json!({ "migrations": applied }))
}
