//! Migration runner
//!
//! Applies migrations with checksums and idempotency

use std::collections::HashMap;

use rusqlite::Connection;
use tracing::{debug, info};

use crate::errors::{checksum_mismatch, from_rusqlite, migration_error, unknown_migration, Result};
use crate::migrations::checksums::compute_checksum;
use crate::migrations::embedded::MIGRATIONS;

/// Apply all pending migrations to the database
///
/// Already applied migrations are verified against their recorded checksum
/// and skipped. A database that records a migration this build does not
/// know is refused.
pub fn apply_migrations(conn: &mut Connection) -> Result<()> {
    create_schema_version_table(conn)?;

    let applied: HashMap<String, Option<String>> = applied_migrations(conn)?.into_iter().collect();

    for id in applied.keys() {
        if !MIGRATIONS.iter().any(|m| m.id == id.as_str()) {
            return Err(unknown_migration(id));
        }
    }

    for migration in MIGRATIONS {
        let checksum = compute_checksum(migration.sql);
        match applied.get(migration.id) {
            Some(Some(recorded)) if *recorded != checksum => {
                return Err(checksum_mismatch(migration.id, recorded, &checksum));
            }
            Some(_) => {
                debug!(migration = migration.id, "migration already applied");
            }
            None => apply_migration(conn, migration.id, migration.sql, &checksum)?,
        }
    }

    Ok(())
}

/// Applied migration ids with their recorded checksums, in application order
pub fn applied_migrations(conn: &Connection) -> Result<Vec<(String, Option<String>)>> {
    let mut stmt = conn
        .prepare("SELECT migration_id, checksum FROM schema_version ORDER BY id")
        .map_err(from_rusqlite)?;
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
        .map_err(from_rusqlite)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(from_rusqlite)?;
    Ok(rows)
}

/// Create the schema_version table if it doesn't exist
fn create_schema_version_table(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            id INTEGER PRIMARY KEY,
            migration_id TEXT NOT NULL UNIQUE,
            applied_at INTEGER NOT NULL,
            checksum TEXT
        )",
        [],
    )
    .map_err(from_rusqlite)?;

    Ok(())
}

fn apply_migration(conn: &mut Connection, migration_id: &str, sql: &str, checksum: &str) -> Result<()> {
    let tx = conn.transaction().map_err(from_rusqlite)?;

    tx.execute_batch(sql)
        .map_err(|e| migration_error(migration_id, &e.to_string()))?;

    let now = chrono::Utc::now().timestamp_millis();
    tx.execute(
        "INSERT INTO schema_version (migration_id, applied_at, checksum) VALUES (?, ?, ?)",
        rusqlite::params![migration_id, now, checksum],
    )
    .map_err(from_rusqlite)?;

    tx.commit().map_err(from_rusqlite)?;

    info!(migration = migration_id, "migration applied");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_migrations() {
        let mut conn = Connection::open_in_memory().unwrap();
        let result = apply_migrations(&mut conn);
        assert!(result.is_ok());
    }

    #[test]
    fn test_idempotency() {
        let mut conn = Connection::open_in_memory().unwrap();
        apply_migrations(&mut conn).unwrap();
        let result = apply_migrations(&mut conn);
        assert!(result.is_ok());
        assert_eq!(applied_migrations(&conn).unwrap().len(), 1);
    }
}
