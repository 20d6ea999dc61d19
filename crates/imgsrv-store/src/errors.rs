//! Error handling for imgsrv-store
//!
//! Wraps imgsrv-core ExError with store-specific helpers

use imgsrv_core::errors::{ExError, ExErrorKind};
use rusqlite::ErrorCode;
use thiserror::Error;

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Failures loading a store configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid store configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

impl From<ConfigError> for ExError {
    fn from(err: ConfigError) -> Self {
        let kind = match &err {
            ConfigError::Read { .. } => ExErrorKind::Io,
            ConfigError::Parse(_) => ExErrorKind::Configuration,
        };
        ExError::new(kind)
            .with_op("load_config")
            .with_message(err.to_string())
    }
}

/// Create a migration error
pub fn migration_error(migration_id: &str, reason: &str) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("migration")
        .with_message(format!("Migration {} failed: {}", migration_id, reason))
}

/// Create a checksum mismatch error
pub fn checksum_mismatch(migration_id: &str, expected: &str, actual: &str) -> ExError {
    ExError::new(ExErrorKind::ConstraintViolation)
        .with_op("migration_checksum")
        .with_message(format!(
            "Checksum mismatch for migration {}: expected {}, got {}",
            migration_id, expected, actual
        ))
}

/// The database records a migration this build does not ship
pub fn unknown_migration(migration_id: &str) -> ExError {
    ExError::new(ExErrorKind::Configuration)
        .with_op("migration")
        .with_message(format!(
            "Database was migrated by a newer build: unknown migration {}",
            migration_id
        ))
}

/// Create a database error from rusqlite::Error
///
/// Constraint failures (unique keys, foreign keys, triggers) become
/// `ConstraintViolation`, lock contention becomes `Concurrency`. A column
/// conversion that failed on one of our own decoding errors returns that error
/// unchanged.
pub fn from_rusqlite(err: rusqlite::Error) -> ExError {
    if let rusqlite::Error::FromSqlConversionFailure(_, _, source) = &err {
        if let Some(inner) = source.downcast_ref::<ExError>() {
            return inner.clone();
        }
    }

    let kind = match err.sqlite_error_code() {
        Some(ErrorCode::ConstraintViolation) => ExErrorKind::ConstraintViolation,
        Some(ErrorCode::DatabaseBusy) | Some(ErrorCode::DatabaseLocked) => {
            ExErrorKind::Concurrency
        }
        _ => ExErrorKind::Persistence,
    };
    ExError::new(kind)
        .with_op("sqlite")
        .with_message(err.to_string())
}
