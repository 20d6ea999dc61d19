//! Command implementations

use std::error::Error;
use std::path::PathBuf;

use imgsrv_core::EntityKey;
use imgsrv_store::{PersistentStore, StoreConfig};
use serde::Serialize;

pub mod device;
pub mod migrate;
pub mod partition;
pub mod workqueue;

pub type CliResult<T = ()> = Result<T, Box<dyn Error>>;

/// Database used when neither `--db` nor the configuration names one
pub const DEFAULT_DB: &str = "imgsrv.db";

/// Where the store comes from
#[derive(Debug, Default)]
pub struct StoreOptions {
    pub db: Option<PathBuf>,
    pub config: Option<PathBuf>,
}

impl StoreOptions {
    pub fn config(&self) -> CliResult<StoreConfig> {
        let mut config = match &self.config {
            Some(path) => StoreConfig::load(path)?,
            None => StoreConfig::default(),
        };
        if let Some(db) = &self.db {
            config.path = Some(db.clone());
        }
        if config.path.is_none() {
            config.path = Some(PathBuf::from(DEFAULT_DB));
        }
        Ok(config)
    }

    /// Open and migrate the store
    pub fn open(&self) -> CliResult<PersistentStore> {
        Ok(PersistentStore::open(&self.config()?)?)
    }
}

pub fn print_json(value: &impl Serialize) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn parse_key(text: &str) -> CliResult<EntityKey> {
    Ok(EntityKey::parse(text)?)
}
