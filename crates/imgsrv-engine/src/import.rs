//! Bulk device import
//!
//! Records are written in batches, one committed update context per batch.
//! The cancellation token is polled between batches only, so a cancelled
//! import keeps every batch committed before the request and never leaves a
//! batch half written.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use imgsrv_core::errors::{ExError, ExErrorKind, Result};
use imgsrv_core::model::{Device, DeviceField, DeviceType, ServerPartition};
use imgsrv_core::UpdateColumns;
use imgsrv_store::adaptor::DeviceAdaptor;
use imgsrv_store::{EntityAdaptor, PersistentStore};
use serde::{Deserialize, Serialize};

use crate::controllers::logged;

/// One device to import; omitted options take the table defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub ae_title: String,
    pub ip_address: String,
    pub port: u16,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub device_type: Option<DeviceType>,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub dhcp: Option<bool>,
    #[serde(default)]
    pub allow_storage: Option<bool>,
    #[serde(default)]
    pub allow_retrieve: Option<bool>,
    #[serde(default)]
    pub allow_query: Option<bool>,
    #[serde(default)]
    pub allow_auto_route: Option<bool>,
}

impl DeviceRecord {
    pub fn new(ae_title: impl Into<String>, ip_address: impl Into<String>, port: u16) -> Self {
        Self {
            ae_title: ae_title.into(),
            ip_address: ip_address.into(),
            port,
            description: String::new(),
            device_type: None,
            enabled: None,
            dhcp: None,
            allow_storage: None,
            allow_retrieve: None,
            allow_query: None,
            allow_auto_route: None,
        }
    }

    fn to_columns(&self, partition: &ServerPartition) -> UpdateColumns<Device> {
        let mut columns = Device::columns(
            &partition.key,
            self.ae_title.as_str(),
            self.ip_address.as_str(),
            self.port,
        )
        .set(DeviceField::Description, self.description.as_str());

        if let Some(device_type) = self.device_type {
            columns.assign(DeviceField::DeviceType, device_type);
        }
        let flags = [
            (DeviceField::Enabled, self.enabled),
            (DeviceField::Dhcp, self.dhcp),
            (DeviceField::AllowStorage, self.allow_storage),
            (DeviceField::AllowRetrieve, self.allow_retrieve),
            (DeviceField::AllowQuery, self.allow_query),
            (DeviceField::AllowAutoRoute, self.allow_auto_route),
        ];
        for (field, value) in flags {
            if let Some(value) = value {
                columns.assign(field, value);
            }
        }
        columns
    }
}

/// Cooperative cancellation flag shared with whoever started the import
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Running totals of an import
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImportProgress {
    pub total: usize,
    pub imported: usize,
    pub skipped: usize,
}

/// How an import ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ImportOutcome {
    Completed { imported: usize, skipped: usize },
    Cancelled { imported: usize, skipped: usize },
}

impl ImportOutcome {
    pub fn imported(&self) -> usize {
        match self {
            ImportOutcome::Completed { imported, .. } | ImportOutcome::Cancelled { imported, .. } => {
                *imported
            }
        }
    }

    pub fn skipped(&self) -> usize {
        match self {
            ImportOutcome::Completed { skipped, .. } | ImportOutcome::Cancelled { skipped, .. } => {
                *skipped
            }
        }
    }
}

/// Imports devices into one partition
#[derive(Debug, Clone)]
pub struct DeviceImporter {
    store: PersistentStore,
    devices: DeviceAdaptor,
    partition: ServerPartition,
    batch_size: usize,
}

impl DeviceImporter {
    pub const DEFAULT_BATCH_SIZE: usize = 50;

    pub fn new(store: PersistentStore, partition: ServerPartition) -> Self {
        Self {
            devices: EntityAdaptor::new(store.clone()),
            store,
            partition,
            batch_size: Self::DEFAULT_BATCH_SIZE,
        }
    }

    /// Records per committed batch, at least one
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Read a JSON array of device records
    ///
    /// # Errors
    ///
    /// `Io` when the file cannot be read, `Serialization` when it is not a
    /// valid record list.
    pub fn read_records(path: &Path) -> Result<Vec<DeviceRecord>> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ExError::new(ExErrorKind::Io)
                .with_op("read_device_records")
                .with_message(format!("{}: {}", path.display(), e))
        })?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Import `records`, skipping AE titles the partition already has
    ///
    /// A failing batch rolls back and ends the import with its error; batches
    /// committed before it stay.
    pub fn run(&self, records: &[DeviceRecord], cancel: &CancellationToken) -> Result<ImportOutcome> {
        self.run_with_progress(records, cancel, |_| {})
    }

    /// [`run`](Self::run), reporting the running totals after every
    /// committed batch
    pub fn run_with_progress(
        &self,
        records: &[DeviceRecord],
        cancel: &CancellationToken,
        mut progress: impl FnMut(&ImportProgress),
    ) -> Result<ImportOutcome> {
        logged("import_devices", || {
            let mut totals = ImportProgress {
                total: records.len(),
                imported: 0,
                skipped: 0,
            };
            for batch in records.chunks(self.batch_size) {
                if cancel.is_cancelled() {
                    tracing::debug!(
                        imported = totals.imported,
                        skipped = totals.skipped,
                        "device import cancelled"
                    );
                    return Ok(ImportOutcome::Cancelled {
                        imported: totals.imported,
                        skipped: totals.skipped,
                    });
                }
                let (added, existing) = self.import_batch(batch)?;
                totals.imported += added;
                totals.skipped += existing;
                tracing::debug!(
                    partition = self.partition.ae_title.as_str(),
                    added,
                    existing,
                    "device batch committed"
                );
                progress(&totals);
            }
            Ok(ImportOutcome::Completed {
                imported: totals.imported,
                skipped: totals.skipped,
            })
        })
    }

    fn import_batch(&self, batch: &[DeviceRecord]) -> Result<(usize, usize)> {
        let ctx = self.store.open_update_context()?;
        let mut added = 0;
        let mut existing = 0;
        for record in batch {
            if self
                .devices
                .find_by_ae_title_in(&ctx, &self.partition.key, &record.ae_title)?
                .is_some()
            {
                existing += 1;
                continue;
            }
            self.devices.add_in(&ctx, &record.to_columns(&self.partition))?;
            added += 1;
        }
        ctx.commit()?;
        Ok((added, existing))
    }
}
