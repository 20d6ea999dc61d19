//! Multi-step operations over the image server store
//!
//! Controllers compose entity adaptors inside a single update context so a
//! whole operation commits or rolls back together. The engine layer owns
//! lifecycle logging for these operations; the `*_in` adaptor calls it makes
//! do not log on their own.

pub mod controllers;
pub mod import;

pub use controllers::{
    PartitionSettings, ServerPartitionController, StudyController, WorkQueueController,
};
pub use import::{CancellationToken, DeviceImporter, DeviceRecord, ImportOutcome, ImportProgress};
