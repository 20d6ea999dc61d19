//! Device commands

use std::path::PathBuf;

use clap::{Args, Subcommand};
use imgsrv_engine::{CancellationToken, DeviceImporter, ServerPartitionController};
use imgsrv_store::PersistentStore;

use super::partition::find_partition;
use super::{print_json, CliResult};

#[derive(Debug, Args)]
pub struct DeviceArgs {
    #[command(subcommand)]
    pub command: DeviceCommand,
}

#[derive(Debug, Subcommand)]
pub enum DeviceCommand {
    /// List the devices of a partition
    List {
        /// AE title of the partition
        #[arg(long)]
        partition: String,
    },
    /// Import devices from a JSON array of records
    Import {
        /// AE title of the partition
        #[arg(long)]
        partition: String,

        /// Records committed per batch
        #[arg(long, default_value_t = DeviceImporter::DEFAULT_BATCH_SIZE)]
        batch_size: usize,

        file: PathBuf,
    },
}

pub fn execute(args: DeviceArgs, store: &PersistentStore) -> CliResult {
    let controller = ServerPartitionController::new(store.clone());
    match args.command {
        DeviceCommand::List { partition } => {
            let partition = find_partition(&controller, &partition)?;
            print_json(&controller.devices(&partition)?)
        }
        DeviceCommand::Import {
            partition,
            batch_size,
            file,
        } => {
            let partition = find_partition(&controller, &partition)?;
            let records = DeviceImporter::read_records(&file)?;
            let outcome = DeviceImporter::new(store.clone(), partition)
                .with_batch_size(batch_size)
                .run_with_progress(&records, &CancellationToken::new(), |progress| {
                    tracing::info!(
                        total = progress.total,
                        imported = progress.imported,
                        skipped = progress.skipped,
                        "device import progress"
                    );
                })?;
            print_json(&outcome)
        }
    }
}
