//! Server partition commands

use clap::{Args, Subcommand};
use imgsrv_core::model::ServerPartition;
use imgsrv_engine::{PartitionSettings, ServerPartitionController};
use imgsrv_store::PersistentStore;
use serde_json::json;

use super::{print_json, CliResult};

#[derive(Debug, Args)]
pub struct PartitionArgs {
    #[command(subcommand)]
    pub command: PartitionCommand,
}

#[derive(Debug, Subcommand)]
pub enum PartitionCommand {
    /// List partitions ordered by AE title
    List,
    /// Create a partition
    Add(AddArgs),
    /// Show one partition with its data access groups and devices
    Show {
        /// AE title of the partition
        ae_title: String,
    },
}

#[derive(Debug, Args)]
pub struct AddArgs {
    #[arg(long)]
    pub ae_title: String,

    /// Folder name under each filesystem
    #[arg(long)]
    pub folder: String,

    #[arg(long, default_value_t = 104)]
    pub port: u16,

    #[arg(long, default_value = "")]
    pub description: String,

    /// Create the partition disabled
    #[arg(long)]
    pub disabled: bool,

    /// Authority group OID allowed to see the partition's studies (repeatable)
    #[arg(long = "group")]
    pub groups: Vec<String>,
}

pub fn execute(args: PartitionArgs, store: &PersistentStore) -> CliResult {
    let controller = ServerPartitionController::new(store.clone());
    match args.command {
        PartitionCommand::List => print_json(&controller.partitions()?),
        PartitionCommand::Add(add) => {
            let mut settings = PartitionSettings::new(add.ae_title, add.folder, add.port);
            settings.description = add.description;
            settings.enabled = !add.disabled;
            let partition = controller.add_partition(&settings, &add.groups)?;
            print_json(&partition)
        }
        PartitionCommand::Show { ae_title } => {
            let partition = find_partition(&controller, &ae_title)?;
            let groups = controller.data_access_groups(&partition)?;
            let devices = controller.devices(&partition)?;
            print_json(&json!({
                "partition": partition,
                "data_access_groups": groups,
                "devices": devices,
            }))
        }
    }
}

pub(crate) fn find_partition(
    controller: &ServerPartitionController,
    ae_title: &str,
) -> CliResult<ServerPartition> {
    controller
        .find_by_ae_title(ae_title)?
        .ok_or_else(|| format!("no partition with AE title '{}'", ae_title).into())
}
