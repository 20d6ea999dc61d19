//! Image server administration CLI
//!
//! Every command prints its result as JSON on stdout. Logs go to stderr.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use imgsrv_core::logging_facility::{self, Profile};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "imgsrv")]
#[command(about = "Image server partitions, devices and work queue", long_about = None)]
struct Cli {
    /// Database file, overrides the path in the configuration file
    #[arg(long, global = true, env = "IMGSRV_DB")]
    db: Option<PathBuf>,

    /// TOML store configuration
    #[arg(long, global = true, env = "IMGSRV_CONFIG")]
    config: Option<PathBuf>,

    /// Logging profile (dev or prod)
    #[arg(long, global = true, env = "IMGSRV_LOG", default_value = "prod")]
    log: Profile,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    Migrate,
    /// Server partition configuration
    Partition(commands::partition::PartitionArgs),
    /// Devices of a partition
    Device(commands::device::DeviceArgs),
    /// Work queue inspection and manual intervention
    Workqueue(commands::workqueue::WorkQueueArgs),
}

fn main() {
    let cli = Cli::parse();
    logging_facility::init(cli.log);

    let options = commands::StoreOptions {
        db: cli.db,
        config: cli.config,
    };
    let result = options.open().and_then(|store| match cli.command {
        Commands::Migrate => commands::migrate::execute(&store),
        Commands::Partition(args) => commands::partition::execute(args, &store),
        Commands::Device(args) => commands::device::execute(args, &store),
        Commands::Workqueue(args) => commands::workqueue::execute(args, &store),
    });

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
