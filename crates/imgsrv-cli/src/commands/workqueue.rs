//! Work queue commands
//!
//! Batch commands take entry keys; an unknown key fails the command before
//! anything is changed.

use chrono::{DateTime, Duration, Utc};
use clap::{Args, Subcommand};
use imgsrv_core::model::{WorkQueue, WorkQueueField, WorkQueuePriority, WorkQueueStatus};
use imgsrv_core::rules::work_queue as rules;
use imgsrv_core::SelectCriteria;
use imgsrv_engine::WorkQueueController;
use imgsrv_store::PersistentStore;
use serde_json::json;

use super::{parse_key, print_json, CliResult};

#[derive(Debug, Args)]
pub struct WorkQueueArgs {
    #[command(subcommand)]
    pub command: WorkQueueCommand,
}

#[derive(Debug, Subcommand)]
pub enum WorkQueueCommand {
    /// List entries in scheduled order
    List {
        /// Only entries with this status, e.g. "Pending" or "In Progress"
        #[arg(long)]
        status: Option<WorkQueueStatus>,
    },
    /// Move pending or idle entries to a new scheduled time
    Reschedule {
        #[arg(required = true)]
        keys: Vec<String>,

        /// Minutes from now
        #[arg(long, default_value_t = 0)]
        in_minutes: i64,

        /// Minutes after the new scheduled time the entries expire
        #[arg(long)]
        expire_after: Option<i64>,

        #[arg(long)]
        priority: Option<WorkQueuePriority>,
    },
    /// Return failed or abandoned entries to pending
    Reset {
        #[arg(required = true)]
        keys: Vec<String>,
    },
    /// Replace a failed entry with a reprocess request
    Reprocess { key: String },
    /// Delete entries with their UIDs
    Delete {
        #[arg(required = true)]
        keys: Vec<String>,

        /// Also delete entries the work queue rules would keep, such as
        /// pending study processing
        #[arg(long)]
        force: bool,
    },
    /// Claimed entries per processor
    Overview,
}

pub fn execute(args: WorkQueueArgs, store: &PersistentStore) -> CliResult {
    let controller = WorkQueueController::new(store.clone());
    match args.command {
        WorkQueueCommand::List { status } => {
            let mut criteria = SelectCriteria::new().sort_asc(WorkQueueField::ScheduledTime);
            if let Some(status) = status {
                criteria = criteria.equal_to(WorkQueueField::WorkQueueStatus, status);
            }
            print_json(&controller.find(&criteria)?)
        }
        WorkQueueCommand::Reschedule {
            keys,
            in_minutes,
            expire_after,
            priority,
        } => {
            let scheduled = minutes_after(Utc::now(), in_minutes)?;
            let expiration = expire_after
                .map(|minutes| minutes_after(scheduled, minutes))
                .transpose()?;
            let items = load_items(&controller, &keys)?;
            let changed = controller.reschedule_items(&items, scheduled, expiration, priority)?;
            print_changed(changed)
        }
        WorkQueueCommand::Reset { keys } => {
            let items = load_items(&controller, &keys)?;
            print_changed(controller.reset_items(&items, Utc::now(), None)?)
        }
        WorkQueueCommand::Reprocess { key } => {
            let item = load_item(&controller, &key)?;
            print_changed(controller.reprocess_item(&item)?)
        }
        WorkQueueCommand::Delete { keys, force } => {
            let items = load_items(&controller, &keys)?;
            if !force {
                let now = Utc::now();
                if let Some(kept) = items.iter().find(|item| !rules::can_delete(item, now)) {
                    return Err(format!(
                        "work queue entry '{}' is {} and cannot be deleted (use --force)",
                        kept.key, kept.work_queue_status
                    )
                    .into());
                }
            }
            print_changed(controller.delete_items(&items)?)
        }
        WorkQueueCommand::Overview => print_json(&controller.overview()?),
    }
}

fn load_items(controller: &WorkQueueController, keys: &[String]) -> CliResult<Vec<WorkQueue>> {
    keys.iter().map(|text| load_item(controller, text)).collect()
}

fn load_item(controller: &WorkQueueController, text: &str) -> CliResult<WorkQueue> {
    let key = parse_key(text)?;
    controller
        .get(&key)?
        .ok_or_else(|| format!("no work queue entry with key '{}'", key).into())
}

fn minutes_after(base: DateTime<Utc>, minutes: i64) -> CliResult<DateTime<Utc>> {
    Duration::try_minutes(minutes)
        .and_then(|offset| base.checked_add_signed(offset))
        .ok_or_else(|| format!("{} minutes is out of range", minutes).into())
}

fn print_changed(changed: bool) -> CliResult {
    print_json(&json!({ "changed": changed }))
}
