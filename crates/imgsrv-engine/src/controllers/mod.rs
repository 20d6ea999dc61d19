//! Controllers
//!
//! Each controller method that changes state opens one update context, runs
//! every step through the adaptors' `*_in` variants and commits only when all
//! steps succeeded. Dropping the context on an early return discards it.
//!
//! ## Logging Ownership
//!
//! Controllers log `log_op_start!` / `log_op_end!` / `log_op_error!` around each
//! operation, each call under a fresh request id that is also attached to the
//! error it returns. The `*_in` adaptor calls they make do not log, so a
//! failure is reported once.

mod server_partition;
mod study;
mod work_queue;

use std::time::Instant;

use imgsrv_core::errors::Result;
use imgsrv_core::types::RequestId;
use imgsrv_core::{log_op_end, log_op_error, log_op_start};

pub use server_partition::{PartitionSettings, ServerPartitionController};
pub use study::StudyController;
pub use work_queue::WorkQueueController;

/// Run one controller operation with boundary logging
pub(crate) fn logged<T>(op: &'static str, f: impl FnOnce() -> Result<T>) -> Result<T> {
    let request_id = RequestId::new();
    log_op_start!(op, request_id = %request_id);
    let start = Instant::now();
    let result = f();
    let duration_ms = start.elapsed().as_millis() as u64;
    match &result {
        Ok(_) => {
            log_op_end!(op, duration_ms = duration_ms, request_id = %request_id);
        }
        Err(err) => {
            log_op_error!(op, err, duration_ms = duration_ms, request_id = %request_id);
        }
    }
    result.map_err(|err| {
        if err.request_id().is_some() {
            err
        } else {
            err.with_request_id(request_id)
        }
    })
}
