// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Startup replay: recover outstanding intents from the log and hand them
//! back to the worker. No cluster calls happen here — the worker's own
//! status-check-before-acting steps already treat a vanished snapshot or
//! an already-synchronized stow as a no-op completion, so a queued,
//! in-progress, or errored intent from a previous run is always safe to
//! resubmit as-is.

use crate::queue::WorkItem;
use crate::worker::Worker;
use snapd_core::clock::Clock;
use snapd_storage::{IntentLog, WalError};
use tracing::info;

/// Load every outstanding intent and requeue it on `worker`, in the
/// order `IntentLog::load_outstanding` returns them (in-progress, then
/// error, then queued). Returns the number of intents requeued.
pub fn replay_outstanding<C: Clock>(log: &IntentLog, worker: &Worker<C>) -> Result<usize, WalError> {
    let outstanding = log.load_outstanding()?;
    let count = outstanding.len();
    if count > 0 {
        info!(count, "replaying outstanding intents from the intent log");
    }
    for record in outstanding {
        worker.requeue(WorkItem {
            uid: record.uid,
            filesystem: record.filesystem,
            snapshot: record.snapshot,
            operation: record.operation,
        });
    }
    Ok(count)
}

#[cfg(test)]
#[path = "replay_tests.rs"]
mod tests;
