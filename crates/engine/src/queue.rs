// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The single-consumer FIFO queue of work items between the planner
//! (producer) and the background worker (consumer).

use parking_lot::Mutex;
use snapd_core::intent::Operation;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Notify;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub uid: String,
    pub filesystem: String,
    pub snapshot: String,
    pub operation: Operation,
}

#[derive(Default)]
pub struct WorkQueue {
    inner: Mutex<VecDeque<WorkItem>>,
    notify: Notify,
}

impl WorkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` if an equivalent `(filesystem, snapshot, delete)` intent is
    /// already queued. Checked by the planner before logging and enqueuing
    /// a new delete intent; harmless if the matched item is dequeued between
    /// the check and the caller's decision, since the queue only shrinks
    /// under concurrent access (the worker is the sole consumer).
    pub fn has_pending_delete(&self, filesystem: &str, snapshot: &str) -> bool {
        self.inner.lock().iter().any(|item| {
            item.operation == Operation::Delete
                && item.filesystem == filesystem
                && item.snapshot == snapshot
        })
    }

    pub fn push(&self, item: WorkItem) {
        self.inner.lock().push_back(item);
        self.notify.notify_one();
    }

    /// Wait up to `timeout` for a work item. Returns `None` on timeout so
    /// the worker can re-check parent/shutdown liveness between polls.
    pub async fn pop_timeout(&self, timeout: Duration) -> Option<WorkItem> {
        loop {
            // Register interest before checking, so a push() landing
            // between the check and the wait is not missed.
            let notified = self.notify.notified();
            if let Some(item) = self.inner.lock().pop_front() {
                return Some(item);
            }
            if tokio::time::timeout(timeout, notified).await.is_err() {
                return None;
            }
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
