// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The background worker: a single-consumer queue that drives upload and
//! delete operations against the cluster with adaptive polling and
//! duplicate suppression.

use crate::progress::ProgressRing;
use crate::queue::{WorkItem, WorkQueue};
use snapd_adapters::{ClusterConnector, ConnectorError, ObsSite, SnapshotFilter};
use snapd_core::clock::Clock;
use snapd_core::intent::{IntentRecord, Operation, Status};
use snapd_core::snapshot::{Progress, Snapshot, StowStatus};
use snapd_core::uid::new_uid;
use std::sync::Arc;
use std::time::Duration;
use snapd_storage::IntentLog;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Consecutive status-fetch failures tolerated during a poll loop before
/// the worker abandons it, leaving the uid `in-progress` for the next
/// restart's replay to pick back up.
const MAX_POLL_ERRORS: u32 = 10;

/// How long the worker waits on an empty queue before re-checking parent
/// liveness / shutdown.
const DEQUEUE_TIMEOUT: Duration = Duration::from_secs(1);

/// Adaptive polling interval from `(loop_count, progress)`, per the
/// observed behaviour of object-store transfers: frequent stalls at low
/// percentages, an abrupt jump near completion. `Progress::Unknown`
/// (the cluster's `-1`/"N/A" sentinel) paces like `> 80`.
fn adaptive_sleep(loop_count: u32, progress: Progress) -> Duration {
    let percent = match progress {
        Progress::Unknown => 101,
        Progress::Percent(p) => p as i32,
    };
    let secs = if loop_count > 12 {
        if percent < 50 {
            60
        } else if percent <= 80 {
            30
        } else {
            10
        }
    } else if loop_count > 9 {
        if percent < 50 {
            30
        } else if percent <= 80 {
            20
        } else {
            10
        }
    } else if loop_count > 6 {
        if percent < 50 {
            20
        } else if percent <= 80 {
            15
        } else {
            10
        }
    } else if loop_count > 3 {
        if percent < 50 {
            10
        } else if percent <= 80 {
            5
        } else {
            5
        }
    } else {
        2
    };
    Duration::from_secs(secs)
}

pub struct Worker<C: Clock> {
    connector: Arc<dyn ClusterConnector>,
    log: Arc<IntentLog>,
    progress: Arc<ProgressRing>,
    queue: WorkQueue,
    clock: C,
}

impl<C: Clock> Worker<C> {
    pub fn new(
        connector: Arc<dyn ClusterConnector>,
        log: Arc<IntentLog>,
        progress: Arc<ProgressRing>,
        clock: C,
    ) -> Self {
        Self { connector, log, progress, queue: WorkQueue::new(), clock }
    }

    pub fn progress(&self) -> &ProgressRing {
        &self.progress
    }

    #[cfg(test)]
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    #[cfg(test)]
    pub async fn pop_for_test(&self, timeout: Duration) -> Option<WorkItem> {
        self.queue.pop_timeout(timeout).await
    }

    /// Log an upload/upload-remote intent and enqueue it. Not suppressed
    /// at enqueue time (duplicate uploads are caught later by the
    /// stow-status check at execution time).
    pub fn enqueue_upload(
        &self,
        fs: &str,
        snap: &str,
        operation: Operation,
    ) -> Result<String, snapd_storage::WalError> {
        let uid = new_uid();
        let record = IntentRecord::new(uid.clone(), fs, snap, operation, Status::Queued, self.clock.now());
        self.log.append(&record)?;
        self.queue.push(WorkItem {
            uid: uid.clone(),
            filesystem: fs.to_string(),
            snapshot: snap.to_string(),
            operation,
        });
        Ok(uid)
    }

    /// Log and enqueue a delete intent, unless an equivalent
    /// `(filesystem, snapshot, delete)` intent is already queued, in which
    /// case nothing is written and `Ok(None)` is returned.
    pub fn enqueue_delete(
        &self,
        fs: &str,
        snap: &str,
    ) -> Result<Option<String>, snapd_storage::WalError> {
        if self.queue.has_pending_delete(fs, snap) {
            return Ok(None);
        }
        let uid = new_uid();
        let record =
            IntentRecord::new(uid.clone(), fs, snap, Operation::Delete, Status::Queued, self.clock.now());
        self.log.append(&record)?;
        self.queue.push(WorkItem {
            uid: uid.clone(),
            filesystem: fs.to_string(),
            snapshot: snap.to_string(),
            operation: Operation::Delete,
        });
        Ok(Some(uid))
    }

    /// Re-enqueue an already-logged outstanding intent recovered by
    /// replay. Does not write a new log record: the intent is already on
    /// disk.
    pub fn requeue(&self, item: WorkItem) {
        self.queue.push(item);
    }

    /// Drive the queue until `shutdown` fires. Exits promptly (within
    /// `DEQUEUE_TIMEOUT`) once the parent/shutdown signal is observed.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        loop {
            if *shutdown.borrow() {
                return;
            }
            tokio::select! {
                item = self.queue.pop_timeout(DEQUEUE_TIMEOUT) => {
                    if let Some(item) = item {
                        self.execute(item).await;
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        return;
                    }
                }
            }
        }
    }

    async fn execute(&self, item: WorkItem) {
        match item.operation {
            Operation::Upload => self.execute_upload(item, ObsSite::Local).await,
            Operation::UploadRemote => self.execute_upload(item, ObsSite::Remote).await,
            Operation::Delete => self.execute_delete(item).await,
        }
    }

    fn append(&self, record: IntentRecord) {
        if let Err(e) = self.log.append(&record) {
            error!(error = %e, uid = %record.uid, "failed to append intent record");
        }
    }

    async fn fetch_one(&self, fs: &str, name: &str) -> Result<Option<Snapshot>, ConnectorError> {
        let snapshots = self.connector.snapshots_list(SnapshotFilter::Filesystem(fs.to_string())).await?;
        Ok(snapshots.into_iter().find(|s| s.name == name))
    }

    async fn resolve_bucket(&self, fs: &str, site: ObsSite) -> Option<String> {
        let filesystems = self.connector.filesystems_list().await.ok()?;
        let filesystem = filesystems.into_iter().find(|f| f.name == fs)?;
        filesystem.bucket_for(site).map(|b| b.name.clone())
    }

    async fn execute_upload(&self, item: WorkItem, site: ObsSite) {
        let now = self.clock.now();
        let snapshot = match self.fetch_one(&item.filesystem, &item.snapshot).await {
            Ok(Some(s)) => s,
            Ok(None) => {
                self.progress.push(format!(
                    "{}: snapshot {} missing on {}, marking complete (snapshot_missing)",
                    item.uid, item.snapshot, item.filesystem
                ));
                self.append(IntentRecord::new(
                    item.uid.clone(),
                    &item.filesystem,
                    &item.snapshot,
                    item.operation,
                    Status::Complete,
                    now,
                ));
                return;
            }
            Err(e) => {
                warn!(uid = %item.uid, error = %e, "status fetch failed before upload start");
                self.append(IntentRecord::new(
                    item.uid.clone(),
                    &item.filesystem,
                    &item.snapshot,
                    item.operation,
                    Status::Error,
                    now,
                ));
                return;
            }
        };

        let stow = match site {
            ObsSite::Local => &snapshot.local_stow,
            ObsSite::Remote => &snapshot.remote_stow,
        };
        if stow.status == StowStatus::Synchronized {
            self.append(IntentRecord::new(
                item.uid.clone(),
                &item.filesystem,
                &item.snapshot,
                item.operation,
                Status::Complete,
                now,
            ));
            return;
        }

        if stow.status == StowStatus::None {
            let Some(bucket) = self.resolve_bucket(&item.filesystem, site).await else {
                self.progress.push(format!(
                    "{}: no {:?} bucket available for {}, marking error",
                    item.uid, site, item.filesystem
                ));
                self.append(IntentRecord::new(
                    item.uid.clone(),
                    &item.filesystem,
                    &item.snapshot,
                    item.operation,
                    Status::Error,
                    now,
                ));
                return;
            };
            match self.connector.snapshot_upload(&item.filesystem, &item.snapshot, site, &bucket).await {
                Ok(locator) => {
                    self.progress.push(format!(
                        "{}: upload started for {}/{} -> {}",
                        item.uid, item.filesystem, item.snapshot, bucket
                    ));
                    self.append(
                        IntentRecord::new(
                            item.uid.clone(),
                            &item.filesystem,
                            &item.snapshot,
                            item.operation,
                            Status::InProgress,
                            now,
                        )
                        .with_locator(locator)
                        .with_bucket(bucket),
                    );
                }
                Err(ConnectorError::Permanent(msg)) if msg.contains("not tiered") => {
                    // Policy error, not a transient failure: left in
                    // `error` so the operator's schedule review surfaces
                    // it, rather than retried on every replay.
                    self.progress.push(format!(
                        "{}: {} is not tiered, cannot upload",
                        item.uid, item.filesystem
                    ));
                    self.append(IntentRecord::new(
                        item.uid.clone(),
                        &item.filesystem,
                        &item.snapshot,
                        item.operation,
                        Status::Error,
                        now,
                    ));
                    return;
                }
                Err(e) => {
                    warn!(uid = %item.uid, error = %e, "snapshot_upload call failed");
                    self.append(IntentRecord::new(
                        item.uid.clone(),
                        &item.filesystem,
                        &item.snapshot,
                        item.operation,
                        Status::Error,
                        now,
                    ));
                    return;
                }
            }
        }

        self.poll_until_terminal(item, site).await;
    }

    async fn poll_until_terminal(&self, item: WorkItem, site: ObsSite) {
        let mut loop_count = 0u32;
        let mut error_count = 0u32;
        loop {
            loop_count += 1;
            match self.fetch_one(&item.filesystem, &item.snapshot).await {
                Ok(None) => {
                    // Snapshot disappeared mid-upload; satisfied by policy,
                    // nothing left to upload.
                    self.append(IntentRecord::new(
                        item.uid.clone(),
                        &item.filesystem,
                        &item.snapshot,
                        item.operation,
                        Status::Complete,
                        self.clock.now(),
                    ));
                    return;
                }
                Ok(Some(snapshot)) => {
                    error_count = 0;
                    let stow = match site {
                        ObsSite::Local => &snapshot.local_stow,
                        ObsSite::Remote => &snapshot.remote_stow,
                    };
                    match (stow.status, stow.progress) {
                        (StowStatus::Synchronized, _) => {
                            self.progress.push(format!(
                                "{}: upload complete for {}/{}",
                                item.uid, item.filesystem, item.snapshot
                            ));
                            self.append(IntentRecord::new(
                                item.uid.clone(),
                                &item.filesystem,
                                &item.snapshot,
                                item.operation,
                                Status::Complete,
                                self.clock.now(),
                            ));
                            return;
                        }
                        (StowStatus::None, Progress::Unknown) if site == ObsSite::Remote => {
                            // Server-side hand-off lag between local stow
                            // completing and remote pickup starting.
                            tokio::time::sleep(adaptive_sleep(loop_count, stow.progress)).await;
                        }
                        (StowStatus::Uploading, _) => {
                            tokio::time::sleep(adaptive_sleep(loop_count, stow.progress)).await;
                        }
                        (other, _) => {
                            error!(uid = %item.uid, status = ?other, "unexpected terminal stow status, abandoning poll");
                            self.append(IntentRecord::new(
                                item.uid.clone(),
                                &item.filesystem,
                                &item.snapshot,
                                item.operation,
                                Status::Error,
                                self.clock.now(),
                            ));
                            return;
                        }
                    }
                }
                Err(e) => {
                    error_count += 1;
                    warn!(uid = %item.uid, error = %e, error_count, "status fetch failed during poll");
                    if error_count >= MAX_POLL_ERRORS {
                        error!(uid = %item.uid, "abandoning poll after repeated status-fetch errors");
                        return;
                    }
                    tokio::time::sleep(adaptive_sleep(loop_count, Progress::Unknown)).await;
                }
            }
        }
    }

    async fn execute_delete(&self, item: WorkItem) {
        let now = self.clock.now();
        let snapshot = match self.fetch_one(&item.filesystem, &item.snapshot).await {
            Ok(Some(s)) => s,
            Ok(None) => {
                self.append(IntentRecord::new(
                    item.uid.clone(),
                    &item.filesystem,
                    &item.snapshot,
                    Operation::Delete,
                    Status::Complete,
                    now,
                ));
                return;
            }
            Err(e) => {
                warn!(uid = %item.uid, error = %e, "status fetch failed before delete start");
                self.append(IntentRecord::new(
                    item.uid.clone(),
                    &item.filesystem,
                    &item.snapshot,
                    Operation::Delete,
                    Status::Error,
                    now,
                ));
                return;
            }
        };

        let locator = snapshot.preferred_locator().map(str::to_string);
        let bucket = self
            .resolve_bucket(&item.filesystem, ObsSite::Local)
            .await
            .or_else(|| snapshot.local_stow.locator.clone())
            .or_else(|| snapshot.remote_stow.locator.clone());

        match self.connector.snapshot_delete(&item.filesystem, &item.snapshot).await {
            Ok(()) => {
                self.progress.push(format!("{}: delete started for {}/{}", item.uid, item.filesystem, item.snapshot));
                let mut record = IntentRecord::new(
                    item.uid.clone(),
                    &item.filesystem,
                    &item.snapshot,
                    Operation::Delete,
                    Status::InProgress,
                    now,
                );
                if let Some(locator) = locator {
                    record = record.with_locator(locator);
                }
                if let Some(bucket) = bucket {
                    record = record.with_bucket(bucket);
                }
                self.append(record);
            }
            Err(e) => {
                warn!(uid = %item.uid, error = %e, "snapshot_delete call failed");
                self.append(IntentRecord::new(
                    item.uid.clone(),
                    &item.filesystem,
                    &item.snapshot,
                    Operation::Delete,
                    Status::Error,
                    now,
                ));
                return;
            }
        }

        let mut loop_count = 0u32;
        let mut error_count = 0u32;
        loop {
            loop_count += 1;
            match self.fetch_one(&item.filesystem, &item.snapshot).await {
                Ok(None) => {
                    info!(uid = %item.uid, "delete complete for {}/{}", item.filesystem, item.snapshot);
                    self.append(IntentRecord::new(
                        item.uid.clone(),
                        &item.filesystem,
                        &item.snapshot,
                        Operation::Delete,
                        Status::Complete,
                        self.clock.now(),
                    ));
                    return;
                }
                Ok(Some(_)) => {
                    error_count = 0;
                    tokio::time::sleep(adaptive_sleep(loop_count, Progress::Unknown)).await;
                }
                Err(e) => {
                    error_count += 1;
                    warn!(uid = %item.uid, error = %e, error_count, "status fetch failed during delete poll");
                    if error_count >= MAX_POLL_ERRORS {
                        error!(uid = %item.uid, "abandoning delete poll after repeated status-fetch errors");
                        return;
                    }
                    tokio::time::sleep(adaptive_sleep(loop_count, Progress::Unknown)).await;
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
