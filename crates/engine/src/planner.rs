// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The planner/reconciler: decides what fires next, creates snapshots and
//! their upload intents, prunes excess snapshots against retention, and
//! hot-reloads the schedule/binding config and cluster connection on
//! file-mtime change.

use crate::error::EngineError;
use crate::retry::RetryConnector;
use crate::status::{BindingSummary, EngineStatus, StatusView};
use crate::worker::Worker;
use chrono::{DateTime, Local, Timelike};
use parking_lot::RwLock;
use snapd_adapters::config::changed_since;
use snapd_adapters::{load_config, ClusterConfig, ClusterConnector, SnapshotFilter};
use snapd_core::clock::Clock;
use snapd_core::group::ScheduleGroup;
use snapd_core::intent::Operation;
use snapd_core::recurrence::FireTime;
use snapd_core::schedule::UploadMode;
use snapd_core::snapshot::{format_access_point, format_snapshot_name, Snapshot, DEFAULT_ACCESS_POINT_PATTERN};
use snapd_storage::IntentLog;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::watch;
use tracing::{error, warn};

/// How often the planner checks the config file's mtime while waiting for
/// the next fire instant or idling with nothing scheduled.
const CONFIG_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// One filesystem's winning claim from a `plan_next` pass: the entry
/// whose group won the tie-break for that filesystem, with everything
/// `create_snapshots` needs already copied out (schedule entries are not
/// `Clone`, owning a `Mutex` for recurrence memoisation).
#[derive(Debug, Clone)]
pub struct PlannedSnapshot {
    pub filesystem: String,
    pub group_name: String,
    pub entry_name: String,
    pub upload_mode: UploadMode,
}

pub struct Planner<C: Clock> {
    connector: Arc<RetryConnector>,
    worker: Arc<Worker<C>>,
    log: Arc<IntentLog>,
    clock: C,
    config_path: PathBuf,
    groups: RwLock<Vec<ScheduleGroup>>,
    cluster_config: Arc<RwLock<ClusterConfig>>,
    config_loaded_at: RwLock<SystemTime>,
    status: EngineStatus,
}

impl<C: Clock> Planner<C> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        connector: Arc<RetryConnector>,
        worker: Arc<Worker<C>>,
        log: Arc<IntentLog>,
        clock: C,
        config_path: impl Into<PathBuf>,
        cluster_config: Arc<RwLock<ClusterConfig>>,
        initial_groups: Vec<ScheduleGroup>,
        loaded_at: SystemTime,
        status: EngineStatus,
    ) -> Self {
        Self {
            connector,
            worker,
            log,
            clock,
            config_path: config_path.into(),
            groups: RwLock::new(initial_groups),
            cluster_config,
            config_loaded_at: RwLock::new(loaded_at),
            status,
        }
    }

    /// Sort groups by `(next_fire, sort_priority, no_upload)`, collect
    /// every group whose `next_fire` equals the head's, and walk their
    /// filesystems claiming each one for the first (earliest-sorted)
    /// group that names it. Later claims for an already-claimed
    /// filesystem are silently dropped.
    pub fn plan_next(groups: &[ScheduleGroup], now: DateTime<Local>) -> (FireTime, HashMap<String, PlannedSnapshot>) {
        if groups.is_empty() {
            return (FireTime::Never, HashMap::new());
        }
        let mut sorted: Vec<&ScheduleGroup> = groups.iter().collect();
        sorted.sort_by_key(|g| g.tie_break(now));

        let head_fire = sorted[0].tie_break(now).fire_time;
        if head_fire == FireTime::Never {
            return (FireTime::Never, HashMap::new());
        }

        let mut claimed: HashMap<String, PlannedSnapshot> = HashMap::new();
        for group in sorted.iter().take_while(|g| g.tie_break(now).fire_time == head_fire) {
            let Some(entry) = group.earliest_entry(now) else { continue };
            for fs in group.filesystems() {
                claimed.entry(fs.clone()).or_insert_with(|| PlannedSnapshot {
                    filesystem: fs.clone(),
                    group_name: group.name().to_string(),
                    entry_name: entry.name().to_string(),
                    upload_mode: entry.upload_mode(),
                });
            }
        }
        (head_fire, claimed)
    }

    /// For each claimed `(fs, entry)`, create `{entry}.{YYMMDDhhmm}` with
    /// an access-point name derived from `fire_at`, and log an upload
    /// intent if the entry's upload mode calls for one. A single
    /// filesystem's create failure is logged and skipped rather than
    /// aborting the rest of the pass.
    pub async fn create_snapshots(
        &self,
        fire_at: DateTime<Local>,
        plan: &HashMap<String, PlannedSnapshot>,
    ) -> Result<(), EngineError> {
        for (fs, planned) in plan {
            let name = format_snapshot_name(&planned.entry_name, fire_at);
            let access_point =
                format_access_point(DEFAULT_ACCESS_POINT_PATTERN, fire_at, &planned.entry_name, fs);
            if let Err(e) = self.connector.snapshot_create(fs, &name, &access_point, false).await {
                error!(filesystem = %fs, snapshot = %name, error = %e, "snapshot_create failed");
                continue;
            }
            let operation = match planned.upload_mode {
                UploadMode::None => None,
                UploadMode::Local => Some(Operation::Upload),
                UploadMode::Remote => Some(Operation::UploadRemote),
            };
            if let Some(op) = operation {
                if let Err(e) = self.worker.enqueue_upload(fs, &name, op) {
                    error!(filesystem = %fs, snapshot = %name, error = %e, "failed to log upload intent");
                }
            }
        }
        Ok(())
    }

    /// Fetch the full snapshot list, group by filesystem, and for every
    /// (group, entry, filesystem) triple enqueue deletes for the oldest
    /// excess beyond `entry.retain()`.
    pub async fn reconcile_deletes(&self) -> Result<(), EngineError> {
        let snapshots = self.connector.snapshots_list(SnapshotFilter::All).await?;
        let mut by_fs: HashMap<&str, Vec<&Snapshot>> = HashMap::new();
        for s in &snapshots {
            by_fs.entry(s.filesystem.as_str()).or_default().push(s);
        }

        let groups = self.groups.read();
        for group in groups.iter() {
            for entry in group.entries() {
                for fs in group.filesystems() {
                    let Some(candidates) = by_fs.get(fs.as_str()) else { continue };
                    let mut matching: Vec<&Snapshot> = candidates
                        .iter()
                        .copied()
                        .filter(|s| {
                            Snapshot::parse_engine_name(&s.name).map(|(n, _)| n) == Some(entry.name())
                        })
                        .collect();
                    matching.sort_by_key(|s| s.creation_time);
                    let retain = entry.retain() as usize;
                    if matching.len() > retain {
                        let excess = matching.len() - retain;
                        for s in &matching[..excess] {
                            if let Err(e) = self.worker.enqueue_delete(fs, &s.name) {
                                error!(
                                    filesystem = %fs, snapshot = %s.name, error = %e,
                                    "failed to log delete intent"
                                );
                            }
                        }
                    }
                }
            }
        }
        Ok(())
    }

    async fn delete_pass(&self) {
        if let Err(e) = self.reconcile_deletes().await {
            error!(error = %e, "reconcile_deletes failed");
        }
    }

    async fn publish_status(&self, plan: &HashMap<String, PlannedSnapshot>, fire_time: FireTime) {
        let health = self.connector.status().await.ok();
        let bindings = plan
            .values()
            .map(|p| BindingSummary {
                group: p.group_name.clone(),
                entry: p.entry_name.clone(),
                filesystem: p.filesystem.clone(),
                next_fire: fire_time.instant().map(|t| t.to_rfc3339()),
            })
            .collect();
        self.status.publish(StatusView {
            cluster_health: health,
            bindings,
            recent_progress: self.worker.progress().snapshot(),
            config_loaded_at: Some(format!("{:?}", *self.config_loaded_at.read())),
        });
    }

    /// Reload the config if its mtime has advanced since the last load.
    /// Returns `true` if a reload happened, so a caller waiting for the
    /// next fire instant knows to abandon the wait and replan.
    fn reload_config_if_changed(&self) -> bool {
        let loaded_at = *self.config_loaded_at.read();
        if !changed_since(&self.config_path, loaded_at) {
            return false;
        }
        let loaded = match load_config(&self.config_path) {
            Ok(loaded) => loaded,
            Err(e) => {
                error!(error = %e, "failed to reload config, keeping previous schedule");
                return false;
            }
        };
        for err in &loaded.ignored_errors {
            warn!(error = %err, "ignoring malformed config entry");
        }
        for group in &loaded.groups {
            if group.filesystems().is_empty() {
                warn!(group = group.name(), "schedule group has no bound filesystems");
            }
        }

        let old_cluster = self.cluster_config.read().clone();
        let reconnect_needed = old_cluster.hosts.0 != loaded.cluster.hosts.0
            || old_cluster.auth_token_file != loaded.cluster.auth_token_file
            || old_cluster.force_https != loaded.cluster.force_https
            || old_cluster.verify_cert != loaded.cluster.verify_cert;

        *self.cluster_config.write() = loaded.cluster;
        *self.groups.write() = loaded.groups;
        *self.config_loaded_at.write() = loaded.loaded_at;

        if reconnect_needed {
            if let Err(e) = self.connector.reconnect() {
                error!(error = %e, "reconnect after config change failed, retaining previous connector");
            }
        }
        true
    }

    /// Wait until `fire_at`, polling the config mtime every
    /// `CONFIG_POLL_INTERVAL`. Returns `true` if `fire_at` was reached
    /// undisturbed, `false` if a config reload or shutdown cut the wait
    /// short (the caller should replan rather than proceed to create).
    async fn wait_until(&self, fire_at: DateTime<Local>, shutdown: &mut watch::Receiver<bool>) -> bool {
        loop {
            if *shutdown.borrow() {
                return false;
            }
            let now = self.clock.now();
            if now >= fire_at {
                return true;
            }
            let remaining = (fire_at - now).to_std().unwrap_or(Duration::ZERO);
            let tick = remaining.min(CONFIG_POLL_INTERVAL);
            tokio::select! {
                _ = tokio::time::sleep(tick) => {
                    if self.reload_config_if_changed() {
                        return false;
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        return false;
                    }
                }
            }
        }
    }

    /// Idle wait used when nothing is scheduled (e.g. an empty config):
    /// poll for a config change instead of busy-looping.
    async fn idle_wait(&self, shutdown: &mut watch::Receiver<bool>) {
        tokio::select! {
            _ = tokio::time::sleep(CONFIG_POLL_INTERVAL) => {
                self.reload_config_if_changed();
            }
            _ = shutdown.changed() => {}
        }
    }

    /// Sleep until the start of the next minute, so a fire instant
    /// already acted on this tick is not immediately re-entered by the
    /// next `plan_next` call (recurrence is idempotent for `now` within
    /// the same minute as the memoised result).
    async fn pad_to_next_minute(&self, shutdown: &mut watch::Receiver<bool>) {
        let now = self.clock.now();
        let pad = duration_to_next_minute(now);
        if pad.is_zero() {
            return;
        }
        tokio::select! {
            _ = tokio::time::sleep(pad) => {}
            _ = shutdown.changed() => {}
        }
    }

    /// Drive the state machine `idle -> delete-pass -> planning ->
    /// waiting(fire_time) -> creating -> delete-pass -> padding -> idle`
    /// until `shutdown` fires.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        loop {
            if *shutdown.borrow() {
                return;
            }
            if let Err(e) = self.log.rotate() {
                error!(error = %e, "intent log rotation check failed");
            }

            self.delete_pass().await;
            if *shutdown.borrow() {
                return;
            }

            let now = self.clock.now();
            let (fire_time, plan) = {
                let groups = self.groups.read();
                Self::plan_next(groups.as_slice(), now)
            };
            self.publish_status(&plan, fire_time).await;

            let Some(fire_at) = fire_time.instant() else {
                self.idle_wait(&mut shutdown).await;
                continue;
            };

            if !self.wait_until(fire_at, &mut shutdown).await {
                continue;
            }
            if *shutdown.borrow() {
                return;
            }

            if let Err(e) = self.create_snapshots(fire_at, &plan).await {
                error!(error = %e, "create_snapshots failed");
            }
            self.delete_pass().await;
            self.pad_to_next_minute(&mut shutdown).await;
        }
    }
}

fn duration_to_next_minute(now: DateTime<Local>) -> Duration {
    let elapsed_ns = now.second() as u64 * 1_000_000_000 + now.timestamp_subsec_nanos() as u64;
    if elapsed_ns == 0 {
        return Duration::ZERO;
    }
    Duration::from_nanos(60_000_000_000u64.saturating_sub(elapsed_ns))
}

#[cfg(test)]
#[path = "planner_tests.rs"]
mod tests;
