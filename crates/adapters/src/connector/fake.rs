// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory fake cluster connector. Every engine-level test programs
//! against this instead of a real network socket.

use super::{Bucket, BucketMode, ClusterConnector, ClusterHealth, Filesystem, ObsSite, SnapshotFilter};
use crate::error::ConnectorError;
use async_trait::async_trait;
use parking_lot::Mutex;
use snapd_core::snapshot::{Progress, Snapshot, Stow, StowStatus};
use std::collections::HashMap;

struct State {
    snapshots: HashMap<(String, String), Snapshot>,
    filesystems: HashMap<String, Filesystem>,
    health: ClusterHealth,
    fail_next: usize,
    policy_deny_upload_for: Option<String>,
}

pub struct FakeClusterConnector {
    state: Mutex<State>,
}

impl Default for FakeClusterConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeClusterConnector {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                snapshots: HashMap::new(),
                filesystems: HashMap::new(),
                health: ClusterHealth::Healthy,
                fail_next: 0,
                policy_deny_upload_for: None,
            }),
        }
    }

    pub fn add_filesystem(&self, name: impl Into<String>, buckets: Vec<Bucket>) {
        let name = name.into();
        self.state
            .lock()
            .filesystems
            .insert(name.clone(), Filesystem { name, buckets });
    }

    pub fn seed_snapshot(&self, snapshot: Snapshot) {
        let key = (snapshot.filesystem.clone(), snapshot.name.clone());
        self.state.lock().snapshots.insert(key, snapshot);
    }

    /// Make the next `n` calls return a transient failure, for exercising
    /// the retry policy.
    pub fn fail_next(&self, n: usize) {
        self.state.lock().fail_next = n;
    }

    /// Make uploads for this filesystem return the "not tiered" policy
    /// error.
    pub fn deny_upload_for(&self, fs: impl Into<String>) {
        self.state.lock().policy_deny_upload_for = Some(fs.into());
    }

    pub fn snapshot_exists(&self, fs: &str, name: &str) -> bool {
        self.state.lock().snapshots.contains_key(&(fs.to_string(), name.to_string()))
    }

    fn maybe_fail(state: &mut State) -> Result<(), ConnectorError> {
        if state.fail_next > 0 {
            state.fail_next -= 1;
            return Err(ConnectorError::Transient("fake injected failure".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl ClusterConnector for FakeClusterConnector {
    async fn snapshots_list(&self, filter: SnapshotFilter) -> Result<Vec<Snapshot>, ConnectorError> {
        let mut state = self.state.lock();
        Self::maybe_fail(&mut state)?;
        let snapshots = state
            .snapshots
            .values()
            .filter(|s| match &filter {
                SnapshotFilter::All => true,
                SnapshotFilter::Filesystem(fs) => &s.filesystem == fs,
            })
            .cloned()
            .collect();
        Ok(snapshots)
    }

    async fn snapshot_create(
        &self,
        fs: &str,
        name: &str,
        _access_point: &str,
        _writable: bool,
    ) -> Result<(), ConnectorError> {
        let mut state = self.state.lock();
        Self::maybe_fail(&mut state)?;
        let key = (fs.to_string(), name.to_string());
        if state.snapshots.contains_key(&key) {
            return Err(ConnectorError::AlreadyExists(format!(
                "snapshot {name} already exists on {fs}"
            )));
        }
        state.snapshots.insert(
            key,
            Snapshot {
                filesystem: fs.to_string(),
                name: name.to_string(),
                creation_time: chrono::Local::now(),
                locator: None,
                local_stow: Stow { status: StowStatus::None, progress: Progress::Unknown, locator: None },
                remote_stow: Stow { status: StowStatus::None, progress: Progress::Unknown, locator: None },
            },
        );
        Ok(())
    }

    async fn snapshot_upload(
        &self,
        fs: &str,
        snap: &str,
        site: ObsSite,
        bucket: &str,
    ) -> Result<String, ConnectorError> {
        let mut state = self.state.lock();
        Self::maybe_fail(&mut state)?;
        if state.policy_deny_upload_for.as_deref() == Some(fs) {
            return Err(ConnectorError::Permanent("not tiered: cannot upload from it".into()));
        }
        let key = (fs.to_string(), snap.to_string());
        let snapshot = state
            .snapshots
            .get_mut(&key)
            .ok_or_else(|| ConnectorError::Permanent(format!("snapshot {snap} not found")))?;
        let locator = format!("{bucket}/{snap}");
        let stow = match site {
            ObsSite::Local => &mut snapshot.local_stow,
            ObsSite::Remote => &mut snapshot.remote_stow,
        };
        stow.status = StowStatus::Synchronized;
        stow.progress = Progress::Percent(100);
        stow.locator = Some(locator.clone());
        Ok(locator)
    }

    async fn snapshot_delete(&self, fs: &str, name: &str) -> Result<(), ConnectorError> {
        let mut state = self.state.lock();
        Self::maybe_fail(&mut state)?;
        state.snapshots.remove(&(fs.to_string(), name.to_string()));
        Ok(())
    }

    async fn filesystems_list(&self) -> Result<Vec<Filesystem>, ConnectorError> {
        let mut state = self.state.lock();
        Self::maybe_fail(&mut state)?;
        Ok(state.filesystems.values().cloned().collect())
    }

    async fn status(&self) -> Result<ClusterHealth, ConnectorError> {
        let mut state = self.state.lock();
        Self::maybe_fail(&mut state)?;
        Ok(state.health)
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
