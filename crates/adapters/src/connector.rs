// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The cluster API client contract.
//!
//! This is the external, out-of-scope collaborator named in the purpose
//! statement: a request/response RPC with a named method and a parameter
//! mapping. The trait below is the boundary the planner and worker program
//! against; the retry/reconnect policy that wraps it lives in
//! `snapd-engine`, since that bounded-retry behavior is part of the
//! scheduling engine, not the transport.

use async_trait::async_trait;
use snapd_core::snapshot::Snapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObsSite {
    Local,
    Remote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketMode {
    Writable,
    Remote,
    ReadOnly,
}

#[derive(Debug, Clone)]
pub struct Bucket {
    pub name: String,
    pub mode: BucketMode,
}

#[derive(Debug, Clone)]
pub struct Filesystem {
    pub name: String,
    pub buckets: Vec<Bucket>,
}

impl Filesystem {
    /// Select the bucket whose mode matches the obs_site an upload is
    /// targeting (`WRITABLE` for local, `REMOTE` for remote).
    pub fn bucket_for(&self, site: ObsSite) -> Option<&Bucket> {
        let wanted = match site {
            ObsSite::Local => BucketMode::Writable,
            ObsSite::Remote => BucketMode::Remote,
        };
        self.buckets.iter().find(|b| b.mode == wanted)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterHealth {
    Healthy,
    Degraded,
}

/// A filter over `snapshots_list`: all snapshots, or all on one filesystem.
#[derive(Debug, Clone)]
pub enum SnapshotFilter {
    All,
    Filesystem(String),
}

use crate::error::ConnectorError;

#[async_trait]
pub trait ClusterConnector: Send + Sync {
    async fn snapshots_list(&self, filter: SnapshotFilter) -> Result<Vec<Snapshot>, ConnectorError>;

    async fn snapshot_create(
        &self,
        fs: &str,
        name: &str,
        access_point: &str,
        writable: bool,
    ) -> Result<(), ConnectorError>;

    async fn snapshot_upload(
        &self,
        fs: &str,
        snap: &str,
        site: ObsSite,
        bucket: &str,
    ) -> Result<String, ConnectorError>; // returns the locator

    async fn snapshot_delete(&self, fs: &str, name: &str) -> Result<(), ConnectorError>;

    async fn filesystems_list(&self) -> Result<Vec<Filesystem>, ConnectorError>;

    async fn status(&self) -> Result<ClusterHealth, ConnectorError>;
}

#[cfg(any(test, feature = "test-support"))]
pub mod fake;

pub mod http;
