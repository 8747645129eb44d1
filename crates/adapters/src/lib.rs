// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! External collaborators for the snapshot scheduling daemon: the cluster
//! API client contract and the TOML configuration loader. Both are named
//! out of scope as full implementations in the purpose statement; this
//! crate ships the trait/contract plus a workable reference
//! implementation of each (a fake in-memory connector, a real TOML
//! loader) rather than a placeholder.

pub mod config;
pub mod connector;
pub mod error;

pub use config::{load as load_config, ClusterConfig, LoadedConfig, SnaptoolConfig};
pub use connector::http::HttpClusterConnector;
pub use connector::{Bucket, BucketMode, ClusterConnector, ClusterHealth, Filesystem, ObsSite, SnapshotFilter};
pub use error::{ConfigError, ConnectorError};

#[cfg(any(test, feature = "test-support"))]
pub use connector::fake::FakeClusterConnector;
