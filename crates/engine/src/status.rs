// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared, lock-free-to-read status snapshot consumed by the read-only
//! HTTP status surface. The planner writes a fresh [`StatusView`] every
//! time it finishes a planning pass; the HTTP handlers only ever read.

use parking_lot::RwLock;
use snapd_adapters::ClusterHealth;
use std::sync::Arc;

/// One schedule entry's binding, as summarised for display.
#[derive(Debug, Clone)]
pub struct BindingSummary {
    pub group: String,
    pub entry: String,
    pub filesystem: String,
    pub next_fire: Option<String>,
}

/// A point-in-time summary of the engine's state, rebuilt by the planner
/// after every planning pass and on every config reload.
#[derive(Debug, Clone, Default)]
pub struct StatusView {
    pub cluster_health: Option<ClusterHealth>,
    pub bindings: Vec<BindingSummary>,
    pub recent_progress: Vec<String>,
    pub config_loaded_at: Option<String>,
}

/// Shared handle the planner publishes into and the status UI reads
/// from. Cheap to clone; wraps an `Arc<RwLock<_>>`.
#[derive(Clone, Default)]
pub struct EngineStatus {
    inner: Arc<RwLock<StatusView>>,
}

impl EngineStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, view: StatusView) {
        *self.inner.write() = view;
    }

    pub fn snapshot(&self) -> StatusView {
        self.inner.read().clone()
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
