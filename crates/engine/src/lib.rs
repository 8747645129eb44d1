// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! snapd-engine: the scheduling engine that ties the data model
//! (`snapd-core`), the durable intent log (`snapd-storage`), and the
//! cluster API client (`snapd-adapters`) together. Three pieces live
//! here: a bounded retry/reconnect wrapper around the raw connector, a
//! single-consumer background worker that executes upload and delete
//! intents, and the planner/reconciler that decides what to fire and
//! when.

pub mod error;
pub mod planner;
pub mod progress;
pub mod queue;
pub mod replay;
pub mod retry;
pub mod status;
pub mod worker;

pub use error::EngineError;
pub use planner::Planner;
pub use progress::ProgressRing;
pub use queue::{WorkItem, WorkQueue};
pub use replay::replay_outstanding;
pub use retry::{ConnectorFactory, RetryConnector};
pub use status::{EngineStatus, StatusView};
pub use worker::Worker;
