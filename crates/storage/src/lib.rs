// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Durable storage for the snapshot scheduling daemon: the append-only
//! intent log.

pub mod error;
pub mod intent_log;

pub use error::WalError;
pub use intent_log::{IntentLog, ROTATE_THRESHOLD_BYTES};
