// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! snapd-daemon library surface: split out of `main` so the status UI
//! router and CLI parsing can be exercised directly in tests without
//! spawning the binary.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod cli;
pub mod env;
pub mod logging;
pub mod status_http;

pub use cli::Cli;
