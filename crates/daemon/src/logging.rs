// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Action-log setup for `logs/snaptool.log`: a rotating `tracing`
//! sink distinct from the intent log's own internal rotation in
//! `snapd-storage`. Rotation here is a startup-time size check, not a
//! running-process threshold, matching the reference daemon's own
//! `rotate_log_if_needed` shape.

use crate::env;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Maximum size of `snaptool.log` before rotation (10 MiB per §6).
const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;
/// Rotated backups kept (`snaptool.log.1`, `snaptool.log.2`).
const MAX_ROTATED_LOGS: u32 = 2;

/// Shift `snaptool.log` -> `.1` -> `.2`, dropping the oldest. Best-effort:
/// a failure here must not stop the daemon from starting.
pub fn rotate_log_if_needed(log_path: &Path) {
    let size = match std::fs::metadata(log_path) {
        Ok(m) => m.len(),
        Err(_) => return,
    };
    if size < MAX_LOG_SIZE {
        return;
    }
    let log_str = log_path.display().to_string();
    for i in (1..MAX_ROTATED_LOGS).rev() {
        let from = format!("{log_str}.{i}");
        let to = format!("{log_str}.{}", i + 1);
        let _ = std::fs::rename(&from, &to);
    }
    let _ = std::fs::rename(log_path, format!("{log_str}.1"));
}

fn filter_for(verbosity: u8) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    if let Some(level) = env::initial_log_level() {
        if let Ok(filter) = EnvFilter::try_new(&level) {
            return filter;
        }
    }
    let level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    EnvFilter::new(level)
}

/// Install the `tracing` subscriber: always a non-blocking file layer at
/// `log_path`, plus a stderr layer unless the process is running under a
/// container entrypoint or systemd unit that already captures stderr
/// (`IN_DOCKER_CONTAINER`, `LAUNCHED_BY_SYSTEMD`), which would otherwise
/// duplicate every line into journald or the container log driver.
pub fn setup_logging(verbosity: u8, log_path: &Path) -> std::io::Result<WorkerGuard> {
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let dir = log_path.parent().unwrap_or_else(|| Path::new("."));
    let file_name = log_path.file_name().unwrap_or_else(|| std::ffi::OsStr::new("snaptool.log"));
    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let suppress_stderr = env::in_docker_container() || env::launched_by_systemd();

    let registry = tracing_subscriber::registry()
        .with(filter_for(verbosity))
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false));

    if suppress_stderr {
        registry.init();
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr)).init();
    }

    Ok(guard)
}

#[cfg(test)]
#[path = "logging_tests.rs"]
mod tests;
