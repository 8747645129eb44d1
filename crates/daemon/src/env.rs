// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

/// Pre-CLI log level, read before `-v` flags are available (e.g. set by
/// a supervisor wrapping this process before it can pass arguments).
pub fn initial_log_level() -> Option<String> {
    std::env::var("INITIAL_LOG_LEVEL").ok().filter(|s| !s.is_empty())
}

/// Set by container entrypoints that already capture stdout/stderr into
/// their own log pipeline; suppresses this process's own stderr handler
/// so log lines are not duplicated.
pub fn in_docker_container() -> bool {
    std::env::var_os("IN_DOCKER_CONTAINER").is_some()
}

/// Set by a systemd unit (`Environment=LAUNCHED_BY_SYSTEMD=1`) whose
/// journald capture already sees stderr; suppresses this process's own
/// stderr handler for the same reason as [`in_docker_container`].
pub fn launched_by_systemd() -> bool {
    std::env::var_os("LAUNCHED_BY_SYSTEMD").is_some()
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
