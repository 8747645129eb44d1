// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Snapshot naming and the server-side snapshot observation model.

use chrono::{DateTime, Local, Utc};

/// `NONE / UPLOADING / SYNCHRONIZED` cluster-side upload status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StowStatus {
    None,
    Uploading,
    Synchronized,
}

/// Progress as reported by the cluster: either an unknown/"N/A" percentage,
/// or a parsed 0..=100 value. `-1` ("not uploaded") maps to `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    Unknown,
    Percent(u8),
}

impl Progress {
    /// Parse the cluster's mixed numeric/string progress representation
    /// (`"47%"`, `"N/A"`, or a bare `-1` sentinel) at the boundary.
    pub fn parse(raw: &str) -> Self {
        if raw == "-1" || raw.eq_ignore_ascii_case("n/a") {
            return Progress::Unknown;
        }
        let trimmed = raw.trim_end_matches('%');
        match trimmed.parse::<u8>() {
            Ok(p) => Progress::Percent(p.min(100)),
            Err(_) => Progress::Unknown,
        }
    }
}

/// One side (local or remote) of a snapshot's stow state.
#[derive(Debug, Clone)]
pub struct Stow {
    pub status: StowStatus,
    pub progress: Progress,
    pub locator: Option<String>,
}

/// Server-side snapshot, as observed through the cluster connector.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub filesystem: String,
    pub name: String,
    pub creation_time: DateTime<Local>,
    pub locator: Option<String>,
    pub local_stow: Stow,
    pub remote_stow: Stow,
}

impl Snapshot {
    /// Split `{entry_name}.{10-digit-suffix}`; returns `None` if the name
    /// does not match the engine's naming convention (such snapshots are
    /// ignored by retention logic).
    pub fn parse_engine_name(name: &str) -> Option<(&str, &str)> {
        let (entry_name, suffix) = name.rsplit_once('.')?;
        if suffix.len() == 10 && suffix.bytes().all(|b| b.is_ascii_digit()) {
            Some((entry_name, suffix))
        } else {
            None
        }
    }

    /// Derive the locator to use for a delete/upload call: the top-level
    /// locator first, then remote, then local.
    pub fn preferred_locator(&self) -> Option<&str> {
        self.locator
            .as_deref()
            .or(self.remote_stow.locator.as_deref())
            .or(self.local_stow.locator.as_deref())
    }
}

/// Format a snapshot name from a fire instant: `{entry_name}.{YYMMDDhhmm}`.
pub fn format_snapshot_name(entry_name: &str, fire_time: DateTime<Local>) -> String {
    format!("{entry_name}.{}", fire_time.format("%y%m%d%H%M"))
}

/// Default access-point strftime-like pattern, preserved bit-exactly for
/// compatibility with Windows Previous Versions clients.
pub const DEFAULT_ACCESS_POINT_PATTERN: &str = "@GMT-%Y.%m.%d-%H.%M.%S";

/// Derive the access-point name from the fire instant (converted to UTC)
/// using an operator-supplied strftime-like pattern, plus the literal
/// substitutions `%name` and `%fs`.
pub fn format_access_point(
    pattern: &str,
    fire_time: DateTime<Local>,
    entry_name: &str,
    filesystem: &str,
) -> String {
    // Replace the literal substitutions with sentinel markers before handing
    // the pattern to chrono's strftime, so `%name`/`%fs` are never
    // misparsed as strftime specifiers (e.g. `%n` is newline).
    const NAME_MARKER: &str = "\u{1}NAME\u{1}";
    const FS_MARKER: &str = "\u{1}FS\u{1}";
    let masked = pattern.replace("%name", NAME_MARKER).replace("%fs", FS_MARKER);
    let utc: DateTime<Utc> = fire_time.with_timezone(&Utc);
    let strftime_applied = utc.format(&masked).to_string();
    strftime_applied.replace(NAME_MARKER, entry_name).replace(FS_MARKER, filesystem)
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
