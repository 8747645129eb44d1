// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TOML configuration loading.
//!
//! Parses the declarative config document into the typed schedule-group /
//! filesystem-binding model from `snapd-core`. Malformed individual entries
//! are collected into `ignored_errors` and skipped rather than aborting the
//! whole load, so one bad schedule does not take the daemon down.

use crate::error::ConfigError;
use chrono::{NaiveTime, Weekday};
use serde::Deserialize;
use snapd_core::group::ScheduleGroup;
use snapd_core::schedule::{ScheduleEntry, ScheduleKind, UploadMode, RETAIN_MAX_DEFAULT};
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

fn default_retain() -> u32 {
    4
}

fn default_port() -> u16 {
    8090
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_auth_token_file() -> PathBuf {
    PathBuf::from("auth-token.json")
}

fn default_true() -> bool {
    true
}

/// `hosts` accepts either a bare string or a list of strings.
#[derive(Debug, Clone, Default)]
pub struct HostList(pub Vec<String>);

impl<'de> Deserialize<'de> for HostList {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            One(String),
            Many(Vec<String>),
        }
        Ok(match Repr::deserialize(deserializer)? {
            Repr::One(s) => HostList(vec![s]),
            Repr::Many(v) => HostList(v),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    pub hosts: HostList,
    #[serde(default = "default_auth_token_file")]
    pub auth_token_file: PathBuf,
    pub force_https: bool,
    #[serde(default = "default_true")]
    pub verify_cert: bool,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            hosts: HostList::default(),
            auth_token_file: default_auth_token_file(),
            force_https: false,
            verify_cert: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SnaptoolConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_host")]
    pub host: String,
}

impl Default for SnaptoolConfig {
    fn default() -> Self {
        Self { port: default_port(), host: default_host() }
    }
}

/// The loosely-typed `upload` field: `yes/no/true/false/1/0/local/remote`.
#[derive(Debug, Clone, Copy)]
struct UploadSpec(UploadMode);

impl Default for UploadSpec {
    fn default() -> Self {
        UploadSpec(UploadMode::None)
    }
}

impl<'de> Deserialize<'de> for UploadSpec {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Bool(bool),
            Int(i64),
            Str(String),
        }
        let mode = match Repr::deserialize(deserializer)? {
            Repr::Bool(true) => UploadMode::Local,
            Repr::Bool(false) => UploadMode::None,
            Repr::Int(1) => UploadMode::Local,
            Repr::Int(0) => UploadMode::None,
            Repr::Int(n) => {
                return Err(serde::de::Error::custom(format!("invalid upload value {n}")))
            }
            Repr::Str(s) => match s.to_ascii_lowercase().as_str() {
                "yes" | "true" | "1" | "local" => UploadMode::Local,
                "no" | "false" | "0" => UploadMode::None,
                "remote" => UploadMode::Remote,
                other => {
                    return Err(serde::de::Error::custom(format!(
                        "invalid upload value '{other}'"
                    )))
                }
            },
        };
        Ok(UploadSpec(mode))
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ScheduleSpec {
    every: String,
    #[serde(default)]
    at: Option<String>,
    #[serde(default)]
    interval: Option<u32>,
    #[serde(default)]
    until: Option<String>,
    #[serde(default)]
    day: Option<u32>,
    #[serde(default = "default_retain")]
    retain: u32,
    #[serde(default)]
    upload: UploadSpec,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct RawConfig {
    #[serde(default)]
    cluster: ClusterConfig,
    #[serde(default)]
    schedules: toml::value::Table,
    #[serde(default)]
    filesystems: toml::value::Table,
    #[serde(default)]
    snaptool: SnaptoolConfig,
}

/// Fully parsed configuration: typed cluster settings, schedule groups with
/// their bound filesystems, the status-UI settings, and the list of
/// individual entries that failed to parse (logged, not fatal).
pub struct LoadedConfig {
    pub cluster: ClusterConfig,
    pub groups: Vec<ScheduleGroup>,
    pub snaptool: SnaptoolConfig,
    pub ignored_errors: Vec<String>,
    pub loaded_at: SystemTime,
}

pub fn load(path: &Path) -> Result<LoadedConfig, ConfigError> {
    let text = fs::read_to_string(path)
        .map_err(|source| ConfigError::Read { path: path.display().to_string(), source })?;
    let raw: RawConfig = toml::from_str(&text)
        .map_err(|source| ConfigError::Parse { path: path.display().to_string(), source })?;
    let loaded_at = fs::metadata(path).and_then(|m| m.modified()).unwrap_or_else(|_| SystemTime::now());

    let mut ignored_errors = Vec::new();
    let mut entries_by_group: HashMap<String, Vec<ScheduleEntry>> = HashMap::new();
    let mut group_names: Vec<String> = Vec::new();

    for (group_name, value) in raw.schedules.iter() {
        group_names.push(group_name.clone());
        let table = match value.as_table() {
            Some(t) => t,
            None => {
                ignored_errors.push(format!("schedule group '{group_name}' is not a table"));
                continue;
            }
        };
        let mut entries = Vec::new();
        if table.contains_key("every") {
            match parse_entry(group_name, group_name, value) {
                Ok(entry) => entries.push(entry),
                Err(e) => ignored_errors.push(format!("schedule '{group_name}': {e}")),
            }
        } else {
            for (sub_name, sub_value) in table.iter() {
                let entry_name = format!("{group_name}_{sub_name}");
                match parse_entry(&entry_name, group_name, sub_value) {
                    Ok(entry) => entries.push(entry),
                    Err(e) => ignored_errors.push(format!("schedule '{entry_name}': {e}")),
                }
            }
        }
        entries_by_group.insert(group_name.clone(), entries);
    }

    let mut filesystems_by_group: HashMap<String, Vec<String>> = HashMap::new();
    for (fs_name, value) in raw.filesystems.iter() {
        let group_list = match value {
            toml::Value::String(s) => s.split(',').map(|p| p.trim().to_string()).collect(),
            toml::Value::Array(a) => a
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            _ => {
                ignored_errors.push(format!("filesystem '{fs_name}' has an invalid schedule binding"));
                continue;
            }
        };
        for sched_name in group_list {
            if !entries_by_group.contains_key(&sched_name) {
                ignored_errors.push(format!(
                    "filesystem '{fs_name}' references unknown schedule group '{sched_name}'"
                ));
                continue;
            }
            filesystems_by_group.entry(sched_name).or_default().push(fs_name.clone());
        }
    }

    let groups = group_names
        .into_iter()
        .map(|name| {
            let entries = entries_by_group.remove(&name).unwrap_or_default();
            let filesystems = filesystems_by_group.remove(&name).unwrap_or_default();
            ScheduleGroup::new(name, entries, filesystems)
        })
        .collect();

    Ok(LoadedConfig { cluster: raw.cluster, groups, snaptool: raw.snaptool, ignored_errors, loaded_at })
}

/// `true` if `path`'s mtime is newer than `since`.
pub fn changed_since(path: &Path, since: SystemTime) -> bool {
    fs::metadata(path).and_then(|m| m.modified()).map(|mtime| mtime > since).unwrap_or(false)
}

#[allow(clippy::expect_used)]
fn parse_entry(name: &str, group_name: &str, value: &toml::Value) -> Result<ScheduleEntry, String> {
    let spec: ScheduleSpec = value.clone().try_into().map_err(|e| e.to_string())?;
    let every = parse_every(&spec.every)?;
    let at = match &spec.at {
        Some(s) => parse_time(s)?,
        None => NaiveTime::from_hms_opt(0, 0, 0).expect("midnight is always valid"),
    };

    let kind = match (every, spec.interval) {
        (Every::Months(months), _) => {
            ScheduleKind::Monthly { months, day: spec.day.unwrap_or(1), time: at }
        }
        (Every::Weekdays(weekdays), Some(interval_minutes)) => {
            let stop = match &spec.until {
                Some(s) => parse_time(s)?,
                None => NaiveTime::from_hms_opt(23, 59, 0).expect("23:59 is always valid"),
            };
            ScheduleKind::Interval { weekdays, start: at, stop, interval_minutes }
        }
        (Every::Weekdays(weekdays), None) => ScheduleKind::Daily { weekdays, time: at },
    };

    ScheduleEntry::with_retain_max(name, group_name, kind, spec.retain, spec.upload.0, RETAIN_MAX_DEFAULT)
        .map_err(|e| e.to_string())
}

enum Every {
    Weekdays(BTreeSet<Weekday>),
    Months(BTreeSet<u32>),
}

const WEEKDAY_NAMES: &[(&str, Weekday)] = &[
    ("mon", Weekday::Mon),
    ("monday", Weekday::Mon),
    ("tue", Weekday::Tue),
    ("tuesday", Weekday::Tue),
    ("wed", Weekday::Wed),
    ("wednesday", Weekday::Wed),
    ("thu", Weekday::Thu),
    ("thursday", Weekday::Thu),
    ("fri", Weekday::Fri),
    ("friday", Weekday::Fri),
    ("sat", Weekday::Sat),
    ("saturday", Weekday::Sat),
    ("sun", Weekday::Sun),
    ("sunday", Weekday::Sun),
];

const MONTH_NAMES: &[(&str, u32)] = &[
    ("jan", 1), ("january", 1),
    ("feb", 2), ("february", 2),
    ("mar", 3), ("march", 3),
    ("apr", 4), ("april", 4),
    ("may", 5),
    ("jun", 6), ("june", 6),
    ("jul", 7), ("july", 7),
    ("aug", 8), ("august", 8),
    ("sep", 9), ("september", 9),
    ("oct", 10), ("october", 10),
    ("nov", 11), ("november", 11),
    ("dec", 12), ("december", 12),
];

fn parse_weekday(s: &str) -> Option<Weekday> {
    let lower = s.trim().to_ascii_lowercase();
    WEEKDAY_NAMES.iter().find(|(name, _)| *name == lower).map(|(_, d)| *d)
}

fn parse_month_num(s: &str) -> Option<u32> {
    let lower = s.trim().to_ascii_lowercase();
    MONTH_NAMES.iter().find(|(name, _)| *name == lower).map(|(_, m)| *m)
}

fn comma_list(s: &str) -> Vec<String> {
    s.split(',').map(|p| p.trim().to_string()).collect()
}

fn parse_every(every: &str) -> Result<Every, String> {
    if every.eq_ignore_ascii_case("day") {
        return Ok(Every::Weekdays(BTreeSet::from([
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
            Weekday::Sun,
        ])));
    }
    if every.eq_ignore_ascii_case("month") {
        return Ok(Every::Months((1..=12).collect()));
    }
    let parts = comma_list(every);
    if !parts.is_empty() && parts.iter().all(|p| parse_weekday(p).is_some()) {
        return Ok(Every::Weekdays(parts.iter().filter_map(|p| parse_weekday(p)).collect()));
    }
    if !parts.is_empty() && parts.iter().all(|p| parse_month_num(p).is_some()) {
        return Ok(Every::Months(parts.iter().filter_map(|p| parse_month_num(p)).collect()));
    }
    Err(format!("invalid 'every' spec: '{every}'"))
}

/// Accepts `"09:00"` (24h), `"0903"` (bare 4-digit), or `"9am"`/`"9:05am"`
/// (12h with meridiem), matching the config formats the original tool's
/// flexible date parser accepted for this field.
fn parse_time(raw: &str) -> Result<NaiveTime, String> {
    let s = raw.trim().to_ascii_uppercase();
    for fmt in ["%H:%M", "%H%M", "%I:%M%p", "%I%p", "%I %p"] {
        if let Ok(t) = NaiveTime::parse_from_str(&s, fmt) {
            return Ok(t);
        }
    }
    Err(format!("invalid time spec: '{raw}'"))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
