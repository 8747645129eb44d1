// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Schedule entry data model: the recurrence unit bound to a filesystem
//! through a schedule group.

use crate::error::ScheduleError;
use chrono::{NaiveTime, Weekday};
use parking_lot::Mutex;
use std::collections::BTreeSet;

pub const NAME_MAX_LEN: usize = 18;
pub const RETAIN_MAX_DEFAULT: u32 = 365;

/// Base sort-priority value for interval entries; `interval_minutes` is
/// added on top so a tighter cadence (smaller `interval_minutes`) yields a
/// smaller, earlier-sorting value.
const INTERVAL_SORT_BASE: u32 = 20;

/// `upload-mode` on a schedule entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UploadMode {
    None,
    Local,
    Remote,
}

impl UploadMode {
    pub fn no_upload(self) -> bool {
        matches!(self, UploadMode::None)
    }
}

/// The recurrence algorithm and its parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleKind {
    Monthly {
        months: BTreeSet<u32>, // 1..=12
        day: u32,              // 1..=31, clamped to month length at evaluation time
        time: NaiveTime,
    },
    Daily {
        weekdays: BTreeSet<Weekday>,
        time: NaiveTime,
    },
    Interval {
        weekdays: BTreeSet<Weekday>,
        start: NaiveTime,
        stop: NaiveTime,
        interval_minutes: u32, // 1..=1439
    },
}

impl ScheduleKind {
    fn validate(&self) -> Result<(), ScheduleError> {
        match self {
            ScheduleKind::Monthly { months, day, .. } => {
                if months.is_empty() {
                    return Err(ScheduleError::EmptyMonths);
                }
                if !(1..=31).contains(day) {
                    return Err(ScheduleError::DayOutOfRange(*day));
                }
                Ok(())
            }
            ScheduleKind::Daily { weekdays, .. } => {
                if weekdays.is_empty() {
                    return Err(ScheduleError::EmptyWeekdays);
                }
                Ok(())
            }
            ScheduleKind::Interval { weekdays, start, stop, interval_minutes } => {
                if weekdays.is_empty() {
                    return Err(ScheduleError::EmptyWeekdays);
                }
                if !(1..=1439).contains(interval_minutes) {
                    return Err(ScheduleError::IntervalOutOfRange(*interval_minutes));
                }
                if stop <= start {
                    return Err(ScheduleError::StopBeforeStart);
                }
                Ok(())
            }
        }
    }

    /// Sort priority: monthly sorts earliest; within interval, a tighter
    /// cadence (smaller `interval_minutes`) sorts earlier than a looser
    /// one.
    pub fn sort_priority(&self) -> u32 {
        match self {
            ScheduleKind::Monthly { .. } => 10,
            ScheduleKind::Daily { .. } => 50,
            ScheduleKind::Interval { interval_minutes, .. } => INTERVAL_SORT_BASE + interval_minutes,
        }
    }
}

/// A single schedule entry: one recurrence bound to a name, a retention
/// count, and an upload mode.
#[derive(Debug)]
pub struct ScheduleEntry {
    name: String,
    group_name: String,
    kind: ScheduleKind,
    retain: u32,
    upload_mode: UploadMode,
    retain_max: u32,
    memo: Mutex<Option<crate::recurrence::FireTime>>,
}

impl ScheduleEntry {
    pub fn new(
        name: impl Into<String>,
        group_name: impl Into<String>,
        kind: ScheduleKind,
        retain: u32,
        upload_mode: UploadMode,
    ) -> Result<Self, ScheduleError> {
        Self::with_retain_max(name, group_name, kind, retain, upload_mode, RETAIN_MAX_DEFAULT)
    }

    pub fn with_retain_max(
        name: impl Into<String>,
        group_name: impl Into<String>,
        kind: ScheduleKind,
        retain: u32,
        upload_mode: UploadMode,
        retain_max: u32,
    ) -> Result<Self, ScheduleError> {
        let name = name.into();
        if name.len() > NAME_MAX_LEN {
            return Err(ScheduleError::NameTooLong { name, len: name.len(), max: NAME_MAX_LEN });
        }
        if retain > retain_max {
            return Err(ScheduleError::RetainOutOfRange(retain, retain_max));
        }
        kind.validate()?;
        Ok(Self {
            name,
            group_name: group_name.into(),
            kind,
            retain,
            upload_mode,
            retain_max,
            memo: Mutex::new(None),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn group_name(&self) -> &str {
        &self.group_name
    }

    pub fn kind(&self) -> &ScheduleKind {
        &self.kind
    }

    pub fn retain(&self) -> u32 {
        self.retain
    }

    pub fn upload_mode(&self) -> UploadMode {
        self.upload_mode
    }

    pub fn no_upload(&self) -> bool {
        self.upload_mode.no_upload()
    }

    pub fn sort_priority(&self) -> u32 {
        self.kind.sort_priority()
    }

    pub(crate) fn memo(&self) -> &Mutex<Option<crate::recurrence::FireTime>> {
        &self.memo
    }
}

#[cfg(test)]
#[path = "schedule_tests.rs"]
mod tests;
