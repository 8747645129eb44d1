// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recurrence Evaluator: `next_fire(entry, now) -> instant`.
//!
//! Pure with respect to the outside world: the only state it touches is the
//! per-entry memoised previous result, guarded by the entry's own mutex. No
//! I/O, no shared global state.

use crate::schedule::{ScheduleEntry, ScheduleKind};
use chrono::{DateTime, Datelike, Days, Local, NaiveDate, NaiveTime, TimeZone, Timelike};

/// The result of a recurrence computation: either a concrete instant or
/// "never fires again" (an entry with `retain == 0`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireTime {
    At(DateTime<Local>),
    Never,
}

impl FireTime {
    pub fn instant(self) -> Option<DateTime<Local>> {
        match self {
            FireTime::At(t) => Some(t),
            FireTime::Never => None,
        }
    }
}

impl PartialOrd for FireTime {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FireTime {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        match (self, other) {
            (FireTime::At(a), FireTime::At(b)) => a.cmp(b),
            (FireTime::Never, FireTime::Never) => std::cmp::Ordering::Equal,
            (FireTime::Never, _) => std::cmp::Ordering::Greater,
            (_, FireTime::Never) => std::cmp::Ordering::Less,
        }
    }
}

/// Truncate sub-minute fields to zero, as the spec requires of `now` before
/// any recurrence computation.
fn normalize(now: DateTime<Local>) -> DateTime<Local> {
    now.with_second(0).and_then(|t| t.with_nanosecond(0)).unwrap_or(now)
}

/// Compute (or return the memoised) next fire instant for `entry` given
/// `now`. Idempotent for `now <= previous_result`.
pub fn next_fire(entry: &ScheduleEntry, now: DateTime<Local>) -> FireTime {
    if entry.retain() == 0 {
        *entry.memo().lock() = Some(FireTime::Never);
        return FireTime::Never;
    }

    let now = normalize(now);
    let mut memo = entry.memo().lock();
    if let Some(FireTime::At(prev)) = *memo {
        if now <= prev {
            return FireTime::At(prev);
        }
    }

    let computed = match entry.kind() {
        ScheduleKind::Monthly { months, day, time } => compute_monthly(months, *day, *time, now),
        ScheduleKind::Daily { weekdays, time } => compute_daily(weekdays, *time, now),
        ScheduleKind::Interval { weekdays, start, stop, interval_minutes } => {
            compute_interval(weekdays, *start, *stop, *interval_minutes, now)
        }
    };
    let result = FireTime::At(computed);
    *memo = Some(result);
    result
}

#[allow(clippy::expect_used)]
fn localize(date: NaiveDate, time: NaiveTime) -> DateTime<Local> {
    let naive = date.and_time(time);
    match Local.from_local_datetime(&naive).single() {
        Some(dt) => dt,
        None => Local.from_local_datetime(&naive).earliest().unwrap_or_else(|| {
            // DST gap: fall back to latest mapping rather than panic.
            Local.from_local_datetime(&naive).latest().expect("local datetime must map")
        }),
    }
}

#[allow(clippy::expect_used)]
fn last_day_of_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .expect("valid next month")
        .pred_opt()
        .expect("valid previous day")
        .day()
}

#[allow(clippy::expect_used)]
fn compute_monthly(
    months: &std::collections::BTreeSet<u32>,
    day: u32,
    time: NaiveTime,
    now: DateTime<Local>,
) -> DateTime<Local> {
    let mut year = now.year();
    let mut month = now.month();
    // Bound the search to 10 years; a well-formed month set always resolves
    // within 12 iterations.
    for _ in 0..120 {
        if months.contains(&month) {
            let clamped_day = day.min(last_day_of_month(year, month));
            let candidate_date =
                NaiveDate::from_ymd_opt(year, month, clamped_day).expect("clamped day is valid");
            let candidate = localize(candidate_date, time);
            if candidate >= now {
                return candidate;
            }
        }
        if month == 12 {
            month = 1;
            year += 1;
        } else {
            month += 1;
        }
    }
    unreachable!("monthly schedule with a non-empty month set must resolve within 10 years")
}

fn compute_daily(
    weekdays: &std::collections::BTreeSet<chrono::Weekday>,
    time: NaiveTime,
    now: DateTime<Local>,
) -> DateTime<Local> {
    let today = now.date_naive();
    for offset in 0..8u64 {
        let date = today + Days::new(offset);
        if weekdays.contains(&date.weekday()) {
            let candidate = localize(date, time);
            if candidate >= now {
                return candidate;
            }
        }
    }
    unreachable!("daily schedule with a non-empty weekday set must resolve within 8 days")
}

fn compute_interval(
    weekdays: &std::collections::BTreeSet<chrono::Weekday>,
    start: NaiveTime,
    stop: NaiveTime,
    interval_minutes: u32,
    now: DateTime<Local>,
) -> DateTime<Local> {
    let today = now.date_naive();
    for offset in 0..8u64 {
        let date = today + Days::new(offset);
        if !weekdays.contains(&date.weekday()) {
            continue;
        }
        let mut t = start;
        // 1440 covers every minute-granularity walk across a single day even
        // in degenerate configs; guards against wraparound past midnight.
        for _ in 0..1440u32 {
            let candidate = localize(date, t);
            if candidate >= now {
                return candidate;
            }
            if t >= stop {
                break;
            }
            t = t + chrono::Duration::minutes(interval_minutes as i64);
            if t < start {
                // Wrapped past midnight without reaching stop; no more
                // candidates today.
                break;
            }
        }
    }
    unreachable!("interval schedule with a non-empty weekday set must resolve within 8 days")
}

#[cfg(test)]
#[path = "recurrence_tests.rs"]
mod tests;
