// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::clock::FakeClock;
use crate::schedule::{ScheduleEntry, ScheduleKind, UploadMode};
use chrono::{NaiveTime, Weekday};
use std::collections::BTreeSet;

fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).expect("valid time")
}

fn at(entry: &ScheduleEntry, naive: &str) -> DateTime<Local> {
    match next_fire(entry, FakeClock::at(naive).now()) {
        FireTime::At(t) => t,
        FireTime::Never => panic!("expected a fire time, got Never"),
    }
}

fn expect(naive: &str) -> DateTime<Local> {
    FakeClock::at(naive).now()
}

// S1 Monthly end-of-month clamp.
#[test]
fn s1_monthly_end_of_month_clamp() {
    let kind = ScheduleKind::Monthly { months: BTreeSet::from([2]), day: 31, time: time(9, 5) };
    let entry =
        ScheduleEntry::new("M-Feb-31-09:05", "grp", kind, 5, UploadMode::None).expect("valid");
    assert_eq!(at(&entry, "2021-06-23 15:30:59"), expect("2022-02-28 09:05:00"));
}

// S2 Interval boundary: today's last candidate already passed.
#[test]
fn s2_interval_boundary_rolls_to_next_weekday() {
    let kind = ScheduleKind::Interval {
        weekdays: BTreeSet::from([Weekday::Mon, Weekday::Wed]),
        start: time(9, 3),
        stop: time(17, 0),
        interval_minutes: 10,
    };
    let entry = ScheduleEntry::new("I-MonWed-09:03-17:00-10m", "grp", kind, 5, UploadMode::None)
        .expect("valid");
    // 2021-06-02 is a Wednesday; 16:54:31 is after the last 10-minute
    // candidate at 16:53, so the next fire rolls to the following Monday.
    assert_eq!(at(&entry, "2021-06-02 16:54:31"), expect("2021-06-07 09:03:00"));
}

// S3 Interval first candidate today.
#[test]
fn s3_interval_first_candidate_today() {
    let kind = ScheduleKind::Interval {
        weekdays: BTreeSet::from([Weekday::Mon, Weekday::Wed]),
        start: time(9, 3),
        stop: time(17, 0),
        interval_minutes: 10,
    };
    let entry = ScheduleEntry::new("I-MonWed-09:03-17:00-10m", "grp", kind, 5, UploadMode::None)
        .expect("valid");
    assert_eq!(at(&entry, "2021-06-02 09:04:59"), expect("2021-06-02 09:13:00"));
}

#[test]
fn retain_zero_forces_never() {
    let kind = ScheduleKind::Daily { weekdays: BTreeSet::from([Weekday::Mon]), time: time(9, 0) };
    let entry = ScheduleEntry::new("d", "grp", kind, 0, UploadMode::None).expect("valid");
    assert_eq!(next_fire(&entry, FakeClock::at("2021-06-02 00:00:00").now()), FireTime::Never);
}

#[test]
fn memoisation_is_idempotent_for_now_at_or_before_previous_result() {
    let kind = ScheduleKind::Daily { weekdays: BTreeSet::from([Weekday::Mon]), time: time(9, 0) };
    let entry = ScheduleEntry::new("d", "grp", kind, 4, UploadMode::None).expect("valid");
    let first = next_fire(&entry, FakeClock::at("2021-06-02 08:00:00").now());
    // Calling again with an earlier or equal `now` must return the exact
    // same memoised value, not recompute.
    let second = next_fire(&entry, FakeClock::at("2021-06-01 00:00:00").now());
    assert_eq!(first, second);
    let third = next_fire(&entry, first.instant().unwrap());
    assert_eq!(first, third);
}

#[test]
fn memoisation_recomputes_once_now_passes_previous_result() {
    let kind = ScheduleKind::Daily {
        weekdays: BTreeSet::from([Weekday::Mon, Weekday::Tue, Weekday::Wed]),
        time: time(9, 0),
    };
    let entry = ScheduleEntry::new("d", "grp", kind, 4, UploadMode::None).expect("valid");
    let first = next_fire(&entry, FakeClock::at("2021-06-02 08:00:00").now());
    assert_eq!(first, FireTime::At(expect("2021-06-02 09:00:00")));
    let past_first = first.instant().unwrap() + chrono::Duration::minutes(1);
    let second = next_fire(&entry, past_first);
    assert!(second.instant().unwrap() >= past_first);
    assert_ne!(first, second);
}

// Additional oracle cases adapted from the original schedule self-tests.
#[test]
fn m02_monthly_simple_day_of_month() {
    let kind = ScheduleKind::Monthly { months: BTreeSet::from([1]), day: 15, time: time(9, 0) };
    let entry = ScheduleEntry::new("m02", "grp", kind, 4, UploadMode::None).expect("valid");
    assert_eq!(at(&entry, "2021-01-01 00:00:00"), expect("2021-01-15 09:00:00"));
}

#[test]
fn m05_monthly_skips_to_next_eligible_month_when_today_passed() {
    let kind =
        ScheduleKind::Monthly { months: BTreeSet::from([1, 7]), day: 1, time: time(0, 0) };
    let entry = ScheduleEntry::new("m05", "grp", kind, 4, UploadMode::None).expect("valid");
    assert_eq!(at(&entry, "2021-07-01 00:00:01"), expect("2022-01-01 00:00:00"));
}

#[test]
fn d01_daily_rolls_to_next_matching_weekday() {
    let kind = ScheduleKind::Daily {
        weekdays: BTreeSet::from([Weekday::Mon, Weekday::Wed, Weekday::Fri]),
        time: time(6, 0),
    };
    let entry = ScheduleEntry::new("d01", "grp", kind, 4, UploadMode::None).expect("valid");
    // 2021-06-03 is a Thursday.
    assert_eq!(at(&entry, "2021-06-03 05:00:00"), expect("2021-06-04 06:00:00"));
}

#[test]
fn i04_interval_includes_stop_time_candidate() {
    let kind = ScheduleKind::Interval {
        weekdays: BTreeSet::from([Weekday::Wed]),
        start: time(9, 0),
        stop: time(9, 30),
        interval_minutes: 10,
    };
    let entry = ScheduleEntry::new("i04", "grp", kind, 4, UploadMode::None).expect("valid");
    // Candidates are 09:00, 09:10, 09:20, 09:30 (inclusive of stop).
    assert_eq!(at(&entry, "2021-06-02 09:25:00"), expect("2021-06-02 09:30:00"));
}
