// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::clock::FakeClock;
use crate::schedule::{ScheduleKind, UploadMode};
use chrono::{NaiveTime, Weekday};
use std::collections::BTreeSet;

fn daily(name: &str, h: u32, m: u32) -> ScheduleEntry {
    let kind = ScheduleKind::Daily {
        weekdays: BTreeSet::from([Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri, Weekday::Sat, Weekday::Sun]),
        time: NaiveTime::from_hms_opt(h, m, 0).expect("valid time"),
    };
    ScheduleEntry::new(name, "grp", kind, 4, UploadMode::None).expect("valid entry")
}

#[test]
fn group_next_fire_is_min_over_entries() {
    let group = ScheduleGroup::new(
        "grp",
        vec![daily("late", 18, 0), daily("early", 6, 0)],
        vec!["fs1".into()],
    );
    let now = FakeClock::at("2021-06-02 00:00:00").now();
    let fire = group.next_fire(now);
    assert_eq!(fire, next_fire(&daily("early", 6, 0), now));
}

#[test]
fn earliest_entry_picks_the_soonest_firing_entry() {
    let group = ScheduleGroup::new(
        "grp",
        vec![daily("late", 18, 0), daily("early", 6, 0)],
        vec!["fs1".into()],
    );
    let now = FakeClock::at("2021-06-02 00:00:00").now();
    assert_eq!(group.earliest_entry(now).expect("has entries").name(), "early");
}

#[test]
fn empty_group_ties_break_last() {
    let group = ScheduleGroup::new("empty", vec![], vec![]);
    let now = FakeClock::at("2021-06-02 00:00:00").now();
    let tie = group.tie_break(now);
    assert_eq!(tie.fire_time, FireTime::Never);
}
