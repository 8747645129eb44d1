// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::progress::ProgressRing;
use crate::retry::ConnectorFactory;
use snapd_adapters::{Bucket, BucketMode, FakeClusterConnector};
use snapd_core::clock::FakeClock;
use snapd_core::schedule::ScheduleKind;
use snapd_core::snapshot::{Progress, Stow, StowStatus};
use std::collections::BTreeSet;
use std::sync::Arc;
use tempfile::TempDir;

fn daily_entry(name: &str, group: &str, retain: u32, upload_mode: UploadMode) -> ScheduleEntry {
    let weekdays: BTreeSet<chrono::Weekday> = [
        chrono::Weekday::Mon,
        chrono::Weekday::Tue,
        chrono::Weekday::Wed,
        chrono::Weekday::Thu,
        chrono::Weekday::Fri,
        chrono::Weekday::Sat,
        chrono::Weekday::Sun,
    ]
    .into_iter()
    .collect();
    let kind = ScheduleKind::Daily { weekdays, time: chrono::NaiveTime::from_hms_opt(2, 0, 0).unwrap() };
    ScheduleEntry::new(name, group, kind, retain, upload_mode).expect("valid entry")
}

use snapd_core::schedule::ScheduleEntry;

#[test]
fn plan_next_claims_filesystems_for_the_earliest_sorted_group_only() {
    let a = ScheduleGroup::new(
        "groupA",
        vec![daily_entry("a_full", "groupA", 4, UploadMode::None)],
        vec!["fs1".to_string()],
    );
    let b = ScheduleGroup::new(
        "groupB",
        vec![daily_entry("b_full", "groupB", 4, UploadMode::None)],
        vec!["fs1".to_string(), "fs2".to_string()],
    );
    let now: DateTime<Local> = FakeClock::at("2021-06-07 01:00:00").now();
    let (fire_time, plan) = Planner::<FakeClock>::plan_next(&[a, b], now);

    assert_ne!(fire_time, FireTime::Never);
    assert_eq!(plan.len(), 2);
    assert_eq!(plan["fs1"].group_name, "groupA");
    assert_eq!(plan["fs2"].group_name, "groupB");
}

#[test]
fn plan_next_with_no_groups_never_fires() {
    let (fire_time, plan) = Planner::<FakeClock>::plan_next(&[], FakeClock::at("2021-06-07 01:00:00").now());
    assert_eq!(fire_time, FireTime::Never);
    assert!(plan.is_empty());
}

fn planner_harness(
    groups: Vec<ScheduleGroup>,
) -> (Planner<FakeClock>, Arc<FakeClusterConnector>, Arc<IntentLog>, TempDir) {
    let fake = Arc::new(FakeClusterConnector::new());
    let factory: ConnectorFactory = {
        let fake = Arc::clone(&fake);
        Arc::new(move || Ok(fake.clone() as Arc<dyn ClusterConnector>))
    };
    let retry = Arc::new(RetryConnector::new(fake.clone(), factory));
    let dir = TempDir::new().expect("tempdir");
    let log = Arc::new(IntentLog::open(dir.path().join("intent.log")).expect("open log"));
    let progress = Arc::new(ProgressRing::default());
    let clock = FakeClock::at("2021-06-07 02:00:00");
    let worker = Arc::new(Worker::new(fake.clone() as Arc<dyn ClusterConnector>, log.clone(), progress, clock.clone()));
    let cluster_config = Arc::new(RwLock::new(ClusterConfig::default()));
    let planner = Planner::new(
        retry,
        worker,
        log.clone(),
        clock,
        dir.path().join("snaptool.toml"),
        cluster_config,
        groups,
        SystemTime::now(),
        EngineStatus::new(),
    );
    (planner, fake, log, dir)
}

fn stowed_snapshot(fs: &str, name: &str, creation_time: DateTime<Local>) -> Snapshot {
    Snapshot {
        filesystem: fs.to_string(),
        name: name.to_string(),
        creation_time,
        locator: None,
        local_stow: Stow { status: StowStatus::None, progress: Progress::Unknown, locator: None },
        remote_stow: Stow { status: StowStatus::None, progress: Progress::Unknown, locator: None },
    }
}

#[tokio::test(start_paused = true)]
async fn create_snapshots_creates_and_enqueues_upload_for_local_mode() {
    let (planner, fake, log, _dir) = planner_harness(vec![]);
    fake.add_filesystem("fs1", vec![Bucket { name: "bucket1".into(), mode: BucketMode::Writable }]);

    let fire_at = FakeClock::at("2021-06-07 02:00:00").now();
    let mut plan = HashMap::new();
    plan.insert(
        "fs1".to_string(),
        PlannedSnapshot {
            filesystem: "fs1".to_string(),
            group_name: "groupA".to_string(),
            entry_name: "a_full".to_string(),
            upload_mode: UploadMode::Local,
        },
    );

    planner.create_snapshots(fire_at, &plan).await.expect("create_snapshots");

    let expected_name = format_snapshot_name("a_full", fire_at);
    assert!(fake.snapshot_exists("fs1", &expected_name));
    let outstanding = log.load_outstanding().expect("load");
    assert_eq!(outstanding.len(), 1);
    assert_eq!(outstanding[0].operation, Operation::Upload);
    assert_eq!(outstanding[0].snapshot, expected_name);
}

#[tokio::test(start_paused = true)]
async fn reconcile_deletes_enqueues_oldest_excess_beyond_retention() {
    let group = ScheduleGroup::new(
        "groupA",
        vec![daily_entry("a_full", "groupA", 1, UploadMode::None)],
        vec!["fs1".to_string()],
    );
    let (planner, fake, log, _dir) = planner_harness(vec![group]);

    let base = FakeClock::at("2021-06-01 02:00:00").now();
    fake.seed_snapshot(stowed_snapshot("fs1", "a_full.2106010200", base));
    fake.seed_snapshot(stowed_snapshot("fs1", "a_full.2106020200", base + chrono::Duration::days(1)));
    fake.seed_snapshot(stowed_snapshot("fs1", "a_full.2106030200", base + chrono::Duration::days(2)));

    planner.reconcile_deletes().await.expect("reconcile_deletes");

    let outstanding = log.load_outstanding().expect("load");
    assert_eq!(outstanding.len(), 2, "two of the three excess snapshots should be queued for delete");
    let mut names: Vec<&str> = outstanding.iter().map(|r| r.snapshot.as_str()).collect();
    names.sort();
    assert_eq!(names, vec!["a_full.2106010200", "a_full.2106020200"]);
}
