// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::clock::FakeClock;

fn sample() -> IntentRecord {
    let now = FakeClock::at("2021-06-02 09:05:07").now();
    IntentRecord::new("u1", "fs1", "daily.2106020905", Operation::Upload, Status::Queued, now)
        .with_locator("loc1")
        .with_bucket("bucket1")
}

#[test]
fn round_trip_through_8_field_line() {
    let record = sample();
    let line = record.to_line();
    let parsed = IntentRecord::parse(&line).expect("valid line");
    assert_eq!(parsed, record);
}

#[test]
fn empty_locator_and_bucket_round_trip_as_none() {
    let now = FakeClock::at("2021-06-02 09:05:07").now();
    let record =
        IntentRecord::new("u1", "fs1", "daily.2106020905", Operation::Delete, Status::Complete, now);
    let line = record.to_line();
    let parsed = IntentRecord::parse(&line).expect("valid line");
    assert_eq!(parsed.locator, None);
    assert_eq!(parsed.bucket, None);
}

#[test]
fn legacy_5_field_line_derives_timestamp_from_snapshot_suffix() {
    let line = "u2:fs1:daily.2106020905:upload:queued";
    let parsed = IntentRecord::parse(line).expect("valid legacy line");
    assert_eq!(parsed.uid, "u2");
    assert_eq!(parsed.filesystem, "fs1");
    assert_eq!(parsed.snapshot, "daily.2106020905");
    assert_eq!(parsed.operation, Operation::Upload);
    assert_eq!(parsed.status, Status::Queued);
    assert!(parsed.locator.is_none());
    assert!(parsed.bucket.is_none());
}

#[test]
fn rejects_wrong_field_count() {
    let err = IntentRecord::parse("u1:fs1:snap:upload").unwrap_err();
    assert_eq!(err, IntentRecordError::WrongFieldCount(4));
}

#[test]
fn rejects_unknown_operation() {
    let line = "u1:fs1:daily.2106020905:rename:queued:20210602.090507.000000::";
    let err = IntentRecord::parse(line).unwrap_err();
    assert_eq!(err, IntentRecordError::UnknownOperation("rename".into()));
}

#[test]
fn rejects_unknown_status() {
    let line = "u1:fs1:daily.2106020905:upload:pending:20210602.090507.000000::";
    let err = IntentRecord::parse(line).unwrap_err();
    assert_eq!(err, IntentRecordError::UnknownStatus("pending".into()));
}
