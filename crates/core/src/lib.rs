// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! snapd-core: data model and pure recurrence evaluator for the snapshot
//! scheduling daemon.

pub mod clock;
pub mod error;
pub mod group;
pub mod intent;
pub mod recurrence;
pub mod schedule;
pub mod snapshot;
pub mod uid;

pub use clock::{Clock, FakeClock, SystemClock};
pub use error::{IntentRecordError, ScheduleError};
pub use group::{ScheduleGroup, TieBreak};
pub use intent::{IntentRecord, Operation, Status};
pub use recurrence::{next_fire, FireTime};
pub use schedule::{ScheduleEntry, ScheduleKind, UploadMode, NAME_MAX_LEN, RETAIN_MAX_DEFAULT};
pub use snapshot::{
    format_access_point, format_snapshot_name, Progress, Snapshot, Stow, StowStatus,
    DEFAULT_ACCESS_POINT_PATTERN,
};
pub use uid::{int_to_base62, new_uid};
