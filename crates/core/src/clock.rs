// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wall-clock abstraction for testable time handling.
//!
//! The recurrence evaluator and planner reason in local wall-clock time
//! (schedule entries are specified in terms of time-of-day and weekday), so
//! this clock yields `DateTime<Local>` rather than a monotonic `Instant`.

use chrono::{DateTime, Local, TimeZone};
use parking_lot::Mutex;
use std::sync::Arc;

/// A clock that provides the current local time.
pub trait Clock: Clone + Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

/// Real system clock.
#[derive(Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Fake clock for testing with controllable time.
#[derive(Clone)]
pub struct FakeClock {
    current: Arc<Mutex<DateTime<Local>>>,
}

impl FakeClock {
    pub fn new(start: DateTime<Local>) -> Self {
        Self { current: Arc::new(Mutex::new(start)) }
    }

    /// Construct from a naive local `"YYYY-MM-DD HH:MM:SS"` string, for test fixtures.
    #[allow(clippy::expect_used)]
    pub fn at(naive: &str) -> Self {
        let parsed = chrono::NaiveDateTime::parse_from_str(naive, "%Y-%m-%d %H:%M:%S")
            .expect("fixture datetime must parse");
        Self::new(Local.from_local_datetime(&parsed).single().expect("unambiguous local time"))
    }

    pub fn advance(&self, duration: chrono::Duration) {
        let mut current = self.current.lock();
        *current += duration;
    }

    pub fn set(&self, at: DateTime<Local>) {
        *self.current.lock() = at;
    }
}

impl Clock for FakeClock {
    fn now(&self) -> DateTime<Local> {
        *self.current.lock()
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
