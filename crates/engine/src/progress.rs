// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-wide bounded ring of human-readable progress messages, read by
//! the status UI without locking against the worker's append path (the
//! mutex here is uncontended enough that lossy tolerance is not needed in
//! practice, but the spec only promises best-effort visibility).

use parking_lot::Mutex;
use std::collections::VecDeque;

pub const DEFAULT_CAPACITY: usize = 500;

pub struct ProgressRing {
    capacity: usize,
    lines: Mutex<VecDeque<String>>,
}

impl Default for ProgressRing {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl ProgressRing {
    pub fn new(capacity: usize) -> Self {
        Self { capacity, lines: Mutex::new(VecDeque::with_capacity(capacity)) }
    }

    pub fn push(&self, line: impl Into<String>) {
        let mut lines = self.lines.lock();
        if lines.len() == self.capacity {
            lines.pop_front();
        }
        lines.push_back(line.into());
    }

    /// Snapshot the ring, oldest first, for the status UI.
    pub fn snapshot(&self) -> Vec<String> {
        self.lines.lock().iter().cloned().collect()
    }
}

#[cfg(test)]
#[path = "progress_tests.rs"]
mod tests;
