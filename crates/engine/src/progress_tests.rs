// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn keeps_insertion_order() {
    let ring = ProgressRing::new(3);
    ring.push("a");
    ring.push("b");
    assert_eq!(ring.snapshot(), vec!["a".to_string(), "b".to_string()]);
}

#[test]
fn drops_oldest_past_capacity() {
    let ring = ProgressRing::new(2);
    ring.push("a");
    ring.push("b");
    ring.push("c");
    assert_eq!(ring.snapshot(), vec!["b".to_string(), "c".to_string()]);
}
