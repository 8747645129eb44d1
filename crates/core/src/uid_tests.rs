// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn zero_is_padded_to_minimum_length() {
    let s = int_to_base62(0);
    assert_eq!(s.len(), MIN_LEN);
    assert_eq!(s, "0".repeat(MIN_LEN));
}

#[test]
fn small_value_is_padded_to_minimum_length() {
    let s = int_to_base62(61);
    assert_eq!(s.len(), MIN_LEN);
    assert!(s.chars().all(|c| c.is_ascii_alphanumeric()));
    assert_eq!(&s[MIN_LEN - 1..], "z");
}

#[test]
fn large_value_stays_at_or_above_minimum_length() {
    let s = int_to_base62(u128::MAX);
    assert!(s.len() >= MIN_LEN);
    assert!(s.chars().all(|c| c.is_ascii_alphanumeric()));
}

#[test]
fn distinct_uuids_give_distinct_strings() {
    let a = new_uid();
    let b = new_uid();
    assert_ne!(a, b);
    assert!(a.len() >= MIN_LEN);
    assert!(b.len() >= MIN_LEN);
}

#[test]
fn alphabet_is_alphanumeric_only() {
    for _ in 0..50 {
        let s = new_uid();
        assert!(s.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
