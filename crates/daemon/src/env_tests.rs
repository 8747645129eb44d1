// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;

#[test]
#[serial]
fn initial_log_level_reads_env_and_ignores_empty() {
    std::env::remove_var("INITIAL_LOG_LEVEL");
    assert_eq!(initial_log_level(), None);
    std::env::set_var("INITIAL_LOG_LEVEL", "debug");
    assert_eq!(initial_log_level(), Some("debug".to_string()));
    std::env::set_var("INITIAL_LOG_LEVEL", "");
    assert_eq!(initial_log_level(), None);
    std::env::remove_var("INITIAL_LOG_LEVEL");
}

#[test]
#[serial]
fn in_docker_container_reflects_presence_not_value() {
    std::env::remove_var("IN_DOCKER_CONTAINER");
    assert!(!in_docker_container());
    std::env::set_var("IN_DOCKER_CONTAINER", "");
    assert!(in_docker_container());
    std::env::remove_var("IN_DOCKER_CONTAINER");
}

#[test]
#[serial]
fn launched_by_systemd_reflects_presence_not_value() {
    std::env::remove_var("LAUNCHED_BY_SYSTEMD");
    assert!(!launched_by_systemd());
    std::env::set_var("LAUNCHED_BY_SYSTEMD", "1");
    assert!(launched_by_systemd());
    std::env::remove_var("LAUNCHED_BY_SYSTEMD");
}
