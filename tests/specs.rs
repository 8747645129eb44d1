// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end checks against the built `snaptool` binary: CLI surface,
//! config-load failure, and the `--test-connection-only` fast path.

use assert_cmd::Command;
use std::io::Write;

fn snaptool() -> Command {
    Command::cargo_bin("snaptool").expect("binary built")
}

#[test]
fn version_flag_prints_crate_version() {
    let mut cmd = snaptool();
    cmd.arg("--version");
    let output = cmd.output().expect("run");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")), "unexpected version output: {stdout}");
}

#[test]
fn missing_configfile_exits_nonzero_with_a_clear_message() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut cmd = snaptool();
    cmd.current_dir(&dir);
    cmd.args(["-c", "does-not-exist.toml"]);
    let output = cmd.output().expect("run");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to load config"), "unexpected stderr: {stderr}");
}

#[test]
fn test_connection_only_against_unconfigured_cluster_reports_failure() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config_path = dir.path().join("snaptool.toml");
    let mut file = std::fs::File::create(&config_path).expect("create config");
    writeln!(file, "[cluster]\nhosts = []\n").expect("write config");

    let mut cmd = snaptool();
    cmd.current_dir(&dir);
    cmd.args(["-c", "snaptool.toml", "--test-connection-only"]);
    let output = cmd.output().expect("run");

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Connection Failed"), "unexpected stdout: {stdout}");
}
