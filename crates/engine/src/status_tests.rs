// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn publish_then_snapshot_roundtrips() {
    let status = EngineStatus::new();
    assert!(status.snapshot().bindings.is_empty());

    status.publish(StatusView {
        cluster_health: Some(ClusterHealth::Healthy),
        bindings: vec![BindingSummary {
            group: "nightly".into(),
            entry: "nightly_full".into(),
            filesystem: "fs1".into(),
            next_fire: Some("2021-06-08T00:00:00".into()),
        }],
        recent_progress: vec!["started".into()],
        config_loaded_at: Some("2021-06-07T12:00:00".into()),
    });

    let view = status.snapshot();
    assert_eq!(view.cluster_health, Some(ClusterHealth::Healthy));
    assert_eq!(view.bindings.len(), 1);
    assert_eq!(view.bindings[0].filesystem, "fs1");
}

#[test]
fn clone_shares_the_same_underlying_state() {
    let status = EngineStatus::new();
    let handle = status.clone();
    status.publish(StatusView { recent_progress: vec!["x".into()], ..Default::default() });
    assert_eq!(handle.snapshot().recent_progress, vec!["x".to_string()]);
}
