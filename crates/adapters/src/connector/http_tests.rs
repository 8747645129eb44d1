// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::config::HostList;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn token_file(dir: &TempDir, token: &str) -> PathBuf {
    let path = dir.path().join("auth-token.json");
    fs::write(&path, json!({ "token": token }).to_string()).expect("write token");
    path
}

fn connector_for(dir: &TempDir, server: &MockServer) -> HttpClusterConnector {
    let host = server.address().to_string();
    let config = ClusterConfig {
        hosts: HostList(vec![host]),
        auth_token_file: token_file(dir, "secret"),
        force_https: false,
        verify_cert: true,
    };
    HttpClusterConnector::new(&config).expect("build connector")
}

#[test]
fn new_rejects_an_empty_host_list() {
    let config = ClusterConfig { hosts: HostList(vec![]), ..ClusterConfig::default() };
    assert!(HttpClusterConnector::new(&config).is_err());
}

#[test]
fn parse_snapshot_reads_the_cluster_json_shape() {
    let raw = json!({
        "file_system": "fs1",
        "name": "nightly.2106070200",
        "creationTime": "2021-06-07T02:00:00Z",
        "locator": "",
        "localStowInfo": { "stowStatus": "SYNCHRONIZED", "stowProgress": "100%", "locator": "bucket1/nightly" },
        "remoteStowInfo": { "stowStatus": "NONE", "stowProgress": "N/A", "locator": "" },
    });
    let snap = parse_snapshot(&raw).expect("parse");
    assert_eq!(snap.filesystem, "fs1");
    assert_eq!(snap.name, "nightly.2106070200");
    assert_eq!(snap.locator, None);
    assert_eq!(snap.local_stow.status, StowStatus::Synchronized);
    assert_eq!(snap.local_stow.progress, Progress::Percent(100));
    assert_eq!(snap.local_stow.locator.as_deref(), Some("bucket1/nightly"));
    assert_eq!(snap.remote_stow.status, StowStatus::None);
    assert_eq!(snap.remote_stow.progress, Progress::Unknown);
}

#[test]
fn parse_snapshot_rejects_a_shape_missing_required_fields() {
    let raw = json!({ "name": "nightly.2106070200" });
    assert!(parse_snapshot(&raw).is_err());
}

#[tokio::test]
async fn snapshots_list_parses_the_mocked_response_array() {
    let dir = TempDir::new().expect("tempdir");
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v2/process"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "file_system": "fs1",
                "name": "nightly.2106070200",
                "creationTime": "2021-06-07T02:00:00Z",
                "locator": "",
                "localStowInfo": { "stowStatus": "NONE", "stowProgress": "N/A", "locator": "" },
                "remoteStowInfo": { "stowStatus": "NONE", "stowProgress": "N/A", "locator": "" },
            }
        ])))
        .mount(&server)
        .await;

    let connector = connector_for(&dir, &server);
    let snapshots = connector.snapshots_list(SnapshotFilter::All).await.expect("snapshots_list");
    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshots[0].name, "nightly.2106070200");
}

#[tokio::test]
async fn status_reports_degraded_when_io_status_is_not_ok() {
    let dir = TempDir::new().expect("tempdir");
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v2/process"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "io_status": "DEGRADED" })))
        .mount(&server)
        .await;

    let connector = connector_for(&dir, &server);
    assert_eq!(connector.status().await.expect("status"), ClusterHealth::Degraded);
}

#[tokio::test]
async fn snapshot_create_maps_a_conflict_body_to_already_exists() {
    let dir = TempDir::new().expect("tempdir");
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v2/process"))
        .respond_with(ResponseTemplate::new(409).set_body_string("name already exists"))
        .mount(&server)
        .await;

    let connector = connector_for(&dir, &server);
    let err = connector.snapshot_create("fs1", "n", "@GMT-2021.06.07", false).await.unwrap_err();
    assert!(matches!(err, ConnectorError::AlreadyExists(_)));
}
