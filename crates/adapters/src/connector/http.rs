// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Thin HTTP implementation of [`ClusterConnector`] against the cluster's
//! request/response RPC: a named `method` plus a JSON parameter mapping,
//! POSTed to one of a configured host list with bearer auth. Bounded
//! retry and reconnect-on-failure live in `snapd-engine`'s retry wrapper;
//! this adapter makes exactly one attempt per call and maps transport and
//! API-level failures onto [`ConnectorError`].

use super::{Bucket, BucketMode, ClusterConnector, ClusterHealth, Filesystem, ObsSite, SnapshotFilter};
use crate::config::ClusterConfig;
use crate::error::ConnectorError;
use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use snapd_core::snapshot::{Progress, Snapshot, Stow, StowStatus};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

const API_PORT: u16 = 14000;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct AuthToken {
    #[serde(alias = "access_token")]
    token: String,
}

/// Talks to the cluster's management API over HTTP(S). One host list,
/// tried in order on transport failure; the caller (the retry wrapper)
/// decides whether to reconnect and how many times to retry overall.
pub struct HttpClusterConnector {
    client: Client,
    hosts: Vec<String>,
    scheme: &'static str,
    auth_token_file: PathBuf,
}

impl HttpClusterConnector {
    pub fn new(config: &ClusterConfig) -> Result<Self, ConnectorError> {
        if config.hosts.0.is_empty() {
            return Err(ConnectorError::Permanent("no cluster hosts configured".into()));
        }
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .danger_accept_invalid_certs(!config.verify_cert)
            .build()
            .map_err(|e| ConnectorError::Permanent(format!("failed to build http client: {e}")))?;
        Ok(Self {
            client,
            hosts: config.hosts.0.clone(),
            scheme: if config.force_https { "https" } else { "http" },
            auth_token_file: config.auth_token_file.clone(),
        })
    }

    fn bearer_token(&self) -> Result<String, ConnectorError> {
        let text = fs::read_to_string(&self.auth_token_file).map_err(|e| {
            ConnectorError::Permanent(format!(
                "failed to read auth token file {}: {e}",
                self.auth_token_file.display()
            ))
        })?;
        match serde_json::from_str::<AuthToken>(&text) {
            Ok(parsed) => Ok(parsed.token),
            Err(_) => Ok(text.trim().to_string()),
        }
    }

    /// POST `{method, params}` to the first host in the list; a
    /// transport-level failure tries the next host before giving up.
    async fn call(&self, method: &str, params: Value) -> Result<Value, ConnectorError> {
        let token = self.bearer_token()?;
        let body = json!({ "method": method, "params": params });
        let mut last_err = None;
        for host in &self.hosts {
            let url = format!("{}://{host}:{API_PORT}/api/v2/process", self.scheme);
            match self.client.post(&url).bearer_auth(&token).json(&body).send().await {
                Ok(resp) => return Self::handle_response(method, resp).await,
                Err(e) => {
                    last_err = Some(ConnectorError::Transient(format!("{host}: {e}")));
                    continue;
                }
            }
        }
        Err(last_err.unwrap_or_else(|| ConnectorError::Transient(format!("{method}: no reachable host"))))
    }

    async fn handle_response(method: &str, resp: reqwest::Response) -> Result<Value, ConnectorError> {
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        if status == StatusCode::BAD_GATEWAY {
            return Err(ConnectorError::BadGateway);
        }
        if !status.is_success() {
            if text.contains("already exists") {
                return Err(ConnectorError::AlreadyExists(text));
            }
            if status.is_client_error() {
                return Err(ConnectorError::Permanent(format!("{method}: {status}: {text}")));
            }
            return Err(ConnectorError::Transient(format!("{method}: {status}: {text}")));
        }
        serde_json::from_str(&text)
            .map_err(|e| ConnectorError::Transient(format!("{method}: invalid response body: {e}")))
    }
}

fn str_field<'a>(v: &'a Value, key: &str) -> Option<&'a str> {
    v.get(key).and_then(Value::as_str)
}

fn non_empty(s: Option<&str>) -> Option<String> {
    s.filter(|s| !s.is_empty()).map(str::to_string)
}

fn parse_stow(v: &Value) -> Stow {
    let status = match str_field(v, "stowStatus") {
        Some("UPLOADING") => StowStatus::Uploading,
        Some("SYNCHRONIZED") => StowStatus::Synchronized,
        _ => StowStatus::None,
    };
    let progress = v
        .get("stowProgress")
        .or_else(|| v.get("objectProgress"))
        .and_then(Value::as_str)
        .map(Progress::parse)
        .unwrap_or(Progress::Unknown);
    Stow { status, progress, locator: non_empty(str_field(v, "locator")) }
}

fn parse_snapshot(v: &Value) -> Result<Snapshot, ConnectorError> {
    let filesystem = str_field(v, "file_system")
        .or_else(|| str_field(v, "filesystem"))
        .ok_or_else(|| ConnectorError::Transient("snapshot missing file_system".into()))?
        .to_string();
    let name = str_field(v, "name")
        .ok_or_else(|| ConnectorError::Transient("snapshot missing name".into()))?
        .to_string();
    let creation_time = str_field(v, "creationTime")
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .map(|dt: DateTime<Utc>| dt.with_timezone(&Local))
        .unwrap_or_else(Local::now);
    let local_stow = v.get("localStowInfo").map(parse_stow).unwrap_or(Stow {
        status: StowStatus::None,
        progress: Progress::Unknown,
        locator: None,
    });
    let remote_stow = v.get("remoteStowInfo").map(parse_stow).unwrap_or(Stow {
        status: StowStatus::None,
        progress: Progress::Unknown,
        locator: None,
    });
    Ok(Snapshot {
        filesystem,
        name,
        creation_time,
        locator: non_empty(str_field(v, "locator")),
        local_stow,
        remote_stow,
    })
}

#[async_trait]
impl ClusterConnector for HttpClusterConnector {
    async fn snapshots_list(&self, filter: SnapshotFilter) -> Result<Vec<Snapshot>, ConnectorError> {
        let params = match filter {
            SnapshotFilter::All => json!({}),
            SnapshotFilter::Filesystem(fs) => json!({ "file_system": fs }),
        };
        let result = self.call("snapshots_list", params).await?;
        let entries = result.as_array().cloned().unwrap_or_default();
        entries.iter().map(parse_snapshot).collect()
    }

    async fn snapshot_create(
        &self,
        fs: &str,
        name: &str,
        access_point: &str,
        writable: bool,
    ) -> Result<(), ConnectorError> {
        self.call(
            "snapshot_create",
            json!({ "file_system": fs, "name": name, "access_point": access_point, "is_writable": writable }),
        )
        .await?;
        Ok(())
    }

    async fn snapshot_upload(
        &self,
        fs: &str,
        snap: &str,
        site: ObsSite,
        bucket: &str,
    ) -> Result<String, ConnectorError> {
        let method = match site {
            ObsSite::Local => "snapshot_upload",
            ObsSite::Remote => "snapshot_upload_remote",
        };
        let result = self.call(method, json!({ "file_system": fs, "name": snap, "obs_name": bucket })).await?;
        result
            .get("locator")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ConnectorError::Transient(format!("{method}: response missing locator")))
    }

    async fn snapshot_delete(&self, fs: &str, name: &str) -> Result<(), ConnectorError> {
        self.call("snapshot_delete", json!({ "file_system": fs, "name": name })).await?;
        Ok(())
    }

    async fn filesystems_list(&self) -> Result<Vec<Filesystem>, ConnectorError> {
        let result = self.call("filesystems_list", json!({})).await?;
        let entries = result.as_array().cloned().unwrap_or_default();
        entries
            .iter()
            .map(|v| {
                let name = str_field(v, "name")
                    .ok_or_else(|| ConnectorError::Transient("filesystem missing name".into()))?
                    .to_string();
                let buckets = v
                    .get("obs_buckets")
                    .and_then(Value::as_array)
                    .cloned()
                    .unwrap_or_default()
                    .iter()
                    .filter_map(|b| {
                        let name = str_field(b, "name")?.to_string();
                        let mode = match str_field(b, "mode") {
                            Some("READ_ONLY") => BucketMode::ReadOnly,
                            Some("REMOTE") => BucketMode::Remote,
                            _ => BucketMode::Writable,
                        };
                        Some(Bucket { name, mode })
                    })
                    .collect();
                Ok(Filesystem { name, buckets })
            })
            .collect()
    }

    async fn status(&self) -> Result<ClusterHealth, ConnectorError> {
        let result = self.call("status", json!({})).await?;
        match str_field(&result, "io_status") {
            Some("OK") | Some("ONLINE") => Ok(ClusterHealth::Healthy),
            _ => Ok(ClusterHealth::Degraded),
        }
    }
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
