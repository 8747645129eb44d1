// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use snapd_adapters::FakeClusterConnector;
use std::sync::Arc;

fn retry_connector(fake: Arc<FakeClusterConnector>) -> RetryConnector {
    let factory: ConnectorFactory = {
        let fake = Arc::clone(&fake);
        Arc::new(move || Ok(fake.clone() as Arc<dyn ClusterConnector>))
    };
    RetryConnector::new(fake, factory)
}

#[tokio::test(start_paused = true)]
async fn transient_failures_below_budget_eventually_succeed() {
    let fake = Arc::new(FakeClusterConnector::new());
    fake.fail_next(2);
    let retry = retry_connector(fake);
    let result = retry.filesystems_list().await;
    assert!(result.is_ok());
}

#[tokio::test(start_paused = true)]
async fn already_exists_short_circuits_to_success() {
    let fake = Arc::new(FakeClusterConnector::new());
    fake.seed_snapshot(snapd_core::snapshot::Snapshot {
        filesystem: "fs1".into(),
        name: "daily.2106071200".into(),
        creation_time: chrono::Local::now(),
        locator: None,
        local_stow: snapd_core::snapshot::Stow {
            status: snapd_core::snapshot::StowStatus::None,
            progress: snapd_core::snapshot::Progress::Unknown,
            locator: None,
        },
        remote_stow: snapd_core::snapshot::Stow {
            status: snapd_core::snapshot::StowStatus::None,
            progress: snapd_core::snapshot::Progress::Unknown,
            locator: None,
        },
    });
    let retry = retry_connector(fake);
    let result = retry.snapshot_create("fs1", "daily.2106071200", "@GMT-2021", false).await;
    assert!(result.is_ok());
}

#[tokio::test(start_paused = true)]
async fn exhausting_retry_budget_surfaces_the_last_error() {
    let fake = Arc::new(FakeClusterConnector::new());
    fake.fail_next(MAX_ATTEMPTS as usize);
    let retry = retry_connector(fake);
    let result = retry.filesystems_list().await;
    assert!(result.is_err());
}

#[tokio::test(start_paused = true)]
async fn upload_policy_error_is_not_retried_as_transient() {
    let fake = Arc::new(FakeClusterConnector::new());
    fake.deny_upload_for("fs1");
    let retry = retry_connector(fake);
    let result = retry.snapshot_upload("fs1", "daily.2106071200", ObsSite::Local, "bucket").await;
    assert!(matches!(result, Err(ConnectorError::Permanent(_))));
}
