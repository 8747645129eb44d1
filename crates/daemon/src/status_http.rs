// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Read-only status HTTP surface. An independent server task that only
//! reads the shared [`EngineStatus`] snapshot the planner publishes; it
//! never mutates engine state. `axum` is the only addition to the
//! workspace dependency set this crate needed beyond what the teacher
//! already carried (see `DESIGN.md`).

use axum::extract::State;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use serde::Serialize;
use snapd_engine::{EngineStatus, StatusView};
use std::net::SocketAddr;
use tracing::{error, info};

#[derive(Serialize)]
struct BindingJson {
    group: String,
    entry: String,
    filesystem: String,
    next_fire: Option<String>,
}

#[derive(Serialize)]
struct StatusJson {
    cluster_health: Option<String>,
    bindings: Vec<BindingJson>,
    recent_progress: Vec<String>,
    config_loaded_at: Option<String>,
}

impl From<StatusView> for StatusJson {
    fn from(view: StatusView) -> Self {
        Self {
            cluster_health: view.cluster_health.map(|h| format!("{h:?}")),
            bindings: view
                .bindings
                .into_iter()
                .map(|b| BindingJson {
                    group: b.group,
                    entry: b.entry,
                    filesystem: b.filesystem,
                    next_fire: b.next_fire,
                })
                .collect(),
            recent_progress: view.recent_progress,
            config_loaded_at: view.config_loaded_at,
        }
    }
}

async fn index(State(status): State<EngineStatus>) -> Json<StatusJson> {
    Json(status.snapshot().into())
}

async fn config(State(status): State<EngineStatus>) -> Json<Vec<BindingJson>> {
    let view = status.snapshot();
    Json(
        view.bindings
            .into_iter()
            .map(|b| BindingJson { group: b.group, entry: b.entry, filesystem: b.filesystem, next_fire: b.next_fire })
            .collect(),
    )
}

pub fn router(status: EngineStatus) -> Router {
    Router::new().route("/", get(index)).route("/config", get(config)).with_state(status)
}

/// Bind and serve the status router until the process exits. Errors are
/// logged, not propagated: the status UI is a convenience surface, not
/// load-bearing for scheduling.
pub async fn serve(bind: String, status: EngineStatus) {
    let addr: SocketAddr = match bind.parse() {
        Ok(addr) => addr,
        Err(e) => {
            error!(bind = %bind, error = %e, "invalid status UI bind address, status UI disabled");
            return;
        }
    };
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(%addr, error = %e, "failed to bind status UI, status UI disabled");
            return;
        }
    };
    info!(%addr, "status UI listening");
    if let Err(e) = axum::serve(listener, router(status)).await {
        error!(error = %e, "status UI server exited");
    }
}

#[cfg(test)]
#[path = "status_http_tests.rs"]
mod tests;
