// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! snaptool: the snapshot scheduling daemon binary. Wires CLI parsing,
//! logging, config loading, the cluster connector, and the planner and
//! worker tasks from `snapd-engine` into a single long-running process,
//! replacing the source's module-level globals with one constructed-at-
//! startup engine bundle (see `GLOSSARY` in the design document).

use clap::Parser;
use parking_lot::RwLock;
use snapd_adapters::{load_config, ClusterConnector, HttpClusterConnector};
use snapd_core::clock::SystemClock;
use snapd_daemon::{cli::Cli, env, logging, status_http};
use snapd_engine::{replay_outstanding, ConnectorFactory, EngineStatus, Planner, ProgressRing, RetryConnector, Worker};
use snapd_storage::IntentLog;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let loaded = load_config(&cli.configfile)
        .map_err(|e| anyhow::anyhow!("failed to load config {}: {e}", cli.configfile.display()))?;
    for err in &loaded.ignored_errors {
        eprintln!("warning: ignoring malformed config entry: {err}");
    }

    let log_dir = PathBuf::from("logs");
    let action_log_path = log_dir.join("snaptool.log");
    logging::rotate_log_if_needed(&action_log_path);
    let _log_guard = logging::setup_logging(cli.verbosity, &action_log_path)?;

    info!(version = env!("CARGO_PKG_VERSION"), config = %cli.configfile.display(), "starting snaptool");

    let raw_connector: Arc<dyn ClusterConnector> =
        Arc::new(HttpClusterConnector::new(&loaded.cluster).map_err(|e| anyhow::anyhow!("{e}"))?);

    if cli.test_connection_only {
        return match raw_connector.status().await {
            Ok(_) => {
                println!("Connection Succeeded");
                Ok(())
            }
            Err(e) => {
                println!("Connection Failed");
                error!(error = %e, "connection test failed");
                std::process::exit(1);
            }
        };
    }

    let cluster_config = Arc::new(RwLock::new(loaded.cluster.clone()));
    let factory: ConnectorFactory = {
        let cluster_config = Arc::clone(&cluster_config);
        Arc::new(move || {
            let cfg = cluster_config.read().clone();
            HttpClusterConnector::new(&cfg).map(|c| Arc::new(c) as Arc<dyn ClusterConnector>)
        })
    };
    let retry_connector = Arc::new(RetryConnector::new(raw_connector, factory));

    std::fs::create_dir_all(&log_dir)?;
    let intent_log = Arc::new(IntentLog::open(log_dir.join("snap_intent_q.log"))?);
    let progress = Arc::new(ProgressRing::default());
    let clock = SystemClock;

    let worker = Arc::new(Worker::new(
        retry_connector.clone() as Arc<dyn ClusterConnector>,
        intent_log.clone(),
        progress,
        clock.clone(),
    ));

    match replay_outstanding(&intent_log, &worker) {
        Ok(count) if count > 0 => info!(count, "replayed outstanding intents from the intent log"),
        Ok(_) => {}
        Err(e) => error!(error = %e, "failed to replay intent log at startup"),
    }

    let status = EngineStatus::new();
    let planner = Arc::new(Planner::new(
        retry_connector,
        worker.clone(),
        intent_log,
        clock,
        cli.configfile.clone(),
        cluster_config,
        loaded.groups,
        loaded.loaded_at,
        status.clone(),
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let worker_task = tokio::spawn({
        let worker = worker.clone();
        let shutdown_rx = shutdown_rx.clone();
        async move { worker.run(shutdown_rx).await }
    });
    let planner_task = tokio::spawn({
        let planner = planner.clone();
        let shutdown_rx = shutdown_rx.clone();
        async move { planner.run(shutdown_rx).await }
    });

    let http_port = cli.http_port.unwrap_or(loaded.snaptool.port);
    let http_task = (http_port != 0).then(|| {
        let bind = format!("{}:{http_port}", loaded.snaptool.host);
        tokio::spawn(status_http::serve(bind, status))
    });

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::select! {
        _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
        _ = sigint.recv() => info!("received SIGINT, shutting down"),
    }

    let _ = shutdown_tx.send(true);
    let _ = tokio::join!(worker_task, planner_task);
    if let Some(http_task) = http_task {
        http_task.abort();
    }

    info!("snaptool stopped");
    Ok(())
}
