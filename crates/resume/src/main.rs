// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `resume-trigger` — the external event handler that watches
//! one run's `inputs` writes and launches the matching resume Job, or
//! aborts the run, until the run reaches a terminal status.

use pb_cluster::KubeClusterAdapter;
use pb_resume::{ResumeConfig, ResumeOptions, ResumeWatcher};
use pb_store::HttpStoreAdapter;
use std::process::ExitCode;
use std::sync::Arc;

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .json()
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    init_tracing();

    let config = match ResumeConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "failed to read resume-trigger configuration");
            return ExitCode::FAILURE;
        }
    };

    let base_url = match std::env::var("STORE_BASE_URL") {
        Ok(url) => url,
        Err(_) => {
            tracing::error!("missing required environment variable: STORE_BASE_URL");
            return ExitCode::FAILURE;
        }
    };

    let store = match HttpStoreAdapter::new(base_url) {
        Ok(store) => Arc::new(store),
        Err(err) => {
            tracing::error!(error = %err, "failed to construct store adapter");
            return ExitCode::FAILURE;
        }
    };

    let cluster = match KubeClusterAdapter::new().await {
        Ok(cluster) => Arc::new(cluster),
        Err(err) => {
            tracing::error!(error = %err, "failed to construct cluster adapter");
            return ExitCode::FAILURE;
        }
    };

    let options = ResumeOptions::from(&config);
    let mut watcher = ResumeWatcher::new(store, cluster, config.org_id, config.run_id, options);

    match watcher.run_until_terminal(config.poll_interval).await {
        Ok(()) => {
            tracing::info!("run reached a terminal status; resume-trigger exiting");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(error = %err, "resume-trigger exited with an error");
            ExitCode::FAILURE
        }
    }
}
