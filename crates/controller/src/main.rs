// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `playbookd` — the run controller binary. Reads its env once, validates
//! and drives exactly one playbook run to a terminal status, then exits.

use pb_cluster::KubeClusterAdapter;
use pb_controller::{ControllerConfig, Scheduler, SchedulerOptions};
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

    let config = match ControllerConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "failed to read controller configuration");
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

    let definition_path = match std::env::var("PLAYBOOK_DEFINITION_PATH") {
        Ok(path) => path,
        Err(_) => {
            tracing::error!("missing required environment variable: PLAYBOOK_DEFINITION_PATH");
            return ExitCode::FAILURE;
        }
    };
    let raw = match std::fs::read_to_string(&definition_path) {
        Ok(raw) => raw,
        Err(err) => {
            tracing::error!(error = %err, path = definition_path, "failed to read playbook definition");
            return ExitCode::FAILURE;
        }
    };
    let playbook = match serde_yaml::from_str(&raw) {
        Ok(playbook) => playbook,
        Err(err) => {
            tracing::error!(error = %err, path = definition_path, "failed to parse playbook definition");
            return ExitCode::FAILURE;
        }
    };

    let options = SchedulerOptions::from(&config);
    let scheduler = Scheduler::new(store, cluster, playbook, config.org_id, config.run_id, options);

    match scheduler.run().await {
        Ok(outcome) => {
            tracing::info!(?outcome, "run controller finished");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(error = %err, "run controller exited with an error");
            ExitCode::FAILURE
        }
    }
}
