// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `step-echo` — the minimal worker container: no HITL, completes on its
//! first (and only) invocation. Reads `STEP_ID`, `RUN_ID`, `ORG_ID`,
//! records them, and exits 0 through the `pb-worker` library contract —
//! it doubles as a smoke test for the Job pipeline and as the simplest
//! possible example of implementing [`StepHandler`].

use async_trait::async_trait;
use pb_core::{Checkpoint, InputRecord};
use pb_store::{HttpStoreAdapter, StoreAdapter};
use pb_worker::{run_step, Outcome, StepHandler, WorkerConfig, WorkerContext, WorkerError};
use std::process::ExitCode;
use std::sync::Arc;

struct EchoHandler;

#[async_trait]
impl StepHandler for EchoHandler {
    async fn fresh(&self, ctx: &WorkerContext) -> Result<Outcome, WorkerError> {
        tracing::info!(
            step = %ctx.step(),
            run = %ctx.run(),
            org = %ctx.org(),
            "echo agent completed successfully"
        );
        ctx.complete("echo agent completed successfully").await
    }

    async fn resume(
        &self,
        _ctx: &WorkerContext,
        _checkpoint: Checkpoint,
        _input: InputRecord,
    ) -> Result<Outcome, WorkerError> {
        // The echo agent never pauses, so it is never relaunched with
        // `RESUME_THREAD_ID` set — `pb-worker`'s dispatch would fail before
        // calling this with `MissingCheckpoint` anyway.
        unreachable!("step-echo never checkpoints, so it is never resumed")
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .json()
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    init_tracing();

    let config = match WorkerConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "failed to read step-echo configuration");
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

    let store: Arc<dyn StoreAdapter> = match HttpStoreAdapter::new(base_url) {
        Ok(store) => Arc::new(store),
        Err(err) => {
            tracing::error!(error = %err, "failed to construct store adapter");
            return ExitCode::FAILURE;
        }
    };

    run_step(store, config, &EchoHandler).await;
    // `run_step` always exits the process itself — this is
    // unreachable, kept only so `main`'s return type checks.
    ExitCode::SUCCESS
}
