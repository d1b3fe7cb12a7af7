// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fresh-vs-resume phase dispatch and the top-level driver that
//! performs the process exit.
//!
//! [`dispatch`] is pure from the process's point of view — it never calls
//! `std::process::exit`, so it's exercised directly in this crate's tests.
//! [`run_step`] wraps it with the one `process::exit` call a worker
//! binary's `main` needs, matching the exit-code contract: 0 on any
//! reachable terminal state (completed, skipped, paused-then-exit), nonzero
//! only on unhandled crash.

use crate::context::crash_error;
use crate::{Outcome, WorkerConfig, WorkerContext, WorkerError};
use async_trait::async_trait;
use pb_core::{Checkpoint, InputKind, InputRecord, RunStatus};
use pb_store::StoreAdapter;
use serde_json::json;
use std::sync::Arc;

/// Worker-supplied business logic for one step. `fresh` runs when no
/// `RESUME_THREAD_ID` is set; `resume` runs once the generic dispatch has
/// confirmed the run isn't aborted and the matching input exists — it's
/// handed the loaded checkpoint and input so it can match on
/// `checkpoint.phase` itself (a worker may define phases beyond the two
/// built-in HITL primitives).
#[async_trait]
pub trait StepHandler: Send + Sync {
    async fn fresh(&self, ctx: &WorkerContext) -> Result<Outcome, WorkerError>;

    async fn resume(
        &self,
        ctx: &WorkerContext,
        checkpoint: Checkpoint,
        input: InputRecord,
    ) -> Result<Outcome, WorkerError>;
}

/// Run the fresh-vs-resume protocol for one step, without ever exiting the
/// process. A handler error here is treated as an uncaught-exception
/// catch-all: the step is marked `failed` with `STEP_AGENT_CRASH` and the
/// checkpoint is cleared before returning `Outcome::Failed`.
pub async fn dispatch(
    store: Arc<dyn StoreAdapter>,
    config: &WorkerConfig,
    handler: &dyn StepHandler,
) -> Outcome {
    let ctx = WorkerContext::new(store, config);
    match run_phase(&ctx, config, handler).await {
        Ok(outcome) => outcome,
        Err(err) => {
            let error = crash_error(err.to_string());
            match ctx.fail(error.clone()).await {
                Ok(outcome) => outcome,
                Err(_) => Outcome::Failed { error },
            }
        }
    }
}

/// `run_step` is what a worker binary's `main` calls: run the protocol,
/// then exit with the code the exit-code contract prescribes.
pub async fn run_step(store: Arc<dyn StoreAdapter>, config: WorkerConfig, handler: &dyn StepHandler) {
    let outcome = dispatch(store, &config, handler).await;
    let code = match &outcome {
        Outcome::Completed { .. } | Outcome::Paused(_) | Outcome::Aborted => 0,
        Outcome::Failed { .. } => 1,
    };
    std::process::exit(code);
}

async fn run_phase(
    ctx: &WorkerContext,
    config: &WorkerConfig,
    handler: &dyn StepHandler,
) -> Result<Outcome, WorkerError> {
    if !config.is_resume() {
        ctx.mark_running().await?;
        ctx.emit(pb_core::EventType::StepStarted, json!({ "stepId": ctx.step().as_str() })).await?;
        return handler.fresh(ctx).await;
    }

    let checkpoint = ctx
        .store()
        .load_checkpoint(ctx.org(), ctx.run(), ctx.step())
        .await?
        .ok_or(WorkerError::MissingCheckpoint)?;

    let run = ctx.store().read_run(ctx.org(), ctx.run()).await?;
    if run.status == RunStatus::Aborted {
        ctx.mark_aborted().await?;
        return Ok(Outcome::Aborted);
    }

    let input = ctx
        .store()
        .read_input_by_question_id(ctx.org(), ctx.run(), &checkpoint.question_id)
        .await?
        .ok_or_else(|| WorkerError::MissingInput(checkpoint.question_id.clone()))?;

    if input.kind == InputKind::Abort {
        ctx.mark_aborted().await?;
        return Ok(Outcome::Aborted);
    }

    ctx.mark_running().await?;
    handler.resume(ctx, checkpoint, input).await
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
