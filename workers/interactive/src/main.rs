// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `step-interactive` — a two-round HITL worker demonstrating the full
//! pause/resume contract: a free-text question, then an approval on the
//! draft built from the answer, built against the `pb-worker` library
//! contract (checkpoint phases, an `Outcome`-returning `resume`).
//!
//! Phase flow:
//!   fresh               -> ask_user(free_text)            -> paused
//!   waiting_for_answer  -> request_approval(draft)         -> paused
//!   waiting_for_approval -> write report, complete          -> completed

use async_trait::async_trait;
use pb_core::{ApprovalDecision, ApprovalRiskLevel, Checkpoint, InputRecord, QuestionType};
use pb_store::{HttpStoreAdapter, StoreAdapter};
use pb_worker::{run_step, Outcome, StepHandler, WorkerConfig, WorkerContext, WorkerError};
use serde_json::json;
use std::process::ExitCode;
use std::sync::Arc;

struct InteractiveHandler;

#[async_trait]
impl StepHandler for InteractiveHandler {
    async fn fresh(&self, ctx: &WorkerContext) -> Result<Outcome, WorkerError> {
        ctx.emit(pb_core::EventType::Progress, json!({ "message": "reading run context" })).await?;
        let context = ctx.read_context().await?;

        ctx.ask_user(
            "What is the main objective for this project? Please describe briefly.",
            QuestionType::FreeText,
            None,
            Some("This will be used to generate a project summary draft."),
            true,
            json!({ "context": context }),
        )
        .await
    }

    async fn resume(
        &self,
        ctx: &WorkerContext,
        checkpoint: Checkpoint,
        input: InputRecord,
    ) -> Result<Outcome, WorkerError> {
        if checkpoint.phase.is_waiting_for_answer() {
            return after_question(ctx, checkpoint, input).await;
        }
        if checkpoint.phase.is_waiting_for_approval() {
            return after_approval(ctx, checkpoint, input).await;
        }
        Err(WorkerError::UnknownPhase(checkpoint.phase.as_str().to_string()))
    }
}

/// Phase 2: the user answered the question — build a draft and request
/// approval on it.
async fn after_question(
    ctx: &WorkerContext,
    checkpoint: Checkpoint,
    input: InputRecord,
) -> Result<Outcome, WorkerError> {
    let user_answer = input.payload.answer.unwrap_or_default();
    let context = checkpoint.data.get("context").cloned().unwrap_or(json!({}));

    let mut draft = format!("# Project Summary\n\n## Objective\n\n{user_answer}\n\n## Context\n\n");
    match context.as_object().filter(|m| !m.is_empty()) {
        Some(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            for key in keys {
                draft.push_str(&format!("- **{key}**: {}\n", map[key]));
            }
        }
        None => draft.push_str("_No additional context available._\n"),
    }
    draft.push_str(&format!(
        "\n## Metadata\n\n- Run: `{}`\n- Step: `{}`\n- Org: `{}`\n",
        ctx.run(),
        ctx.step(),
        ctx.org()
    ));

    ctx.request_approval(
        "Please review the generated project summary draft.",
        Some(&draft),
        ApprovalRiskLevel::Low,
        json!({ "draft": draft, "user_answer": user_answer }),
    )
    .await
}

/// Phase 3: the user approved, revised, or rejected the draft — write the
/// final report summary and complete.
async fn after_approval(
    ctx: &WorkerContext,
    checkpoint: Checkpoint,
    input: InputRecord,
) -> Result<Outcome, WorkerError> {
    let draft = checkpoint.data.get("draft").and_then(|d| d.as_str()).unwrap_or_default().to_string();
    let decision = input.payload.decision.unwrap_or(ApprovalDecision::Reject);

    let (report, summary) = match decision {
        ApprovalDecision::Approve => (format!("{draft}\n---\n\n_Approved by user._\n"), "Draft approved and finalized."),
        ApprovalDecision::Revise => {
            let revised = input.payload.revised_content.clone().unwrap_or(draft);
            (format!("{revised}\n---\n\n_Revised by user._\n"), "Draft revised by user and finalized.")
        }
        ApprovalDecision::Reject => (format!("{draft}\n---\n\n_Rejected by user._\n"), "Draft rejected by user."),
    };
    tracing::info!(step = %ctx.step(), bytes = report.len(), "final report assembled");

    ctx.complete(summary).await
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
            tracing::error!(error = %err, "failed to read step-interactive configuration");
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

    run_step(store, config, &InteractiveHandler).await;
    ExitCode::SUCCESS
}
