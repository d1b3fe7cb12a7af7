// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-step handle bundling the document store with the identifiers a
//! worker needs on every call, plus the HITL primitives themselves.
//!
//! `ask_user`/`request_approval` write the event, save the checkpoint,
//! mark the step paused, and return an [`Outcome`] instead of exiting
//! directly — `lifecycle::run_step` performs the exit once, at the top.

use crate::{Outcome, PauseRequested, WorkerConfig, WorkerError};
use pb_core::{
    error_codes, Checkpoint, CheckpointPhase, ErrorInfo, EventType, OrgId, QuestionType, RunId,
    StepId,
};
use pb_store::{StepStatusUpdate, StoreAdapter};
use serde_json::json;
use std::sync::Arc;

/// Everything a `StepHandler` needs to talk to the document store for one
/// step invocation.
pub struct WorkerContext {
    store: Arc<dyn StoreAdapter>,
    org: OrgId,
    run: RunId,
    step: StepId,
}

impl WorkerContext {
    pub fn new(store: Arc<dyn StoreAdapter>, config: &WorkerConfig) -> Self {
        Self {
            store,
            org: config.org_id.clone(),
            run: config.run_id.clone(),
            step: config.step_id.clone(),
        }
    }

    pub fn org(&self) -> &OrgId {
        &self.org
    }

    pub fn run(&self) -> &RunId {
        &self.run
    }

    pub fn step(&self) -> &StepId {
        &self.step
    }

    pub fn store(&self) -> &Arc<dyn StoreAdapter> {
        &self.store
    }

    /// Read the run's resolved variable context (`readContext`).
    pub async fn read_context(
        &self,
    ) -> Result<std::collections::HashMap<String, serde_json::Value>, WorkerError> {
        Ok(self.store.read_context(&self.org, &self.run).await?)
    }

    /// Mark the step `running`. Called at the top of both the fresh phase
    /// and every resume phase, so a controller polling step status always
    /// observes the `paused -> running` edge before a resumed step reaches
    /// its next terminal or paused state.
    pub async fn mark_running(&self) -> Result<(), WorkerError> {
        Ok(self
            .store
            .update_step_status(
                &self.org,
                &self.run,
                &self.step,
                pb_core::StepStatus::Running,
                StepStatusUpdate::default(),
            )
            .await?)
    }

    pub async fn emit(
        &self,
        kind: EventType,
        payload: serde_json::Value,
    ) -> Result<(), WorkerError> {
        self.store.append_event(&self.org, &self.run, kind, Some(&self.step), payload).await?;
        Ok(())
    }

    /// Ask the user a free-form or choice question. Writes the `question`
    /// event, saves the checkpoint, marks the step `paused`. Never exits —
    /// the caller returns the resulting `Outcome` up to `run_step`.
    #[allow(clippy::too_many_arguments)]
    pub async fn ask_user(
        &self,
        question: &str,
        question_type: QuestionType,
        options: Option<Vec<String>>,
        help_text: Option<&str>,
        required: bool,
        checkpoint_data: serde_json::Value,
    ) -> Result<Outcome, WorkerError> {
        let question_id = pb_core::new_correlation_id();

        let mut payload = json!({
            "questionId": question_id,
            "question": question,
            "questionType": question_type.to_string(),
            "required": required,
        });
        if let Some(options) = options {
            payload["options"] = json!(options);
        }
        if let Some(help_text) = help_text {
            payload["helpText"] = json!(help_text);
        }
        self.emit(EventType::Question, payload).await?;

        let phase = CheckpointPhase::waiting_for_answer();
        self.store
            .save_checkpoint(
                &self.org,
                &self.run,
                &self.step,
                Checkpoint { phase: phase.clone(), question_id: question_id.clone(), data: checkpoint_data },
            )
            .await?;

        self.store
            .update_step_status(
                &self.org,
                &self.run,
                &self.step,
                pb_core::StepStatus::Paused,
                StepStatusUpdate::default(),
            )
            .await?;

        tracing::info!(step = %self.step, question_id = %question_id, "step paused waiting for answer");
        Ok(Outcome::Paused(PauseRequested { phase, question_id }))
    }

    /// Symmetric to [`Self::ask_user`]: writes `approval_request`, phase
    /// `waiting_for_approval`.
    pub async fn request_approval(
        &self,
        description: &str,
        draft_content: Option<&str>,
        risk_level: pb_core::ApprovalRiskLevel,
        checkpoint_data: serde_json::Value,
    ) -> Result<Outcome, WorkerError> {
        let approval_id = pb_core::new_correlation_id();

        let mut payload = json!({
            "approvalId": approval_id,
            "description": description,
            "riskLevel": risk_level.to_string(),
        });
        if let Some(draft_content) = draft_content {
            payload["draftContent"] = json!(draft_content);
        }
        self.emit(EventType::ApprovalRequest, payload).await?;

        let phase = CheckpointPhase::waiting_for_approval();
        self.store
            .save_checkpoint(
                &self.org,
                &self.run,
                &self.step,
                Checkpoint {
                    phase: phase.clone(),
                    question_id: approval_id.clone(),
                    data: checkpoint_data,
                },
            )
            .await?;

        self.store
            .update_step_status(
                &self.org,
                &self.run,
                &self.step,
                pb_core::StepStatus::Paused,
                StepStatusUpdate::default(),
            )
            .await?;

        tracing::info!(step = %self.step, approval_id = %approval_id, "step paused waiting for approval");
        Ok(Outcome::Paused(PauseRequested { phase, question_id: approval_id }))
    }

    /// Mark the step `completed`, emit `step_completed`, clear the
    /// checkpoint. Terminal — returns `Outcome::Completed`.
    pub async fn complete(&self, result_summary: impl Into<String>) -> Result<Outcome, WorkerError> {
        let result_summary = result_summary.into();
        self.emit(EventType::StepCompleted, json!({ "resultSummary": result_summary })).await?;
        self.store
            .update_step_status(
                &self.org,
                &self.run,
                &self.step,
                pb_core::StepStatus::Completed,
                StepStatusUpdate { result_summary: Some(result_summary.clone()), ..Default::default() },
            )
            .await?;
        self.store.clear_checkpoint(&self.org, &self.run, &self.step).await?;
        Ok(Outcome::Completed { result_summary })
    }

    /// Mark the step `failed` with a caller-supplied error code (business
    /// failure, e.g. `STEP_FAILED`), emit `step_failed`, clear the
    /// checkpoint. For an uncaught error bubbling out of a handler, prefer
    /// letting `run_step` catch it — it writes `STEP_AGENT_CRASH` as a
    /// generic catch-all.
    pub async fn fail(&self, error: ErrorInfo) -> Result<Outcome, WorkerError> {
        self.emit(EventType::StepFailed, json!({ "error": error.message })).await?;
        self.store
            .update_step_status(
                &self.org,
                &self.run,
                &self.step,
                pb_core::StepStatus::Failed,
                StepStatusUpdate { error: Some(error.clone()), ..Default::default() },
            )
            .await?;
        self.store.clear_checkpoint(&self.org, &self.run, &self.step).await?;
        Ok(Outcome::Failed { error })
    }

    /// Mark the step `skipped` and clear its checkpoint — the resume-phase
    /// abort path ("if run is aborted -> mark step skipped,
    /// clear checkpoint, exit 0").
    pub(crate) async fn mark_aborted(&self) -> Result<(), WorkerError> {
        self.store
            .update_step_status(
                &self.org,
                &self.run,
                &self.step,
                pb_core::StepStatus::Skipped,
                StepStatusUpdate::default(),
            )
            .await?;
        self.store.clear_checkpoint(&self.org, &self.run, &self.step).await?;
        Ok(())
    }
}

/// Crash-path error code used when a handler returns an error rather than
/// an explicit `Outcome::Failed` — a generic catch-all tagged
/// `STEP_AGENT_CRASH`.
pub(crate) fn crash_error(message: impl Into<String>) -> ErrorInfo {
    ErrorInfo::new(error_codes::STEP_AGENT_CRASH, message)
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
