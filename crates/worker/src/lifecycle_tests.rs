// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use pb_core::test_support::playbook_step;
use pb_core::{Checkpoint, CheckpointPhase, InputKind, InputPayload, InputRecord, Run};
use pb_store::in_memory::InMemoryStoreAdapter;
use std::sync::Arc;

struct CompletingHandler;

#[async_trait::async_trait]
impl StepHandler for CompletingHandler {
    async fn fresh(&self, ctx: &WorkerContext) -> Result<Outcome, WorkerError> {
        ctx.complete("done").await
    }

    async fn resume(
        &self,
        ctx: &WorkerContext,
        _checkpoint: Checkpoint,
        input: InputRecord,
    ) -> Result<Outcome, WorkerError> {
        let answer = input.payload.answer.unwrap_or_default();
        ctx.complete(format!("resumed with {answer}")).await
    }
}

/// Asserts the step is back in `running` by the time `resume` is called,
/// before completing it.
struct ObservesRunningOnResumeHandler;

#[async_trait::async_trait]
impl StepHandler for ObservesRunningOnResumeHandler {
    async fn fresh(&self, ctx: &WorkerContext) -> Result<Outcome, WorkerError> {
        ctx.complete("done").await
    }

    async fn resume(
        &self,
        ctx: &WorkerContext,
        _checkpoint: Checkpoint,
        _input: InputRecord,
    ) -> Result<Outcome, WorkerError> {
        let step = ctx.store().read_step(ctx.org(), ctx.run(), ctx.step()).await.unwrap();
        assert_eq!(step.status, pb_core::StepStatus::Running);
        ctx.complete("resumed").await
    }
}

struct PausingHandler;

#[async_trait::async_trait]
impl StepHandler for PausingHandler {
    async fn fresh(&self, ctx: &WorkerContext) -> Result<Outcome, WorkerError> {
        ctx.ask_user(
            "what now?",
            pb_core::QuestionType::FreeText,
            None,
            None,
            true,
            serde_json::json!({}),
        )
        .await
    }

    async fn resume(
        &self,
        _ctx: &WorkerContext,
        _checkpoint: Checkpoint,
        _input: InputRecord,
    ) -> Result<Outcome, WorkerError> {
        unreachable!("not exercised in these tests")
    }
}

struct CrashingHandler;

#[async_trait::async_trait]
impl StepHandler for CrashingHandler {
    async fn fresh(&self, _ctx: &WorkerContext) -> Result<Outcome, WorkerError> {
        Err(WorkerError::Other("kaboom".to_string()))
    }

    async fn resume(
        &self,
        _ctx: &WorkerContext,
        _checkpoint: Checkpoint,
        _input: InputRecord,
    ) -> Result<Outcome, WorkerError> {
        unreachable!("not exercised in these tests")
    }
}

fn config(resume_thread_id: Option<&str>) -> WorkerConfig {
    WorkerConfig {
        run_id: RunId::new("run-1"),
        org_id: OrgId::new("acme"),
        step_id: StepId::new("a"),
        namespace: "playbooks".to_string(),
        resume_thread_id: resume_thread_id.map(|s| s.to_string()),
    }
}

async fn seeded_store() -> Arc<InMemoryStoreAdapter> {
    let store = Arc::new(InMemoryStoreAdapter::new());
    store.seed_run(Run::new(OrgId::new("acme"), RunId::new("run-1")));
    store
        .initialize_steps(&OrgId::new("acme"), &RunId::new("run-1"), &[playbook_step("a", 1, &[])])
        .await
        .unwrap();
    store
}

#[tokio::test]
async fn fresh_phase_with_a_completing_handler_reaches_completed() {
    let store = seeded_store().await;
    let outcome = dispatch(store.clone(), &config(None), &CompletingHandler).await;
    assert!(matches!(outcome, Outcome::Completed { .. }));

    let step =
        store.read_step(&OrgId::new("acme"), &RunId::new("run-1"), &StepId::new("a")).await.unwrap();
    assert_eq!(step.status, pb_core::StepStatus::Completed);
}

#[tokio::test]
async fn fresh_phase_with_a_pausing_handler_reaches_paused() {
    let store = seeded_store().await;
    let outcome = dispatch(store.clone(), &config(None), &PausingHandler).await;
    assert!(matches!(outcome, Outcome::Paused(_)));

    let step =
        store.read_step(&OrgId::new("acme"), &RunId::new("run-1"), &StepId::new("a")).await.unwrap();
    assert_eq!(step.status, pb_core::StepStatus::Paused);
}

#[tokio::test]
async fn handler_error_on_fresh_phase_is_reported_as_a_crash_failure() {
    let store = seeded_store().await;
    let outcome = dispatch(store.clone(), &config(None), &CrashingHandler).await;
    match outcome {
        Outcome::Failed { error } => assert_eq!(error.code, pb_core::error_codes::STEP_AGENT_CRASH),
        other => panic!("expected Failed, got {other:?}"),
    }

    let step =
        store.read_step(&OrgId::new("acme"), &RunId::new("run-1"), &StepId::new("a")).await.unwrap();
    assert_eq!(step.status, pb_core::StepStatus::Failed);
}

#[tokio::test]
async fn resume_without_a_checkpoint_fails_the_step() {
    let store = seeded_store().await;
    let outcome = dispatch(store, &config(Some("thread-1")), &CompletingHandler).await;
    match outcome {
        Outcome::Failed { error } => assert_eq!(error.code, pb_core::error_codes::STEP_AGENT_CRASH),
        other => panic!("expected Failed, got {other:?}"),
    }
}

#[tokio::test]
async fn resume_reads_the_matching_input_and_completes() {
    let store = seeded_store().await;
    store
        .save_checkpoint(
            &OrgId::new("acme"),
            &RunId::new("run-1"),
            &StepId::new("a"),
            Checkpoint {
                phase: CheckpointPhase::waiting_for_answer(),
                question_id: "q-1".to_string(),
                data: serde_json::json!({}),
            },
        )
        .await
        .unwrap();
    store.seed_input(
        &OrgId::new("acme"),
        &RunId::new("run-1"),
        InputRecord {
            id: None,
            question_id: Some("q-1".to_string()),
            approval_id: None,
            step_id: StepId::new("a"),
            kind: InputKind::Answer,
            payload: InputPayload { answer: Some("42".to_string()), ..Default::default() },
        },
    );

    let outcome = dispatch(store.clone(), &config(Some("thread-1")), &CompletingHandler).await;
    match outcome {
        Outcome::Completed { result_summary } => assert_eq!(result_summary, "resumed with 42"),
        other => panic!("expected Completed, got {other:?}"),
    }
}

#[tokio::test]
async fn resume_marks_the_step_running_before_dispatching_to_the_handler() {
    let store = seeded_store().await;
    store
        .update_step_status(
            &OrgId::new("acme"),
            &RunId::new("run-1"),
            &StepId::new("a"),
            pb_core::StepStatus::Paused,
            pb_store::StepStatusUpdate::default(),
        )
        .await
        .unwrap();
    store
        .save_checkpoint(
            &OrgId::new("acme"),
            &RunId::new("run-1"),
            &StepId::new("a"),
            Checkpoint {
                phase: CheckpointPhase::waiting_for_answer(),
                question_id: "q-1".to_string(),
                data: serde_json::json!({}),
            },
        )
        .await
        .unwrap();
    store.seed_input(
        &OrgId::new("acme"),
        &RunId::new("run-1"),
        InputRecord {
            id: None,
            question_id: Some("q-1".to_string()),
            approval_id: None,
            step_id: StepId::new("a"),
            kind: InputKind::Answer,
            payload: InputPayload::default(),
        },
    );

    // `ObservesRunningOnResumeHandler::resume` asserts the step is `running`
    // when it runs, before it completes the step.
    let outcome =
        dispatch(store.clone(), &config(Some("thread-1")), &ObservesRunningOnResumeHandler).await;
    assert!(matches!(outcome, Outcome::Completed { .. }));
}

#[tokio::test]
async fn resume_when_the_run_is_aborted_skips_the_step_and_clears_checkpoint() {
    let store = seeded_store().await;
    store
        .save_checkpoint(
            &OrgId::new("acme"),
            &RunId::new("run-1"),
            &StepId::new("a"),
            Checkpoint {
                phase: CheckpointPhase::waiting_for_answer(),
                question_id: "q-1".to_string(),
                data: serde_json::json!({}),
            },
        )
        .await
        .unwrap();
    store
        .update_run_status(
            &OrgId::new("acme"),
            &RunId::new("run-1"),
            pb_core::RunStatus::Aborted,
            pb_store::RunStatusUpdate::default(),
        )
        .await
        .unwrap();

    let outcome = dispatch(store.clone(), &config(Some("thread-1")), &CompletingHandler).await;
    assert!(matches!(outcome, Outcome::Aborted));

    let step =
        store.read_step(&OrgId::new("acme"), &RunId::new("run-1"), &StepId::new("a")).await.unwrap();
    assert_eq!(step.status, pb_core::StepStatus::Skipped);
    assert!(step.checkpoint.is_none());
}

#[tokio::test]
async fn resume_with_an_abort_type_input_skips_the_step() {
    let store = seeded_store().await;
    store
        .save_checkpoint(
            &OrgId::new("acme"),
            &RunId::new("run-1"),
            &StepId::new("a"),
            Checkpoint {
                phase: CheckpointPhase::waiting_for_answer(),
                question_id: "q-1".to_string(),
                data: serde_json::json!({}),
            },
        )
        .await
        .unwrap();
    store.seed_input(
        &OrgId::new("acme"),
        &RunId::new("run-1"),
        InputRecord {
            id: None,
            question_id: Some("q-1".to_string()),
            approval_id: None,
            step_id: StepId::new("a"),
            kind: InputKind::Abort,
            payload: InputPayload::default(),
        },
    );

    let outcome = dispatch(store.clone(), &config(Some("thread-1")), &CompletingHandler).await;
    assert!(matches!(outcome, Outcome::Aborted));

    let step =
        store.read_step(&OrgId::new("acme"), &RunId::new("run-1"), &StepId::new("a")).await.unwrap();
    assert_eq!(step.status, pb_core::StepStatus::Skipped);
}
