// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::status::StepStatus;

#[test]
fn run_starts_pending_with_no_timestamps() {
    let run = Run::new(OrgId::new("acme"), RunId::new("run-1"));
    assert_eq!(run.status, RunStatus::Pending);
    assert!(run.updated_at.is_none());
    assert!(run.current_step_id.is_none());
}

#[test]
fn step_terminal_matches_status() {
    let mut step = Step {
        id: StepId::new("a"),
        status: StepStatus::Running,
        title: "A".into(),
        order: 1,
        agent_image: "echo".into(),
        timeout_minutes: 30,
        dependencies: vec![],
        job_name: None,
        result_summary: None,
        error: None,
        checkpoint: None,
        created_at: None,
        started_at: None,
        paused_at: None,
        completed_at: None,
    };
    assert!(!step.is_terminal());
    step.status = StepStatus::Completed;
    assert!(step.is_terminal());
}

#[test]
fn input_record_correlation_id_prefers_question_id() {
    let input = InputRecord {
        id: None,
        question_id: Some("q1".into()),
        approval_id: Some("a1".into()),
        step_id: StepId::new("a"),
        kind: crate::status::InputKind::Answer,
        payload: InputPayload::default(),
    };
    assert_eq!(input.correlation_id(), Some("q1"));
}

#[test]
fn input_record_correlation_id_falls_back_to_approval_id() {
    let input = InputRecord {
        id: None,
        question_id: None,
        approval_id: Some("a1".into()),
        step_id: StepId::new("a"),
        kind: crate::status::InputKind::Decision,
        payload: InputPayload::default(),
    };
    assert_eq!(input.correlation_id(), Some("a1"));
}

#[test]
fn step_serde_roundtrip_preserves_dependencies() {
    let step = Step {
        id: StepId::new("b"),
        status: StepStatus::Pending,
        title: "B".into(),
        order: 2,
        agent_image: "step-echo".into(),
        timeout_minutes: 10,
        dependencies: vec![StepId::new("a")],
        job_name: None,
        result_summary: None,
        error: None,
        checkpoint: None,
        created_at: None,
        started_at: None,
        paused_at: None,
        completed_at: None,
    };
    let json = serde_json::to_string(&step).unwrap();
    let back: Step = serde_json::from_str(&json).unwrap();
    assert_eq!(back.dependencies, vec![StepId::new("a")]);
}
