// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn run_status_terminal_set() {
    assert!(RunStatus::Completed.is_terminal());
    assert!(RunStatus::Failed.is_terminal());
    assert!(RunStatus::Aborted.is_terminal());
    assert!(!RunStatus::Running.is_terminal());
    assert!(!RunStatus::Paused.is_terminal());
    assert!(!RunStatus::Pending.is_terminal());
}

#[test]
fn step_status_terminal_set() {
    assert!(StepStatus::Completed.is_terminal());
    assert!(StepStatus::Failed.is_terminal());
    assert!(StepStatus::Skipped.is_terminal());
    assert!(!StepStatus::Running.is_terminal());
    assert!(!StepStatus::Paused.is_terminal());
}

#[test]
fn step_status_serde_snake_case() {
    let json = serde_json::to_string(&StepStatus::Paused).unwrap();
    assert_eq!(json, "\"paused\"");
    let back: StepStatus = serde_json::from_str("\"completed\"").unwrap();
    assert_eq!(back, StepStatus::Completed);
}

#[test]
fn event_type_display_matches_wire_strings() {
    assert_eq!(EventType::ApprovalRequest.to_string(), "approval_request");
    assert_eq!(EventType::StepFailed.to_string(), "step_failed");
}

#[test]
fn checkpoint_phase_recognizes_hitl_phases() {
    let p = CheckpointPhase::waiting_for_answer();
    assert!(p.is_waiting_for_answer());
    assert!(!p.is_waiting_for_approval());

    let custom = CheckpointPhase("some_other_phase".to_string());
    assert!(!custom.is_waiting_for_answer());
    assert_eq!(custom.as_str(), "some_other_phase");
}
