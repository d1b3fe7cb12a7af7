// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use pb_core::{RunId, StepId, StepStatus};

#[test]
fn run_status_update_defaults_to_no_change() {
    let update = RunStatusUpdate::default();
    assert!(update.error.is_none());
    assert!(update.summary.is_none());
    assert!(update.current_step_id.is_none());
}

#[test]
fn step_status_update_defaults_to_no_change() {
    let update = StepStatusUpdate::default();
    assert!(update.error.is_none());
    assert!(update.result_summary.is_none());
    assert!(update.job_name.is_none());
}

#[test]
fn terminal_status_immutable_message_names_step_and_current_status() {
    let err = StoreError::TerminalStatusImmutable {
        step: StepId::new("step-a"),
        current: StepStatus::Completed,
    };
    let message = err.to_string();
    assert!(message.contains("step-a"));
    assert!(message.contains("completed"));
}

#[test]
fn run_not_found_message_names_run() {
    let err = StoreError::RunNotFound(RunId::new("run-1"));
    assert!(err.to_string().contains("run-1"));
}
