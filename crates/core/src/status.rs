// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Closed status/type enumerations for the run, step, event, and input
//! documents.
//!
//! Every one of these is parsed once at the store adapter boundary and
//! carried internally as a tagged value — no raw strings cross into the
//! controller, DAG, or worker crates.

use serde::{Deserialize, Serialize};

crate::simple_display! {
    RunStatus {
        Pending => "pending",
        Running => "running",
        Paused => "paused",
        Completed => "completed",
        Failed => "failed",
        Aborted => "aborted",
    }
}

/// Lifecycle status of a [`crate::model::Run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Pending,
    Running,
    Paused,
    Completed,
    Failed,
    Aborted,
}

impl RunStatus {
    /// Terminal statuses are never transitioned out of.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Aborted)
    }
}

/// Lifecycle status of a [`crate::model::Step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Running,
    Paused,
    Completed,
    Failed,
    Skipped,
}

crate::simple_display! {
    StepStatus {
        Pending => "pending",
        Running => "running",
        Paused => "paused",
        Completed => "completed",
        Failed => "failed",
        Skipped => "skipped",
    }
}

impl StepStatus {
    /// Terminal step statuses are set-once: once written, never overwritten.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Skipped)
    }
}

/// Append-only event kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    PlaybookStarted,
    PlaybookCompleted,
    PlaybookFailed,
    StepStarted,
    StepCompleted,
    StepFailed,
    Progress,
    Question,
    ApprovalRequest,
    AgentThinking,
    AgentToolUse,
    Log,
    FileReady,
}

crate::simple_display! {
    EventType {
        PlaybookStarted => "playbook_started",
        PlaybookCompleted => "playbook_completed",
        PlaybookFailed => "playbook_failed",
        StepStarted => "step_started",
        StepCompleted => "step_completed",
        StepFailed => "step_failed",
        Progress => "progress",
        Question => "question",
        ApprovalRequest => "approval_request",
        AgentThinking => "agent_thinking",
        AgentToolUse => "agent_tool_use",
        Log => "log",
        FileReady => "file_ready",
    }
}

/// Kind of HITL question asked by `askUser`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    FreeText,
    SingleSelect,
    MultiSelect,
}

crate::simple_display! {
    QuestionType {
        FreeText => "free_text",
        SingleSelect => "single_select",
        MultiSelect => "multi_select",
    }
}

/// Risk level attached to `requestApproval`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalRiskLevel {
    Low,
    Medium,
    High,
}

crate::simple_display! {
    ApprovalRiskLevel {
        Low => "low",
        Medium => "medium",
        High => "high",
    }
}

/// Kind of user input document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    Answer,
    Decision,
    Abort,
}

crate::simple_display! {
    InputKind {
        Answer => "answer",
        Decision => "decision",
        Abort => "abort",
    }
}

/// An approval decision value, carried in an input document's `decision` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalDecision {
    Approve,
    Revise,
    Reject,
}

crate::simple_display! {
    ApprovalDecision {
        Approve => "approve",
        Revise => "revise",
        Reject => "reject",
    }
}

/// Checkpoint phase recorded by the worker on pause.
///
/// Unlike the closed enums above, a checkpoint's `phase` is worker-defined —
/// `pb-worker` assigns the two HITL phases below, but a worker with more
/// than one resume point beyond `ask_user`/`request_approval` may record its
/// own phase name. So this is a thin string newtype with recognized
/// constants rather than a closed enum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CheckpointPhase(pub String);

impl CheckpointPhase {
    pub const WAITING_FOR_ANSWER: &'static str = "waiting_for_answer";
    pub const WAITING_FOR_APPROVAL: &'static str = "waiting_for_approval";

    pub fn waiting_for_answer() -> Self {
        Self(Self::WAITING_FOR_ANSWER.to_string())
    }

    pub fn waiting_for_approval() -> Self {
        Self(Self::WAITING_FOR_APPROVAL.to_string())
    }

    pub fn is_waiting_for_answer(&self) -> bool {
        self.0 == Self::WAITING_FOR_ANSWER
    }

    pub fn is_waiting_for_approval(&self) -> bool {
        self.0 == Self::WAITING_FOR_APPROVAL
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CheckpointPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
