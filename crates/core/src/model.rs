// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Entity types stored in the external document store.
//!
//! These are plain data — no behavior beyond small invariant checks lives
//! here. The state machine transitions themselves are enforced by
//! `pb-store` (set-once terminal writes) and driven by `pb-controller` /
//! `pb-worker`.

use crate::ids::{EventId, FileId, InputId, OrgId, RunId, StepId};
use crate::status::{EventType, InputKind, RunStatus, StepStatus};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// `{code, message}` pair attached to a failed run or step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self { code: code.into(), message: message.into() }
    }
}

/// Well-known error codes used by the controller and worker.
pub mod error_codes {
    pub const CYCLIC_DEPENDENCY: &str = "CYCLIC_DEPENDENCY";
    pub const PLAYBOOK_INVALID: &str = "PLAYBOOK_INVALID";
    pub const STEP_TIMEOUT: &str = "STEP_TIMEOUT";
    pub const STEP_FAILED: &str = "STEP_FAILED";
    pub const AGENT_CRASH: &str = "AGENT_CRASH";
    pub const STEP_AGENT_CRASH: &str = "STEP_AGENT_CRASH";
}

/// A playbook run (`orgs/{org}/playbook_runs/{run}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    pub id: RunId,
    pub org_id: OrgId,
    pub status: RunStatus,
    #[serde(default)]
    pub context: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub trigger_inputs: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub current_step_id: Option<StepId>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub error: Option<ErrorInfo>,
    /// Server-assigned; `None` until the store has written it at least once.
    #[serde(default)]
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub last_heartbeat: Option<chrono::DateTime<chrono::Utc>>,
}

impl Run {
    pub fn new(org_id: OrgId, id: RunId) -> Self {
        Self {
            id,
            org_id,
            status: RunStatus::Pending,
            context: HashMap::new(),
            trigger_inputs: HashMap::new(),
            current_step_id: None,
            summary: None,
            error: None,
            updated_at: None,
            completed_at: None,
            last_heartbeat: None,
        }
    }
}

/// A step document (`.../steps/{step}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    pub id: StepId,
    pub status: StepStatus,
    pub title: String,
    pub order: u32,
    pub agent_image: String,
    pub timeout_minutes: u32,
    #[serde(default)]
    pub dependencies: Vec<StepId>,
    #[serde(default)]
    pub job_name: Option<String>,
    #[serde(default)]
    pub result_summary: Option<String>,
    #[serde(default)]
    pub error: Option<ErrorInfo>,
    #[serde(default)]
    pub checkpoint: Option<Checkpoint>,
    #[serde(default)]
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub started_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub paused_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Step {
    /// `true` once this step has reached a terminal status. Terminal step
    /// statuses are never overwritten.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Checkpoint payload saved by a worker on HITL pause.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub phase: crate::status::CheckpointPhase,
    pub question_id: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// An append-only event (`.../events/{auto}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    #[serde(default)]
    pub id: Option<EventId>,
    #[serde(rename = "type")]
    pub kind: EventType,
    #[serde(default)]
    pub step_id: Option<StepId>,
    #[serde(default)]
    pub timestamp: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub payload: serde_json::Value,
}

/// An input document written by the UI in response to a HITL event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputRecord {
    #[serde(default)]
    pub id: Option<InputId>,
    #[serde(default)]
    pub question_id: Option<String>,
    #[serde(default)]
    pub approval_id: Option<String>,
    pub step_id: StepId,
    #[serde(rename = "type")]
    pub kind: InputKind,
    #[serde(default)]
    pub payload: InputPayload,
}

impl InputRecord {
    /// The correlation id this input answers — checked against the
    /// checkpoint's `questionId` by both `pb-worker` and `pb-resume`, which
    /// search both the question and approval fields.
    pub fn correlation_id(&self) -> Option<&str> {
        self.question_id.as_deref().or(self.approval_id.as_deref())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputPayload {
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub decision: Option<crate::status::ApprovalDecision>,
    #[serde(default)]
    pub revised_content: Option<String>,
}

/// Metadata for an artifact uploaded to the blob store (`.../files/{auto}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    #[serde(default)]
    pub id: Option<FileId>,
    pub name: String,
    pub storage_path: String,
    pub mime_type: String,
    pub size_bytes: u64,
    #[serde(default)]
    pub step_id: Option<StepId>,
}

#[cfg(test)]
#[path = "model_tests.rs"]
mod tests;
