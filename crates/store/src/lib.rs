// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Typed read/write operations against the external document store.
//!
//! [`StoreAdapter`] is the single seam every other crate in the workspace
//! talks through — `pb-controller`, `pb-worker`, and `pb-resume` never touch
//! a concrete document-store client directly. Two implementations exist:
//!
//! - [`InMemoryStoreAdapter`] — an in-process store behind a
//!   [`parking_lot::Mutex`], driven by an injected [`pb_core::Clock`] so
//!   tests control time deterministically. Used by every crate's own test
//!   suite and by the workspace-level scenario tests.
//! - [`HttpStoreAdapter`] — a `reqwest`-based REST client against a
//!   Firestore-shaped document API, collections nested as
//!   `orgs/{org}/playbook_runs/{run}/...` per the data model. Never sends a
//!   client-side timestamp; it relies on the store's server-timestamp
//!   sentinel the same way `firestore.SERVER_TIMESTAMP` does upstream.
//!
//! Each operation here is a single best-effort request — retries are the
//! caller's concern (§4.B), not the adapter's.

pub mod http;
pub mod in_memory;

pub use http::HttpStoreAdapter;
pub use in_memory::InMemoryStoreAdapter;

use async_trait::async_trait;
use pb_core::{
    Checkpoint, ErrorInfo, EventRecord, EventType, FileRecord, InputId, InputRecord, OrgId,
    PlaybookStep, RunId, RunStatus, StepId, StepStatus,
};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("run '{0}' not found")]
    RunNotFound(RunId),

    #[error("step '{0}' not found")]
    StepNotFound(StepId),

    #[error("terminal step status is immutable: step '{step}' is already '{current}'")]
    TerminalStatusImmutable { step: StepId, current: StepStatus },

    #[error("terminal run status is immutable: run '{run}' is already '{current}'")]
    TerminalRunImmutable { run: RunId, current: RunStatus },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed document: {0}")]
    Malformed(String),

    #[error("not implemented: {0}")]
    NotImplemented(&'static str),
}

/// Partial update applied to a run's bookkeeping fields alongside a status
/// transition. All fields default to "leave unchanged".
#[derive(Debug, Clone, Default)]
pub struct RunStatusUpdate {
    pub error: Option<ErrorInfo>,
    pub summary: Option<String>,
    pub current_step_id: Option<StepId>,
}

/// Partial update applied to a step's bookkeeping fields alongside a status
/// transition.
#[derive(Debug, Clone, Default)]
pub struct StepStatusUpdate {
    pub error: Option<ErrorInfo>,
    pub result_summary: Option<String>,
    pub job_name: Option<String>,
}

/// `StoreAdapter` is the typed CRUD surface against the document store. Every
/// method here makes a single request; it does not retry.
#[async_trait]
pub trait StoreAdapter: Send + Sync {
    // ── Run ──────────────────────────────────────────────────────────
    async fn read_run(&self, org: &OrgId, run: &RunId) -> Result<Run, StoreError>;

    async fn update_run_status(
        &self,
        org: &OrgId,
        run: &RunId,
        status: RunStatus,
        update: RunStatusUpdate,
    ) -> Result<(), StoreError>;

    async fn heartbeat_run(&self, org: &OrgId, run: &RunId) -> Result<(), StoreError>;

    // ── Step ─────────────────────────────────────────────────────────
    /// Set-overwrite every step to "pending" with its playbook metadata.
    async fn initialize_steps(
        &self,
        org: &OrgId,
        run: &RunId,
        steps: &[PlaybookStep],
    ) -> Result<(), StoreError>;

    async fn update_step_status(
        &self,
        org: &OrgId,
        run: &RunId,
        step: &StepId,
        status: StepStatus,
        update: StepStatusUpdate,
    ) -> Result<(), StoreError>;

    async fn read_step_status(
        &self,
        org: &OrgId,
        run: &RunId,
        step: &StepId,
    ) -> Result<StepStatus, StoreError>;

    async fn read_step(&self, org: &OrgId, run: &RunId, step: &StepId) -> Result<Step, StoreError>;

    // ── Event (append-only) ──────────────────────────────────────────
    async fn append_event(
        &self,
        org: &OrgId,
        run: &RunId,
        kind: EventType,
        step: Option<&StepId>,
        payload: serde_json::Value,
    ) -> Result<pb_core::EventId, StoreError>;

    async fn list_events(&self, org: &OrgId, run: &RunId) -> Result<Vec<EventRecord>, StoreError>;

    // ── Input ────────────────────────────────────────────────────────
    /// Search both `questionId` and `approvalId` fields for a match.
    async fn read_input_by_question_id(
        &self,
        org: &OrgId,
        run: &RunId,
        correlation_id: &str,
    ) -> Result<Option<InputRecord>, StoreError>;

    /// Used by `pb-resume`'s polling watcher: every input
    /// written after `since`, in write order.
    async fn poll_new_inputs(
        &self,
        org: &OrgId,
        run: &RunId,
        since: Option<InputId>,
    ) -> Result<Vec<(InputId, InputRecord)>, StoreError>;

    // ── Context / results / files ────────────────────────────────────
    async fn read_context(
        &self,
        org: &OrgId,
        run: &RunId,
    ) -> Result<HashMap<String, serde_json::Value>, StoreError>;

    async fn read_all_step_results(
        &self,
        org: &OrgId,
        run: &RunId,
    ) -> Result<HashMap<StepId, String>, StoreError>;

    async fn read_all_files(&self, org: &OrgId, run: &RunId) -> Result<Vec<FileRecord>, StoreError>;

    // ── Checkpoint ───────────────────────────────────────────────────
    async fn save_checkpoint(
        &self,
        org: &OrgId,
        run: &RunId,
        step: &StepId,
        checkpoint: Checkpoint,
    ) -> Result<(), StoreError>;

    async fn load_checkpoint(
        &self,
        org: &OrgId,
        run: &RunId,
        step: &StepId,
    ) -> Result<Option<Checkpoint>, StoreError>;

    async fn clear_checkpoint(&self, org: &OrgId, run: &RunId, step: &StepId)
        -> Result<(), StoreError>;

    // ── Secret ───────────────────────────────────────────────────────
    /// Out-of-band credential material. Concrete secret backing is out of
    /// scope for this distillation (§1) — both implementations return
    /// [`StoreError::NotImplemented`] until a production secret store is
    /// wired in, without changing this trait.
    async fn read_oauth_token(&self, org: &OrgId, provider: &str) -> Result<String, StoreError>;

    async fn read_ai_config(&self, org: &OrgId) -> Result<serde_json::Value, StoreError>;
}

pub use pb_core::{Run, Step};

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
