// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! pb-core: shared data model, IDs, clock abstraction, and the
//! `Context`/`Playbook` value types consumed by every other crate in the
//! workspace.
//!
//! This crate owns nothing that talks to the document store, the cluster
//! orchestrator, or a worker process — it is pure data plus the small
//! amount of behavior (variable resolution, terminal-status checks) that
//! every collaborator needs to agree on.

pub mod macros;

pub mod clock;
pub mod context;
pub mod ids;
pub mod model;
pub mod playbook;
pub mod status;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use clock::{Clock, FakeClock, SystemClock};
pub use context::{Context, ContextError, ContextValue, Member};
pub use ids::{new_correlation_id, EventId, FileId, InputId, OrgId, RunId, StepId};
pub use model::{
    error_codes, Checkpoint, ErrorInfo, EventRecord, FileRecord, InputPayload, InputRecord, Run,
    Step,
};
pub use playbook::{Participant, Playbook, PlaybookStep, Trigger, Variable};
pub use status::{
    ApprovalDecision, ApprovalRiskLevel, CheckpointPhase, EventType, InputKind, QuestionType,
    RunStatus, StepStatus,
};
