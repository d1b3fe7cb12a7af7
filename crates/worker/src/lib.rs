// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Step lifecycle protocol shared by every worker container.
//!
//! A worker reads its env into a [`env::WorkerConfig`], then hands a
//! [`lifecycle::StepHandler`] implementation to [`lifecycle::run_step`],
//! which performs the fresh-vs-resume phase dispatch and the terminal
//! `std::process::exit` call. The HITL primitives on [`context::WorkerContext`]
//! never call `process::exit` themselves — they return an [`Outcome`], the
//! same `Vec<Effect>`-returning discipline used to keep side effects out of
//! deep call stacks. Only `run_step`, at the very top, performs the exit.

pub mod context;
pub mod env;
pub mod lifecycle;

pub use context::WorkerContext;
pub use env::{ConfigError, WorkerConfig};
pub use lifecycle::{dispatch, run_step, StepHandler};

use pb_core::{CheckpointPhase, ErrorInfo};
use pb_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("resumed with RESUME_THREAD_ID set but no checkpoint was found for this step")]
    MissingCheckpoint,

    #[error("resume triggered but no input matches questionId/approvalId '{0}'")]
    MissingInput(String),

    #[error("unrecognized checkpoint phase '{0}'")]
    UnknownPhase(String),

    #[error("{0}")]
    Other(String),
}

/// The HITL correlation value returned by `ask_user`/`request_approval`
/// instead of calling `process::exit` — an explicit terminal
/// `PauseRequested` value" re-architecture guidance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PauseRequested {
    pub phase: CheckpointPhase,
    pub question_id: String,
}

/// What a phase function (`fresh`/`resume`) produced. `run_step` matches on
/// this and performs the actual process exit — the only place in the
/// library that does.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// Step finished normally; `result_summary` has already been written.
    Completed { result_summary: String },
    /// Step failed; the error has already been written to the step
    /// document. `run_step` exits nonzero.
    Failed { error: ErrorInfo },
    /// Step checkpointed and should exit 0 without having reached a
    /// terminal status — a future worker resumes it.
    Paused(PauseRequested),
    /// The run was aborted while this step was paused, or the input that
    /// triggered this resume was itself an abort. The step has been marked
    /// `skipped` and its checkpoint cleared; `run_step` exits 0, same as
    /// `Completed`/`Paused`. Not one of the three outcomes named in spec
    /// this module's redesign note, but the resume-phase abort path
    /// describes is a distinct terminal case from an ordinary HITL pause,
    /// so it gets its own variant rather than overloading `Completed`.
    Aborted,
}
