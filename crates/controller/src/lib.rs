// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Run controller: the scheduling loop that drives a playbook run from
//! `pending` to a terminal status.
//!
//! [`Scheduler`] owns no global state — it is constructed with an injected
//! [`pb_store::StoreAdapter`] and [`pb_cluster::ClusterAdapter`], following
//! the general re-architecture principle of replacing a global singleton
//! store client with an explicitly injected adapter value"). A single call
//! to [`Scheduler::run`] drives one playbook run to completion, failure, or
//! a clean abort — there is no internal concurrency; every step launched
//! concurrently is realized by the cluster orchestrator, not by this
//! process.

pub mod env;
pub mod scheduler;

pub use env::{ConfigError, ControllerConfig};
pub use scheduler::{RunOutcome, Scheduler, SchedulerOptions};

use pb_core::StepId;
use pb_dag::DagError;
use pb_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Dag(#[from] DagError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Cluster(#[from] pb_cluster::ClusterError),

    /// Surfaced by an inner store-read helper once `run.status` is observed
    /// as `"aborted"` — modeled as a `Result`
    /// variant propagated with `?`, not a raised exception. The scheduling
    /// loop matches this specifically and performs a clean shutdown rather
    /// than treating it as a run failure.
    #[error("run was aborted")]
    Aborted,

    #[error("step '{0}' has no declared playbook entry")]
    UnknownStep(StepId),
}
