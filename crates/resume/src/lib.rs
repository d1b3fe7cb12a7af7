// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Resume trigger: the external event handler that watches a run's
//! `inputs` writes for paused steps and launches the matching resume Job.
//!
//! [`ResumeWatcher`] is a polling loop over [`pb_store::StoreAdapter::poll_new_inputs`]
//! rather than a push subscription, since the store trait is
//! request/response only (see DESIGN.md for the Open Question this
//! resolves). It never runs a step's business logic itself — matching a
//! paused step's checkpoint to the new input and launching a Job is the
//! whole of its job; `pb-worker`'s own resume dispatch does the rest once
//! the new container starts.

pub mod env;
pub mod watcher;

pub use env::{ConfigError, ResumeConfig};
pub use watcher::{ResumeAction, ResumeOptions, ResumeWatcher, SkipReason};

use pb_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResumeError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Cluster(#[from] pb_cluster::ClusterError),
}
