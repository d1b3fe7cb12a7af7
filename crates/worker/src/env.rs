// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for worker binaries — every var
//! is read once, at startup, into a typed config struct instead of
//! scattered `std::env::var` calls through the binary.

use pb_core::{OrgId, RunId, StepId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingVar(&'static str),
}

/// Env surface read by every step worker: `RUN_ID`, `ORG_ID`,
/// `STEP_ID`, `NAMESPACE`, optional `RESUME_THREAD_ID`.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub run_id: RunId,
    pub org_id: OrgId,
    pub step_id: StepId,
    pub namespace: String,
    pub resume_thread_id: Option<String>,
}

impl WorkerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            run_id: RunId::new(required("RUN_ID")?),
            org_id: OrgId::new(required("ORG_ID")?),
            step_id: StepId::new(required("STEP_ID")?),
            namespace: std::env::var("NAMESPACE").unwrap_or_else(|_| "playbooks".to_string()),
            resume_thread_id: std::env::var("RESUME_THREAD_ID").ok().filter(|s| !s.is_empty()),
        })
    }

    pub fn is_resume(&self) -> bool {
        self.resume_thread_id.is_some()
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingVar(name))
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
