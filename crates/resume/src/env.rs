// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the `resume-trigger`
//! binary: every var is read once, at startup, into a typed config
//! struct instead of scattered `std::env::var` calls.

use pb_core::{OrgId, RunId};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingVar(&'static str),
}

/// Env surface read by the resume trigger: `RUN_ID`, `ORG_ID`,
/// `NAMESPACE`, `AGENT_IMAGE_REGISTRY`, `PLAYBOOK_SERVICE_ACCOUNT`.
#[derive(Debug, Clone)]
pub struct ResumeConfig {
    pub run_id: RunId,
    pub org_id: OrgId,
    pub namespace: String,
    pub agent_image_registry: Option<String>,
    pub service_account: String,
    pub poll_interval: Duration,
}

impl ResumeConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            run_id: RunId::new(required("RUN_ID")?),
            org_id: OrgId::new(required("ORG_ID")?),
            namespace: std::env::var("NAMESPACE").unwrap_or_else(|_| "playbooks".to_string()),
            agent_image_registry: std::env::var("AGENT_IMAGE_REGISTRY").ok().filter(|s| !s.is_empty()),
            service_account: std::env::var("PLAYBOOK_SERVICE_ACCOUNT")
                .unwrap_or_else(|_| "default".to_string()),
            poll_interval: env_duration_secs("RESUME_POLL_INTERVAL_SECS", 5),
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingVar(name))
}

fn env_duration_secs(name: &str, default_secs: u64) -> Duration {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(default_secs))
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
