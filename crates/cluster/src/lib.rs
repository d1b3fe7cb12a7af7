// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Create/read/delete Job workloads for step execution, and poll Job status.
//!
//! [`ClusterAdapter`] is the seam `pb-controller` and `pb-resume` talk
//! through — neither ever constructs a `kube::Api` directly. Two
//! implementations exist: [`KubeClusterAdapter`] (real `kube`/`k8s-openapi`)
//! and [`FakeClusterAdapter`] (in-memory, for controller/resume tests).
//!
//! Job spec construction ([`pod::build_job_spec`]) is a pure function kept
//! separate from the `kube::Api` call that submits it, so spec shape can be
//! tested without a cluster.

pub mod fake;
pub mod kube_adapter;
pub mod pod;

pub use fake::FakeClusterAdapter;
pub use kube_adapter::KubeClusterAdapter;

use async_trait::async_trait;
use pb_core::{OrgId, RunId, StepId};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("cannot resolve short image name '{0}': AGENT_IMAGE_REGISTRY is not set")]
    UnresolvedImage(String),

    #[error("job '{0}' not found")]
    JobNotFound(String),

    #[error("cluster API error: {0}")]
    Api(String),

    #[error("job '{job}' timed out after {timeout_seconds}s")]
    Timeout { job: String, timeout_seconds: u64 },
}

/// Parameters for launching one step's worker Job.
#[derive(Debug, Clone)]
pub struct CreateJobParams {
    pub org: OrgId,
    pub run: RunId,
    pub step: StepId,
    pub image: String,
    pub namespace: String,
    pub timeout_seconds: u64,
    pub service_account: String,
    pub env: Vec<(String, String)>,
}

/// Terminal outcome reported by [`ClusterAdapter::wait_for_job`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutcome {
    pub succeeded: bool,
    pub message: String,
}

/// Create/read/delete Job workloads with a specified image, env, resources,
/// timeout; poll Job status.
#[async_trait]
pub trait ClusterAdapter: Send + Sync {
    /// Create a Job for one step. `backoffLimit = 0`, `restartPolicy =
    /// Never`, `activeDeadlineSeconds = params.timeout_seconds`, a small
    /// positive `ttlSecondsAfterFinished`, and an ephemeral `/shared`
    /// scratch volume are non-negotiable. Returns the Job name.
    async fn create_step_job(&self, params: CreateJobParams) -> Result<String, ClusterError>;

    /// Create a resume Job under the idempotency-keyed name
    /// `step-{run}-{step}-resume-{n}` rather than the original
    /// launch name, so a duplicate input write can't launch the same resume
    /// Job twice. Used only by `pb-resume`.
    async fn create_resume_job(
        &self,
        params: CreateJobParams,
        resume_seq: u64,
    ) -> Result<String, ClusterError>;

    /// Poll until the Job reports at least one success or failure, or
    /// `timeout_seconds` elapses. `on_poll` runs once per poll iteration
    /// before the sleep — the controller's own loop does not call this to
    /// decide step completion (it reads step status from the document
    /// store); this is a lower-level Job-health primitive.
    async fn wait_for_job(
        &self,
        job_name: &str,
        namespace: &str,
        timeout_seconds: u64,
        poll_interval: Duration,
        on_poll: Option<Box<dyn FnMut() + Send>>,
    ) -> Result<JobOutcome, ClusterError>;

    /// Best-effort; tolerates the Job already being gone.
    async fn delete_job(&self, name: &str, namespace: &str) -> Result<(), ClusterError>;

    /// Best-effort; tolerates the ConfigMap already being gone.
    async fn delete_config_map(&self, name: &str, namespace: &str) -> Result<(), ClusterError>;
}

/// Resolve a step's `agentImage` to a full container image reference.
///
/// Verbatim if it already contains `/`; otherwise
/// `{registry}/step-{agent_image}:latest`. Errors if no registry is
/// configured for a short name.
pub fn resolve_image(agent_image: &str, registry: Option<&str>) -> Result<String, ClusterError> {
    if agent_image.contains('/') {
        return Ok(agent_image.to_string());
    }
    let registry = registry.filter(|r| !r.is_empty()).ok_or_else(|| {
        ClusterError::UnresolvedImage(agent_image.to_string())
    })?;
    Ok(format!("{registry}/step-{agent_image}:latest"))
}

/// Sanitize a document-store ID into an RFC 1123-safe Kubernetes resource
/// name component (lowercase; `kube`/K8s itself enforces the rest).
pub fn k8s_name(name: &str) -> String {
    name.to_lowercase()
}

/// Job name for an original (non-resume) step launch: `step-{run}-{step}`,
/// truncated to 63 characters per Kubernetes object name limits.
pub fn job_name(run: &RunId, step: &StepId) -> String {
    truncate63(&format!("step-{}-{}", k8s_name(run.as_str()), k8s_name(step.as_str())))
}

/// Idempotency-keyed job name for a resume launch:
/// `step-{run}-{step}-resume-{n}`, so a duplicate input write can't launch
/// the same resume Job twice.
pub fn resume_job_name(run: &RunId, step: &StepId, resume_seq: u64) -> String {
    truncate63(&format!(
        "step-{}-{}-resume-{}",
        k8s_name(run.as_str()),
        k8s_name(step.as_str()),
        resume_seq
    ))
}

fn truncate63(name: &str) -> String {
    if name.len() <= 63 {
        name.to_string()
    } else {
        name[..63].to_string()
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
