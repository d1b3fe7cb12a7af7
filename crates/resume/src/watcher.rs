// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The watcher loop itself: poll for new inputs, match each one
//! against its paused step's checkpoint, launch a resume Job or abort.

use crate::ResumeError;
use pb_cluster::{ClusterAdapter, CreateJobParams};
use pb_core::{InputId, InputKind, OrgId, RunId, StepId, StepStatus};
use pb_store::{RunStatusUpdate, StoreAdapter};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Outcome of matching one new input document against its step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResumeAction {
    /// A resume Job was launched for this step.
    Launched { step: StepId, job_name: String },
    /// `run.status` was set to `aborted`; no Job was launched.
    Aborted { step: StepId },
    /// The input didn't result in a launch.
    Skipped { step: StepId, reason: SkipReason },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The step was not `paused` when the input arrived — stale or
    /// duplicate write.
    StepNotPaused,
    /// The step has no checkpoint recorded; nothing to resume.
    MissingCheckpoint,
    /// The input's `questionId`/`approvalId` doesn't match the checkpoint's.
    CorrelationMismatch,
}

/// Tuning read from [`crate::ResumeConfig`], kept separate from the
/// identifiers so a [`ResumeWatcher`] can be constructed directly in tests.
#[derive(Debug, Clone)]
pub struct ResumeOptions {
    pub namespace: String,
    pub service_account: String,
    pub agent_image_registry: Option<String>,
}

impl From<&crate::ResumeConfig> for ResumeOptions {
    fn from(config: &crate::ResumeConfig) -> Self {
        Self {
            namespace: config.namespace.clone(),
            service_account: config.service_account.clone(),
            agent_image_registry: config.agent_image_registry.clone(),
        }
    }
}

/// Watches one run's `inputs` subcollection and reacts to writes meant for
/// a currently-paused step. Holds the cursor (`since`) and the per-step
/// resume sequence counter used to build the idempotency-keyed Job name —
/// both live only as long as this process does, fitting a separately
/// deployed, stateless-between-restarts watcher (a restart simply replays
/// already-processed inputs as `StepNotPaused` skips, since the resumed
/// step is no longer paused).
pub struct ResumeWatcher {
    store: Arc<dyn StoreAdapter>,
    cluster: Arc<dyn ClusterAdapter>,
    org: OrgId,
    run: RunId,
    options: ResumeOptions,
    since: Option<InputId>,
    resume_seq: HashMap<StepId, u64>,
}

impl ResumeWatcher {
    pub fn new(
        store: Arc<dyn StoreAdapter>,
        cluster: Arc<dyn ClusterAdapter>,
        org: OrgId,
        run: RunId,
        options: ResumeOptions,
    ) -> Self {
        Self { store, cluster, org, run, options, since: None, resume_seq: HashMap::new() }
    }

    /// Drive the watcher until the run reaches a terminal status, sleeping
    /// `poll_interval` between polls.
    pub async fn run_until_terminal(&mut self, poll_interval: Duration) -> Result<(), ResumeError> {
        loop {
            let run = self.store.read_run(&self.org, &self.run).await?;
            if run.status.is_terminal() {
                return Ok(());
            }
            for action in self.poll_once().await? {
                log_action(&action);
            }
            tokio::time::sleep(poll_interval).await;
        }
    }

    /// One poll cycle: fetch inputs written since the last call, react to
    /// each in write order, and return what happened.
    pub async fn poll_once(&mut self) -> Result<Vec<ResumeAction>, ResumeError> {
        let inputs = self.store.poll_new_inputs(&self.org, &self.run, self.since.clone()).await?;
        let mut actions = Vec::with_capacity(inputs.len());

        for (input_id, input) in inputs {
            self.since = Some(input_id);

            let step = self.store.read_step(&self.org, &self.run, &input.step_id).await?;
            if step.status != StepStatus::Paused {
                actions.push(ResumeAction::Skipped {
                    step: input.step_id.clone(),
                    reason: SkipReason::StepNotPaused,
                });
                continue;
            }

            if input.kind == InputKind::Abort {
                self.store
                    .update_run_status(&self.org, &self.run, pb_core::RunStatus::Aborted, RunStatusUpdate::default())
                    .await?;
                actions.push(ResumeAction::Aborted { step: input.step_id.clone() });
                continue;
            }

            let checkpoint = match &step.checkpoint {
                Some(checkpoint) => checkpoint,
                None => {
                    actions.push(ResumeAction::Skipped {
                        step: input.step_id.clone(),
                        reason: SkipReason::MissingCheckpoint,
                    });
                    continue;
                }
            };
            if input.correlation_id() != Some(checkpoint.question_id.as_str()) {
                actions.push(ResumeAction::Skipped {
                    step: input.step_id.clone(),
                    reason: SkipReason::CorrelationMismatch,
                });
                continue;
            }

            let resume_seq = {
                let counter = self.resume_seq.entry(input.step_id.clone()).or_insert(0);
                *counter += 1;
                *counter
            };

            let image =
                pb_cluster::resolve_image(&step.agent_image, self.options.agent_image_registry.as_deref())?;
            let thread_id = uuid::Uuid::new_v4().to_string();
            let env = vec![
                ("RUN_ID".to_string(), self.run.as_str().to_string()),
                ("ORG_ID".to_string(), self.org.as_str().to_string()),
                ("STEP_ID".to_string(), step.id.as_str().to_string()),
                ("NAMESPACE".to_string(), self.options.namespace.clone()),
                ("RESUME_THREAD_ID".to_string(), thread_id),
            ];
            let params = CreateJobParams {
                org: self.org.clone(),
                run: self.run.clone(),
                step: step.id.clone(),
                image,
                namespace: self.options.namespace.clone(),
                timeout_seconds: u64::from(step.timeout_minutes) * 60,
                service_account: self.options.service_account.clone(),
                env,
            };
            let job_name = self.cluster.create_resume_job(params, resume_seq).await?;
            actions.push(ResumeAction::Launched { step: input.step_id.clone(), job_name });
        }

        Ok(actions)
    }
}

fn log_action(action: &ResumeAction) {
    match action {
        ResumeAction::Launched { step, job_name } => {
            tracing::info!(step = %step, job = %job_name, "launched resume Job");
        }
        ResumeAction::Aborted { step } => {
            tracing::info!(step = %step, "run aborted via input write");
        }
        ResumeAction::Skipped { step, reason } => {
            tracing::debug!(step = %step, ?reason, "skipped input");
        }
    }
}

#[cfg(test)]
#[path = "watcher_tests.rs"]
mod tests;
