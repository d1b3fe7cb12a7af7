// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The scheduling loop itself: init, launch, poll, complete,
//! cascade failures, finalize.

use crate::{ControllerConfig, ControllerError};
use pb_cluster::{ClusterAdapter, CreateJobParams};
use pb_core::{
    error_codes, ErrorInfo, EventType, OrgId, Playbook, PlaybookStep, RunId, RunStatus, StepId,
    StepStatus,
};
use pb_store::{RunStatusUpdate, StepStatusUpdate, StoreAdapter};
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Terminal shape of one run, handed back to whatever launched the
/// controller binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    /// Carries the sorted set of step IDs that reached `failed` — the run
    /// is ultimately reported failed with the first failed step's id as
    /// the cause.
    Failed { failed: Vec<StepId> },
    /// The run was aborted by an external write to `run.status`. Not a
    /// failure — a clean shutdown.
    Aborted,
}

/// Per-run tuning read from [`ControllerConfig`], kept separate from the
/// identifiers so a [`Scheduler`] can be constructed directly in tests
/// without going through environment variables.
#[derive(Debug, Clone)]
pub struct SchedulerOptions {
    pub namespace: String,
    pub service_account: String,
    pub agent_image_registry: Option<String>,
    pub poll_interval: Duration,
    pub heartbeat_interval: Duration,
}

impl From<&ControllerConfig> for SchedulerOptions {
    fn from(config: &ControllerConfig) -> Self {
        Self {
            namespace: config.namespace.clone(),
            service_account: config.service_account.clone(),
            agent_image_registry: config.agent_image_registry.clone(),
            poll_interval: config.poll_interval,
            heartbeat_interval: config.heartbeat_interval,
        }
    }
}

/// Drives exactly one playbook run from `pending` to a terminal run status.
/// One `Scheduler` is constructed per run; `run()` consumes it to
/// completion, failure, or abort. No mutable state outlives the call — the
/// scheduling sets (`completed`, `failed`, `skipped`, `running`) live on the
/// stack of [`Scheduler::drive`] — one process, one loop, no internal
/// multithreading.
pub struct Scheduler {
    store: Arc<dyn StoreAdapter>,
    cluster: Arc<dyn ClusterAdapter>,
    playbook: Playbook,
    org: OrgId,
    run: RunId,
    options: SchedulerOptions,
}

impl Scheduler {
    pub fn new(
        store: Arc<dyn StoreAdapter>,
        cluster: Arc<dyn ClusterAdapter>,
        playbook: Playbook,
        org: OrgId,
        run: RunId,
        options: SchedulerOptions,
    ) -> Self {
        Self { store, cluster, playbook, org, run, options }
    }

    /// Validate the DAG, initialize step documents, then drive the
    /// scheduling loop to a terminal [`RunOutcome`].
    pub async fn run(&self) -> Result<RunOutcome, ControllerError> {
        if let Err(err) = pb_dag::validate(&self.playbook.steps) {
            self.fail_playbook(&err).await;
            return Err(ControllerError::Dag(err));
        }

        self.store.initialize_steps(&self.org, &self.run, &self.playbook.steps).await?;
        self.store
            .append_event(&self.org, &self.run, EventType::PlaybookStarted, None, json!({}))
            .await?;
        self.store
            .update_run_status(&self.org, &self.run, RunStatus::Running, RunStatusUpdate::default())
            .await?;

        match self.drive().await {
            Ok(RunOutcome::Completed) => {
                self.store
                    .append_event(&self.org, &self.run, EventType::PlaybookCompleted, None, json!({}))
                    .await?;
                self.store
                    .update_run_status(
                        &self.org,
                        &self.run,
                        RunStatus::Completed,
                        RunStatusUpdate { summary: Some("all steps completed".to_string()), ..Default::default() },
                    )
                    .await?;
                Ok(RunOutcome::Completed)
            }
            Ok(RunOutcome::Failed { failed }) => {
                let names: Vec<&str> = failed.iter().map(|s| s.as_str()).collect();
                self.store
                    .append_event(
                        &self.org,
                        &self.run,
                        EventType::PlaybookFailed,
                        None,
                        json!({ "failed": names }),
                    )
                    .await?;
                let cause = failed.first().map(|s| s.as_str()).unwrap_or("unknown");
                self.store
                    .update_run_status(
                        &self.org,
                        &self.run,
                        RunStatus::Failed,
                        RunStatusUpdate {
                            error: Some(ErrorInfo::new(
                                error_codes::STEP_FAILED,
                                format!("step '{cause}' failed"),
                            )),
                            summary: Some(format!("failed steps: {}", names.join(", "))),
                            ..Default::default()
                        },
                    )
                    .await?;
                Ok(RunOutcome::Failed { failed })
            }
            // `Aborted` is never returned by `drive` directly — it surfaces
            // as an error from an inner read so every `?` in the loop body
            // naturally short-circuits.
            Err(ControllerError::Aborted) => {
                let configmap = format!("playbook-{}", self.run.as_str());
                let _ = self.cluster.delete_config_map(&configmap, &self.options.namespace).await;
                Ok(RunOutcome::Aborted)
            }
            Err(err) => {
                self.store
                    .update_run_status(
                        &self.org,
                        &self.run,
                        RunStatus::Failed,
                        RunStatusUpdate {
                            error: Some(ErrorInfo::new(error_codes::AGENT_CRASH, err.to_string())),
                            ..Default::default()
                        },
                    )
                    .await
                    .ok();
                Err(err)
            }
        }
    }

    async fn fail_playbook(&self, err: &pb_dag::DagError) {
        let code = match err {
            pb_dag::DagError::Cyclic { .. } => error_codes::CYCLIC_DEPENDENCY,
            pb_dag::DagError::MissingDependency { .. } => error_codes::PLAYBOOK_INVALID,
        };
        let _ = self
            .store
            .append_event(
                &self.org,
                &self.run,
                EventType::PlaybookFailed,
                None,
                json!({ "error": err.to_string() }),
            )
            .await;
        let _ = self
            .store
            .update_run_status(
                &self.org,
                &self.run,
                RunStatus::Failed,
                RunStatusUpdate { error: Some(ErrorInfo::new(code, err.to_string())), ..Default::default() },
            )
            .await;
    }

    /// The loop itself. Never returns `Ok(RunOutcome::Aborted)` — an
    /// observed abort is surfaced as `Err(ControllerError::Aborted)` so the
    /// caller's `?`-based plumbing handles it uniformly with every other
    /// store-read failure.
    async fn drive(&self) -> Result<RunOutcome, ControllerError> {
        let mut completed: HashSet<StepId> = HashSet::new();
        let mut failed: HashSet<StepId> = HashSet::new();
        let mut skipped: HashSet<StepId> = HashSet::new();
        let mut running: HashSet<StepId> = HashSet::new();
        let mut start_times: HashMap<StepId, Instant> = HashMap::new();
        let mut paused_notified: HashSet<StepId> = HashSet::new();
        let mut last_heartbeat = Instant::now();

        loop {
            self.ensure_not_aborted().await?;

            let terminal_blocked: HashSet<StepId> = failed.union(&skipped).cloned().collect();
            let ready = pb_dag::ready_steps(&self.playbook.steps, &completed, &terminal_blocked, &running);

            if !ready.is_empty() {
                if ready.len() > 1 {
                    let names: Vec<&str> = ready.iter().map(|s| s.id.as_str()).collect();
                    self.emit_progress(format!(
                        "launching {} steps in parallel: {}",
                        ready.len(),
                        names.join(", ")
                    ))
                    .await?;
                }
                let total = self.playbook.steps.len();
                for step in &ready {
                    self.emit_progress(format!(
                        "Preparing step {}/{}: {}",
                        step.order, total, step.title
                    ))
                    .await?;
                    self.store
                        .update_run_status(
                            &self.org,
                            &self.run,
                            RunStatus::Running,
                            RunStatusUpdate { current_step_id: Some(step.id.clone()), ..Default::default() },
                        )
                        .await?;
                    self.launch(step).await?;
                    running.insert(step.id.clone());
                    start_times.insert(step.id.clone(), Instant::now());
                }
            }

            if running.is_empty() {
                let all_ids: HashSet<StepId> = self.playbook.steps.iter().map(|s| s.id.clone()).collect();
                let mut remaining: Vec<&StepId> = all_ids
                    .iter()
                    .filter(|id| !completed.contains(*id) && !failed.contains(*id) && !skipped.contains(*id))
                    .collect();
                remaining.sort();
                for id in remaining {
                    if !pb_dag::is_blocked(id, &self.playbook.steps, &terminal_blocked) {
                        tracing::warn!(
                            step = %id,
                            "sweeping step as skipped at finalization but it is not blocked by a failed dependency"
                        );
                    }
                    self.mark_skipped(id).await?;
                    skipped.insert(id.clone());
                }
                break;
            }

            let mut running_now: Vec<StepId> = running.iter().cloned().collect();
            running_now.sort();
            for step_id in running_now {
                let step_def = self.step_def(&step_id)?;
                let elapsed = Instant::now().saturating_duration_since(start_times[&step_id]);
                let timeout = Duration::from_secs(u64::from(step_def.timeout_minutes) * 60);
                if elapsed > timeout {
                    self.fail_step(&step_id, error_codes::STEP_TIMEOUT, "step exceeded its configured timeout")
                        .await?;
                    running.remove(&step_id);
                    failed.insert(step_id.clone());
                    paused_notified.remove(&step_id);
                    self.cascade_skip(&step_id, &completed, &failed, &mut skipped, &running).await?;
                    continue;
                }

                let status = self.store.read_step_status(&self.org, &self.run, &step_id).await?;
                match status {
                    StepStatus::Paused => {
                        if paused_notified.insert(step_id.clone()) {
                            self.emit_progress("waiting for user input".to_string()).await?;
                        }
                    }
                    StepStatus::Running => {
                        if paused_notified.remove(&step_id) {
                            self.emit_progress("resumed after user input".to_string()).await?;
                        }
                    }
                    StepStatus::Completed => {
                        running.remove(&step_id);
                        completed.insert(step_id.clone());
                        paused_notified.remove(&step_id);
                    }
                    StepStatus::Failed => {
                        running.remove(&step_id);
                        failed.insert(step_id.clone());
                        paused_notified.remove(&step_id);
                        self.cascade_skip(&step_id, &completed, &failed, &mut skipped, &running).await?;
                    }
                    StepStatus::Skipped => {
                        running.remove(&step_id);
                        skipped.insert(step_id.clone());
                        paused_notified.remove(&step_id);
                    }
                    StepStatus::Pending => {}
                }
            }

            if last_heartbeat.elapsed() >= self.options.heartbeat_interval {
                self.store.heartbeat_run(&self.org, &self.run).await?;
                last_heartbeat = Instant::now();
            }

            tokio::time::sleep(self.options.poll_interval).await;
        }

        if failed.is_empty() {
            Ok(RunOutcome::Completed)
        } else {
            let mut failed_ids: Vec<StepId> = failed.into_iter().collect();
            failed_ids.sort();
            Ok(RunOutcome::Failed { failed: failed_ids })
        }
    }

    async fn ensure_not_aborted(&self) -> Result<(), ControllerError> {
        let run = self.store.read_run(&self.org, &self.run).await?;
        if run.status == RunStatus::Aborted {
            return Err(ControllerError::Aborted);
        }
        Ok(())
    }

    async fn emit_progress(&self, message: String) -> Result<(), ControllerError> {
        self.store
            .append_event(&self.org, &self.run, EventType::Progress, None, json!({ "message": message }))
            .await?;
        Ok(())
    }

    async fn mark_skipped(&self, id: &StepId) -> Result<(), ControllerError> {
        self.store
            .update_step_status(&self.org, &self.run, id, StepStatus::Skipped, StepStatusUpdate::default())
            .await?;
        Ok(())
    }

    async fn fail_step(&self, id: &StepId, code: &str, message: &str) -> Result<(), ControllerError> {
        self.store
            .append_event(&self.org, &self.run, EventType::StepFailed, Some(id), json!({ "error": message }))
            .await?;
        self.store
            .update_step_status(
                &self.org,
                &self.run,
                id,
                StepStatus::Failed,
                StepStatusUpdate { error: Some(ErrorInfo::new(code, message)), ..Default::default() },
            )
            .await?;
        Ok(())
    }

    /// Cascade-skip every transitive dependent of a freshly failed step,
    /// leaving completed/failed/skipped/running steps untouched — terminal
    /// step statuses are never overwritten, and a currently-running step is
    /// left alone even if it happens to be a dependent.
    async fn cascade_skip(
        &self,
        failed_step: &StepId,
        completed: &HashSet<StepId>,
        failed: &HashSet<StepId>,
        skipped: &mut HashSet<StepId>,
        running: &HashSet<StepId>,
    ) -> Result<(), ControllerError> {
        let dependents = pb_dag::transitive_dependents(failed_step, &self.playbook.steps);
        let mut list: Vec<&StepId> = dependents.iter().collect();
        list.sort();
        for dep in list {
            if completed.contains(dep) || failed.contains(dep) || skipped.contains(dep) || running.contains(dep) {
                continue;
            }
            self.mark_skipped(dep).await?;
            skipped.insert(dep.clone());
        }
        Ok(())
    }

    async fn launch(&self, step: &PlaybookStep) -> Result<(), ControllerError> {
        let image = pb_cluster::resolve_image(&step.agent_image, self.options.agent_image_registry.as_deref())?;
        let env = vec![
            ("RUN_ID".to_string(), self.run.as_str().to_string()),
            ("ORG_ID".to_string(), self.org.as_str().to_string()),
            ("STEP_ID".to_string(), step.id.as_str().to_string()),
            ("NAMESPACE".to_string(), self.options.namespace.clone()),
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
        let job_name = self.cluster.create_step_job(params).await?;
        self.store
            .update_step_status(
                &self.org,
                &self.run,
                &step.id,
                StepStatus::Running,
                StepStatusUpdate { job_name: Some(job_name), ..Default::default() },
            )
            .await?;
        Ok(())
    }

    fn step_def(&self, id: &StepId) -> Result<&PlaybookStep, ControllerError> {
        self.playbook.steps.iter().find(|s| &s.id == id).ok_or_else(|| ControllerError::UnknownStep(id.clone()))
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
