// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process [`StoreAdapter`] backed by a [`parking_lot::Mutex`], driven by
//! an injected [`Clock`] so tests control every timestamp deterministically.
//!
//! Mirrors the document shapes of the production store closely enough that
//! scheduling logic exercised against this adapter behaves the same way it
//! would against the real one — including set-once terminal-status
//! enforcement, which lives here rather than in the caller.

use crate::{RunStatusUpdate, StepStatusUpdate, StoreAdapter, StoreError};
use async_trait::async_trait;
use pb_core::{
    Checkpoint, Clock, EventId, EventRecord, EventType, FileId, FileRecord, InputId, InputRecord,
    OrgId, PlaybookStep, Run, RunId, RunStatus, Step, StepId, StepStatus, SystemClock,
};
use parking_lot::Mutex;
use std::collections::HashMap;

type RunKey = (OrgId, RunId);
type StepKey = (OrgId, RunId, StepId);

#[derive(Default)]
struct Inner {
    runs: HashMap<RunKey, Run>,
    steps: HashMap<StepKey, Step>,
    step_order: HashMap<RunKey, Vec<StepId>>,
    events: HashMap<RunKey, Vec<EventRecord>>,
    next_event_seq: u64,
    inputs: HashMap<RunKey, Vec<(InputId, InputRecord)>>,
    next_input_seq: u64,
    files: HashMap<RunKey, Vec<FileRecord>>,
}

/// An in-memory [`StoreAdapter`], generic over the [`Clock`] it uses for
/// server-assigned timestamps. Defaults to [`SystemClock`]; test callers pass
/// a [`pb_core::FakeClock`] instead.
pub struct InMemoryStoreAdapter<C: Clock = SystemClock> {
    clock: C,
    inner: Mutex<Inner>,
}

impl InMemoryStoreAdapter<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for InMemoryStoreAdapter<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> InMemoryStoreAdapter<C> {
    pub fn with_clock(clock: C) -> Self {
        Self { clock, inner: Mutex::new(Inner::default()) }
    }

    fn now(&self) -> chrono::DateTime<chrono::Utc> {
        chrono::DateTime::from_timestamp_millis(self.clock.epoch_ms() as i64)
            .unwrap_or_else(chrono::Utc::now)
    }

    /// Seed a run document directly — used by integration tests that need a
    /// run to exist before exercising the scheduling loop against it.
    pub fn seed_run(&self, run: Run) {
        let key = (run.org_id.clone(), run.id.clone());
        self.inner.lock().runs.insert(key, run);
    }
}

#[async_trait]
impl<C: Clock> StoreAdapter for InMemoryStoreAdapter<C> {
    async fn read_run(&self, org: &OrgId, run: &RunId) -> Result<Run, StoreError> {
        let key = (org.clone(), run.clone());
        self.inner.lock().runs.get(&key).cloned().ok_or_else(|| StoreError::RunNotFound(run.clone()))
    }

    async fn update_run_status(
        &self,
        org: &OrgId,
        run: &RunId,
        status: RunStatus,
        update: RunStatusUpdate,
    ) -> Result<(), StoreError> {
        let key = (org.clone(), run.clone());
        let now = self.now();
        let mut inner = self.inner.lock();
        let doc = inner.runs.get_mut(&key).ok_or_else(|| StoreError::RunNotFound(run.clone()))?;

        if doc.status.is_terminal() && status != doc.status {
            return Err(StoreError::TerminalRunImmutable { run: run.clone(), current: doc.status });
        }

        doc.status = status;
        if let Some(error) = update.error {
            doc.error = Some(error);
        }
        if let Some(summary) = update.summary {
            doc.summary = Some(summary);
        }
        if let Some(step_id) = update.current_step_id {
            doc.current_step_id = Some(step_id);
        }
        doc.updated_at = Some(now);
        if status.is_terminal() {
            doc.completed_at = Some(now);
        }
        Ok(())
    }

    async fn heartbeat_run(&self, org: &OrgId, run: &RunId) -> Result<(), StoreError> {
        let key = (org.clone(), run.clone());
        let now = self.now();
        let mut inner = self.inner.lock();
        let doc = inner.runs.get_mut(&key).ok_or_else(|| StoreError::RunNotFound(run.clone()))?;
        doc.last_heartbeat = Some(now);
        Ok(())
    }

    async fn initialize_steps(
        &self,
        org: &OrgId,
        run: &RunId,
        steps: &[PlaybookStep],
    ) -> Result<(), StoreError> {
        let run_key = (org.clone(), run.clone());
        let now = self.now();
        let mut inner = self.inner.lock();
        let mut order = Vec::with_capacity(steps.len());
        for playbook_step in steps {
            let doc = Step {
                id: playbook_step.id.clone(),
                status: StepStatus::Pending,
                title: playbook_step.title.clone(),
                order: playbook_step.order,
                agent_image: playbook_step.agent_image.clone(),
                timeout_minutes: playbook_step.timeout_minutes,
                dependencies: playbook_step.dependencies.clone(),
                job_name: None,
                result_summary: None,
                error: None,
                checkpoint: None,
                created_at: Some(now),
                started_at: None,
                paused_at: None,
                completed_at: None,
            };
            order.push(playbook_step.id.clone());
            inner.steps.insert((org.clone(), run.clone(), playbook_step.id.clone()), doc);
        }
        inner.step_order.insert(run_key, order);
        Ok(())
    }

    async fn update_step_status(
        &self,
        org: &OrgId,
        run: &RunId,
        step: &StepId,
        status: StepStatus,
        update: StepStatusUpdate,
    ) -> Result<(), StoreError> {
        let key = (org.clone(), run.clone(), step.clone());
        let now = self.now();
        let mut inner = self.inner.lock();
        let doc = inner.steps.get_mut(&key).ok_or_else(|| StoreError::StepNotFound(step.clone()))?;

        if doc.status.is_terminal() {
            return Err(StoreError::TerminalStatusImmutable {
                step: step.clone(),
                current: doc.status,
            });
        }

        doc.status = status;
        if let Some(error) = update.error {
            doc.error = Some(error);
        }
        if let Some(summary) = update.result_summary {
            doc.result_summary = Some(summary);
        }
        if let Some(job_name) = update.job_name {
            doc.job_name = Some(job_name);
        }
        match status {
            StepStatus::Running if doc.started_at.is_none() => doc.started_at = Some(now),
            StepStatus::Paused => doc.paused_at = Some(now),
            _ if status.is_terminal() => doc.completed_at = Some(now),
            _ => {}
        }
        Ok(())
    }

    async fn read_step_status(
        &self,
        org: &OrgId,
        run: &RunId,
        step: &StepId,
    ) -> Result<StepStatus, StoreError> {
        self.read_step(org, run, step).await.map(|s| s.status)
    }

    async fn read_step(&self, org: &OrgId, run: &RunId, step: &StepId) -> Result<Step, StoreError> {
        let key = (org.clone(), run.clone(), step.clone());
        self.inner.lock().steps.get(&key).cloned().ok_or_else(|| StoreError::StepNotFound(step.clone()))
    }

    async fn append_event(
        &self,
        org: &OrgId,
        run: &RunId,
        kind: EventType,
        step: Option<&StepId>,
        payload: serde_json::Value,
    ) -> Result<EventId, StoreError> {
        let key = (org.clone(), run.clone());
        let now = self.now();
        let mut inner = self.inner.lock();
        let id = EventId::new(format!("event-{}", inner.next_event_seq));
        inner.next_event_seq += 1;
        let record = EventRecord {
            id: Some(id.clone()),
            kind,
            step_id: step.cloned(),
            timestamp: Some(now),
            payload,
        };
        inner.events.entry(key).or_default().push(record);
        Ok(id)
    }

    async fn list_events(&self, org: &OrgId, run: &RunId) -> Result<Vec<EventRecord>, StoreError> {
        let key = (org.clone(), run.clone());
        Ok(self.inner.lock().events.get(&key).cloned().unwrap_or_default())
    }

    async fn read_input_by_question_id(
        &self,
        org: &OrgId,
        run: &RunId,
        correlation_id: &str,
    ) -> Result<Option<InputRecord>, StoreError> {
        let key = (org.clone(), run.clone());
        let inner = self.inner.lock();
        Ok(inner
            .inputs
            .get(&key)
            .and_then(|list| {
                list.iter().find(|(_, input)| input.correlation_id() == Some(correlation_id))
            })
            .map(|(_, input)| input.clone()))
    }

    async fn poll_new_inputs(
        &self,
        org: &OrgId,
        run: &RunId,
        since: Option<InputId>,
    ) -> Result<Vec<(InputId, InputRecord)>, StoreError> {
        let key = (org.clone(), run.clone());
        let inner = self.inner.lock();
        let Some(list) = inner.inputs.get(&key) else {
            return Ok(Vec::new());
        };
        match since {
            None => Ok(list.clone()),
            Some(cursor) => {
                let start = list.iter().position(|(id, _)| *id == cursor).map(|idx| idx + 1).unwrap_or(0);
                Ok(list[start..].to_vec())
            }
        }
    }

    async fn read_context(
        &self,
        org: &OrgId,
        run: &RunId,
    ) -> Result<HashMap<String, serde_json::Value>, StoreError> {
        self.read_run(org, run).await.map(|r| r.context)
    }

    async fn read_all_step_results(
        &self,
        org: &OrgId,
        run: &RunId,
    ) -> Result<HashMap<StepId, String>, StoreError> {
        let inner = self.inner.lock();
        let order = inner.step_order.get(&(org.clone(), run.clone())).cloned().unwrap_or_default();
        Ok(order
            .into_iter()
            .filter_map(|step_id| {
                let doc = inner.steps.get(&(org.clone(), run.clone(), step_id.clone()))?;
                doc.result_summary.clone().map(|summary| (step_id, summary))
            })
            .collect())
    }

    async fn read_all_files(&self, org: &OrgId, run: &RunId) -> Result<Vec<FileRecord>, StoreError> {
        let key = (org.clone(), run.clone());
        Ok(self.inner.lock().files.get(&key).cloned().unwrap_or_default())
    }

    async fn save_checkpoint(
        &self,
        org: &OrgId,
        run: &RunId,
        step: &StepId,
        checkpoint: Checkpoint,
    ) -> Result<(), StoreError> {
        let key = (org.clone(), run.clone(), step.clone());
        let mut inner = self.inner.lock();
        let doc = inner.steps.get_mut(&key).ok_or_else(|| StoreError::StepNotFound(step.clone()))?;
        doc.checkpoint = Some(checkpoint);
        Ok(())
    }

    async fn load_checkpoint(
        &self,
        org: &OrgId,
        run: &RunId,
        step: &StepId,
    ) -> Result<Option<Checkpoint>, StoreError> {
        self.read_step(org, run, step).await.map(|s| s.checkpoint)
    }

    async fn clear_checkpoint(
        &self,
        org: &OrgId,
        run: &RunId,
        step: &StepId,
    ) -> Result<(), StoreError> {
        let key = (org.clone(), run.clone(), step.clone());
        let mut inner = self.inner.lock();
        let doc = inner.steps.get_mut(&key).ok_or_else(|| StoreError::StepNotFound(step.clone()))?;
        doc.checkpoint = None;
        Ok(())
    }

    async fn read_oauth_token(&self, _org: &OrgId, _provider: &str) -> Result<String, StoreError> {
        Err(StoreError::NotImplemented("oauth token secrets are out of scope for this store"))
    }

    async fn read_ai_config(&self, _org: &OrgId) -> Result<serde_json::Value, StoreError> {
        Err(StoreError::NotImplemented("AI provider config secrets are out of scope for this store"))
    }
}

// File records are appended by whatever uploads the artifact (the worker's
// file-upload side-channel, out of scope here) — exposed so tests can seed
// them the way `initialize_steps` seeds steps.
impl<C: Clock> InMemoryStoreAdapter<C> {
    pub fn seed_file(&self, org: &OrgId, run: &RunId, file: FileRecord) -> FileId {
        let key = (org.clone(), run.clone());
        let mut inner = self.inner.lock();
        let id = file.id.clone().unwrap_or_else(|| FileId::new(format!("file-{}", inner.files.len())));
        let mut file = file;
        file.id = Some(id.clone());
        inner.files.entry(key).or_default().push(file);
        id
    }

    pub fn seed_input(&self, org: &OrgId, run: &RunId, input: InputRecord) -> InputId {
        let key = (org.clone(), run.clone());
        let mut inner = self.inner.lock();
        let id = InputId::new(format!("input-{}", inner.next_input_seq));
        inner.next_input_seq += 1;
        let mut input = input;
        input.id = Some(id.clone());
        inner.inputs.entry(key).or_default().push((id.clone(), input));
        id
    }
}

#[cfg(test)]
#[path = "in_memory_tests.rs"]
mod tests;
