// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory [`ClusterAdapter`] for controller and resume-trigger tests.
//!
//! A real worker container never runs under this adapter. Scenario tests
//! configure the outcome they want a given job to report, then drive
//! `pb-controller`'s scheduler, which reads step completion from the
//! document store rather than from this adapter — [`FakeClusterAdapter`]
//! mainly exists so `create_step_job` has something to call and
//! `wait_for_job` is exercised directly in this crate's own tests.

use crate::{ClusterAdapter, ClusterError, CreateJobParams, JobOutcome};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

#[derive(Default)]
struct Inner {
    jobs: HashMap<String, CreateJobParams>,
    creation_order: Vec<String>,
    outcomes: HashMap<String, JobOutcome>,
    deleted_jobs: HashSet<String>,
    deleted_config_maps: HashSet<String>,
}

#[derive(Default)]
pub struct FakeClusterAdapter {
    inner: Mutex<Inner>,
}

impl FakeClusterAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the terminal outcome `wait_for_job` should report for a
    /// job once it's polled.
    pub fn set_outcome(&self, job_name: &str, outcome: JobOutcome) {
        self.inner.lock().outcomes.insert(job_name.to_string(), outcome);
    }

    pub fn created_jobs(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.lock().jobs.keys().cloned().collect();
        names.sort();
        names
    }

    /// Job names in the order `create_step_job` was actually called —
    /// unlike [`Self::created_jobs`] (sorted for stable assertions), this
    /// preserves launch order so scheduler tests can assert on it.
    pub fn creation_order(&self) -> Vec<String> {
        self.inner.lock().creation_order.clone()
    }

    pub fn params_for(&self, job_name: &str) -> Option<CreateJobParams> {
        self.inner.lock().jobs.get(job_name).cloned()
    }

    pub fn was_job_deleted(&self, job_name: &str) -> bool {
        self.inner.lock().deleted_jobs.contains(job_name)
    }

    pub fn was_config_map_deleted(&self, name: &str) -> bool {
        self.inner.lock().deleted_config_maps.contains(name)
    }
}

#[async_trait]
impl ClusterAdapter for FakeClusterAdapter {
    async fn create_step_job(&self, params: CreateJobParams) -> Result<String, ClusterError> {
        let name = crate::job_name(&params.run, &params.step);
        let mut inner = self.inner.lock();
        inner.jobs.insert(name.clone(), params);
        inner.creation_order.push(name.clone());
        Ok(name)
    }

    async fn create_resume_job(
        &self,
        params: CreateJobParams,
        resume_seq: u64,
    ) -> Result<String, ClusterError> {
        let name = crate::resume_job_name(&params.run, &params.step, resume_seq);
        let mut inner = self.inner.lock();
        inner.jobs.insert(name.clone(), params);
        inner.creation_order.push(name.clone());
        Ok(name)
    }

    async fn wait_for_job(
        &self,
        job_name: &str,
        _namespace: &str,
        timeout_seconds: u64,
        poll_interval: Duration,
        mut on_poll: Option<Box<dyn FnMut() + Send>>,
    ) -> Result<JobOutcome, ClusterError> {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(timeout_seconds);
        loop {
            if let Some(outcome) = self.inner.lock().outcomes.get(job_name).cloned() {
                return Ok(outcome);
            }
            if let Some(cb) = on_poll.as_mut() {
                cb();
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(ClusterError::Timeout {
                    job: job_name.to_string(),
                    timeout_seconds,
                });
            }
            tokio::time::sleep(poll_interval).await;
        }
    }

    async fn delete_job(&self, name: &str, _namespace: &str) -> Result<(), ClusterError> {
        self.inner.lock().deleted_jobs.insert(name.to_string());
        Ok(())
    }

    async fn delete_config_map(&self, name: &str, _namespace: &str) -> Result<(), ClusterError> {
        self.inner.lock().deleted_config_maps.insert(name.to_string());
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
