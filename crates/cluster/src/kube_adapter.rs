// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Real Kubernetes [`ClusterAdapter`]: the same split between pure spec
//! construction ([`crate::pod`]) and the `kube::Api` calls that submit it.

use crate::{pod, ClusterAdapter, ClusterError, CreateJobParams, JobOutcome};
use async_trait::async_trait;
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::ConfigMap;
use kube::api::{Api, DeleteParams, PostParams};
use kube::Client;
use std::time::Duration;

#[derive(Clone)]
pub struct KubeClusterAdapter {
    client: Client,
}

impl KubeClusterAdapter {
    pub async fn new() -> Result<Self, ClusterError> {
        let client =
            Client::try_default().await.map_err(|e| ClusterError::Api(e.to_string()))?;
        Ok(Self { client })
    }

    fn is_not_found(err: &kube::Error) -> bool {
        matches!(err, kube::Error::Api(resp) if resp.code == 404)
    }
}

#[async_trait]
impl ClusterAdapter for KubeClusterAdapter {
    async fn create_step_job(&self, params: CreateJobParams) -> Result<String, ClusterError> {
        let name = crate::job_name(&params.run, &params.step);
        let job_spec = pod::build_job_spec(&name, &params);

        let jobs: Api<Job> = Api::namespaced(self.client.clone(), &params.namespace);
        tracing::info!(run = %params.run, step = %params.step, job = %name, "creating step Job");
        jobs.create(&PostParams::default(), &job_spec)
            .await
            .map_err(|e| ClusterError::Api(e.to_string()))?;
        Ok(name)
    }

    async fn create_resume_job(
        &self,
        params: CreateJobParams,
        resume_seq: u64,
    ) -> Result<String, ClusterError> {
        let name = crate::resume_job_name(&params.run, &params.step, resume_seq);
        let job_spec = pod::build_job_spec(&name, &params);

        let jobs: Api<Job> = Api::namespaced(self.client.clone(), &params.namespace);
        tracing::info!(run = %params.run, step = %params.step, job = %name, "creating resume Job");
        match jobs.create(&PostParams::default(), &job_spec).await {
            Ok(_) => Ok(name),
            Err(kube::Error::Api(resp)) if resp.code == 409 => Ok(name),
            Err(e) => Err(ClusterError::Api(e.to_string())),
        }
    }

    async fn wait_for_job(
        &self,
        job_name: &str,
        namespace: &str,
        timeout_seconds: u64,
        poll_interval: Duration,
        mut on_poll: Option<Box<dyn FnMut() + Send>>,
    ) -> Result<JobOutcome, ClusterError> {
        let jobs: Api<Job> = Api::namespaced(self.client.clone(), namespace);
        let deadline = tokio::time::Instant::now() + Duration::from_secs(timeout_seconds);

        loop {
            let job = jobs
                .get(job_name)
                .await
                .map_err(|e| ClusterError::Api(e.to_string()))?;
            if let Some(status) = job.status {
                if status.succeeded.unwrap_or(0) >= 1 {
                    return Ok(JobOutcome {
                        succeeded: true,
                        message: "Job completed successfully".to_string(),
                    });
                }
                if status.failed.unwrap_or(0) >= 1 {
                    let reason = status
                        .conditions
                        .unwrap_or_default()
                        .into_iter()
                        .find(|c| c.type_ == "Failed")
                        .and_then(|c| c.message.or(Some(c.reason.unwrap_or_default())))
                        .unwrap_or_else(|| "Job failed".to_string());
                    return Ok(JobOutcome { succeeded: false, message: reason });
                }
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

    async fn delete_job(&self, name: &str, namespace: &str) -> Result<(), ClusterError> {
        let jobs: Api<Job> = Api::namespaced(self.client.clone(), namespace);
        let params = DeleteParams { propagation_policy: Some(kube::api::PropagationPolicy::Foreground), ..Default::default() };
        match jobs.delete(name, &params).await {
            Ok(_) => Ok(()),
            Err(e) if Self::is_not_found(&e) => Ok(()),
            Err(e) => Err(ClusterError::Api(e.to_string())),
        }
    }

    async fn delete_config_map(&self, name: &str, namespace: &str) -> Result<(), ClusterError> {
        let config_maps: Api<ConfigMap> = Api::namespaced(self.client.clone(), namespace);
        match config_maps.delete(name, &DeleteParams::default()).await {
            Ok(_) => Ok(()),
            Err(e) if Self::is_not_found(&e) => Ok(()),
            Err(e) => Err(ClusterError::Api(e.to_string())),
        }
    }
}
