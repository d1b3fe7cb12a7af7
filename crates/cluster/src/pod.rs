// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pure Job spec construction, kept separate from the `kube::Api` call that
//! submits it, so the resulting shape can be unit-tested without a cluster.

use crate::CreateJobParams;
use k8s_openapi::api::batch::v1::{Job, JobSpec};
use k8s_openapi::api::core::v1::{
    Container, EmptyDirVolumeSource, EnvVar, PodSpec, PodTemplateSpec, ResourceRequirements,
    Volume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::BTreeMap;

/// How long a finished Job (succeeded or failed) lingers before the
/// orchestrator reaps it automatically.
pub const TTL_SECONDS_AFTER_FINISHED: i32 = 300;

const SCRATCH_VOLUME: &str = "scratch";
const SCRATCH_MOUNT_PATH: &str = "/shared";

/// Build a Job spec for one step's worker. Non-negotiable:
/// `backoffLimit = 0` (the controller owns retry policy — currently none),
/// `activeDeadlineSeconds = params.timeout_seconds`, a small positive
/// `ttlSecondsAfterFinished`, `restartPolicy = Never`, and an ephemeral
/// `/shared` scratch volume.
pub fn build_job_spec(name: &str, params: &CreateJobParams) -> Job {
    let mut env = vec![
        env_var("RUN_ID", params.run.as_str()),
        env_var("ORG_ID", params.org.as_str()),
        env_var("STEP_ID", params.step.as_str()),
        env_var("NAMESPACE", &params.namespace),
    ];
    for (k, v) in &params.env {
        env.push(env_var(k, v));
    }

    let mut labels = BTreeMap::new();
    labels.insert("app".to_string(), "playbook".to_string());
    labels.insert("run-id".to_string(), crate::k8s_name(params.run.as_str()));
    labels.insert("step-id".to_string(), crate::k8s_name(params.step.as_str()));
    labels.insert("component".to_string(), "step-worker".to_string());

    let container = Container {
        name: "step-worker".to_string(),
        image: Some(params.image.clone()),
        env: Some(env),
        resources: Some(ResourceRequirements {
            requests: Some(BTreeMap::from([
                ("cpu".to_string(), Quantity("250m".to_string())),
                ("memory".to_string(), Quantity("512Mi".to_string())),
            ])),
            limits: Some(BTreeMap::from([
                ("cpu".to_string(), Quantity("1".to_string())),
                ("memory".to_string(), Quantity("1Gi".to_string())),
            ])),
            ..Default::default()
        }),
        volume_mounts: Some(vec![VolumeMount {
            name: SCRATCH_VOLUME.to_string(),
            mount_path: SCRATCH_MOUNT_PATH.to_string(),
            ..Default::default()
        }]),
        ..Default::default()
    };

    let pod_spec = PodSpec {
        service_account_name: Some(params.service_account.clone()),
        restart_policy: Some("Never".to_string()),
        containers: vec![container],
        volumes: Some(vec![Volume {
            name: SCRATCH_VOLUME.to_string(),
            empty_dir: Some(EmptyDirVolumeSource::default()),
            ..Default::default()
        }]),
        ..Default::default()
    };

    Job {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(params.namespace.clone()),
            labels: Some(labels.clone()),
            ..Default::default()
        },
        spec: Some(JobSpec {
            backoff_limit: Some(0),
            active_deadline_seconds: Some(params.timeout_seconds as i64),
            ttl_seconds_after_finished: Some(TTL_SECONDS_AFTER_FINISHED),
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta { labels: Some(labels), ..Default::default() }),
                spec: Some(pod_spec),
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn env_var(name: &str, value: &str) -> EnvVar {
    EnvVar { name: name.to_string(), value: Some(value.to_string()), ..Default::default() }
}

#[cfg(test)]
#[path = "pod_tests.rs"]
mod tests;
