// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use pb_core::{OrgId, RunId, StepId};

fn params() -> CreateJobParams {
    CreateJobParams {
        org: OrgId::new("acme"),
        run: RunId::new("run-1"),
        step: StepId::new("a"),
        image: "gcr.io/acme/step-echo:latest".to_string(),
        namespace: "playbooks".to_string(),
        timeout_seconds: 1800,
        service_account: "step-worker-sa".to_string(),
        env: vec![("RESUME_THREAD_ID".to_string(), "thread-1".to_string())],
    }
}

#[test]
fn job_spec_sets_backoff_limit_zero_and_never_restarts() {
    let job = build_job_spec("step-run-1-a", &params());
    let spec = job.spec.unwrap();
    assert_eq!(spec.backoff_limit, Some(0));
    assert_eq!(spec.active_deadline_seconds, Some(1800));
    assert_eq!(spec.ttl_seconds_after_finished, Some(TTL_SECONDS_AFTER_FINISHED));

    let pod_spec = spec.template.spec.unwrap();
    assert_eq!(pod_spec.restart_policy.as_deref(), Some("Never"));
    assert_eq!(pod_spec.service_account_name.as_deref(), Some("step-worker-sa"));
}

#[test]
fn job_spec_mounts_an_ephemeral_shared_scratch_volume() {
    let job = build_job_spec("step-run-1-a", &params());
    let pod_spec = job.spec.unwrap().template.spec.unwrap();
    let volumes = pod_spec.volumes.unwrap();
    assert_eq!(volumes.len(), 1);
    assert_eq!(volumes[0].name, SCRATCH_VOLUME);
    assert!(volumes[0].empty_dir.is_some());

    let mounts = pod_spec.containers[0].volume_mounts.clone().unwrap();
    assert_eq!(mounts[0].mount_path, SCRATCH_MOUNT_PATH);
}

#[test]
fn job_spec_carries_required_env_plus_extras() {
    let job = build_job_spec("step-run-1-a", &params());
    let pod_spec = job.spec.unwrap().template.spec.unwrap();
    let env = pod_spec.containers[0].env.clone().unwrap();
    let names: Vec<&str> = env.iter().map(|e| e.name.as_str()).collect();
    assert!(names.contains(&"RUN_ID"));
    assert!(names.contains(&"ORG_ID"));
    assert!(names.contains(&"STEP_ID"));
    assert!(names.contains(&"NAMESPACE"));
    assert!(names.contains(&"RESUME_THREAD_ID"));
}

#[test]
fn job_spec_labels_identify_run_and_step() {
    let job = build_job_spec("step-run-1-a", &params());
    let labels = job.metadata.labels.unwrap();
    assert_eq!(labels.get("run-id"), Some(&"run-1".to_string()));
    assert_eq!(labels.get("step-id"), Some(&"a".to_string()));
}
