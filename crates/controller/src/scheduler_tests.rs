// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use pb_cluster::FakeClusterAdapter;
use pb_core::test_support::{playbook_step, playbook_with_steps};
use pb_core::{ErrorInfo, FakeClock, Run, RunStatus, StepStatus};
use pb_store::{InMemoryStoreAdapter, StepStatusUpdate};
use std::collections::HashMap;
use std::time::Duration;

type Store = InMemoryStoreAdapter<FakeClock>;

fn setup(steps: Vec<pb_core::PlaybookStep>) -> (Arc<Store>, Arc<FakeClusterAdapter>, OrgId, RunId, Scheduler) {
    let store = Arc::new(InMemoryStoreAdapter::with_clock(FakeClock::new()));
    let cluster = Arc::new(FakeClusterAdapter::new());
    let org = OrgId::new("acme");
    let run = RunId::new("run-1");
    store.seed_run(Run::builder().org_id(org.clone()).id(run.clone()).status(RunStatus::Running).build());

    let playbook = playbook_with_steps(steps);
    let options = SchedulerOptions {
        namespace: "playbooks".to_string(),
        service_account: "step-worker-sa".to_string(),
        agent_image_registry: Some("gcr.io/acme".to_string()),
        poll_interval: Duration::from_millis(10),
        heartbeat_interval: Duration::from_secs(30),
    };
    let scheduler = Scheduler::new(
        store.clone() as Arc<dyn StoreAdapter>,
        cluster.clone() as Arc<dyn ClusterAdapter>,
        playbook,
        org.clone(),
        run.clone(),
        options,
    );
    (store, cluster, org, run, scheduler)
}

/// Simulates every worker this test cares about: as soon as a step goes
/// `running`, immediately writes the configured terminal status. Mirrors
/// how a real worker marks itself `completed`/`failed`/`paused`, without
/// pulling `pb-worker` into this crate's own tests.
async fn autocomplete(store: Arc<Store>, org: OrgId, run: RunId, outcomes: HashMap<StepId, StepStatus>) {
    let mut done = std::collections::HashSet::new();
    loop {
        for (id, status) in &outcomes {
            if done.contains(id) {
                continue;
            }
            if let Ok(StepStatus::Running) = store.read_step_status(&org, &run, id).await {
                let update = if *status == StepStatus::Failed {
                    StepStatusUpdate { error: Some(ErrorInfo::new("STEP_FAILED", "boom")), ..Default::default() }
                } else {
                    StepStatusUpdate { result_summary: Some("ok".to_string()), ..Default::default() }
                };
                store.update_step_status(&org, &run, id, *status, update).await.unwrap();
                done.insert(id.clone());
            }
        }
        if done.len() == outcomes.len() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
}

#[tokio::test]
async fn rejects_a_cyclic_playbook_before_initializing_any_step() {
    let steps = vec![playbook_step("a", 1, &["b"]), playbook_step("b", 2, &["a"])];
    let (store, _cluster, org, run, scheduler) = setup(steps);

    let err = scheduler.run().await.unwrap_err();
    assert!(matches!(err, ControllerError::Dag(pb_dag::DagError::Cyclic { .. })));

    let run_doc = store.read_run(&org, &run).await.unwrap();
    assert_eq!(run_doc.status, RunStatus::Failed);
    assert_eq!(run_doc.error.unwrap().code, pb_core::error_codes::CYCLIC_DEPENDENCY);
}

#[tokio::test]
async fn rejects_a_dangling_dependency() {
    let steps = vec![playbook_step("a", 1, &["ghost"])];
    let (_store, _cluster, _org, _run, scheduler) = setup(steps);

    let err = scheduler.run().await.unwrap_err();
    assert!(matches!(err, ControllerError::Dag(pb_dag::DagError::MissingDependency { .. })));
}

#[tokio::test(start_paused = true)]
async fn linear_three_step_happy_path_completes_the_run() {
    let steps = vec![
        playbook_step("a", 1, &[]),
        playbook_step("b", 2, &["a"]),
        playbook_step("c", 3, &["b"]),
    ];
    let ids: Vec<StepId> = steps.iter().map(|s| s.id.clone()).collect();
    let (store, _cluster, org, run, scheduler) = setup(steps);

    let outcomes: HashMap<StepId, StepStatus> = ids.iter().map(|id| (id.clone(), StepStatus::Completed)).collect();
    let driver = tokio::spawn(autocomplete(store.clone(), org.clone(), run.clone(), outcomes));

    let outcome = scheduler.run().await.unwrap();
    driver.await.unwrap();

    assert_eq!(outcome, RunOutcome::Completed);
    let run_doc = store.read_run(&org, &run).await.unwrap();
    assert_eq!(run_doc.status, RunStatus::Completed);
    for id in &ids {
        assert_eq!(store.read_step_status(&org, &run, id).await.unwrap(), StepStatus::Completed);
    }
}

#[tokio::test(start_paused = true)]
async fn parallel_fan_out_launches_independent_steps_together_in_order() {
    let steps = vec![
        playbook_step("a", 1, &[]),
        playbook_step("b", 2, &[]),
        playbook_step("c", 3, &[]),
        playbook_step("d", 4, &["a", "b", "c"]),
    ];
    let ids: Vec<StepId> = steps.iter().map(|s| s.id.clone()).collect();
    let (store, cluster, org, run, scheduler) = setup(steps);

    let outcomes: HashMap<StepId, StepStatus> = ids.iter().map(|id| (id.clone(), StepStatus::Completed)).collect();
    let driver = tokio::spawn(autocomplete(store.clone(), org.clone(), run.clone(), outcomes));

    let outcome = scheduler.run().await.unwrap();
    driver.await.unwrap();

    assert_eq!(outcome, RunOutcome::Completed);
    let order = cluster.creation_order();
    assert_eq!(&order[..3], &["step-run-1-a", "step-run-1-b", "step-run-1-c"]);
    assert_eq!(order[3], "step-run-1-d");
}

#[tokio::test(start_paused = true)]
async fn failure_cascades_to_dependents_but_spares_independent_branches() {
    // a -> b -> c, a -> d
    let steps = vec![
        playbook_step("a", 1, &[]),
        playbook_step("b", 2, &["a"]),
        playbook_step("c", 3, &["b"]),
        playbook_step("d", 4, &["a"]),
    ];
    let (store, _cluster, org, run, scheduler) = setup(steps);

    let mut outcomes = HashMap::new();
    outcomes.insert(StepId::new("a"), StepStatus::Completed);
    outcomes.insert(StepId::new("b"), StepStatus::Failed);
    outcomes.insert(StepId::new("d"), StepStatus::Completed);
    let driver = tokio::spawn(autocomplete(store.clone(), org.clone(), run.clone(), outcomes));

    let outcome = scheduler.run().await.unwrap();
    driver.await.unwrap();

    match outcome {
        RunOutcome::Failed { failed } => assert_eq!(failed, vec![StepId::new("b")]),
        other => panic!("expected Failed, got {other:?}"),
    }
    assert_eq!(store.read_step_status(&org, &run, &StepId::new("c")).await.unwrap(), StepStatus::Skipped);
    assert_eq!(store.read_step_status(&org, &run, &StepId::new("d")).await.unwrap(), StepStatus::Completed);
}

#[tokio::test(start_paused = true)]
async fn step_timeout_fails_the_step_and_cascades() {
    let mut a = playbook_step("a", 1, &[]);
    a.timeout_minutes = 0;
    let b = playbook_step("b", 2, &["a"]);
    let (store, _cluster, org, run, scheduler) = setup(vec![a, b]);

    // Nobody ever completes `a` — it must time out on its own.
    let outcome = scheduler.run().await.unwrap();

    match outcome {
        RunOutcome::Failed { failed } => assert_eq!(failed, vec![StepId::new("a")]),
        other => panic!("expected Failed, got {other:?}"),
    }
    let a_doc = store.read_step(&org, &run, &StepId::new("a")).await.unwrap();
    assert_eq!(a_doc.error.unwrap().code, pb_core::error_codes::STEP_TIMEOUT);
    assert_eq!(store.read_step_status(&org, &run, &StepId::new("b")).await.unwrap(), StepStatus::Skipped);
}

#[tokio::test(start_paused = true)]
async fn abort_observed_mid_run_stops_launching_and_exits_cleanly() {
    let steps = vec![playbook_step("a", 1, &[]), playbook_step("b", 2, &["a"])];
    let (store, cluster, org, run, scheduler) = setup(steps);

    // Once `a` is launched, abort the run instead of ever completing it.
    let store_for_abort = store.clone();
    let org2 = org.clone();
    let run2 = run.clone();
    let driver = tokio::spawn(async move {
        loop {
            if let Ok(StepStatus::Running) = store_for_abort.read_step_status(&org2, &run2, &StepId::new("a")).await {
                store_for_abort
                    .update_run_status(&org2, &run2, RunStatus::Aborted, RunStatusUpdate::default())
                    .await
                    .unwrap();
                return;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    });

    let outcome = scheduler.run().await.unwrap();
    driver.await.unwrap();

    assert_eq!(outcome, RunOutcome::Aborted);
    assert!(cluster.was_config_map_deleted("playbook-run-1"));
    // `b` was never launched — it depends on `a`, which never reached `completed`.
    assert!(!cluster.created_jobs().contains(&"step-run-1-b".to_string()));
}

#[tokio::test(start_paused = true)]
async fn pause_notification_fires_once_per_pause_and_once_per_resume() {
    let steps = vec![playbook_step("a", 1, &[])];
    let (store, _cluster, org, run, scheduler) = setup(steps);

    let store2 = store.clone();
    let org2 = org.clone();
    let run2 = run.clone();
    let driver = tokio::spawn(async move {
        // Wait for launch, pause, let the controller notice, resume, then complete.
        loop {
            if let Ok(StepStatus::Running) = store2.read_step_status(&org2, &run2, &StepId::new("a")).await {
                break;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        store2
            .update_step_status(&org2, &run2, &StepId::new("a"), StepStatus::Paused, StepStatusUpdate::default())
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        store2
            .update_step_status(&org2, &run2, &StepId::new("a"), StepStatus::Running, StepStatusUpdate::default())
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        store2
            .update_step_status(
                &org2,
                &run2,
                &StepId::new("a"),
                StepStatus::Completed,
                StepStatusUpdate { result_summary: Some("ok".to_string()), ..Default::default() },
            )
            .await
            .unwrap();
    });

    let outcome = scheduler.run().await.unwrap();
    driver.await.unwrap();
    assert_eq!(outcome, RunOutcome::Completed);

    let events = store.list_events(&org, &run).await.unwrap();
    let progress_messages: Vec<String> = events
        .iter()
        .filter(|e| e.kind == pb_core::EventType::Progress)
        .filter_map(|e| e.payload.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .collect();
    assert_eq!(progress_messages.iter().filter(|m| m.as_str() == "waiting for user input").count(), 1);
    assert_eq!(progress_messages.iter().filter(|m| m.as_str() == "resumed after user input").count(), 1);
}
