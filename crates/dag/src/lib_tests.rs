// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use pb_core::test_support::playbook_step;
use std::collections::HashSet;

fn ids(s: &[&str]) -> HashSet<StepId> {
    s.iter().map(|id| StepId::new(*id)).collect()
}

#[test]
fn validate_accepts_linear_chain() {
    let steps = vec![playbook_step("a", 1, &[]), playbook_step("b", 2, &["a"]), playbook_step("c", 3, &["b"])];
    assert!(validate(&steps).is_ok());
}

#[test]
fn validate_rejects_missing_dependency() {
    let steps = vec![playbook_step("a", 1, &["ghost"])];
    let err = validate(&steps).unwrap_err();
    assert_eq!(
        err,
        DagError::MissingDependency { step: StepId::new("a"), dependency: StepId::new("ghost") }
    );
}

#[test]
fn validate_rejects_self_dependency() {
    let steps = vec![playbook_step("a", 1, &["a"])];
    match validate(&steps) {
        Err(DagError::Cyclic { cycle }) => assert_eq!(cycle, vec![StepId::new("a")]),
        other => panic!("expected Cyclic, got {other:?}"),
    }
}

#[test]
fn validate_rejects_two_cycle() {
    let steps = vec![playbook_step("a", 1, &["b"]), playbook_step("b", 2, &["a"])];
    match validate(&steps) {
        Err(DagError::Cyclic { cycle }) => {
            assert!(cycle.contains(&StepId::new("a")));
            assert!(cycle.contains(&StepId::new("b")));
        }
        other => panic!("expected Cyclic, got {other:?}"),
    }
}

#[test]
fn validate_accepts_empty_graph() {
    let steps: Vec<pb_core::PlaybookStep> = vec![];
    assert!(validate(&steps).is_ok());
}

#[test]
fn ready_steps_linear_chain_progresses_one_at_a_time() {
    let steps = vec![playbook_step("a", 1, &[]), playbook_step("b", 2, &["a"]), playbook_step("c", 3, &["b"])];
    let none = HashSet::new();

    let ready = ready_steps(&steps, &none, &none, &none);
    assert_eq!(ready.iter().map(|s| s.id.as_str()).collect::<Vec<_>>(), vec!["a"]);

    let completed = ids(&["a"]);
    let ready = ready_steps(&steps, &completed, &none, &none);
    assert_eq!(ready.iter().map(|s| s.id.as_str()).collect::<Vec<_>>(), vec!["b"]);
}

#[test]
fn ready_steps_fan_out_launches_in_order() {
    let steps = vec![
        playbook_step("a", 1, &[]),
        playbook_step("b", 2, &[]),
        playbook_step("c", 3, &[]),
        playbook_step("d", 4, &["a", "b", "c"]),
    ];
    let none = HashSet::new();
    let ready = ready_steps(&steps, &none, &none, &none);
    assert_eq!(ready.iter().map(|s| s.id.as_str()).collect::<Vec<_>>(), vec!["a", "b", "c"]);
}

#[test]
fn ready_steps_excludes_running_and_terminal() {
    let steps = vec![playbook_step("a", 1, &[]), playbook_step("b", 2, &[])];
    let running = ids(&["a"]);
    let terminal = ids(&["b"]);
    let ready = ready_steps(&steps, &HashSet::new(), &terminal, &running);
    assert!(ready.is_empty());
}

#[test]
fn ready_steps_blocked_by_failed_dependency_never_becomes_ready() {
    let steps = vec![playbook_step("a", 1, &[]), playbook_step("b", 2, &["a"])];
    let failed = ids(&["a"]);
    let ready = ready_steps(&steps, &HashSet::new(), &failed, &HashSet::new());
    assert!(ready.iter().all(|s| s.id.as_str() != "b"));
}

#[test]
fn transitive_dependents_failure_cascade() {
    let steps = vec![
        playbook_step("a", 1, &[]),
        playbook_step("b", 2, &["a"]),
        playbook_step("c", 3, &["b"]),
        playbook_step("d", 4, &["a"]),
    ];
    let deps = transitive_dependents(&StepId::new("b"), &steps);
    assert_eq!(deps, ids(&["c"]));

    let deps = transitive_dependents(&StepId::new("a"), &steps);
    assert_eq!(deps, ids(&["b", "c", "d"]));
}

#[test]
fn transitive_dependents_excludes_origin() {
    let steps = vec![playbook_step("a", 1, &[]), playbook_step("b", 2, &["a"])];
    let deps = transitive_dependents(&StepId::new("a"), &steps);
    assert!(!deps.contains(&StepId::new("a")));
}

#[test]
fn transitive_dependents_leaf_step_has_none() {
    let steps = vec![playbook_step("a", 1, &[]), playbook_step("b", 2, &["a"])];
    let deps = transitive_dependents(&StepId::new("b"), &steps);
    assert!(deps.is_empty());
}

#[test]
fn is_blocked_true_when_dependency_failed() {
    let steps = vec![playbook_step("a", 1, &[]), playbook_step("b", 2, &["a"])];
    let failed = ids(&["a"]);
    assert!(is_blocked(&StepId::new("b"), &steps, &failed));
    assert!(!is_blocked(&StepId::new("a"), &steps, &failed));
}
