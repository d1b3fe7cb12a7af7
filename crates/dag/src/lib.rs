// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Step dependency graph validation and scheduling primitives.
//!
//! Three pure, side-effect-free operations drive the run controller's
//! scheduling loop:
//!
//! - [`validate`] — reject a graph with a missing dependency or a cycle.
//! - [`ready_steps`] — the deterministic set of steps launchable right now.
//! - [`transitive_dependents`] — everything downstream of a failed step,
//!   for the cascade-skip sweep.

use pb_core::StepId;
use std::collections::{HashMap, HashSet, VecDeque};
use thiserror::Error;

/// A minimal view of a playbook step needed for graph operations. Any type
/// naming an id, an order, and a dependency list works — `pb-controller`
/// passes `&[pb_core::PlaybookStep]` directly.
pub trait StepNode {
    fn id(&self) -> &StepId;
    fn order(&self) -> u32;
    fn dependencies(&self) -> &[StepId];
}

impl StepNode for pb_core::PlaybookStep {
    fn id(&self) -> &StepId {
        &self.id
    }

    fn order(&self) -> u32 {
        self.order
    }

    fn dependencies(&self) -> &[StepId] {
        &self.dependencies
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DagError {
    #[error("step '{step}' depends on '{dependency}', which does not exist")]
    MissingDependency { step: StepId, dependency: StepId },

    #[error("cyclic dependency detected: {}", format_cycle(.cycle))]
    Cyclic { cycle: Vec<StepId> },
}

fn format_cycle(cycle: &[StepId]) -> String {
    cycle.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(" -> ")
}

/// Validate that `steps` form a valid DAG: every dependency references a
/// step that exists, and the dependency graph contains no cycle (including
/// a step depending on itself, a 1-cycle).
///
/// Pure and idempotent: repeated calls on the same input produce the same
/// result.
#[allow(clippy::expect_used)]
pub fn validate<S: StepNode>(steps: &[S]) -> Result<(), DagError> {
    let ids: HashSet<&StepId> = steps.iter().map(StepNode::id).collect();

    for step in steps {
        for dep in step.dependencies() {
            if !ids.contains(dep) {
                return Err(DagError::MissingDependency {
                    step: step.id().clone(),
                    dependency: dep.clone(),
                });
            }
        }
    }

    // Kahn's algorithm: topological sort by in-degree. If fewer than
    // `steps.len()` nodes get sorted, a cycle exists somewhere.
    let mut in_degree: HashMap<&StepId, usize> = steps.iter().map(|s| (s.id(), 0)).collect();
    let mut dependents: HashMap<&StepId, Vec<&StepId>> =
        steps.iter().map(|s| (s.id(), Vec::new())).collect();

    for step in steps {
        for dep in step.dependencies() {
            dependents.get_mut(dep).expect("dep existence checked above").push(step.id());
            *in_degree.get_mut(step.id()).expect("step in its own id set") += 1;
        }
    }

    let mut queue: VecDeque<&StepId> =
        in_degree.iter().filter(|(_, &deg)| deg == 0).map(|(id, _)| *id).collect();
    let mut sorted_count = 0usize;

    while let Some(node) = queue.pop_front() {
        sorted_count += 1;
        for dependent in &dependents[node] {
            let deg = in_degree.get_mut(dependent).expect("dependent tracked in in_degree");
            *deg -= 1;
            if *deg == 0 {
                queue.push_back(dependent);
            }
        }
    }

    if sorted_count < steps.len() {
        let cycle = find_cycle(steps);
        return Err(DagError::Cyclic { cycle });
    }

    Ok(())
}

/// White/gray/black DFS cycle witness reconstruction, used once `validate`
/// has already established a cycle exists via Kahn's algorithm.
fn find_cycle<S: StepNode>(steps: &[S]) -> Vec<StepId> {
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Color {
        White,
        Gray,
        Black,
    }

    let adj: HashMap<&StepId, &[StepId]> =
        steps.iter().map(|s| (s.id(), s.dependencies())).collect();
    let mut color: HashMap<&StepId, Color> = steps.iter().map(|s| (s.id(), Color::White)).collect();
    let mut parent: HashMap<&StepId, &StepId> = HashMap::new();

    fn visit<'a>(
        node: &'a StepId,
        adj: &HashMap<&'a StepId, &'a [StepId]>,
        color: &mut HashMap<&'a StepId, Color>,
        parent: &mut HashMap<&'a StepId, &'a StepId>,
    ) -> Option<Vec<StepId>> {
        color.insert(node, Color::Gray);
        if let Some(deps) = adj.get(node) {
            for dep in deps.iter() {
                match color.get(dep).copied().unwrap_or(Color::White) {
                    Color::Gray => {
                        // Back-edge found: walk parents from `node` back to `dep`.
                        let mut cycle = vec![dep.clone(), node.clone()];
                        let mut current = node;
                        while let Some(&p) = parent.get(current) {
                            if p == dep {
                                break;
                            }
                            current = p;
                            cycle.push(current.clone());
                        }
                        cycle.reverse();
                        return Some(cycle);
                    }
                    Color::White => {
                        parent.insert(dep, node);
                        if let Some(found) = visit(dep, adj, color, parent) {
                            return Some(found);
                        }
                    }
                    Color::Black => {}
                }
            }
        }
        color.insert(node, Color::Black);
        None
    }

    for step in steps {
        if color.get(step.id()).copied().unwrap_or(Color::White) == Color::White {
            if let Some(cycle) = visit(step.id(), &adj, &mut color, &mut parent) {
                return cycle;
            }
        }
    }

    vec![StepId::new("unknown")]
}

/// Return the steps that are ready to launch right now, sorted by declared
/// `order` for deterministic launch ordering.
///
/// A step is ready iff it is not already in `completed`, `terminal_blocked`
/// (failed ∪ skipped), or `running`, and every one of its dependencies is
/// in `completed`. `readySteps` depends only on the sets passed in, so
/// repeated calls with the same inputs are idempotent.
pub fn ready_steps<'a, S: StepNode>(
    steps: &'a [S],
    completed: &HashSet<StepId>,
    terminal_blocked: &HashSet<StepId>,
    running: &HashSet<StepId>,
) -> Vec<&'a S> {
    let mut ready: Vec<&S> = steps
        .iter()
        .filter(|s| {
            !completed.contains(s.id())
                && !terminal_blocked.contains(s.id())
                && !running.contains(s.id())
                && s.dependencies().iter().all(|dep| completed.contains(dep))
        })
        .collect();
    ready.sort_by_key(|s| s.order());
    ready
}

/// All step IDs that transitively depend on `step_id`, via BFS over the
/// reverse ("enables") adjacency. Excludes `step_id` itself.
pub fn transitive_dependents<S: StepNode>(step_id: &StepId, steps: &[S]) -> HashSet<StepId> {
    let mut dependents: HashMap<&StepId, Vec<&StepId>> =
        steps.iter().map(|s| (s.id(), Vec::new())).collect();
    for step in steps {
        for dep in step.dependencies() {
            if let Some(list) = dependents.get_mut(dep) {
                list.push(step.id());
            }
        }
    }

    let mut visited: HashSet<StepId> = HashSet::new();
    let mut queue: VecDeque<&StepId> = VecDeque::new();
    queue.push_back(step_id);

    while let Some(current) = queue.pop_front() {
        if let Some(next) = dependents.get(current) {
            for dep_id in next {
                if visited.insert((*dep_id).clone()) {
                    queue.push_back(dep_id);
                }
            }
        }
    }

    visited
}

/// `true` if `step_id` can never become ready because a dependency is in
/// `failed` (or `failed ∪ skipped`, the caller's choice of set).
pub fn is_blocked<S: StepNode>(step_id: &StepId, steps: &[S], failed: &HashSet<StepId>) -> bool {
    steps
        .iter()
        .find(|s| s.id() == step_id)
        .map(|s| s.dependencies().iter().any(|dep| failed.contains(dep)))
        .unwrap_or(true)
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
