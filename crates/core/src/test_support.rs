// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test builders for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::ids::{OrgId, RunId, StepId};
use crate::model::Run;
use crate::model::Step;
use crate::playbook::{Playbook, PlaybookStep, Variable};
use crate::status::{RunStatus, StepStatus};
use std::collections::HashMap;

/// Proptest strategies for core state machine types.
#[cfg(feature = "proptest")]
pub mod strategies {
    use crate::status::StepStatus;
    use proptest::prelude::*;

    pub fn arb_step_status() -> impl Strategy<Value = StepStatus> {
        prop_oneof![
            Just(StepStatus::Pending),
            Just(StepStatus::Running),
            Just(StepStatus::Paused),
            Just(StepStatus::Completed),
            Just(StepStatus::Failed),
            Just(StepStatus::Skipped),
        ]
    }
}

crate::builder! {
    pub struct RunBuilder => Run {
        set {
            org_id: OrgId = OrgId::new("org-test"),
            id: RunId = RunId::new("run-test"),
            status: RunStatus = RunStatus::Pending,
            context: HashMap<String, serde_json::Value> = HashMap::new(),
            trigger_inputs: HashMap<String, serde_json::Value> = HashMap::new(),
        }
        option {
            current_step_id: StepId = None,
            summary: String = None,
        }
        computed {
            error: Option<crate::model::ErrorInfo> = None,
            updated_at: Option<chrono::DateTime<chrono::Utc>> = None,
            completed_at: Option<chrono::DateTime<chrono::Utc>> = None,
            last_heartbeat: Option<chrono::DateTime<chrono::Utc>> = None,
        }
    }
}

crate::builder! {
    pub struct StepBuilder => Step {
        into {
            title: String = "Test step",
            agent_image: String = "echo",
        }
        set {
            id: StepId = StepId::new("step-test"),
            status: StepStatus = StepStatus::Pending,
            order: u32 = 1,
            timeout_minutes: u32 = 30,
            dependencies: Vec<StepId> = Vec::new(),
        }
        option {
            job_name: String = None,
            result_summary: String = None,
        }
        computed {
            error: Option<crate::model::ErrorInfo> = None,
            checkpoint: Option<crate::model::Checkpoint> = None,
            created_at: Option<chrono::DateTime<chrono::Utc>> = None,
            started_at: Option<chrono::DateTime<chrono::Utc>> = None,
            paused_at: Option<chrono::DateTime<chrono::Utc>> = None,
            completed_at: Option<chrono::DateTime<chrono::Utc>> = None,
        }
    }
}

/// Build a [`PlaybookStep`] with sane defaults for DAG/controller tests.
pub fn playbook_step(id: &str, order: u32, dependencies: &[&str]) -> PlaybookStep {
    PlaybookStep {
        id: StepId::new(id),
        order,
        title: format!("Step {id}"),
        assigned_role: String::new(),
        agent_image: "echo".to_string(),
        timeout_minutes: 30,
        interactive: false,
        approval: "approve_only".to_string(),
        dependencies: dependencies.iter().map(|d| StepId::new(*d)).collect(),
        description: String::new(),
        instruction: String::new(),
        required_connections: Vec::new(),
    }
}

/// Build a minimal [`Playbook`] from a set of steps (`variables` empty).
pub fn playbook_with_steps(steps: Vec<PlaybookStep>) -> Playbook {
    Playbook {
        name: "test-playbook".to_string(),
        version: "1".to_string(),
        description: String::new(),
        category: String::new(),
        schema_version: "1".to_string(),
        trigger: Default::default(),
        participants: Vec::new(),
        variables: Vec::new(),
        steps,
    }
}

pub fn variable(name: &str, source: &str, required: bool) -> Variable {
    Variable { name: name.to_string(), source: source.to_string(), required, description: String::new() }
}
