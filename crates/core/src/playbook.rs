// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Playbook value types.
//!
//! Parsing `PLAYBOOK.md`'s YAML frontmatter and Markdown body is a separate
//! collaborator's job. What lives here is the *value* that parser hands to
//! the run controller: plain structs deserializable straight off an
//! already-parsed document.

use crate::ids::StepId;
use serde::{Deserialize, Serialize};

/// A declared variable, resolved against a [`crate::context::Context`]
/// before a run starts (§6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub source: String,
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default)]
    pub description: String,
}

fn default_required() -> bool {
    true
}

/// One playbook step definition (§6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybookStep {
    pub id: StepId,
    pub order: u32,
    pub title: String,
    #[serde(default)]
    pub assigned_role: String,
    pub agent_image: String,
    #[serde(default = "default_timeout_minutes")]
    pub timeout_minutes: u32,
    #[serde(default)]
    pub interactive: bool,
    #[serde(default = "default_approval")]
    pub approval: String,
    #[serde(default)]
    pub dependencies: Vec<StepId>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub instruction: String,
    #[serde(default)]
    pub required_connections: Vec<String>,
}

fn default_timeout_minutes() -> u32 {
    30
}

fn default_approval() -> String {
    "approve_only".to_string()
}

/// Trigger metadata (§6 frontmatter `trigger{...}`) — shape is
/// collaborator-defined, so this is carried opaquely.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

/// Participant entry (§6 frontmatter `participants[]`) — also
/// collaborator-defined shape, carried opaquely.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

/// A fully parsed playbook, ready for DAG validation and scheduling (§6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playbook {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    pub schema_version: String,
    #[serde(default)]
    pub trigger: Trigger,
    #[serde(default)]
    pub participants: Vec<Participant>,
    #[serde(default)]
    pub variables: Vec<Variable>,
    pub steps: Vec<PlaybookStep>,
}

impl Playbook {
    /// Steps sorted by their declared `order` (the scheduler re-derives
    /// this itself via `pb_dag::ready_steps`, but callers building step
    /// docs at run-init time want the same deterministic order).
    pub fn steps_by_order(&self) -> Vec<&PlaybookStep> {
        let mut steps: Vec<&PlaybookStep> = self.steps.iter().collect();
        steps.sort_by_key(|s| s.order);
        steps
    }
}

#[cfg(test)]
#[path = "playbook_tests.rs"]
mod tests;
