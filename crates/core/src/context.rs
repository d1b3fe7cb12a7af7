// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed run context and variable resolution.
//!
//! A playbook's declared variables are resolved against a nested context
//! built from org data, run trigger inputs, and role-scoped member lists.
//! The nesting is a closed Rust type rather than an untyped map, and
//! resolution returns a typed `Result` instead of panicking on a missing
//! required variable.

use crate::playbook::Variable;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// A resolved context leaf value: a scalar, a list (member emails/names
/// joined for display), or a nested map (org fields).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContextValue {
    Scalar(String),
    List(Vec<String>),
    Map(HashMap<String, String>),
}

impl ContextValue {
    /// Flatten to the string representation used when resolving a variable.
    pub fn as_resolved_string(&self) -> String {
        match self {
            Self::Scalar(s) => s.clone(),
            Self::List(items) => items.join(", "),
            Self::Map(map) => {
                let mut entries: Vec<_> = map.iter().collect();
                entries.sort_by_key(|(k, _)| k.clone());
                entries
                    .into_iter()
                    .map(|(k, v)| format!("{k}={v}"))
                    .collect::<Vec<_>>()
                    .join(", ")
            }
        }
    }
}

/// A single member record under `members.{role}.*`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub email: String,
    pub display_name: String,
    pub role: String,
}

/// Typed nested context resolved against an org, a run's trigger inputs, and
/// role-scoped member lists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Context {
    #[serde(default)]
    pub org: HashMap<String, ContextValue>,
    #[serde(default)]
    pub run: HashMap<String, ContextValue>,
    #[serde(default)]
    pub members: HashMap<String, Vec<Member>>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContextError {
    #[error("required variable '{name}' could not be resolved (source: '{source}')")]
    MissingRequired { name: String, source: String },
}

impl Context {
    /// Resolve a dotted source path (`org.name`, `run.context.new_hire`,
    /// `members.Engineering`) against this context.
    ///
    /// Returns `None` if any segment is missing.
    pub fn resolve_path(&self, path: &str) -> Option<ContextValue> {
        let mut segments = path.splitn(2, '.');
        let root = segments.next()?;
        let rest = segments.next().unwrap_or("");

        match root {
            "org" => self.org.get(rest).cloned(),
            "run" => {
                // `run.context.{name}` — only the `context.` prefix is
                // supported as a `run.*` source.
                let key = rest.strip_prefix("context.")?;
                self.run.get(key).cloned()
            }
            "members" => {
                let role = rest.split('.').next()?;
                let members = self.members.get(role)?;
                Some(ContextValue::List(
                    members
                        .iter()
                        .map(|m| {
                            if !m.email.is_empty() {
                                m.email.clone()
                            } else {
                                m.display_name.clone()
                            }
                        })
                        .collect(),
                ))
            }
            _ => None,
        }
    }

    /// Resolve every declared variable, erroring on the first unresolved
    /// required one.
    pub fn resolve_variables(
        &self,
        variables: &[Variable],
    ) -> Result<HashMap<String, String>, ContextError> {
        let mut resolved = HashMap::with_capacity(variables.len());
        for var in variables {
            match self.resolve_path(&var.source) {
                Some(value) => {
                    resolved.insert(var.name.clone(), value.as_resolved_string());
                }
                None if var.required => {
                    return Err(ContextError::MissingRequired {
                        name: var.name.clone(),
                        source: var.source.clone(),
                    });
                }
                None => {}
            }
        }
        Ok(resolved)
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
