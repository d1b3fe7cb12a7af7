// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::playbook::Variable;

fn sample_context() -> Context {
    let mut org = HashMap::new();
    org.insert("name".to_string(), ContextValue::Scalar("Acme Corp".to_string()));

    let mut run = HashMap::new();
    run.insert("new_hire_name".to_string(), ContextValue::Scalar("Bob".to_string()));

    let mut members = HashMap::new();
    members.insert(
        "Engineering".to_string(),
        vec![
            Member { email: "a@acme.com".into(), display_name: "A".into(), role: "Engineering".into() },
            Member { email: "b@acme.com".into(), display_name: "B".into(), role: "Engineering".into() },
        ],
    );

    Context { org, run, members }
}

#[test]
fn resolves_org_path() {
    let ctx = sample_context();
    assert_eq!(
        ctx.resolve_path("org.name"),
        Some(ContextValue::Scalar("Acme Corp".to_string()))
    );
}

#[test]
fn resolves_run_context_path() {
    let ctx = sample_context();
    assert_eq!(
        ctx.resolve_path("run.context.new_hire_name"),
        Some(ContextValue::Scalar("Bob".to_string()))
    );
}

#[test]
fn resolves_members_by_role_as_list() {
    let ctx = sample_context();
    let value = ctx.resolve_path("members.Engineering").unwrap();
    match value {
        ContextValue::List(emails) => {
            assert_eq!(emails, vec!["a@acme.com".to_string(), "b@acme.com".to_string()]);
        }
        other => panic!("expected list, got {other:?}"),
    }
}

#[test]
fn missing_path_segment_returns_none() {
    let ctx = sample_context();
    assert_eq!(ctx.resolve_path("org.missing"), None);
    assert_eq!(ctx.resolve_path("members.NoSuchRole"), None);
}

#[test]
fn resolve_variables_collects_all_resolvable() {
    let ctx = sample_context();
    let vars = vec![
        Variable { name: "hire".into(), source: "run.context.new_hire_name".into(), required: true, description: String::new() },
        Variable { name: "org_name".into(), source: "org.name".into(), required: true, description: String::new() },
    ];
    let resolved = ctx.resolve_variables(&vars).unwrap();
    assert_eq!(resolved.get("hire"), Some(&"Bob".to_string()));
    assert_eq!(resolved.get("org_name"), Some(&"Acme Corp".to_string()));
}

#[test]
fn resolve_variables_errors_on_missing_required() {
    let ctx = sample_context();
    let vars = vec![Variable {
        name: "missing".into(),
        source: "org.nope".into(),
        required: true,
        description: String::new(),
    }];
    let err = ctx.resolve_variables(&vars).unwrap_err();
    assert_eq!(
        err,
        ContextError::MissingRequired { name: "missing".into(), source: "org.nope".into() }
    );
}

#[test]
fn resolve_variables_skips_missing_optional() {
    let ctx = sample_context();
    let vars = vec![Variable {
        name: "optional".into(),
        source: "org.nope".into(),
        required: false,
        description: String::new(),
    }];
    let resolved = ctx.resolve_variables(&vars).unwrap();
    assert!(!resolved.contains_key("optional"));
}
