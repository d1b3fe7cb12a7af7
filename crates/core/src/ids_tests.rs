// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::collections::HashMap;

#[test]
fn id_equality_and_display() {
    let a = RunId::new("run-1");
    let b = RunId::new("run-1".to_string());
    let c = RunId::new("run-2");
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(a.to_string(), "run-1");
}

#[test]
fn id_as_hashmap_key_lookup_by_str() {
    let mut map: HashMap<StepId, u32> = HashMap::new();
    map.insert(StepId::new("provision"), 1);
    assert_eq!(map.get("provision"), Some(&1));
}

#[test]
fn id_serde_roundtrip() {
    let id = OrgId::new("acme");
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, "\"acme\"");
    let back: OrgId = serde_json::from_str(&json).unwrap();
    assert_eq!(back, id);
}

#[test]
fn correlation_ids_are_unique() {
    let a = new_correlation_id();
    let b = new_correlation_id();
    assert_ne!(a, b);
    assert_eq!(a.len(), 36);
}
