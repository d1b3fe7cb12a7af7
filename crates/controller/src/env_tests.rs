// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;

fn clear_all() {
    for var in [
        "RUN_ID",
        "ORG_ID",
        "PLAYBOOK_ID",
        "NAMESPACE",
        "AGENT_IMAGE_REGISTRY",
        "PLAYBOOK_SERVICE_ACCOUNT",
        "POLL_INTERVAL_SECS",
        "HEARTBEAT_INTERVAL_SECS",
    ] {
        std::env::remove_var(var);
    }
}

#[test]
#[serial]
fn from_env_reads_required_vars_and_defaults() {
    clear_all();
    std::env::set_var("RUN_ID", "run-1");
    std::env::set_var("ORG_ID", "acme");

    let config = ControllerConfig::from_env().unwrap();
    assert_eq!(config.run_id.as_str(), "run-1");
    assert_eq!(config.org_id.as_str(), "acme");
    assert_eq!(config.namespace, "playbooks");
    assert_eq!(config.service_account, "default");
    assert_eq!(config.poll_interval, Duration::from_secs(10));
    assert_eq!(config.heartbeat_interval, Duration::from_secs(30));
    assert!(config.playbook_id.is_none());
    assert!(config.agent_image_registry.is_none());
    clear_all();
}

#[test]
#[serial]
fn from_env_errors_on_missing_run_id() {
    clear_all();
    std::env::set_var("ORG_ID", "acme");

    let err = ControllerConfig::from_env().unwrap_err();
    assert!(matches!(err, ConfigError::MissingVar("RUN_ID")));
    clear_all();
}

#[test]
#[serial]
fn from_env_reads_overrides() {
    clear_all();
    std::env::set_var("RUN_ID", "run-1");
    std::env::set_var("ORG_ID", "acme");
    std::env::set_var("NAMESPACE", "custom-ns");
    std::env::set_var("AGENT_IMAGE_REGISTRY", "registry.example.com");
    std::env::set_var("POLL_INTERVAL_SECS", "2");
    std::env::set_var("HEARTBEAT_INTERVAL_SECS", "5");

    let config = ControllerConfig::from_env().unwrap();
    assert_eq!(config.namespace, "custom-ns");
    assert_eq!(config.agent_image_registry.as_deref(), Some("registry.example.com"));
    assert_eq!(config.poll_interval, Duration::from_secs(2));
    assert_eq!(config.heartbeat_interval, Duration::from_secs(5));
    clear_all();
}
