//! Tests for configuration validation

use std::collections::HashMap;
use std::time::Duration;

use volunteer_match::config::{EngineConfig, NotificationBackendConfig};
use volunteer_match::core::{RelayMode, RepeatPolicy};

#[test]
fn test_default_config_is_valid() {
    let cfg = EngineConfig::default();
    assert!(cfg.validate().is_ok());
    assert_eq!(cfg.repeat_decision, RepeatPolicy::NoOp);
    assert_eq!(cfg.relay, RelayMode::Inline);
    assert_eq!(cfg.recent_limit, 10);
}

#[test]
fn test_zero_batch_size_is_invalid() {
    let cfg = EngineConfig {
        relay_batch_size: 0,
        ..EngineConfig::default()
    };
    assert!(cfg.validate().is_err());
}

#[test]
fn test_file_backend_requires_data_dir() {
    let mut cfg = EngineConfig {
        notifications: NotificationBackendConfig::File,
        ..EngineConfig::default()
    };
    assert!(cfg.validate().is_err());
    cfg.data_dir = Some("/tmp/volunteer-match".to_string());
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_retry_delays_must_be_ordered() {
    let mut cfg = EngineConfig::default();
    cfg.retry.initial_delay_ms = 5_000;
    assert!(cfg.validate().is_err());
}

#[test]
fn test_config_from_json() {
    let json = r#"{
        "repeat_decision": "reject",
        "relay": "background",
        "relay_idle_ms": 250,
        "retry": { "max_retries": 5 }
    }"#;
    let cfg = EngineConfig::from_json_str(json).unwrap();
    assert_eq!(cfg.repeat_decision, RepeatPolicy::Reject);
    assert_eq!(cfg.relay, RelayMode::Background);
    assert_eq!(cfg.relay_idle(), Duration::from_millis(250));
    assert_eq!(cfg.retry.max_retries, 5);
    assert_eq!(cfg.retry.initial_delay_ms, 50);
    assert_eq!(cfg.stream, "default");

    let options = cfg.engine_options();
    assert_eq!(options.repeat, RepeatPolicy::Reject);
    assert_eq!(options.relay_mode, RelayMode::Background);
}

#[test]
fn test_config_from_json_rejects_invalid_values() {
    assert!(EngineConfig::from_json_str(r#"{ "recent_limit": 0 }"#).is_err());
    assert!(EngineConfig::from_json_str("not json").is_err());
}

#[test]
fn test_config_from_lookup() {
    let vars: HashMap<&str, &str> = [
        ("MATCH_REPEAT_DECISION", "Reject"),
        ("MATCH_NOTIFICATIONS", "file"),
        ("MATCH_DATA_DIR", "/var/lib/match"),
        ("MATCH_RELAY_BATCH_SIZE", "16"),
        ("MATCH_RETRY_MAX", "7"),
    ]
    .into_iter()
    .collect();
    let cfg = EngineConfig::from_lookup(|key| vars.get(key).map(|v| (*v).to_string())).unwrap();
    assert_eq!(cfg.repeat_decision, RepeatPolicy::Reject);
    assert_eq!(cfg.notifications, NotificationBackendConfig::File);
    assert_eq!(cfg.data_dir.as_deref(), Some("/var/lib/match"));
    assert_eq!(cfg.relay_batch_size, 16);
    assert_eq!(cfg.retry.policy().max_retries, 7);
}

#[test]
fn test_config_from_lookup_names_bad_variable() {
    let err = EngineConfig::from_lookup(|key| {
        (key == "MATCH_RECENT_LIMIT").then(|| "ten".to_string())
    })
    .unwrap_err();
    assert!(err.starts_with("MATCH_RECENT_LIMIT"), "{err}");
}
