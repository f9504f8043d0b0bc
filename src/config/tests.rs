//! Tests for config functionality.

use crate::config::Config;
use crate::locks::StrategyKind;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_default_config() {
    let config = Config::default();

    assert_eq!(config.strategy, StrategyKind::Marker);
    assert_eq!(config.lock_suffix, ".lock");
    assert_eq!(config.lock_timeout_ms, Some(30_000));
    assert_eq!(config.retry_interval_ms, 50);
    assert_eq!(config.max_retry_interval_ms, 1_000);
    assert_eq!(config.lock_stale_minutes, 120);
    assert_eq!(config.max_read_attempts, 5);
    assert_eq!(config.max_write_attempts, 5);
    assert!(config.validate().is_ok());
}

#[test]
fn test_parse_minimal_yaml() {
    let config = Config::from_yaml("").unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_parse_partial_yaml() {
    let yaml = r#"
strategy: advisory
max_write_attempts: 3
"#;
    let config = Config::from_yaml(yaml).unwrap();

    assert_eq!(config.strategy, StrategyKind::Advisory);
    assert_eq!(config.max_write_attempts, 3);

    assert_eq!(config.lock_suffix, ".lock");
    assert_eq!(config.lock_timeout_ms, Some(30_000));
}

#[test]
fn test_parse_full_yaml() {
    let yaml = r#"
strategy: marker
lock_suffix: .held
lock_timeout_ms: 500
retry_interval_ms: 10
max_retry_interval_ms: 100
lock_stale_minutes: 30
max_read_attempts: 2
max_write_attempts: 7
"#;
    let config = Config::from_yaml(yaml).unwrap();

    assert_eq!(config.lock_suffix, ".held");
    assert_eq!(config.lock_timeout_ms, Some(500));
    assert_eq!(config.retry_interval_ms, 10);
    assert_eq!(config.max_retry_interval_ms, 100);
    assert_eq!(config.lock_stale_minutes, 30);
    assert_eq!(config.max_read_attempts, 2);
    assert_eq!(config.max_write_attempts, 7);
}

#[test]
fn test_null_timeout_waits_forever() {
    let config = Config::from_yaml("lock_timeout_ms: null\n").unwrap();

    assert_eq!(config.lock_timeout_ms, None);
    assert_eq!(config.wait_policy().timeout, None);
}

#[test]
fn test_unknown_fields_ignored() {
    let yaml = r#"
strategy: advisory
future_option: true
"#;
    let config = Config::from_yaml(yaml).unwrap();
    assert_eq!(config.strategy, StrategyKind::Advisory);
}

#[test]
fn test_unknown_strategy_rejected() {
    let err = Config::from_yaml("strategy: symlink\n").unwrap_err();
    assert!(err.to_string().contains("failed to parse config YAML"));
}

#[test]
fn test_validation_rejects_zero_attempts() {
    let err = Config::from_yaml("max_write_attempts: 0\n").unwrap_err();
    assert!(err.to_string().contains("max_write_attempts"));

    let err = Config::from_yaml("max_read_attempts: 0\n").unwrap_err();
    assert!(err.to_string().contains("max_read_attempts"));
}

#[test]
fn test_validation_rejects_bad_suffix() {
    assert!(Config::from_yaml("lock_suffix: \"\"\n").is_err());

    let err = Config::from_yaml("lock_suffix: /lock\n").unwrap_err();
    assert!(err.to_string().contains("path separator"));
}

#[test]
fn test_validation_rejects_inverted_intervals() {
    let yaml = r#"
retry_interval_ms: 500
max_retry_interval_ms: 100
"#;
    let err = Config::from_yaml(yaml).unwrap_err();
    assert!(err.to_string().contains("retry_interval_ms"));
}

#[test]
fn test_validation_rejects_zero_stale_minutes() {
    assert!(Config::from_yaml("lock_stale_minutes: 0\n").is_err());
}

#[test]
fn test_wait_policy_conversion() {
    let config = Config {
        lock_timeout_ms: Some(250),
        retry_interval_ms: 5,
        max_retry_interval_ms: 40,
        ..Config::default()
    };
    let policy = config.wait_policy();

    assert_eq!(policy.timeout, Some(Duration::from_millis(250)));
    assert_eq!(policy.initial_interval, Duration::from_millis(5));
    assert_eq!(policy.max_interval, Duration::from_millis(40));
}

#[test]
fn test_yaml_round_trip() {
    let config = Config {
        strategy: StrategyKind::Advisory,
        lock_timeout_ms: None,
        ..Config::default()
    };
    let yaml = config.to_yaml().unwrap();

    assert!(yaml.contains("strategy: advisory"));
    assert_eq!(Config::from_yaml(&yaml).unwrap(), config);
}

#[test]
fn test_load_from_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("recsync.yaml");
    std::fs::write(&path, "strategy: advisory\nlock_timeout_ms: 100\n").unwrap();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.strategy, StrategyKind::Advisory);
    assert_eq!(config.lock_timeout_ms, Some(100));
}

#[test]
fn test_load_missing_file_is_user_error() {
    let temp_dir = TempDir::new().unwrap();
    let err = Config::load(temp_dir.path().join("absent.yaml")).unwrap_err();
    assert!(err.to_string().contains("failed to read config file"));
}
