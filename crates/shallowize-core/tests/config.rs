//! Tests for run configuration resolution through the public API

use std::path::PathBuf;
use std::time::Duration;

use shallowize_core::compact::Strategy;
use shallowize_core::config::{resolve, GlobalConfig, Overrides, DEFAULT_REMOTE};
use shallowize_core::error::{ExitCode, ShallowizeError};

fn global_from(text: &str) -> GlobalConfig {
    toml::from_str(text).unwrap()
}

#[test]
fn test_flags_win_over_config_file() {
    let global = global_from(
        r#"
root = "/from/config"
limit = 10
strategy = "fetch"
remote = "upstream"
timeout_secs = 30
"#,
    );
    let overrides = Overrides {
        root: Some(PathBuf::from("/from/flag")),
        limit: Some(2),
        strategy: Some(Strategy::Replace),
        ..Overrides::default()
    };

    let config = resolve(overrides, &global).unwrap();
    assert_eq!(config.root, PathBuf::from("/from/flag"));
    assert_eq!(config.limit, Some(2));
    assert_eq!(config.strategy, Strategy::Replace);
    assert_eq!(config.remote, "upstream");
    assert_eq!(config.command_timeout, Some(Duration::from_secs(30)));
}

#[test]
fn test_config_file_fills_missing_flags() {
    let global = global_from("root = \"/srv/src\"\nprune_now = true\n");

    let config = resolve(Overrides::default(), &global).unwrap();
    assert_eq!(config.root, PathBuf::from("/srv/src"));
    assert!(config.prune_now);
    assert_eq!(config.remote, DEFAULT_REMOTE);
    assert_eq!(config.strategy, Strategy::Replace);
    assert!(config.limit.is_none());
    assert!(config.command_timeout.is_none());
}

#[test]
fn test_zero_timeout_is_usage_error() {
    let overrides = Overrides {
        root: Some(PathBuf::from("/srv/src")),
        timeout_secs: Some(0),
        ..Overrides::default()
    };

    let err = resolve(overrides, &GlobalConfig::default()).unwrap_err();
    assert!(matches!(err, ShallowizeError::UsageError(_)));
    assert_eq!(err.exit_code(), ExitCode::Usage);
}

#[test]
fn test_unknown_config_key_rejected() {
    assert!(toml::from_str::<GlobalConfig>("depth = 1\n").is_err());
}
