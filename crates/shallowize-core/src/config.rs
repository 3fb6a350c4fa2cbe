//! Run configuration for shallowize
//!
//! The scan root and compaction settings are resolved once, before the
//! orchestrator starts, with precedence: command-line flag, then the global
//! config file, then the environment fallback, then built-in defaults.

pub mod global;

use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use crate::bail_usage;
use crate::compact::Strategy;
use crate::error::{Result, ShallowizeError};

pub use global::GlobalConfig;

/// Remote used as the clone/fetch source when none is configured
pub const DEFAULT_REMOTE: &str = "origin";

/// Directory name that marks a repository root
pub const DEFAULT_MARKER: &str = ".git";

/// Fully resolved settings for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    /// Directory to search for repositories
    pub root: PathBuf,
    /// Process only the first N discovered repositories
    pub limit: Option<usize>,
    /// How history is truncated
    pub strategy: Strategy,
    /// Name of the upstream remote
    pub remote: String,
    /// Run gc with `--prune=now` after an in-place fetch
    pub prune_now: bool,
    /// Metadata directory that marks a repository root
    pub marker: String,
    /// Kill any single git command that runs longer than this
    pub command_timeout: Option<Duration>,
}

impl ScanConfig {
    /// Create a config for `root` with default settings
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            limit: None,
            strategy: Strategy::default(),
            remote: DEFAULT_REMOTE.to_string(),
            prune_now: false,
            marker: DEFAULT_MARKER.to_string(),
            command_timeout: None,
        }
    }
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub root: Option<PathBuf>,
    pub limit: Option<usize>,
    pub strategy: Option<Strategy>,
    pub remote: Option<String>,
    pub prune_now: bool,
    pub timeout_secs: Option<u64>,
}

/// Merge command-line overrides with the global config and environment
pub fn resolve(overrides: Overrides, global: &GlobalConfig) -> Result<ScanConfig> {
    let root = match overrides.root.or_else(|| global.root.clone()) {
        Some(root) => root,
        None => default_root(std::env::var_os("GOPATH"), dirs::home_dir())?,
    };

    let limit = overrides.limit.or(global.limit);
    if limit == Some(0) {
        bail_usage!("--limit must be at least 1");
    }

    let timeout_secs = overrides.timeout_secs.or(global.timeout_secs);
    if timeout_secs == Some(0) {
        bail_usage!("--timeout must be at least 1 second");
    }

    let mut config = ScanConfig::new(root);
    config.limit = limit;
    config.strategy = overrides
        .strategy
        .or(global.strategy)
        .unwrap_or_default();
    config.remote = overrides
        .remote
        .or_else(|| global.remote.clone())
        .unwrap_or_else(|| DEFAULT_REMOTE.to_string());
    config.prune_now = overrides.prune_now || global.prune_now.unwrap_or(false);
    config.command_timeout = timeout_secs.map(Duration::from_secs);

    tracing::debug!(
        root = %config.root.display(),
        strategy = %config.strategy,
        remote = %config.remote,
        limit = ?config.limit,
        "resolved configuration"
    );

    Ok(config)
}

/// Derive the scan root when none is configured.
///
/// Uses the first entry of `GOPATH` joined with `src`, falling back to
/// `<home>/go/src`.
pub fn default_root(gopath: Option<OsString>, home: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(first) = gopath
        .as_deref()
        .and_then(|value| std::env::split_paths(value).next())
        .filter(|path| !path.as_os_str().is_empty())
    {
        return Ok(first.join("src"));
    }

    let home = home.ok_or_else(|| {
        ShallowizeError::Configuration(
            "GOPATH is unset and the home directory cannot be determined; pass --root".to_string(),
        )
    })?;
    Ok(home.join("go").join("src"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_root_prefers_gopath() {
        let root = default_root(
            Some(OsString::from("/opt/go")),
            Some(PathBuf::from("/home/dev")),
        )
        .unwrap();
        assert_eq!(root, PathBuf::from("/opt/go/src"));
    }

    #[cfg(unix)]
    #[test]
    fn test_default_root_uses_first_gopath_entry() {
        let root = default_root(Some(OsString::from("/a/go:/b/go")), None).unwrap();
        assert_eq!(root, PathBuf::from("/a/go/src"));
    }

    #[test]
    fn test_default_root_falls_back_to_home() {
        let root = default_root(Some(OsString::new()), Some(PathBuf::from("/home/dev"))).unwrap();
        assert_eq!(root, PathBuf::from("/home/dev/go/src"));
    }

    #[test]
    fn test_default_root_without_home_is_configuration_error() {
        let err = default_root(None, None).unwrap_err();
        assert!(matches!(err, ShallowizeError::Configuration(_)));
    }

    #[test]
    fn test_flags_override_global_config() {
        let global = GlobalConfig {
            root: Some(PathBuf::from("/from/file")),
            limit: Some(10),
            strategy: Some(Strategy::Fetch),
            remote: Some("upstream".to_string()),
            prune_now: Some(true),
            timeout_secs: Some(30),
        };
        let overrides = Overrides {
            root: Some(PathBuf::from("/from/flag")),
            limit: Some(1),
            strategy: Some(Strategy::Replace),
            ..Default::default()
        };

        let config = resolve(overrides, &global).unwrap();
        assert_eq!(config.root, PathBuf::from("/from/flag"));
        assert_eq!(config.limit, Some(1));
        assert_eq!(config.strategy, Strategy::Replace);
        assert_eq!(config.remote, "upstream");
        assert!(config.prune_now);
        assert_eq!(config.command_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_defaults_when_nothing_configured() {
        let overrides = Overrides {
            root: Some(PathBuf::from("/src")),
            ..Default::default()
        };
        let config = resolve(overrides, &GlobalConfig::default()).unwrap();
        assert_eq!(config, ScanConfig::new("/src"));
        assert_eq!(config.marker, ".git");
        assert_eq!(config.remote, "origin");
    }

    #[test]
    fn test_zero_limit_is_usage_error() {
        let overrides = Overrides {
            root: Some(PathBuf::from("/src")),
            limit: Some(0),
            ..Default::default()
        };
        let err = resolve(overrides, &GlobalConfig::default()).unwrap_err();
        assert!(matches!(err, ShallowizeError::UsageError(_)));
    }
}
