//! Error types and exit codes for shallowize
//!
//! Exit codes:
//! - 0: Success
//! - 1: Generic failure
//! - 2: Usage error (bad flags/args)
//! - 3: Configuration or discovery error (scan root unusable, tree unreadable)

mod macros;

use std::path::PathBuf;

use thiserror::Error;

/// Exit codes for the shallowize binary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Success (0)
    Success = 0,
    /// Generic failure (1)
    Failure = 1,
    /// Usage error - bad flags/args (2)
    Usage = 2,
    /// Configuration/discovery error (3)
    Config = 3,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

/// Errors that can occur during a shallowize run.
///
/// `Configuration` and `Discovery` are run-level and abort the whole run.
/// The remaining repository-scoped variants are rendered into the record of
/// the repository they happened in.
#[derive(Error, Debug)]
pub enum ShallowizeError {
    // Usage errors (exit code 2)
    #[error("unknown format: {0} (expected: json or human)")]
    UnknownFormat(String),

    #[error("unknown strategy: {0} (expected: replace or fetch)")]
    UnknownStrategy(String),

    #[error("{0}")]
    UsageError(String),

    // Run-level errors (exit code 3)
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("cannot read {path:?} during discovery: {reason}")]
    Discovery { path: PathBuf, reason: String },

    // Repository-scoped errors
    #[error("dirty or unreadable:\n\tout: {output}\n\terr: {reason}")]
    DirtyRepository { output: String, reason: String },

    #[error("unable to {step}:\n\tout: {output}\n\terr: {reason}")]
    Compaction {
        step: String,
        output: String,
        reason: String,
    },

    #[error("unable to measure {path:?}: {reason}")]
    Measurement { path: PathBuf, reason: String },

    // Generic failures (exit code 1)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl ShallowizeError {
    /// Create a compaction error for a failed step
    pub fn compaction(
        step: impl Into<String>,
        output: impl Into<String>,
        reason: impl std::fmt::Display,
    ) -> Self {
        ShallowizeError::Compaction {
            step: step.into(),
            output: output.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a measurement error for a probe that could not finish
    pub fn measurement(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        ShallowizeError::Measurement {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a discovery error for an unreadable directory
    pub fn discovery(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        ShallowizeError::Discovery {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error should abort the whole run rather than a single repository
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ShallowizeError::Configuration(_) | ShallowizeError::Discovery { .. }
        )
    }

    /// Get the appropriate exit code for this error
    pub fn exit_code(&self) -> ExitCode {
        match self {
            ShallowizeError::UnknownFormat(_)
            | ShallowizeError::UnknownStrategy(_)
            | ShallowizeError::UsageError(_) => ExitCode::Usage,

            ShallowizeError::Configuration(_) | ShallowizeError::Discovery { .. } => {
                ExitCode::Config
            }

            ShallowizeError::DirtyRepository { .. }
            | ShallowizeError::Compaction { .. }
            | ShallowizeError::Measurement { .. }
            | ShallowizeError::Json(_)
            | ShallowizeError::Other(_) => ExitCode::Failure,
        }
    }

    /// Get the error type identifier
    fn error_type(&self) -> &'static str {
        match self {
            ShallowizeError::UnknownFormat(_) => "unknown_format",
            ShallowizeError::UnknownStrategy(_) => "unknown_strategy",
            ShallowizeError::UsageError(_) => "usage_error",
            ShallowizeError::Configuration(_) => "configuration_error",
            ShallowizeError::Discovery { .. } => "discovery_error",
            ShallowizeError::DirtyRepository { .. } => "dirty_repository",
            ShallowizeError::Compaction { .. } => "compaction_error",
            ShallowizeError::Measurement { .. } => "measurement_error",
            ShallowizeError::Json(_) => "json_error",
            ShallowizeError::Other(_) => "other",
        }
    }

    /// Convert error to JSON representation for structured error output.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "error": {
                "code": self.exit_code() as i32,
                "type": self.error_type(),
                "message": self.to_string(),
            }
        })
    }
}

/// Result type alias for shallowize operations
pub type Result<T> = std::result::Result<T, ShallowizeError>;
