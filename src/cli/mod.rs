//! CLI argument parsing for shallowize
//!
//! Global flags configure the scan; the subcommand picks between compacting
//! (the default) and a read-only listing.

pub mod parse;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use parse::{parse_format, parse_strategy};
pub use shallowize_core::compact::Strategy;
pub use shallowize_core::format::OutputFormat;

/// Shallowize - replace full git histories with shallow clones
#[derive(Parser, Debug)]
#[command(name = "shallowize")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Directory to scan for repositories [default: $GOPATH/src or ~/go/src]
    #[arg(long, global = true, env = "SHALLOWIZE_ROOT")]
    pub root: Option<PathBuf>,

    /// Process only the first N repositories found
    #[arg(long, global = true)]
    pub limit: Option<usize>,

    /// How history is truncated (replace or fetch)
    #[arg(long, global = true, value_parser = parse_strategy)]
    pub strategy: Option<Strategy>,

    /// Remote to clone or fetch from
    #[arg(long, global = true)]
    pub remote: Option<String>,

    /// Prune unreachable objects immediately (fetch strategy)
    #[arg(long, global = true)]
    pub prune_now: bool,

    /// Kill any git command running longer than this many seconds
    #[arg(long = "timeout", global = true, value_name = "SECS")]
    pub timeout_secs: Option<u64>,

    /// Output format
    #[arg(long, global = true, value_parser = parse_format, default_value = "json")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// Log each step at debug level
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Log level filter (error, warn, info, debug, trace, or a full directive)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Truncate the history of every clean repository (default)
    Compact,

    /// Discover repositories and report their sizes without changing anything
    List,
}
