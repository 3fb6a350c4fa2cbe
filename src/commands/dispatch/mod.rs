//! Command dispatch logic for shallowize

use std::time::Instant;

use crate::cli::{Cli, Commands};
use shallowize_core::config::{self, GlobalConfig, Overrides};
use shallowize_core::error::Result;
use tracing::debug;

mod command;

pub use command::{Command, CommandContext};

use super::compact::CompactCommand;
use super::list::ListCommand;

pub fn run(cli: &Cli, start: Instant) -> Result<()> {
    let global = GlobalConfig::load()?;
    let config = config::resolve(overrides(cli), &global)?;

    debug!(elapsed = ?start.elapsed(), "resolve_config");

    let ctx = CommandContext::new(cli, config, start);

    match cli.command {
        None | Some(Commands::Compact) => CompactCommand.execute(&ctx),
        Some(Commands::List) => ListCommand.execute(&ctx),
    }
}

fn overrides(cli: &Cli) -> Overrides {
    Overrides {
        root: cli.root.clone(),
        limit: cli.limit,
        strategy: cli.strategy,
        remote: cli.remote.clone(),
        prune_now: cli.prune_now,
        timeout_secs: cli.timeout_secs,
    }
}
