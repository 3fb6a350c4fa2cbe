//! `shallowize list` - discover and measure without touching anything

use tracing::debug;

use super::dispatch::{Command, CommandContext};
use super::output::print_report;
use shallowize_core::error::Result;

pub struct ListCommand;

impl Command for ListCommand {
    fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let report = ctx.orchestrator().survey()?;

        debug!(
            elapsed = ?ctx.start.elapsed(),
            repositories = report.len(),
            "list"
        );

        print_report(ctx.cli, &report)
    }
}
