//! `shallowize compact` - truncate every clean repository to depth 1

use tracing::debug;

use super::dispatch::{Command, CommandContext};
use super::output::print_report;
use shallowize_core::error::Result;
use shallowize_core::report::Outcome;

pub struct CompactCommand;

impl Command for CompactCommand {
    fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let report = ctx.orchestrator().run()?;

        debug!(
            elapsed = ?ctx.start.elapsed(),
            repositories = report.len(),
            done = report.count(Outcome::Done),
            aborted = report.count(Outcome::Aborted),
            failed = report.count(Outcome::Failed),
            "compact"
        );

        print_report(ctx.cli, &report)
    }
}
