//! Command trait and context for dispatching commands

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::cli::Cli;
use shallowize_core::config::ScanConfig;
use shallowize_core::error::Result;
use shallowize_core::orchestrator::Orchestrator;

/// Shared context for command execution
pub struct CommandContext<'a> {
    pub cli: &'a Cli,
    pub config: ScanConfig,
    pub start: Instant,
}

impl<'a> CommandContext<'a> {
    pub fn new(cli: &'a Cli, config: ScanConfig, start: Instant) -> Self {
        Self { cli, config, start }
    }

    /// Build an orchestrator whose run stops early on Ctrl-C
    pub fn orchestrator(&self) -> Orchestrator {
        let interrupted = Arc::new(AtomicBool::new(false));
        let interrupted_clone = Arc::clone(&interrupted);

        if let Err(e) = ctrlc::set_handler(move || {
            interrupted_clone.store(true, Ordering::SeqCst);
        }) {
            tracing::warn!(error = %e, "failed to install interrupt handler");
        }

        Orchestrator::new(self.config.clone()).with_interrupt_flag(interrupted)
    }
}

/// Trait for commands that can be executed
pub trait Command {
    fn execute(&self, ctx: &CommandContext) -> Result<()>;
}
