//! Run driver: discover repositories, then measure, compact and re-measure
//! each one in turn.
//!
//! Run-level failures (an unusable root, an unreadable tree, no git) are
//! returned as errors. Anything that goes wrong inside one repository is
//! written to that repository's record and the run moves on.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::compact::{CompactOutcome, Compactor};
use crate::config::ScanConfig;
use crate::error::{Result, ShallowizeError};
use crate::git::Git;
use crate::locate::RepoLocator;
use crate::report::{Outcome, ReportMap, RepositoryRecord};
use crate::size;
use crate::trace_time;

pub struct Orchestrator {
    config: ScanConfig,
    git: Git,
    interrupted: Arc<AtomicBool>,
}

impl Orchestrator {
    pub fn new(config: ScanConfig) -> Self {
        let git = Git::new().with_timeout(config.command_timeout);
        Self {
            config,
            git,
            interrupted: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Replace the git handle
    pub fn with_git(mut self, git: Git) -> Self {
        self.git = git;
        self
    }

    /// Share a flag that, once set, stops the run before the next repository
    pub fn with_interrupt_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupted = flag;
        self
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Locate repositories under the configured root, honoring the limit
    pub fn discover(&self) -> Result<Vec<PathBuf>> {
        let start = Instant::now();
        let root = self.config.root.canonicalize().map_err(|e| {
            ShallowizeError::Configuration(format!(
                "cannot resolve scan root {}: {}",
                self.config.root.display(),
                e
            ))
        })?;

        let mut repos = RepoLocator::new(&self.config.marker).locate(&root)?;
        let found = repos.len();
        if let Some(limit) = self.config.limit {
            repos.truncate(limit);
        }

        trace_time!(start, "discover", found = found);
        tracing::info!(
            root = %root.display(),
            found,
            selected = repos.len(),
            "discovered repositories"
        );
        Ok(repos)
    }

    /// Compact every discovered repository and report the results
    pub fn run(&self) -> Result<ReportMap> {
        let repos = self.discover()?;
        if !repos.is_empty() && !self.git.is_available() {
            return Err(ShallowizeError::Configuration(
                "git not found in PATH".to_string(),
            ));
        }

        let compactor = Compactor::new(&self.git, &self.config);
        let mut report = ReportMap::new();

        for path in repos {
            let record = if self.is_interrupted() {
                self.interrupted_record(path)
            } else {
                self.process(&compactor, path)
            };
            report.insert(record);
        }

        Ok(report)
    }

    /// Discover and measure without changing anything
    pub fn survey(&self) -> Result<ReportMap> {
        let mut report = ReportMap::new();

        for path in self.discover()? {
            if self.is_interrupted() {
                report.insert(self.interrupted_record(path));
                continue;
            }
            let mut record = RepositoryRecord::new(path, self.config.strategy);
            match size::measure(&record.path) {
                Ok(bytes) => {
                    record.size_before_bytes = Some(bytes);
                    record.size_after_bytes = Some(bytes);
                }
                Err(e) => record.push_error(e.to_string()),
            }
            report.insert(record);
        }

        Ok(report)
    }

    fn process(&self, compactor: &Compactor<'_>, path: PathBuf) -> RepositoryRecord {
        let span = tracing::info_span!("repository", path = %path.display());
        let _enter = span.enter();
        let start = Instant::now();

        let mut record = RepositoryRecord::new(path, self.config.strategy);

        match size::measure(&record.path) {
            Ok(bytes) => record.size_before_bytes = Some(bytes),
            Err(e) => {
                // Without a baseline the result could not be judged, so leave it alone
                tracing::warn!(error = %e, "cannot measure repository, skipping");
                record.outcome = Outcome::Aborted;
                record.push_error(e.to_string());
                return record;
            }
        }

        match compactor.compact(&record.path) {
            CompactOutcome::Done => record.outcome = Outcome::Done,
            CompactOutcome::Aborted(e) => {
                record.outcome = Outcome::Aborted;
                record.push_error(e.to_string());
            }
            CompactOutcome::Failed(e) => {
                record.outcome = Outcome::Failed;
                record.push_error(e.to_string());
            }
        }

        match measure_after(&record.path) {
            Ok(bytes) => record.size_after_bytes = Some(bytes),
            Err(e) => {
                tracing::warn!(error = %e, "cannot measure repository after compaction");
                record.push_error(e.to_string());
            }
        }

        trace_time!(start, "process_repository");
        tracing::debug!(
            outcome = ?record.outcome,
            before = ?record.size_before_bytes,
            after = ?record.size_after_bytes,
            "repository processed"
        );
        record
    }

    fn interrupted_record(&self, path: PathBuf) -> RepositoryRecord {
        let mut record = RepositoryRecord::new(path, self.config.strategy);
        record.push_error("interrupted before processing");
        record
    }

    fn is_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }
}

fn measure_after(path: &Path) -> Result<u64> {
    if !path.exists() {
        return Err(ShallowizeError::measurement(
            path,
            "repository directory is missing",
        ));
    }
    size::measure(path)
}
