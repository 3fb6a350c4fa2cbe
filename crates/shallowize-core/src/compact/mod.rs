//! History truncation for a single repository
//!
//! Every compaction runs the same state machine:
//!
//! 1. Safety check - the repository must have nothing that truncation could
//!    lose. A failed or non-empty check ends in [`CompactOutcome::Aborted`]
//!    without touching anything.
//! 2. Compact - shrink history with the configured [`Strategy`].
//! 3. Done.
//!
//! A failure after the safety check ends in [`CompactOutcome::Failed`]. The
//! original repository is only removed once a verified replacement is in
//! place.

mod carry;
mod fetch;
mod replace;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::ScanConfig;
use crate::error::{Result, ShallowizeError};
use crate::git::Git;

/// Name prefix of the sibling directory a replacement is staged in
pub const STAGING_PREFIX: &str = ".shallowize-";

/// How a repository's history is truncated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Clone a depth-1 copy next to the repository and swap it in
    #[default]
    Replace,
    /// Fetch at depth 1 in place, then expire reflogs and gc
    Fetch,
}

impl FromStr for Strategy {
    type Err = ShallowizeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "replace" => Ok(Strategy::Replace),
            "fetch" => Ok(Strategy::Fetch),
            other => Err(ShallowizeError::UnknownStrategy(other.to_string())),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Replace => write!(f, "replace"),
            Strategy::Fetch => write!(f, "fetch"),
        }
    }
}

/// Terminal state of one compaction
#[derive(Debug)]
pub enum CompactOutcome {
    /// History was truncated
    Done,
    /// The safety check refused; nothing was changed
    Aborted(ShallowizeError),
    /// A compaction step failed; the repository was left recoverable
    Failed(ShallowizeError),
}

/// Truncates repository history according to a [`ScanConfig`]
#[derive(Debug)]
pub struct Compactor<'a> {
    git: &'a Git,
    strategy: Strategy,
    remote: &'a str,
    prune_now: bool,
}

impl<'a> Compactor<'a> {
    pub fn new(git: &'a Git, config: &'a ScanConfig) -> Self {
        Self {
            git,
            strategy: config.strategy,
            remote: &config.remote,
            prune_now: config.prune_now,
        }
    }

    /// Run the safety check and, if it passes, truncate history
    pub fn compact(&self, repo: &Path) -> CompactOutcome {
        if let Err(e) = self.check_clean(repo) {
            tracing::warn!(error = %e, "skipping repository");
            return CompactOutcome::Aborted(e);
        }

        let result = match self.strategy {
            Strategy::Replace => replace::run(self.git, repo, self.remote),
            Strategy::Fetch => fetch::run(self.git, repo, self.remote, self.prune_now),
        };

        match result {
            Ok(()) => {
                tracing::info!(strategy = %self.strategy, "history truncated");
                CompactOutcome::Done
            }
            Err(e) => {
                tracing::warn!(error = %e, "compaction failed");
                CompactOutcome::Failed(e)
            }
        }
    }

    /// Refuse repositories holding work that truncation could discard.
    ///
    /// Uncommitted changes and stashes block every strategy; reflog expiry
    /// empties the stash too. Replacing the repository also discards linked
    /// worktrees, commits not on any remote, and tags the remote does not
    /// have.
    fn check_clean(&self, repo: &Path) -> Result<()> {
        let status = self.git.status_porcelain(repo).map_err(unreadable)?;
        if !status.is_empty() {
            return Err(dirty(status, "uncommitted changes"));
        }

        if self.git.has_stash(repo).map_err(unreadable)? {
            return Err(dirty(String::new(), "stash entries would be lost"));
        }

        if self.strategy == Strategy::Replace {
            let worktrees = self.git.linked_worktrees(repo).map_err(unreadable)?;
            if !worktrees.is_empty() {
                return Err(dirty(
                    worktrees.join("\n"),
                    "linked worktrees would be cut off",
                ));
            }
            let unpushed = self.git.unpushed_commits(repo).map_err(unreadable)?;
            if !unpushed.is_empty() {
                return Err(dirty(unpushed, "commits not pushed to any remote"));
            }
            let unpublished = self.unpublished_tags(repo)?;
            if !unpublished.is_empty() {
                return Err(dirty(
                    unpublished.join("\n"),
                    "tags missing from the remote",
                ));
            }
        }

        Ok(())
    }

    /// Local tags the remote lacks or holds at a different object
    fn unpublished_tags(&self, repo: &Path) -> Result<Vec<String>> {
        let local = self.git.local_tags(repo).map_err(unreadable)?;
        if local.is_empty() {
            return Ok(Vec::new());
        }
        let remote = self
            .git
            .remote_tags(repo, self.remote)
            .map_err(unreadable)?;
        Ok(local
            .difference(&remote)
            .map(|(name, _)| name.clone())
            .collect())
    }
}

fn dirty(output: String, reason: &str) -> ShallowizeError {
    ShallowizeError::DirtyRepository {
        output,
        reason: reason.to_string(),
    }
}

fn unreadable(err: ShallowizeError) -> ShallowizeError {
    match err {
        ShallowizeError::Compaction { output, reason, .. } => {
            ShallowizeError::DirtyRepository { output, reason }
        }
        other => ShallowizeError::DirtyRepository {
            output: String::new(),
            reason: other.to_string(),
        },
    }
}
