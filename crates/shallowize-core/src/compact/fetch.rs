//! In-place compaction
//!
//! Cheaper than replacing the repository, but other local branches and tags
//! keep their history reachable, so some stale objects can survive.

use std::path::Path;

use crate::bail_compaction;
use crate::error::{Result, ShallowizeError};
use crate::git::Git;

pub(super) fn run(git: &Git, repo: &Path, remote: &str, prune_now: bool) -> Result<()> {
    let branch = git.current_branch(repo)?.ok_or_else(|| {
        ShallowizeError::compaction("fetch", "", "HEAD is detached; no branch to fetch")
    })?;
    let head = git.rev_parse(repo, "HEAD")?;

    git.fetch_shallow(repo, remote, &branch)?;

    let fetched = git.rev_parse(repo, "FETCH_HEAD")?;
    if fetched != head {
        bail_compaction!(
            "fetch",
            format!("local HEAD {}, upstream HEAD {}", head, fetched),
            "upstream tip differs from local HEAD"
        );
    }

    // Without a completed gc the fetch reclaims nothing, so both steps must succeed
    git.expire_reflog(repo)?;
    git.gc(repo, prune_now)?;

    tracing::debug!(branch = %branch, prune_now, "pruned unreachable history");
    Ok(())
}
