//! Clone-and-replace compaction
//!
//! A depth-1 clone is staged in a hidden sibling directory, verified, and
//! then swapped in with two renames on the same filesystem. The original is
//! parked inside the staging directory and only deleted with it, after the
//! swap has succeeded.

use std::fs;
use std::path::Path;

use tempfile::TempDir;

use super::{carry, STAGING_PREFIX};
use crate::bail_compaction;
use crate::config::DEFAULT_MARKER;
use crate::error::{Result, ShallowizeError};
use crate::git::Git;

const CLONE_DIR: &str = "clone";
const PARKED_DIR: &str = "original";

pub(super) fn run(git: &Git, repo: &Path, remote: &str) -> Result<()> {
    let url = git.remote_url(repo, remote)?;
    let branch = git.current_branch(repo)?;
    let head = git.rev_parse(repo, "HEAD")?;
    let ignored = git.ignored_paths(repo)?;

    let staging = create_staging(repo)?;
    let clone_dir = staging.path().join(CLONE_DIR);

    git.clone_shallow(
        repo,
        &clone_source(repo, &url),
        remote,
        branch.as_deref(),
        &clone_dir,
    )?;
    // Keep the remote exactly as the user configured it
    git.set_remote_url(&clone_dir, remote, &url)?;
    verify_staged(git, &clone_dir, &head)?;

    let parked = staging.path().join(PARKED_DIR);
    if let Err(e) = swap(repo, &clone_dir, &parked) {
        if parked.exists() {
            // The original could not be put back; it must survive the staging cleanup
            let kept = staging.keep();
            tracing::error!(
                original = %kept.join(PARKED_DIR).display(),
                "original repository preserved outside its path"
            );
        }
        return Err(e);
    }

    if let Err(e) = carry::move_ignored(&parked, repo, &ignored) {
        let kept = staging.keep();
        tracing::error!(
            leftovers = %kept.join(PARKED_DIR).display(),
            "ignored files were not all carried over"
        );
        return Err(e);
    }

    if let Err(e) = staging.close() {
        tracing::warn!(error = %e, "failed to remove staging directory");
    }

    Ok(())
}

/// Create the staging directory next to `repo` so renames stay on one filesystem
fn create_staging(repo: &Path) -> Result<TempDir> {
    let parent = repo.parent().ok_or_else(|| {
        ShallowizeError::compaction("create staging dir", "", "repository has no parent")
    })?;
    tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .tempdir_in(parent)
        .map_err(|e| ShallowizeError::compaction("create staging dir", "", e))
}

/// Turn a local path remote into a `file://` URL.
///
/// Git ignores `--depth` for plain-path clones, so local upstreams would
/// otherwise be copied with their full history.
fn clone_source(repo: &Path, url: &str) -> String {
    if url.contains("://") || is_scp_like(url) {
        return url.to_string();
    }

    let path = repo.join(url);
    match fs::canonicalize(&path) {
        Ok(abs) => format!("file://{}", abs.display()),
        Err(_) => url.to_string(),
    }
}

/// `user@host:path` style remotes have a colon before any slash
fn is_scp_like(url: &str) -> bool {
    match (url.find(':'), url.find('/')) {
        (Some(colon), Some(slash)) => colon < slash && colon > 1,
        (Some(colon), None) => colon > 1,
        _ => false,
    }
}

/// Confirm the staged clone is complete and holds the same commit as the original
fn verify_staged(git: &Git, clone_dir: &Path, head: &str) -> Result<()> {
    if !clone_dir.join(DEFAULT_MARKER).is_dir() {
        bail_compaction!(
            "verify clone",
            clone_dir.display().to_string(),
            "clone has no metadata directory"
        );
    }

    let staged_head = git.rev_parse(clone_dir, "HEAD")?;
    if staged_head != head {
        bail_compaction!(
            "verify clone",
            format!("local HEAD {}, upstream HEAD {}", head, staged_head),
            "upstream tip differs from local HEAD"
        );
    }

    match git.is_shallow(clone_dir) {
        Ok(shallow) => tracing::debug!(shallow, "staged clone verified"),
        Err(e) => tracing::debug!(error = %e, "could not read shallow state"),
    }
    Ok(())
}

/// Move the original aside and the clone into its place.
///
/// If the second rename fails the original is moved back.
fn swap(repo: &Path, staged: &Path, parked: &Path) -> Result<()> {
    fs::rename(repo, parked)
        .map_err(|e| ShallowizeError::compaction("park original repository", "", e))?;

    if let Err(e) = fs::rename(staged, repo) {
        return match fs::rename(parked, repo) {
            Ok(()) => Err(ShallowizeError::compaction(
                "move clone into place",
                "",
                e,
            )),
            Err(restore) => Err(ShallowizeError::compaction(
                "restore original repository",
                format!("original left at {}", parked.display()),
                restore,
            )),
        };
    }

    tracing::debug!(repo = %repo.display(), "swapped in shallow clone");
    Ok(())
}
