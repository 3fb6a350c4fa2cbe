//! Repository discovery
//!
//! Walks a directory tree top-down and reports every directory holding a
//! repository metadata directory. A discovered repository is never descended
//! into, so vendored or nested checkouts are neither reported nor mutated on
//! their own.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::compact::STAGING_PREFIX;
use crate::config::DEFAULT_MARKER;
use crate::error::{Result, ShallowizeError};

/// Finds repository roots beneath a directory
#[derive(Debug, Clone)]
pub struct RepoLocator {
    marker: String,
}

impl Default for RepoLocator {
    fn default() -> Self {
        Self::new(DEFAULT_MARKER)
    }
}

impl RepoLocator {
    /// Create a locator that recognizes repositories by `marker`
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }

    /// List repository roots under `root` in depth-first pre-order.
    ///
    /// Siblings are visited in file name order. Symbolic links are not
    /// followed. Any unreadable directory fails the whole discovery.
    pub fn locate(&self, root: &Path) -> Result<Vec<PathBuf>> {
        match fs::metadata(root) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                return Err(ShallowizeError::Configuration(format!(
                    "scan root is not a directory: {}",
                    root.display()
                )))
            }
            Err(e) => {
                return Err(ShallowizeError::Configuration(format!(
                    "cannot read scan root {}: {}",
                    root.display(),
                    e
                )))
            }
        }

        let mut repos = Vec::new();
        let mut walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter();

        while let Some(entry) = walker.next() {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(root).to_path_buf();
                ShallowizeError::discovery(path, e)
            })?;

            if !entry.file_type().is_dir() {
                continue;
            }

            if entry.depth() > 0 && is_staging_dir(entry.file_name()) {
                tracing::warn!(
                    path = %entry.path().display(),
                    "leftover staging directory from an interrupted compaction, skipping"
                );
                walker.skip_current_dir();
                continue;
            }

            if is_repository(entry.path(), &self.marker)? {
                tracing::debug!(path = %entry.path().display(), "found repository");
                repos.push(entry.into_path());
                walker.skip_current_dir();
            }
        }

        Ok(repos)
    }
}

/// Check whether `dir` contains the metadata directory `marker`.
///
/// A missing marker, or a marker that is not a directory (such as the
/// `.git` file of a worktree), is `false`; any other stat failure is an error.
pub fn is_repository(dir: &Path, marker: &str) -> Result<bool> {
    let path = dir.join(marker);
    match fs::metadata(&path) {
        Ok(meta) => Ok(meta.is_dir()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(ShallowizeError::discovery(path, e)),
    }
}

fn is_staging_dir(name: &std::ffi::OsStr) -> bool {
    name.to_str()
        .is_some_and(|name| name.starts_with(STAGING_PREFIX))
}
