//! Carry ignored files from a replaced repository into its shallow clone

use std::fs;
use std::io;
use std::path::Path;

use crate::error::{Result, ShallowizeError};

/// Move each ignored path (relative, as listed by git) from `from` to `to`.
///
/// Entries that no longer exist are skipped. An entry whose destination is
/// already occupied is an error, so nothing is silently left behind.
pub(super) fn move_ignored(from: &Path, to: &Path, paths: &[String]) -> Result<()> {
    let mut moved = 0usize;

    for rel in paths {
        let rel = rel.trim_end_matches('/');
        if rel.is_empty() {
            continue;
        }
        let src = from.join(rel);
        let dst = to.join(rel);

        match fs::symlink_metadata(&src) {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
            Err(e) => return Err(carry_error(rel, e)),
        }
        if fs::symlink_metadata(&dst).is_ok() {
            return Err(carry_error(rel, "destination already exists in the clone"));
        }

        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent).map_err(|e| carry_error(rel, e))?;
        }
        fs::rename(&src, &dst).map_err(|e| carry_error(rel, e))?;
        moved += 1;
    }

    if moved > 0 {
        tracing::debug!(moved, "carried ignored files into clone");
    }
    Ok(())
}

fn carry_error(rel: &str, reason: impl std::fmt::Display) -> ShallowizeError {
    ShallowizeError::compaction("carry ignored files", rel.to_string(), reason)
}
