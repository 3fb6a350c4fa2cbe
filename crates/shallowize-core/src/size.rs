//! On-disk size measurement
//!
//! Sizes are filesystem-literal: every regular file in the subtree counts,
//! including those inside repository metadata directories. Directories,
//! symbolic links and special files contribute nothing, and links are never
//! followed, so the before and after measurements of a repository agree on
//! what they count.

use std::path::Path;
use std::time::Instant;

use walkdir::WalkDir;

use crate::error::{Result, ShallowizeError};
use crate::trace_time;

/// Sum the sizes of all regular files under `dir`.
///
/// Any read error aborts the measurement rather than under-reporting.
pub fn measure(dir: &Path) -> Result<u64> {
    let start = Instant::now();
    let mut total: u64 = 0;
    let mut files: u64 = 0;

    for entry in WalkDir::new(dir).follow_links(false) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            ShallowizeError::measurement(path, e)
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        let metadata = entry
            .metadata()
            .map_err(|e| ShallowizeError::measurement(entry.path(), e))?;
        total += metadata.len();
        files += 1;
    }

    trace_time!(start, "measure", files = files, bytes = total);
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_empty_directory_is_zero() {
        let dir = tempdir().unwrap();
        assert_eq!(measure(dir.path()).unwrap(), 0);
    }

    #[test]
    fn test_sums_files_at_any_depth() {
        let dir = tempdir().unwrap();
        let deep = dir.path().join("a").join("b").join("c");
        fs::create_dir_all(&deep).unwrap();
        fs::write(dir.path().join("top.txt"), vec![0u8; 100]).unwrap();
        fs::write(dir.path().join("a").join("mid.bin"), vec![1u8; 2_500]).unwrap();
        fs::write(deep.join("leaf"), vec![2u8; 7]).unwrap();

        assert_eq!(measure(dir.path()).unwrap(), 2_607);
    }

    #[test]
    fn test_counts_metadata_directories() {
        let dir = tempdir().unwrap();
        let objects = dir.path().join(".git").join("objects");
        fs::create_dir_all(&objects).unwrap();
        fs::write(objects.join("pack"), vec![0u8; 4_096]).unwrap();
        fs::write(dir.path().join("x.txt"), "hello").unwrap();

        assert_eq!(measure(dir.path()).unwrap(), 4_101);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_are_not_counted_or_followed() {
        let dir = tempdir().unwrap();
        let outside = tempdir().unwrap();
        fs::write(outside.path().join("big"), vec![0u8; 10_000]).unwrap();
        fs::write(dir.path().join("real"), vec![0u8; 10]).unwrap();
        std::os::unix::fs::symlink(outside.path(), dir.path().join("linked-dir")).unwrap();
        std::os::unix::fs::symlink(dir.path().join("real"), dir.path().join("linked-file"))
            .unwrap();

        assert_eq!(measure(dir.path()).unwrap(), 10);
    }

    #[test]
    fn test_missing_directory_is_measurement_error() {
        let dir = tempdir().unwrap();
        let err = measure(&dir.path().join("gone")).unwrap_err();
        assert!(matches!(err, ShallowizeError::Measurement { .. }));
    }
}
