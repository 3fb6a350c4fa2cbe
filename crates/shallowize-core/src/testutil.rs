//! Git fixtures shared by unit tests

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use walkdir::WalkDir;

use crate::git::Git;

pub fn git_available() -> bool {
    Git::new().is_available()
}

/// Run git in `dir` with a throwaway identity, panicking on failure
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .arg("-C")
        .arg(dir)
        .args([
            "-c",
            "user.name=Shallowize Test",
            "-c",
            "user.email=test@example.com",
            "-c",
            "commit.gpgsign=false",
        ])
        .args(args)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Incompressible bytes so every commit adds real weight to the history
pub fn noise(seed: u64, len: usize) -> Vec<u8> {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    (0..len)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (state >> 33) as u8
        })
        .collect()
}

/// Commit every change in `repo`
pub fn commit_all(repo: &Path, message: &str) {
    git(repo, &["add", "-A"]);
    git(repo, &["commit", "-q", "-m", message]);
}

/// Build a bare upstream under `root` with `commits` revisions of a heavy file
pub fn upstream(root: &Path, name: &str, commits: u64) -> (PathBuf, PathBuf) {
    let seed = root.join(format!("{}-seed", name));
    fs::create_dir_all(&seed).unwrap();
    git(&seed, &["init", "-q"]);
    fs::write(seed.join(".gitignore"), "build/\n").unwrap();
    for i in 0..commits {
        fs::write(seed.join("x.txt"), format!("revision {}\n", i)).unwrap();
        fs::write(seed.join("blob.bin"), noise(i, 32 * 1024)).unwrap();
        commit_all(&seed, &format!("revision {}", i));
    }

    let bare = root.join(format!("{}.git", name));
    git(
        root,
        &[
            "clone",
            "-q",
            "--bare",
            seed.to_str().unwrap(),
            bare.to_str().unwrap(),
        ],
    );
    (seed, bare)
}

/// Full clone of `upstream` at `dest`
pub fn checkout(upstream: &Path, dest: &Path) {
    fs::create_dir_all(dest.parent().unwrap()).unwrap();
    git(
        dest.parent().unwrap(),
        &[
            "clone",
            "-q",
            "--no-hardlinks",
            upstream.to_str().unwrap(),
            dest.to_str().unwrap(),
        ],
    );
}

/// Every regular file under `dir` with its contents
pub fn snapshot(dir: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    WalkDir::new(dir)
        .into_iter()
        .map(|entry| entry.unwrap())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| {
            let rel = entry.path().strip_prefix(dir).unwrap().to_path_buf();
            (rel, fs::read(entry.path()).unwrap())
        })
        .collect()
}

/// Tracked files only, skipping the metadata directory
pub fn worktree(dir: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    snapshot(dir)
        .into_iter()
        .filter(|(rel, _)| !rel.starts_with(".git"))
        .collect()
}

/// Names in `dir` that look like staging directories
pub fn staging_leftovers(dir: &Path) -> Vec<String> {
    fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with(crate::compact::STAGING_PREFIX))
        .collect()
}

/// Write an executable shell script to stand in for `git`
#[cfg(unix)]
pub fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}
