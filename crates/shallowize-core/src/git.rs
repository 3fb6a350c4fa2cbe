//! Git subprocess wrapper
//!
//! Every operation shallowize needs from version control goes through the
//! `git` binary. Each call is blocking and optionally bounded by a timeout;
//! a failed call becomes a `Compaction` error carrying the command's output.

use std::collections::BTreeSet;
use std::ffi::{OsStr, OsString};
use std::io::Read;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use wait_timeout::ChildExt;

use crate::error::{Result, ShallowizeError};
use crate::trace_time;

/// Handle for invoking the git command line tool
#[derive(Debug, Clone)]
pub struct Git {
    program: OsString,
    timeout: Option<Duration>,
}

impl Default for Git {
    fn default() -> Self {
        Self::new()
    }
}

impl Git {
    /// Use `git` from `PATH` with no timeout
    pub fn new() -> Self {
        Self {
            program: OsString::from("git"),
            timeout: None,
        }
    }

    /// Use a different executable in place of `git`
    pub fn with_program(mut self, program: impl Into<OsString>) -> Self {
        self.program = program.into();
        self
    }

    /// Kill any single command that runs longer than `timeout`
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Check if git is available on the system
    pub fn is_available(&self) -> bool {
        Command::new(&self.program)
            .arg("--version")
            .stdin(Stdio::null())
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    /// List uncommitted changes (staged, unstaged and untracked), one per line
    pub fn status_porcelain(&self, repo: &Path) -> Result<String> {
        self.run(repo, "read status", ["status", "--porcelain"])
    }

    /// Whether any stash entries exist
    pub fn has_stash(&self, repo: &Path) -> Result<bool> {
        let output = self.output(
            repo,
            "read stash",
            ["rev-parse", "--verify", "--quiet", "refs/stash"],
        )?;
        Ok(output.status.success())
    }

    /// List commits on local branches that no remote-tracking ref contains
    pub fn unpushed_commits(&self, repo: &Path) -> Result<String> {
        self.run(
            repo,
            "list unpushed commits",
            ["log", "--branches", "--not", "--remotes", "--oneline"],
        )
    }

    /// Paths of linked worktrees; the main worktree is not included
    pub fn linked_worktrees(&self, repo: &Path) -> Result<Vec<String>> {
        let out = self.run(repo, "list worktrees", ["worktree", "list", "--porcelain"])?;
        // The main worktree is always listed first
        Ok(out
            .lines()
            .filter_map(|line| line.strip_prefix("worktree "))
            .skip(1)
            .map(str::to_string)
            .collect())
    }

    /// Local tags as `(ref name, object id)` pairs
    pub fn local_tags(&self, repo: &Path) -> Result<BTreeSet<(String, String)>> {
        let out = self.run(
            repo,
            "list tags",
            [
                "for-each-ref",
                "--format=%(refname) %(objectname)",
                "refs/tags",
            ],
        )?;
        Ok(out
            .lines()
            .filter_map(|line| line.split_once(' '))
            .map(|(name, oid)| (name.to_string(), oid.to_string()))
            .collect())
    }

    /// Tags advertised by `remote` as `(ref name, object id)` pairs
    pub fn remote_tags(&self, repo: &Path, remote: &str) -> Result<BTreeSet<(String, String)>> {
        let out = self.run(repo, "list remote tags", ["ls-remote", "--tags", remote])?;
        Ok(out
            .lines()
            .filter_map(|line| line.split_once('\t'))
            .filter(|(_, name)| !name.ends_with("^{}"))
            .map(|(oid, name)| (name.to_string(), oid.to_string()))
            .collect())
    }

    /// Get the configured URL of a remote
    pub fn remote_url(&self, repo: &Path, remote: &str) -> Result<String> {
        let url = self.run(repo, "read url", ["remote", "get-url", remote])?;
        if url.is_empty() {
            return Err(ShallowizeError::compaction(
                "read url",
                "",
                format!("remote '{}' has no url", remote),
            ));
        }
        Ok(url)
    }

    /// Point a remote at a new URL
    pub fn set_remote_url(&self, repo: &Path, remote: &str, url: &str) -> Result<()> {
        self.run(repo, "restore remote url", ["remote", "set-url", remote, url])?;
        Ok(())
    }

    /// Get the current branch name, or `None` when HEAD is detached
    pub fn current_branch(&self, repo: &Path) -> Result<Option<String>> {
        let branch = self.run(repo, "read branch", ["rev-parse", "--abbrev-ref", "HEAD"])?;
        if branch == "HEAD" {
            Ok(None)
        } else {
            Ok(Some(branch))
        }
    }

    /// Resolve a revision to a commit id
    pub fn rev_parse(&self, repo: &Path, rev: &str) -> Result<String> {
        let revspec = format!("{}^{{commit}}", rev);
        self.run(repo, "resolve revision", ["rev-parse", "--verify", revspec.as_str()])
    }

    /// Whether the repository's history is truncated
    pub fn is_shallow(&self, repo: &Path) -> Result<bool> {
        let out = self.run(
            repo,
            "read shallow state",
            ["rev-parse", "--is-shallow-repository"],
        )?;
        Ok(out == "true")
    }

    /// List untracked files ignored by the repository's exclude rules.
    ///
    /// Wholly ignored directories are reported once with a trailing `/`.
    pub fn ignored_paths(&self, repo: &Path) -> Result<Vec<String>> {
        let out = self.run_raw(
            repo,
            "list ignored files",
            [
                "ls-files",
                "-z",
                "--others",
                "--ignored",
                "--exclude-standard",
                "--directory",
            ],
        )?;
        Ok(out
            .split('\0')
            .filter(|entry| !entry.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Clone `url` into `target` keeping only the most recent revision.
    ///
    /// `cwd` anchors relative URLs, the same way they resolve for the
    /// repository they were read from.
    pub fn clone_shallow(
        &self,
        cwd: &Path,
        url: &str,
        remote: &str,
        branch: Option<&str>,
        target: &Path,
    ) -> Result<()> {
        let mut args: Vec<&OsStr> = vec![
            OsStr::new("clone"),
            OsStr::new("--depth=1"),
            OsStr::new("--origin"),
            OsStr::new(remote),
        ];
        if let Some(branch) = branch {
            args.push(OsStr::new("--branch"));
            args.push(OsStr::new(branch));
        }
        args.push(OsStr::new(url));
        args.push(target.as_os_str());
        self.run(cwd, "re-clone", args)?;
        Ok(())
    }

    /// Fetch `branch` from `remote` with history limited to one revision
    pub fn fetch_shallow(&self, repo: &Path, remote: &str, branch: &str) -> Result<()> {
        self.run(repo, "fetch", ["fetch", "--depth=1", remote, branch])?;
        Ok(())
    }

    /// Drop every reflog entry so old history becomes unreachable
    pub fn expire_reflog(&self, repo: &Path) -> Result<()> {
        self.run(
            repo,
            "expire reflog",
            ["reflog", "expire", "--expire=now", "--all"],
        )?;
        Ok(())
    }

    /// Reclaim space from unreachable objects
    pub fn gc(&self, repo: &Path, prune_now: bool) -> Result<()> {
        if prune_now {
            self.run(repo, "prune", ["gc", "--quiet", "--prune=now"])?;
        } else {
            self.run(repo, "prune", ["gc", "--quiet"])?;
        }
        Ok(())
    }

    /// Run a git command and return its trimmed stdout on success
    fn run<I, S>(&self, repo: &Path, step: &str, args: I) -> Result<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.run_raw(repo, step, args)
            .map(|out| out.trim().to_string())
    }

    fn run_raw<I, S>(&self, repo: &Path, step: &str, args: I) -> Result<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let output = self.output(repo, step, args)?;
        if !output.status.success() {
            return Err(ShallowizeError::compaction(
                step,
                combined_output(&output),
                output.status,
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn output<I, S>(&self, repo: &Path, step: &str, args: I) -> Result<Output>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut command = Command::new(&self.program);
        command
            .arg("-C")
            .arg(repo)
            .args(args)
            .env("GIT_TERMINAL_PROMPT", "0")
            // Read-only queries must not rewrite the index
            .env("GIT_OPTIONAL_LOCKS", "0")
            .stdin(Stdio::null());

        tracing::debug!(step, repo = %repo.display(), "git");
        let start = Instant::now();

        let output = match self.timeout {
            None => command.output(),
            Some(timeout) => match output_with_timeout(command, timeout) {
                Ok(Some(output)) => Ok(output),
                Ok(None) => {
                    tracing::warn!(step, repo = %repo.display(), ?timeout, "git command timed out");
                    return Err(ShallowizeError::compaction(
                        step,
                        "",
                        format!("timed out after {}s", timeout.as_secs()),
                    ));
                }
                Err(e) => Err(e),
            },
        };

        trace_time!(start, "git_command", step = step);
        output.map_err(|e| ShallowizeError::compaction(step, "", e))
    }
}

/// Spawn `command` and wait at most `timeout` for it to finish.
///
/// Returns `Ok(None)` when the child had to be killed.
fn output_with_timeout(mut command: Command, timeout: Duration) -> std::io::Result<Option<Output>> {
    let mut child = command
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    // Drain both pipes concurrently so a chatty child cannot block on a full pipe
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let stdout_reader = thread::spawn(move || drain(stdout));
    let stderr_reader = thread::spawn(move || drain(stderr));

    match child.wait_timeout(timeout)? {
        Some(status) => Ok(Some(Output {
            status,
            stdout: stdout_reader.join().unwrap_or_default(),
            stderr: stderr_reader.join().unwrap_or_default(),
        })),
        None => {
            let _ = child.kill();
            let _ = child.wait();
            // Readers may stay blocked if a grandchild holds the pipes open; leave them detached.
            Ok(None)
        }
    }
}

fn drain<R: Read>(pipe: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        let _ = pipe.read_to_end(&mut buf);
    }
    buf
}

fn combined_output(output: &Output) -> String {
    let mut text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    if !stderr.is_empty() {
        if !text.is_empty() {
            text.push('\n');
        }
        text.push_str(stderr);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_git_availability() {
        // Just verify the probe doesn't panic when git is missing
        let _ = Git::new().is_available();
    }

    #[test]
    fn test_missing_program_is_unavailable() {
        let git = Git::new().with_program("shallowize-no-such-git");
        assert!(!git.is_available());
    }

    #[test]
    fn test_spawn_failure_is_compaction_error() {
        let dir = tempdir().unwrap();
        let git = Git::new().with_program("shallowize-no-such-git");

        let err = git.status_porcelain(dir.path()).unwrap_err();
        match err {
            ShallowizeError::Compaction { step, .. } => assert_eq!(step, "read status"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_status_outside_repository_fails() {
        let git = Git::new();
        if !git.is_available() {
            return;
        }
        let dir = tempdir().unwrap();
        // Keep git from finding an enclosing repository
        let isolated = dir.path().join("isolated");
        std::fs::create_dir(&isolated).unwrap();
        std::fs::write(isolated.join(".git"), "gitdir: /nonexistent\n").unwrap();

        assert!(git.status_porcelain(&isolated).is_err());
    }
}
