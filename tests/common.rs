use assert_cmd::{cargo::cargo_bin_cmd, Command};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

/// A shallowize command isolated from the user's config and environment
pub fn shallowize(config_dir: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("shallowize");
    cmd.env("SHALLOWIZE_CONFIG_DIR", config_dir)
        .env_remove("SHALLOWIZE_ROOT")
        .env_remove("SHALLOWIZE_LOG")
        .env_remove("RUST_LOG");
    cmd
}

#[allow(dead_code)]
pub fn git_available() -> bool {
    process::Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Run git in `dir` with a fixed identity and return trimmed stdout
#[allow(dead_code)]
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = process::Command::new("git")
        .arg("-C")
        .arg(dir)
        .args([
            "-c",
            "user.name=Test",
            "-c",
            "user.email=test@example.com",
            "-c",
            "commit.gpgsign=false",
        ])
        .args(args)
        .output()
        .expect("failed to run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Incompressible bytes so each commit adds real weight to the history
#[allow(dead_code)]
pub fn noise(seed: u64, len: usize) -> Vec<u8> {
    let mut state = seed.wrapping_mul(0x9E37_79B9_7F4A_7C15) | 1;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            (state >> 24) as u8
        })
        .collect()
}

/// Create a bare upstream with `commits` commits and check it out at `dest`
#[allow(dead_code)]
pub fn checked_out_repo(fixtures: &Path, dest: &Path, commits: usize) -> PathBuf {
    let seed = fixtures.join("seed");
    fs::create_dir_all(&seed).unwrap();
    git(&seed, &["init", "-q"]);
    for i in 0..commits {
        fs::write(seed.join("blob.bin"), noise(i as u64 + 1, 32 * 1024)).unwrap();
        fs::write(seed.join("README.md"), format!("revision {}\n", i)).unwrap();
        git(&seed, &["add", "-A"]);
        git(&seed, &["commit", "-q", "-m", &format!("commit {}", i)]);
    }

    let bare = fixtures.join("upstream.git");
    git(
        fixtures,
        &["clone", "-q", "--bare", "seed", bare.to_str().unwrap()],
    );

    fs::create_dir_all(dest.parent().unwrap()).unwrap();
    git(
        fixtures,
        &[
            "clone",
            "-q",
            "--no-hardlinks",
            bare.to_str().unwrap(),
            dest.to_str().unwrap(),
        ],
    );
    bare
}
