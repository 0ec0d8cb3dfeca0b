//! Diff extraction by spawning `git`
//!
//! All operations return usable text rather than errors: a failed diff
//! (not a repository, invalid ref, git missing) produces a descriptive
//! message in place of the diff so the review can proceed and the model
//! can see what went wrong.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use git2::Repository;
use tokio::process::Command;
use tracing::{debug, warn};

use super::DiffTarget;

/// File patterns excluded from diffs (lockfiles, binaries, generated files)
const EXCLUDE_PATTERNS: &[&str] = &[
    "*.lock",
    "*.json",
    "*.svg",
    "*.png",
    "*.jpg",
    "*.woff",
    "*.woff2",
    "uv.lock",
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
];

/// Abstraction over "get the current diff" for a named target
///
/// Implementations never fail: failures are reported as descriptive text
/// so callers always receive something they can embed in a prompt.
#[async_trait]
pub trait DiffProvider: Send + Sync {
    /// Get the full diff for a target, with lockfile/binary exclusions applied
    async fn diff(&self, target: &DiffTarget, workdir: &Path) -> String;

    /// Get the diff restricted to specific files
    ///
    /// Each file's diff is prefixed with a `# Diff for:` header; files with
    /// no changes are skipped.
    async fn scoped_diff(&self, paths: &[PathBuf], target: &DiffTarget, workdir: &Path) -> String;

    /// List files with staged or unstaged changes
    async fn changed_files(&self, workdir: &Path) -> Vec<String>;
}

/// The production [`DiffProvider`] backed by the `git` binary
#[derive(Debug, Clone, Default)]
pub struct GitDiffProvider;

impl GitDiffProvider {
    /// Create a new git diff provider
    pub fn new() -> Self {
        Self
    }

    /// Run git with the given arguments, returning stdout or a descriptive error
    async fn run_git(args: &[String], workdir: &Path) -> std::result::Result<String, String> {
        debug!(args = ?args, workdir = %workdir.display(), "Running git");

        let output = Command::new("git")
            .args(args)
            .current_dir(workdir)
            .output()
            .await;

        match output {
            Ok(out) if out.status.success() => {
                Ok(String::from_utf8_lossy(&out.stdout).into_owned())
            }
            Ok(out) => Err(format!(
                "Error running git diff: {}",
                String::from_utf8_lossy(&out.stderr).trim()
            )),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err("Error: git is not installed or not in PATH".to_string())
            }
            Err(e) => Err(format!("Error running git: {}", e)),
        }
    }

    /// Check that workdir is inside a git repository
    fn check_repository(workdir: &Path) -> std::result::Result<(), String> {
        match Repository::discover(workdir) {
            Ok(_) => Ok(()),
            Err(_) => Err(format!(
                "Error: not a git repository: {}",
                workdir.display()
            )),
        }
    }
}

#[async_trait]
impl DiffProvider for GitDiffProvider {
    async fn diff(&self, target: &DiffTarget, workdir: &Path) -> String {
        if let Err(msg) = Self::check_repository(workdir) {
            return msg;
        }

        let mut args = target.diff_args();
        args.push("--".to_string());
        for pattern in EXCLUDE_PATTERNS {
            args.push(format!(":!{}", pattern));
        }

        match Self::run_git(&args, workdir).await {
            Ok(out) => out,
            Err(msg) => {
                warn!(diff_target = %target, "Diff failed: {}", msg);
                msg
            }
        }
    }

    async fn scoped_diff(&self, paths: &[PathBuf], target: &DiffTarget, workdir: &Path) -> String {
        if paths.is_empty() {
            return String::new();
        }

        if let Err(msg) = Self::check_repository(workdir) {
            return msg;
        }

        let mut sections = Vec::new();
        for path in paths {
            let displayed = path.display().to_string();
            let mut args = target.diff_args();
            args.push("--".to_string());
            args.push(displayed.clone());

            match Self::run_git(&args, workdir).await {
                Ok(out) if !out.trim().is_empty() => {
                    sections.push(format!("# Diff for: {}\n{}", displayed, out));
                }
                Ok(_) => {}
                Err(_) => {
                    sections.push(format!("# No diff available for: {}", displayed));
                }
            }
        }

        sections.join("\n\n")
    }

    async fn changed_files(&self, workdir: &Path) -> Vec<String> {
        if Self::check_repository(workdir).is_err() {
            return Vec::new();
        }

        let staged: Vec<String> = ["diff", "--staged", "--name-only"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let unstaged: Vec<String> = ["diff", "--name-only"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let mut files = BTreeSet::new();
        for args in [staged, unstaged] {
            if let Ok(out) = Self::run_git(&args, workdir).await {
                for line in out.lines() {
                    let line = line.trim();
                    if !line.is_empty() {
                        files.insert(line.to_string());
                    }
                }
            }
        }

        files.into_iter().collect()
    }
}
