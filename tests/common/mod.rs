//! Shared test helpers
//!
//! These are test utilities - not all may be used in every test binary.

#![allow(dead_code)]

pub mod mock_executor;
pub mod mock_platform;

pub use mock_executor::{MockExecutor, Reply};
pub use mock_platform::{MockPlatformService, make_commit};

use combine_prs::exec::RetryPolicy;
use combine_prs::git::RetryBudget;
use combine_prs::types::{PullRequestRef, RepositoryTarget};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Build a PR carrying `labels`, with branch `feature-{n}` and sha `sha{n}`
pub fn make_pr(number: u64, labels: &[&str]) -> PullRequestRef {
    PullRequestRef {
        number,
        head_branch_name: format!("feature-{number}"),
        head_commit_sha: format!("sha{number}"),
        author_login: "octocat".to_string(),
        title: format!("PR {number}"),
        labels: labels.iter().map(ToString::to_string).collect(),
    }
}

/// `acme/widgets` requiring `labels`
pub fn make_target(labels: &[&str]) -> RepositoryTarget {
    RepositoryTarget::new("acme", "widgets", labels.iter().copied())
}

/// Retry budget that never sleeps
pub fn immediate_budget() -> RetryBudget {
    RetryBudget {
        command_attempts: 3,
        fetch_attempts: 5,
        policy: RetryPolicy::immediate(),
    }
}

/// A real git repository in a temporary directory
pub struct TempGitRepo {
    dir: TempDir,
}

impl TempGitRepo {
    /// Initialize a repository on `main` with a local identity
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let repo = Self { dir };
        repo.git(&["init", "--quiet"]);
        repo.git(&["symbolic-ref", "HEAD", "refs/heads/main"]);
        repo.configure();
        repo
    }

    /// Clone `source` into a fresh temporary directory
    pub fn clone_from(source: &Path) -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        run_git(
            dir.path(),
            &["clone", "--quiet", &source.to_string_lossy(), "."],
        );
        let repo = Self { dir };
        repo.configure();
        repo
    }

    fn configure(&self) {
        self.git(&["config", "user.name", "Test User"]);
        self.git(&["config", "user.email", "test@example.com"]);
        self.git(&["config", "commit.gpgsign", "false"]);
    }

    /// Repository root
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Run git and return trimmed stdout, panicking on failure
    pub fn git(&self, args: &[&str]) -> String {
        run_git(self.path(), args)
    }

    /// Write `content` to `file`
    pub fn write(&self, file: &str, content: &str) {
        let path = self.path().join(file);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    /// Stage everything and commit, returning the new HEAD sha
    pub fn commit_all(&self, message: &str) -> String {
        self.git(&["add", "-A"]);
        self.git(&["commit", "--quiet", "-m", message]);
        self.head()
    }

    /// Current HEAD sha
    pub fn head(&self) -> String {
        self.git(&["rev-parse", "HEAD"])
    }

    /// Porcelain status, empty when the tree is clean
    pub fn status(&self) -> String {
        self.git(&["status", "--porcelain=v1", "-uall"])
    }
}

/// A bare repository standing in for the hosted remote
pub struct BareRemote {
    dir: TempDir,
}

impl BareRemote {
    /// Create an empty bare repository
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        run_git(dir.path(), &["init", "--quiet", "--bare"]);
        run_git(dir.path(), &["symbolic-ref", "HEAD", "refs/heads/main"]);
        Self { dir }
    }

    /// Path usable as a remote URL
    pub fn url(&self) -> String {
        self.dir.path().to_string_lossy().into_owned()
    }

    /// Path of the bare repository
    pub fn path(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }
}

fn run_git(cwd: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(cwd)
        .env("GIT_TERMINAL_PROMPT", "0")
        .output()
        .expect("failed to run git");
    assert!(
        output.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}
