//! Core types for combine-prs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One repository whose labeled PRs get combined
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryTarget {
    /// Repository owner (user or organization)
    pub owner: String,
    /// Repository name
    pub name: String,
    /// Every label a PR must carry to be selected
    pub labels: BTreeSet<String>,
    /// Token used for both the remote URL and API calls
    pub credential: Option<String>,
    /// Per-repository override of metadata generation
    pub generate_metadata: Option<bool>,
}

impl RepositoryTarget {
    /// Create a target without credential or metadata override
    pub fn new<I, S>(owner: impl Into<String>, name: impl Into<String>, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            owner: owner.into(),
            name: name.into(),
            labels: labels.into_iter().map(Into::into).collect(),
            credential: None,
            generate_metadata: None,
        }
    }

    /// `owner/name`
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// An open pull request selected for merging
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestRef {
    /// PR number, unique within its repository
    pub number: u64,
    /// Name of the PR's head branch
    pub head_branch_name: String,
    /// Commit the head branch pointed at when discovered
    pub head_commit_sha: String,
    /// Login of the PR author
    pub author_login: String,
    /// PR title
    pub title: String,
    /// Label names on the PR
    pub labels: Vec<String>,
}

impl PullRequestRef {
    /// Whether the PR carries every one of `required`
    pub fn has_all_labels<'a>(&self, required: impl IntoIterator<Item = &'a String>) -> bool {
        required
            .into_iter()
            .all(|label| self.labels.iter().any(|l| l == label))
    }
}

/// Commit details needed for build metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommitDetails {
    /// Full commit SHA
    pub sha: String,
    /// Full commit message
    pub message: String,
    /// Author name as recorded in the commit
    pub author_name: String,
    /// Author date as recorded in the commit
    pub author_date: Option<DateTime<Utc>>,
}

/// What was merged for one PR, recorded in build metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RefInfo {
    /// Head branch name
    #[serde(rename = "ref")]
    pub ref_name: String,
    /// SHA of the head commit
    pub last_commit_sha: String,
    /// Message of the head commit
    pub last_commit_message: String,
    /// Author of the head commit
    pub last_commit_author: String,
    /// Author date of the head commit
    pub last_commit_author_date: Option<DateTime<Utc>>,
    /// Repository owner
    pub repo_owner: String,
    /// Repository name
    pub repo_name: String,
    /// PR number
    pub pr_number: u64,
    /// PR title
    pub pr_title: String,
}

/// The build metadata document written at the end of a run
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BuildMetadata {
    /// Link to the CI run that produced this build
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_url: Option<String>,
    /// Ref checked out in the working copy before any merge
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_ref: Option<String>,
    /// Commit checked out in the working copy before any merge
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_commit_sha: Option<String>,
    /// Every merged PR, in processing order
    pub prs: Vec<PullRequestRef>,
    /// One entry per merged PR, in processing order
    pub refs_info: Vec<RefInfo>,
}

/// Captured output of one command execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code (`None` if the process was killed by a signal)
    pub exit_code: Option<i32>,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
}

impl CommandOutput {
    /// Successful output with the given stdout
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            exit_code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Failed output with the given exit code and stderr
    pub fn failed(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            exit_code: Some(exit_code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Whether the process exited with status zero
    pub const fn success(&self) -> bool {
        matches!(self.exit_code, Some(0))
    }

    /// One-line description of a failure, for attempt logs and errors
    pub fn failure_summary(&self) -> String {
        let status = self
            .exit_code
            .map_or_else(|| "terminated by signal".to_string(), |c| format!("exit status {c}"));
        let detail = if self.stderr.trim().is_empty() {
            self.stdout.trim()
        } else {
            self.stderr.trim()
        };
        if detail.is_empty() {
            status
        } else {
            format!("{status}: {detail}")
        }
    }
}

/// How open PRs are discovered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiscoveryMode {
    /// Label search through the search API
    #[default]
    Search,
    /// List every open PR and filter labels locally
    List,
}

impl std::fmt::Display for DiscoveryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Search => write!(f, "search"),
            Self::List => write!(f, "list"),
        }
    }
}
