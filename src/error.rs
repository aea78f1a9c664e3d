//! Error types for combine-prs

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the merge engine
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or unreadable configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Credential lookup failed
    #[error("authentication error: {0}")]
    Auth(String),

    /// The command could not be started at all (missing binary, bad cwd, ...)
    #[error("failed to launch `{program}`: {source}")]
    CommandLaunch {
        /// Program that was being launched
        program: String,
        /// Underlying spawn error
        #[source]
        source: std::io::Error,
    },

    /// The command kept exiting non-zero until the retry budget ran out
    #[error("`{command}` failed after {} attempt(s):\n{}", attempts.len(), format_attempts(attempts))]
    CommandFailed {
        /// Redacted command line
        command: String,
        /// One failure message per attempt, in order
        attempts: Vec<String>,
    },

    /// A PR could not be merged into the working copy
    #[error("{}", format_conflict(repository, *pr_number, files, cleanup_failed.as_deref()))]
    MergeConflict {
        /// `owner/name` of the repository being combined
        repository: String,
        /// PR whose merge failed
        pr_number: u64,
        /// Paths left with unresolved conflict markers
        files: Vec<String>,
        /// Set when the working copy could not be restored afterwards
        cleanup_failed: Option<String>,
    },

    /// GitHub API error
    #[error("GitHub API error: {0}")]
    GitHubApi(String),

    /// PR discovery for a repository failed
    #[error("PR discovery failed for {repository}: {message}")]
    Discovery {
        /// `owner/name` of the repository
        repository: String,
        /// What went wrong
        message: String,
    },

    /// A failure while combining one repository
    #[error("{repository}: {source}")]
    Repository {
        /// `owner/name` of the repository
        repository: String,
        /// What went wrong
        #[source]
        source: Box<Error>,
    },

    /// Build metadata could not be produced or written
    #[error("build metadata error: {0}")]
    Metadata(String),

    /// Failed to write the metadata file
    #[error("failed to write {path}: {source}")]
    WriteFile {
        /// Destination path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<octocrab::Error> for Error {
    fn from(err: octocrab::Error) -> Self {
        Self::GitHubApi(err.to_string())
    }
}

fn format_attempts(attempts: &[String]) -> String {
    attempts
        .iter()
        .enumerate()
        .map(|(i, msg)| format!("  attempt {}: {msg}", i + 1))
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_conflict(
    repository: &str,
    pr_number: u64,
    files: &[String],
    cleanup_failed: Option<&str>,
) -> String {
    let mut msg = format!("failed to merge PR #{pr_number} into {repository}");
    if !files.is_empty() {
        msg.push_str(&format!(": conflicts in {}", files.join(", ")));
    }
    if let Some(cleanup) = cleanup_failed {
        msg.push_str(&format!("\nworking copy was not restored: {cleanup}"));
    }
    msg
}

impl Error {
    /// Attach the repository to errors that do not already name it
    #[must_use]
    pub fn in_repository(self, repository: &str) -> Self {
        match self {
            Self::MergeConflict { .. }
            | Self::Discovery { .. }
            | Self::Metadata(_)
            | Self::Repository { .. } => self,
            other => Self::Repository {
                repository: repository.to_string(),
                source: Box::new(other),
            },
        }
    }
}

/// Result type alias for combine-prs
pub type Result<T> = std::result::Result<T, Error>;
