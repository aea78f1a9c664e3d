//! Conflict reporting
//!
//! Called after a failed merge. Collects what a human needs to act on the
//! failure, then puts the working copy back into a clean state.

use crate::error::Error;
use crate::git::{Git, StatusEntry};
use crate::types::CommandOutput;
use tracing::{error, warn};

/// Paths with an unresolved three-way conflict
pub fn conflicted_paths(entries: &[StatusEntry]) -> Vec<String> {
    entries
        .iter()
        .filter(|e| e.is_conflict())
        .map(|e| e.path.clone())
        .collect()
}

/// Diagnose a failed merge of PR `pr_number`, restore a clean tree, and
/// return the error to propagate
///
/// Diagnostics are best-effort: a failing status or diff is logged and
/// skipped. Both cleanup steps always run; if either fails the returned
/// error says so.
pub async fn report_conflict(
    git: &Git<'_>,
    repository: &str,
    pr_number: u64,
    merge_output: &CommandOutput,
) -> Error {
    let files = match git.status().await {
        Ok(entries) => conflicted_paths(&entries),
        Err(e) => {
            warn!(repository, pr_number, error = %e, "could not read status after failed merge");
            Vec::new()
        }
    };

    if files.is_empty() {
        error!(repository, pr_number, "merge failed without conflict markers");
    } else {
        error!(repository, pr_number, files = ?files, "merge conflict");
    }

    for path in &files {
        match git.diff_path(path).await {
            Ok(diff) => error!(repository, pr_number, path = %path, "conflict in {path}:\n{diff}"),
            Err(e) => warn!(repository, pr_number, path = %path, error = %e, "could not diff conflicted file"),
        }
    }

    error!(repository, pr_number, "merge stdout:\n{}", merge_output.stdout);
    if !merge_output.stderr.trim().is_empty() {
        error!(repository, pr_number, "merge stderr:\n{}", merge_output.stderr);
    }

    let cleanup_failed = restore_clean(git).await;
    if let Some(failure) = &cleanup_failed {
        error!(repository, pr_number, error = %failure, "failed to restore a clean working copy");
    }

    Error::MergeConflict {
        repository: repository.to_string(),
        pr_number,
        files,
        cleanup_failed,
    }
}

/// Reset and clean, each attempted regardless of the other
///
/// Returns a description of whatever failed.
async fn restore_clean(git: &Git<'_>) -> Option<String> {
    let failures: Vec<String> = [
        git.reset_hard().await.err().map(|e| format!("reset: {e}")),
        git.clean().await.err().map(|e| format!("clean: {e}")),
    ]
    .into_iter()
    .flatten()
    .collect();

    (!failures.is_empty()).then(|| failures.join("; "))
}
