//! Merge execution - effectful operations
//!
//! Takes a `MergePlan` and applies it to the working copy, one PR at a time.
//! Nothing here is retried except network fetches; a failed merge is handed
//! to the conflict reporter and ends the repository.

use crate::error::Result;
use crate::git::{Git, REMOTE};
use crate::merge::conflict::report_conflict;
use crate::merge::plan::MergePlan;
use crate::types::PullRequestRef;
use tracing::{debug, info};

/// Result of merge execution
#[derive(Debug, Clone, Default)]
pub struct MergeExecutionResult {
    /// `owner/name` of the repository
    pub repository: String,
    /// PRs merged, in merge order
    pub merged: Vec<PullRequestRef>,
}

impl MergeExecutionResult {
    /// Check if at least one PR was merged
    #[must_use]
    pub fn has_merges(&self) -> bool {
        !self.merged.is_empty()
    }
}

/// Point `origin` at the repository and refresh remote-tracking state
///
/// Run once per repository before any PR is fetched, so one working copy can
/// serve repositories with different owners and credentials.
pub async fn prepare_remote(git: &Git<'_>, remote_url: &str) -> Result<()> {
    debug!(remote = REMOTE, "configuring remote");
    git.set_remote(REMOTE, remote_url).await?;
    git.fetch(REMOTE).await?;
    Ok(())
}

/// Execute the merge plan (EFFECTFUL)
///
/// Stops at the first failed merge: the conflict reporter restores a clean
/// working copy and its error is returned.
pub async fn execute_merge(plan: &MergePlan, git: &Git<'_>) -> Result<MergeExecutionResult> {
    let mut result = MergeExecutionResult {
        repository: plan.repository.clone(),
        merged: Vec::new(),
    };

    for step in &plan.steps {
        let number = step.pr.number;
        info!(repository = %plan.repository, pr_number = number, branch = %step.local_branch, "fetching PR");
        git.fetch_pull_request(REMOTE, number, &step.local_branch)
            .await?;

        info!(repository = %plan.repository, pr_number = number, title = %step.pr.title, "merging PR");
        let output = git.merge(&step.local_branch, &step.message).await?;
        if !output.success() {
            return Err(report_conflict(git, &plan.repository, number, &output).await);
        }

        debug!(pr_number = number, stdout = %output.stdout.trim(), "merged");
        result.merged.push(step.pr.clone());
    }

    info!(
        repository = %plan.repository,
        merged = result.merged.len(),
        "all PRs merged"
    );
    Ok(result)
}
