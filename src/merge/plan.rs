//! Merge planning - pure functions for creating merge plans
//!
//! No I/O happens here: the discovered PRs go in, an ordered list of merge
//! steps comes out.

use crate::types::{PullRequestRef, RepositoryTarget};

/// A single PR to fetch and merge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeStep {
    /// The PR being merged
    pub pr: PullRequestRef,
    /// Local branch the PR head is fetched into
    pub local_branch: String,
    /// Message of the merge commit
    pub message: String,
}

impl std::fmt::Display for MergeStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "merge PR #{} ({}): {}",
            self.pr.number, self.local_branch, self.pr.title
        )
    }
}

/// Ordered merges for one repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergePlan {
    /// `owner/name` of the repository
    pub repository: String,
    /// Steps in ascending PR number order
    pub steps: Vec<MergeStep>,
}

impl MergePlan {
    /// Check if the plan has nothing to merge
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Count planned merges
    #[must_use]
    pub fn merge_count(&self) -> usize {
        self.steps.len()
    }

    /// PR numbers in merge order
    #[must_use]
    pub fn pr_numbers(&self) -> Vec<u64> {
        self.steps.iter().map(|s| s.pr.number).collect()
    }
}

/// Create a merge plan (PURE - no I/O, easily testable)
///
/// Steps are ordered by ascending PR number whatever order `prs` arrives in,
/// and a PR listed twice is merged once. Each merge lands on top of the
/// previous one, so later PRs see earlier PRs' changes.
#[must_use]
pub fn create_merge_plan(target: &RepositoryTarget, prs: &[PullRequestRef]) -> MergePlan {
    let mut ordered = prs.to_vec();
    crate::discovery::sort_by_number(&mut ordered);

    let steps = ordered
        .into_iter()
        .map(|pr| MergeStep {
            local_branch: pr.head_branch_name.clone(),
            message: format!("Merge PR #{}: {}", pr.number, pr.title),
            pr,
        })
        .collect();

    MergePlan {
        repository: target.slug(),
        steps,
    }
}
