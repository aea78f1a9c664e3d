//! Hosting platform services
//!
//! Provides the narrow slice of the GitHub API the merge engine consumes.

mod factory;
mod github;

pub use factory::{api_base, create_platform_service};
pub use github::GitHubService;

use crate::error::Result;
use crate::types::{CommitDetails, PullRequestRef};
use async_trait::async_trait;

/// Platform service trait for PR discovery and commit lookups
///
/// One service is bound to one repository. Implementations return fully
/// materialized results: pagination never leaks to callers.
#[async_trait]
pub trait PlatformService: Send + Sync {
    /// Numbers of open PRs carrying every label in `labels`
    async fn search_pull_requests(&self, labels: &[String]) -> Result<Vec<u64>>;

    /// Every open PR with full details (legacy listing path)
    async fn list_open_pull_requests(&self) -> Result<Vec<PullRequestRef>>;

    /// Full details of one PR
    async fn get_pull_request(&self, number: u64) -> Result<PullRequestRef>;

    /// Message, author and date of one commit
    async fn get_commit(&self, sha: &str) -> Result<CommitDetails>;
}
