//! PR discovery
//!
//! Finds the open PRs of one repository that carry every configured label and
//! returns them sorted by ascending number, which is the merge order.

use crate::error::{Error, Result};
use crate::platform::PlatformService;
use crate::types::{DiscoveryMode, PullRequestRef, RepositoryTarget};
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

/// Discover the PRs to merge for `target`
///
/// An empty label set yields no PRs. A failing search or listing call is
/// fatal; a failing detail lookup for a single PR skips that PR.
pub async fn discover_pull_requests(
    platform: &dyn PlatformService,
    target: &RepositoryTarget,
    mode: DiscoveryMode,
    concurrency: usize,
) -> Result<Vec<PullRequestRef>> {
    let repository = target.slug();
    if target.labels.is_empty() {
        info!(repository = %repository, "no labels configured, skipping discovery");
        return Ok(Vec::new());
    }

    let labels: Vec<String> = target.labels.iter().cloned().collect();
    let candidates = match mode {
        DiscoveryMode::Search => fetch_by_search(platform, &labels, concurrency).await,
        DiscoveryMode::List => platform.list_open_pull_requests().await,
    }
    .map_err(|e| Error::Discovery {
        repository: repository.clone(),
        message: e.to_string(),
    })?;

    let mut prs: Vec<PullRequestRef> = candidates
        .into_iter()
        .filter(|pr| {
            let keep = pr.has_all_labels(&target.labels);
            if !keep {
                debug!(repository = %repository, pr_number = pr.number, "PR lacks a required label");
            }
            keep
        })
        .collect();
    sort_by_number(&mut prs);

    info!(
        repository = %repository,
        mode = %mode,
        count = prs.len(),
        numbers = ?prs.iter().map(|pr| pr.number).collect::<Vec<_>>(),
        "discovered PRs"
    );
    Ok(prs)
}

/// Search for matching PR numbers, then fetch every detail concurrently
async fn fetch_by_search(
    platform: &dyn PlatformService,
    labels: &[String],
    concurrency: usize,
) -> Result<Vec<PullRequestRef>> {
    let numbers = platform.search_pull_requests(labels).await?;
    debug!(count = numbers.len(), "search matched PRs");

    let details: Vec<(u64, Result<PullRequestRef>)> = stream::iter(numbers)
        .map(|number| async move { (number, platform.get_pull_request(number).await) })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    Ok(details
        .into_iter()
        .filter_map(|(number, result)| match result {
            Ok(pr) => Some(pr),
            Err(e) => {
                warn!(pr_number = number, error = %e, "failed to fetch PR details, skipping");
                None
            }
        })
        .collect())
}

/// Sort ascending by number and drop duplicates
pub fn sort_by_number(prs: &mut Vec<PullRequestRef>) {
    prs.sort_by_key(|pr| pr.number);
    prs.dedup_by_key(|pr| pr.number);
}
