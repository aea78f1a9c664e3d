//! Top-level run controller
//!
//! Drives every configured repository through the merge engine, strictly one
//! after the other, and writes build metadata once at the end.

use crate::config::Config;
use crate::discovery::discover_pull_requests;
use crate::error::Result;
use crate::exec::CommandExecutor;
use crate::git::{Git, remote_url};
use crate::merge::{MergePlan, create_merge_plan, execute_merge, prepare_remote};
use crate::metadata::{BaseSnapshot, MetadataAggregator, RunContext};
use crate::platform::PlatformService;
use crate::types::RepositoryTarget;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

/// Outcome of one repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryReport {
    /// `owner/name`
    pub repository: String,
    /// Merged PR numbers, in merge order
    pub merged: Vec<u64>,
}

/// Outcome of a successful run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// One entry per repository, in processing order
    pub repositories: Vec<RepositoryReport>,
    /// Metadata file, when one was written
    pub metadata_path: Option<PathBuf>,
}

impl RunReport {
    /// Total merged PRs across repositories
    pub fn merged_count(&self) -> usize {
        self.repositories.iter().map(|r| r.merged.len()).sum()
    }
}

/// Combine the labeled PRs of every configured repository
///
/// `make_platform` builds the API client for a repository. The first error
/// aborts the run and names the repository it happened in; the working copy
/// is left clean when that error is a merge conflict.
pub async fn run_combine<F>(
    config: &Config,
    executor: &dyn CommandExecutor,
    make_platform: F,
    context: RunContext,
    invocation_dir: &Path,
) -> Result<RunReport>
where
    F: Fn(&RepositoryTarget) -> Result<Box<dyn PlatformService>>,
{
    let git = Git::new(executor, &config.working_directory, config.retry_budget());

    if config.skip_identity {
        info!("skipping identity configuration");
    } else {
        git.configure_identity(&config.identity.name, &config.identity.email)
            .await?;
    }

    // Base is captured before the first merge of the run
    let base = if config.any_metadata_enabled() {
        capture_base(&git).await?
    } else {
        BaseSnapshot::default()
    };

    let mut aggregator = MetadataAggregator::new(context, config.detail_concurrency);
    let mut report = RunReport::default();

    for target in &config.repositories {
        let slug = target.slug();
        let platform = make_platform(target).map_err(|e| e.in_repository(&slug))?;
        let repository = combine_repository(
            config,
            &git,
            platform.as_ref(),
            target,
            &base,
            &mut aggregator,
        )
        .await
        .map_err(|e| e.in_repository(&slug))?;
        report.repositories.push(repository);
    }

    report.metadata_path = aggregator.finish(&config.metadata_path(invocation_dir))?;
    info!(
        repositories = report.repositories.len(),
        merged = report.merged_count(),
        "run complete"
    );
    Ok(report)
}

/// Process one repository: configure remote, discover, merge, record metadata
///
/// `base` is only used if this repository creates the metadata document.
#[instrument(skip_all, fields(repository = %target.slug()))]
pub async fn combine_repository(
    config: &Config,
    git: &Git<'_>,
    platform: &dyn PlatformService,
    target: &RepositoryTarget,
    base: &BaseSnapshot,
    aggregator: &mut MetadataAggregator,
) -> Result<RepositoryReport> {
    let url = remote_url(
        &config.host,
        &target.owner,
        &target.name,
        target.credential.as_deref(),
    )?;
    prepare_remote(git, &url).await?;

    let prs = discover_pull_requests(
        platform,
        target,
        config.discovery,
        config.detail_concurrency,
    )
    .await?;
    let plan = create_merge_plan(target, &prs);
    let result = execute_merge(&plan, git).await?;

    if config.metadata_enabled_for(target) {
        aggregator
            .accumulate(platform, target, &result.merged, base)
            .await?;
    }

    Ok(RepositoryReport {
        repository: result.repository,
        merged: result.merged.iter().map(|pr| pr.number).collect(),
    })
}

/// Discover and plan every repository without touching the working copy
pub async fn plan_combine<F>(config: &Config, make_platform: F) -> Result<Vec<MergePlan>>
where
    F: Fn(&RepositoryTarget) -> Result<Box<dyn PlatformService>>,
{
    let mut plans = Vec::with_capacity(config.repositories.len());
    for target in &config.repositories {
        let slug = target.slug();
        let platform = make_platform(target).map_err(|e| e.in_repository(&slug))?;
        let prs = discover_pull_requests(
            platform.as_ref(),
            target,
            config.discovery,
            config.detail_concurrency,
        )
        .await?;
        plans.push(create_merge_plan(target, &prs));
    }
    Ok(plans)
}

async fn capture_base(git: &Git<'_>) -> Result<BaseSnapshot> {
    Ok(BaseSnapshot {
        base_ref: Some(git.current_ref().await?),
        base_commit_sha: Some(git.head_sha().await?),
    })
}
