//! Build metadata aggregation
//!
//! Observes the same traversal as the merge engine and records which PRs and
//! head commits ended up in the combined tree. The document is created on the
//! first repository that generates metadata and written once, at the end.

use crate::error::{Error, Result};
use crate::platform::PlatformService;
use crate::types::{BuildMetadata, PullRequestRef, RefInfo, RepositoryTarget};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Run-identifying context captured once per run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunContext {
    /// Link to the CI run
    pub run_url: Option<String>,
}

impl RunContext {
    /// Build from the GitHub Actions environment
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from GitHub Actions variables read through `lookup`
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| lookup(name).filter(|v| !v.is_empty());
        let run_url = match (
            var("GITHUB_SERVER_URL"),
            var("GITHUB_REPOSITORY"),
            var("GITHUB_RUN_ID"),
        ) {
            (Some(server), Some(repo), Some(run_id)) => Some(format!(
                "{}/{repo}/actions/runs/{run_id}",
                server.trim_end_matches('/')
            )),
            _ => None,
        };
        Self { run_url }
    }
}

/// State of the working copy before any merge of a repository
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BaseSnapshot {
    /// Checked-out ref
    pub base_ref: Option<String>,
    /// Checked-out commit
    pub base_commit_sha: Option<String>,
}

/// Accumulates [`BuildMetadata`] across repositories
#[derive(Debug, Default)]
pub struct MetadataAggregator {
    context: RunContext,
    metadata: Option<BuildMetadata>,
    concurrency: usize,
}

impl MetadataAggregator {
    /// Create an aggregator that has not produced a document yet
    pub fn new(context: RunContext, concurrency: usize) -> Self {
        Self {
            context,
            metadata: None,
            concurrency: concurrency.max(1),
        }
    }

    /// The document so far, if any repository contributed
    pub const fn metadata(&self) -> Option<&BuildMetadata> {
        self.metadata.as_ref()
    }

    /// Record the merged PRs of one repository
    ///
    /// Creates the document on first use, with run context and `base` fixed from
    /// then on. Head commits are looked up concurrently; entries are appended in
    /// the order of `prs`.
    pub async fn accumulate(
        &mut self,
        platform: &dyn PlatformService,
        target: &RepositoryTarget,
        prs: &[PullRequestRef],
        base: &BaseSnapshot,
    ) -> Result<()> {
        let refs_info: Vec<RefInfo> = stream::iter(prs)
            .map(|pr| async move {
                let commit = platform.get_commit(&pr.head_commit_sha).await?;
                Ok::<_, Error>(RefInfo {
                    ref_name: pr.head_branch_name.clone(),
                    last_commit_sha: commit.sha,
                    last_commit_message: commit.message,
                    last_commit_author: commit.author_name,
                    last_commit_author_date: commit.author_date,
                    repo_owner: target.owner.clone(),
                    repo_name: target.name.clone(),
                    pr_number: pr.number,
                    pr_title: pr.title.clone(),
                })
            })
            .buffered(self.concurrency)
            .try_collect()
            .await
            .map_err(|e| Error::Metadata(format!("{}: {e}", target.slug())))?;

        let context = &self.context;
        let metadata = self.metadata.get_or_insert_with(|| {
            debug!(repository = %target.slug(), "creating build metadata");
            BuildMetadata {
                run_url: context.run_url.clone(),
                base_ref: base.base_ref.clone(),
                base_commit_sha: base.base_commit_sha.clone(),
                prs: Vec::new(),
                refs_info: Vec::new(),
            }
        });
        metadata.prs.extend_from_slice(prs);
        metadata.refs_info.extend(refs_info);

        debug!(
            repository = %target.slug(),
            added = prs.len(),
            total = metadata.prs.len(),
            "accumulated build metadata"
        );
        Ok(())
    }

    /// Write the document to `path`, consuming the aggregator
    ///
    /// Returns `None` without touching the filesystem when no repository
    /// contributed.
    pub fn finish(self, path: &Path) -> Result<Option<PathBuf>> {
        let Some(metadata) = self.metadata else {
            debug!("no build metadata generated");
            return Ok(None);
        };
        write_metadata(&metadata, path)?;
        info!(path = %path.display(), prs = metadata.prs.len(), "wrote build metadata");
        Ok(Some(path.to_path_buf()))
    }
}

/// Serialize `metadata` as pretty JSON to `path`
pub fn write_metadata(metadata: &BuildMetadata, path: &Path) -> Result<()> {
    let content = serde_json::to_string_pretty(metadata)
        .map_err(|e| Error::Metadata(format!("failed to serialize: {e}")))?;
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|source| Error::WriteFile {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, format!("{content}\n")).map_err(|source| Error::WriteFile {
        path: path.to_path_buf(),
        source,
    })
}

/// Read a metadata document back
pub fn read_metadata(path: &Path) -> Result<BuildMetadata> {
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map_err(|e| Error::Metadata(format!("failed to parse {}: {e}", path.display())))
}
