//! Git adapter for the working copy
//!
//! Every VCS interaction goes through [`Git`], which knows which commands are
//! retried with which budget and which are attempted exactly once.

use crate::error::{Error, Result};
use crate::exec::{CommandExecutor, RetryPolicy, run_once, run_with_retry};
use crate::types::CommandOutput;
use std::path::PathBuf;
use tracing::{debug, instrument};
use url::Url;

/// Name of the remote the engine (re)points at each repository
pub const REMOTE: &str = "origin";

/// Porcelain codes for unresolved three-way conflicts
/// (both modified, both added, both deleted)
const CONFLICT_CODES: [&str; 3] = ["UU", "AA", "DD"];

/// Parsed `git status --porcelain` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    /// 2-letter XY code, or "??" for untracked
    pub code: String,
    /// Path for the changed file
    pub path: String,
}

impl StatusEntry {
    /// Whether this entry is an unresolved merge conflict
    pub fn is_conflict(&self) -> bool {
        CONFLICT_CODES.contains(&self.code.as_str())
    }
}

/// Retry budgets for the two classes of commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBudget {
    /// Attempts for local/generic commands
    pub command_attempts: u32,
    /// Attempts for network fetches
    pub fetch_attempts: u32,
    /// Backoff between attempts
    pub policy: RetryPolicy,
}

impl Default for RetryBudget {
    fn default() -> Self {
        Self {
            command_attempts: 3,
            fetch_attempts: 5,
            policy: RetryPolicy::default(),
        }
    }
}

/// Wrapper for executing git commands in the working copy
pub struct Git<'a> {
    executor: &'a dyn CommandExecutor,
    workdir: PathBuf,
    budget: RetryBudget,
}

impl<'a> Git<'a> {
    /// Create a wrapper rooted at `workdir`
    pub fn new(
        executor: &'a dyn CommandExecutor,
        workdir: impl Into<PathBuf>,
        budget: RetryBudget,
    ) -> Self {
        Self {
            executor,
            workdir: workdir.into(),
            budget,
        }
    }

    async fn run(&self, args: &[&str]) -> Result<CommandOutput> {
        run_with_retry(
            self.executor,
            "git",
            &to_owned(args),
            &self.workdir,
            self.budget.command_attempts,
            &self.budget.policy,
        )
        .await
    }

    async fn run_fetch(&self, args: &[&str]) -> Result<CommandOutput> {
        run_with_retry(
            self.executor,
            "git",
            &to_owned(args),
            &self.workdir,
            self.budget.fetch_attempts,
            &self.budget.policy,
        )
        .await
    }

    /// Set the commit identity used for merge commits
    #[instrument(skip(self))]
    pub async fn configure_identity(&self, name: &str, email: &str) -> Result<()> {
        self.run(&["config", "user.name", name]).await?;
        self.run(&["config", "user.email", email]).await?;
        Ok(())
    }

    /// Point `remote` at `url`, adding it if it does not exist yet
    pub async fn set_remote(&self, remote: &str, url: &str) -> Result<()> {
        let remotes = self.run(&["remote"]).await?;
        if remotes.stdout.lines().any(|r| r.trim() == remote) {
            debug!(remote, "updating remote url");
            self.run(&["remote", "set-url", remote, url]).await?;
        } else {
            debug!(remote, "adding remote");
            self.run(&["remote", "add", remote, url]).await?;
        }
        Ok(())
    }

    /// Refresh remote-tracking refs
    pub async fn fetch(&self, remote: &str) -> Result<()> {
        self.run_fetch(&["fetch", "--prune", remote]).await?;
        Ok(())
    }

    /// Fetch a PR's head into a local branch, overwriting any stale copy
    pub async fn fetch_pull_request(&self, remote: &str, number: u64, local_branch: &str) -> Result<()> {
        let refspec = format!("+pull/{number}/head:{local_branch}");
        self.run_fetch(&["fetch", remote, &refspec]).await?;
        Ok(())
    }

    /// Merge `branch` into the current checkout, exactly once
    ///
    /// Returns the raw output whether or not the merge succeeded; only a launch
    /// failure is an `Err`.
    pub async fn merge(&self, branch: &str, message: &str) -> Result<CommandOutput> {
        let args = to_owned(&["merge", "--no-ff", "--no-edit", "-m", message, branch]);
        self.executor
            .execute("git", &args, &self.workdir)
            .await
            .map_err(|source| Error::CommandLaunch {
                program: "git".to_string(),
                source,
            })
    }

    /// Status entries, including untracked files
    pub async fn status(&self) -> Result<Vec<StatusEntry>> {
        let out = self.run(&["status", "--porcelain=v1", "-z", "-uall"]).await?;
        Ok(parse_status(&out.stdout))
    }

    /// Diff of the working-tree content of `path` against the index
    pub async fn diff_path(&self, path: &str) -> Result<String> {
        let out = run_once(self.executor, "git", &to_owned(&["diff", "--", path]), &self.workdir).await?;
        Ok(out.stdout)
    }

    /// Discard every uncommitted change, including an in-progress merge
    pub async fn reset_hard(&self) -> Result<()> {
        self.run(&["reset", "--hard", "HEAD"]).await?;
        Ok(())
    }

    /// Remove untracked files and directories
    pub async fn clean(&self) -> Result<()> {
        self.run(&["clean", "-fd"]).await?;
        Ok(())
    }

    /// SHA of `HEAD`
    pub async fn head_sha(&self) -> Result<String> {
        let out = self.run(&["rev-parse", "HEAD"]).await?;
        Ok(out.stdout.trim().to_string())
    }

    /// Symbolic name of the current checkout (`HEAD` when detached)
    pub async fn current_ref(&self) -> Result<String> {
        let out = self.run(&["rev-parse", "--abbrev-ref", "HEAD"]).await?;
        Ok(out.stdout.trim().to_string())
    }
}

fn to_owned(args: &[&str]) -> Vec<String> {
    args.iter().map(ToString::to_string).collect()
}

/// Parse `git status --porcelain=v1 -z` output
///
/// Records are NUL-terminated `XY path` entries with paths verbatim. A rename
/// or copy is followed by one extra record holding the source path.
pub fn parse_status(output: &str) -> Vec<StatusEntry> {
    let mut entries = Vec::new();
    let mut records = output.split('\0');
    while let Some(record) = records.next() {
        let (Some(code), Some(path)) = (record.get(..2), record.get(3..)) else {
            continue;
        };
        if path.is_empty() {
            continue;
        }
        if code.contains(['R', 'C']) {
            records.next();
        }
        entries.push(StatusEntry {
            code: code.to_string(),
            path: path.to_string(),
        });
    }
    entries
}

/// Remote URL for a repository, with the credential as userinfo when present
pub fn remote_url(host: &str, owner: &str, repo: &str, credential: Option<&str>) -> Result<String> {
    let mut url = Url::parse(&format!("https://{host}/{owner}/{repo}"))
        .map_err(|e| Error::Config(format!("invalid remote for {owner}/{repo} on {host}: {e}")))?;
    if let Some(token) = credential.filter(|t| !t.is_empty()) {
        url.set_username(token)
            .map_err(|()| Error::Config(format!("cannot embed credential in {url}")))?;
    }
    Ok(url.to_string())
}
