//! Mock platform service for testing
//!
//! These are test utilities - not all may be used in every test binary.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use combine_prs::error::{Error, Result};
use combine_prs::platform::PlatformService;
use combine_prs::types::{CommitDetails, PullRequestRef};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

/// Simple mock platform service for testing
///
/// Features:
/// - PRs and commits registered up front
/// - Search filters registered PRs by label, in registration order
/// - Call tracking for verification
/// - Error injection for failure path testing
pub struct MockPlatformService {
    slug: String,
    prs: Mutex<Vec<PullRequestRef>>,
    commits: Mutex<HashMap<String, CommitDetails>>,
    search_override: Mutex<Option<Vec<u64>>>,
    commit_delays: Mutex<HashMap<String, Duration>>,
    // Call tracking
    search_calls: Mutex<Vec<Vec<String>>>,
    list_calls: Mutex<usize>,
    get_pr_calls: Mutex<Vec<u64>>,
    get_commit_calls: Mutex<Vec<String>>,
    // Error injection
    error_on_search: Mutex<Option<String>>,
    error_on_list: Mutex<Option<String>>,
    error_on_get_pr: Mutex<HashSet<u64>>,
    error_on_get_commit: Mutex<Option<String>>,
}

impl MockPlatformService {
    /// Create a new mock for `owner/repo`
    pub fn new(owner: &str, repo: &str) -> Self {
        Self {
            slug: format!("{owner}/{repo}"),
            prs: Mutex::new(Vec::new()),
            commits: Mutex::new(HashMap::new()),
            search_override: Mutex::new(None),
            commit_delays: Mutex::new(HashMap::new()),
            search_calls: Mutex::new(Vec::new()),
            list_calls: Mutex::new(0),
            get_pr_calls: Mutex::new(Vec::new()),
            get_commit_calls: Mutex::new(Vec::new()),
            error_on_search: Mutex::new(None),
            error_on_list: Mutex::new(None),
            error_on_get_pr: Mutex::new(HashSet::new()),
            error_on_get_commit: Mutex::new(None),
        }
    }

    /// Register an open PR and a commit for its head
    pub fn add_pr(&self, pr: PullRequestRef) {
        let sha = pr.head_commit_sha.clone();
        self.commits
            .lock()
            .unwrap()
            .entry(sha.clone())
            .or_insert_with(|| make_commit(&sha));
        self.prs.lock().unwrap().push(pr);
    }

    /// Make search return exactly these numbers, in this order
    pub fn set_search_response(&self, numbers: Vec<u64>) {
        *self.search_override.lock().unwrap() = Some(numbers);
    }

    /// Delay the commit lookup for `sha`
    pub fn delay_commit(&self, sha: &str, delay: Duration) {
        self.commit_delays
            .lock()
            .unwrap()
            .insert(sha.to_string(), delay);
    }

    // === Error injection methods ===

    /// Make `search_pull_requests` return an error
    pub fn fail_search(&self, msg: &str) {
        *self.error_on_search.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `list_open_pull_requests` return an error
    pub fn fail_list(&self, msg: &str) {
        *self.error_on_list.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `get_pull_request` fail for one PR
    pub fn fail_get_pr(&self, number: u64) {
        self.error_on_get_pr.lock().unwrap().insert(number);
    }

    /// Make `get_commit` return an error
    pub fn fail_get_commit(&self, msg: &str) {
        *self.error_on_get_commit.lock().unwrap() = Some(msg.to_string());
    }

    // === Call verification methods ===

    /// Label sets `search_pull_requests` was called with
    pub fn get_search_calls(&self) -> Vec<Vec<String>> {
        self.search_calls.lock().unwrap().clone()
    }

    /// Number of `list_open_pull_requests` calls
    pub fn list_call_count(&self) -> usize {
        *self.list_calls.lock().unwrap()
    }

    /// PR numbers `get_pull_request` was called with
    pub fn get_pr_calls(&self) -> Vec<u64> {
        self.get_pr_calls.lock().unwrap().clone()
    }

    /// SHAs `get_commit` was called with
    pub fn get_commit_calls(&self) -> Vec<String> {
        self.get_commit_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PlatformService for MockPlatformService {
    async fn search_pull_requests(&self, labels: &[String]) -> Result<Vec<u64>> {
        self.search_calls.lock().unwrap().push(labels.to_vec());

        if let Some(msg) = self.error_on_search.lock().unwrap().as_ref() {
            return Err(Error::GitHubApi(msg.clone()));
        }
        if let Some(numbers) = self.search_override.lock().unwrap().as_ref() {
            return Ok(numbers.clone());
        }

        Ok(self
            .prs
            .lock()
            .unwrap()
            .iter()
            .filter(|pr| pr.has_all_labels(labels))
            .map(|pr| pr.number)
            .collect())
    }

    async fn list_open_pull_requests(&self) -> Result<Vec<PullRequestRef>> {
        *self.list_calls.lock().unwrap() += 1;

        if let Some(msg) = self.error_on_list.lock().unwrap().as_ref() {
            return Err(Error::GitHubApi(msg.clone()));
        }
        Ok(self.prs.lock().unwrap().clone())
    }

    async fn get_pull_request(&self, number: u64) -> Result<PullRequestRef> {
        self.get_pr_calls.lock().unwrap().push(number);

        if self.error_on_get_pr.lock().unwrap().contains(&number) {
            return Err(Error::GitHubApi(format!("PR #{number} lookup failed")));
        }
        self.prs
            .lock()
            .unwrap()
            .iter()
            .find(|pr| pr.number == number)
            .cloned()
            .ok_or_else(|| Error::GitHubApi(format!("PR #{number} not found in {}", self.slug)))
    }

    async fn get_commit(&self, sha: &str) -> Result<CommitDetails> {
        self.get_commit_calls.lock().unwrap().push(sha.to_string());

        let delay = self.commit_delays.lock().unwrap().get(sha).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(msg) = self.error_on_get_commit.lock().unwrap().as_ref() {
            return Err(Error::GitHubApi(msg.clone()));
        }
        self.commits
            .lock()
            .unwrap()
            .get(sha)
            .cloned()
            .ok_or_else(|| Error::GitHubApi(format!("commit {sha} not found in {}", self.slug)))
    }
}

/// Commit details derived from a SHA
pub fn make_commit(sha: &str) -> CommitDetails {
    CommitDetails {
        sha: sha.to_string(),
        message: format!("Commit {sha}"),
        author_name: "Test Author".to_string(),
        author_date: Some(Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap()),
    }
}
