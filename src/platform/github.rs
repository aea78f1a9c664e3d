//! GitHub platform service implementation

use crate::error::{Error, Result};
use crate::platform::PlatformService;
use crate::types::{CommitDetails, PullRequestRef};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use octocrab::Octocrab;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Largest page the GitHub REST API serves
const MAX_PAGE_SIZE: u8 = 100;

// REST response shapes, validated into domain types before leaving this module

#[derive(Deserialize)]
struct SearchResponse {
    total_count: u64,
    items: Vec<SearchItem>,
}

#[derive(Deserialize)]
struct SearchItem {
    number: u64,
}

#[derive(Serialize)]
struct SearchParams<'a> {
    q: &'a str,
    per_page: u8,
    page: u32,
}

#[derive(Serialize)]
struct ListParams {
    state: &'static str,
    sort: &'static str,
    direction: &'static str,
    per_page: u8,
    page: u32,
}

#[derive(Deserialize)]
struct PullResponse {
    number: u64,
    title: Option<String>,
    user: Option<UserResponse>,
    head: HeadResponse,
    #[serde(default)]
    labels: Vec<LabelResponse>,
}

#[derive(Deserialize)]
struct UserResponse {
    login: String,
}

#[derive(Deserialize)]
struct HeadResponse {
    #[serde(rename = "ref")]
    ref_name: String,
    sha: String,
}

#[derive(Deserialize)]
struct LabelResponse {
    name: String,
}

#[derive(Deserialize)]
struct CommitResponse {
    sha: String,
    commit: CommitPayload,
}

#[derive(Deserialize)]
struct CommitPayload {
    message: String,
    author: Option<CommitAuthor>,
}

#[derive(Deserialize)]
struct CommitAuthor {
    name: Option<String>,
    date: Option<DateTime<Utc>>,
}

impl TryFrom<PullResponse> for PullRequestRef {
    type Error = Error;

    fn try_from(pr: PullResponse) -> Result<Self> {
        if pr.head.ref_name.is_empty() || pr.head.sha.is_empty() {
            return Err(Error::GitHubApi(format!(
                "PR #{} has no head ref or sha",
                pr.number
            )));
        }
        Ok(Self {
            number: pr.number,
            head_branch_name: pr.head.ref_name,
            head_commit_sha: pr.head.sha,
            author_login: pr.user.map(|u| u.login).unwrap_or_default(),
            title: pr.title.unwrap_or_default(),
            labels: pr.labels.into_iter().map(|l| l.name).collect(),
        })
    }
}

/// Build the search query selecting open PRs that carry every label
pub fn label_search_query(owner: &str, repo: &str, labels: &[String]) -> String {
    let mut query = format!("repo:{owner}/{repo} is:pr is:open");
    for label in labels {
        query.push_str(&format!(" label:\"{label}\""));
    }
    query
}

/// GitHub service using octocrab
pub struct GitHubService {
    client: Octocrab,
    owner: String,
    repo: String,
    page_size: u8,
}

impl GitHubService {
    /// Create a new GitHub service
    ///
    /// `api_base` is the REST root, e.g. `https://api.github.com` or
    /// `https://ghe.example.com/api/v3`. Without a token requests are anonymous.
    pub fn new(
        token: Option<&str>,
        owner: String,
        repo: String,
        api_base: &str,
    ) -> Result<Self> {
        let mut builder = Octocrab::builder()
            .base_uri(api_base)
            .map_err(|e| Error::GitHubApi(e.to_string()))?;
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            builder = builder.personal_token(token.to_string());
        }

        let client = builder
            .build()
            .map_err(|e| Error::GitHubApi(e.to_string()))?;

        Ok(Self {
            client,
            owner,
            repo,
            page_size: MAX_PAGE_SIZE,
        })
    }

    /// Override the page size used for paginated endpoints
    #[must_use]
    pub fn with_page_size(mut self, page_size: u8) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    fn repo_route(&self, suffix: &str) -> String {
        format!("/repos/{}/{}/{suffix}", self.owner, self.repo)
    }
}

#[async_trait]
impl PlatformService for GitHubService {
    async fn search_pull_requests(&self, labels: &[String]) -> Result<Vec<u64>> {
        let query = label_search_query(&self.owner, &self.repo, labels);
        debug!(query = %query, "searching PRs");

        let mut numbers = Vec::new();
        let mut page = 1;
        loop {
            let params = SearchParams {
                q: &query,
                per_page: self.page_size,
                page,
            };
            let response: SearchResponse = self.client.get("/search/issues", Some(&params)).await?;
            let received = response.items.len();
            numbers.extend(response.items.into_iter().map(|item| item.number));

            debug!(page, received, total = response.total_count, "search page");
            if received < usize::from(self.page_size)
                || numbers.len() as u64 >= response.total_count
            {
                break;
            }
            page += 1;
        }

        debug!(count = numbers.len(), "searched PRs");
        Ok(numbers)
    }

    async fn list_open_pull_requests(&self) -> Result<Vec<PullRequestRef>> {
        debug!(owner = %self.owner, repo = %self.repo, "listing open PRs");
        let route = self.repo_route("pulls");

        let mut prs = Vec::new();
        let mut page = 1;
        loop {
            let params = ListParams {
                state: "open",
                sort: "created",
                direction: "asc",
                per_page: self.page_size,
                page,
            };
            let response: Vec<PullResponse> = self.client.get(&route, Some(&params)).await?;
            let received = response.len();
            for pr in response {
                prs.push(PullRequestRef::try_from(pr)?);
            }

            debug!(page, received, "list page");
            if received < usize::from(self.page_size) {
                break;
            }
            page += 1;
        }

        debug!(count = prs.len(), "listed open PRs");
        Ok(prs)
    }

    async fn get_pull_request(&self, number: u64) -> Result<PullRequestRef> {
        debug!(pr_number = number, "getting PR details");
        let response: PullResponse = self
            .client
            .get(self.repo_route(&format!("pulls/{number}")), None::<&()>)
            .await?;
        PullRequestRef::try_from(response)
    }

    async fn get_commit(&self, sha: &str) -> Result<CommitDetails> {
        debug!(sha, "getting commit");
        let response: CommitResponse = self
            .client
            .get(self.repo_route(&format!("commits/{sha}")), None::<&()>)
            .await?;

        let (author_name, author_date) = response
            .commit
            .author
            .map(|a| (a.name.unwrap_or_default(), a.date))
            .unwrap_or_default();

        Ok(CommitDetails {
            sha: response.sha,
            message: response.commit.message,
            author_name,
            author_date,
        })
    }
}
