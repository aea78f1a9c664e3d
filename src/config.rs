//! Run configuration
//!
//! Loaded from a TOML file and validated once into an immutable [`Config`].
//! Everything downstream treats it as already-checked input.

use crate::auth::resolve_credential;
use crate::error::{Error, Result};
use crate::git::RetryBudget;
use crate::types::{DiscoveryMode, RepositoryTarget};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Default git host
pub const DEFAULT_HOST: &str = "github.com";

/// Default metadata filename
pub const DEFAULT_METADATA_FILE: &str = "build-metadata.json";

/// Default attempts for generic git commands
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default attempts for network fetches
pub const DEFAULT_FETCH_MAX_RETRIES: u32 = 5;

/// Largest accepted retry count
pub const MAX_RETRY_CEILING: u32 = 100;

const DEFAULT_DETAIL_CONCURRENCY: usize = 8;

/// Where the metadata file is written
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MetadataLocation {
    /// Relative to the directory the tool was invoked from
    #[default]
    Invocation,
    /// Inside the working copy
    WorkingCopy,
}

/// Commit identity for merge commits
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Identity {
    /// `user.name`
    pub name: String,
    /// `user.email`
    pub email: String,
}

impl Default for Identity {
    fn default() -> Self {
        Self {
            name: "github-actions[bot]".to_string(),
            email: "41898282+github-actions[bot]@users.noreply.github.com".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    working_directory: Option<PathBuf>,
    #[serde(default)]
    generate_metadata: bool,
    #[serde(default)]
    metadata_location: MetadataLocation,
    metadata_file: Option<String>,
    #[serde(default)]
    skip_identity: bool,
    identity: Option<Identity>,
    max_retries: Option<toml::Value>,
    fetch_max_retries: Option<toml::Value>,
    host: Option<String>,
    api_url: Option<String>,
    #[serde(default)]
    discovery: DiscoveryMode,
    detail_concurrency: Option<usize>,
    #[serde(default)]
    repositories: Vec<RawRepository>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRepository {
    owner: String,
    name: String,
    #[serde(default)]
    labels: Vec<String>,
    token: Option<String>,
    token_env: Option<String>,
    generate_metadata: Option<bool>,
}

/// Validated run configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Working copy every repository is merged into
    pub working_directory: PathBuf,
    /// Whether build metadata is generated by default
    pub generate_metadata: bool,
    /// Where the metadata file is written
    pub metadata_location: MetadataLocation,
    /// Metadata filename
    pub metadata_file: String,
    /// Skip the one-time `user.name`/`user.email` setup
    pub skip_identity: bool,
    /// Identity configured unless `skip_identity`
    pub identity: Identity,
    /// Attempts for generic git commands
    pub max_retries: u32,
    /// Attempts for network fetches
    pub fetch_max_retries: u32,
    /// Git host used in remote URLs
    pub host: String,
    /// REST API root override
    pub api_url: Option<String>,
    /// How PRs are discovered
    pub discovery: DiscoveryMode,
    /// Concurrent PR/commit lookups per repository
    pub detail_concurrency: usize,
    /// Repositories in processing order
    pub repositories: Vec<RepositoryTarget>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            working_directory: PathBuf::from("."),
            generate_metadata: false,
            metadata_location: MetadataLocation::default(),
            metadata_file: DEFAULT_METADATA_FILE.to_string(),
            skip_identity: false,
            identity: Identity::default(),
            max_retries: DEFAULT_MAX_RETRIES,
            fetch_max_retries: DEFAULT_FETCH_MAX_RETRIES,
            host: DEFAULT_HOST.to_string(),
            api_url: None,
            discovery: DiscoveryMode::default(),
            detail_concurrency: DEFAULT_DETAIL_CONCURRENCY,
            repositories: Vec::new(),
        }
    }
}

impl Config {
    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;
        Self::from_toml_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), strip_prefix(&e))))
    }

    /// Parse and validate TOML content
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let raw: RawConfig =
            toml::from_str(content).map_err(|e| Error::Config(format!("invalid TOML: {e}")))?;

        let repositories = raw
            .repositories
            .into_iter()
            .map(validate_repository)
            .collect::<Result<Vec<_>>>()?;

        if let Some(url) = &raw.api_url {
            url::Url::parse(url).map_err(|e| Error::Config(format!("invalid api_url {url}: {e}")))?;
        }

        Ok(Self {
            working_directory: raw.working_directory.unwrap_or_else(|| PathBuf::from(".")),
            generate_metadata: raw.generate_metadata,
            metadata_location: raw.metadata_location,
            metadata_file: raw
                .metadata_file
                .filter(|f| !f.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_METADATA_FILE.to_string()),
            skip_identity: raw.skip_identity,
            identity: raw.identity.unwrap_or_default(),
            max_retries: normalize_retry_count(
                "max_retries",
                raw.max_retries.as_ref(),
                DEFAULT_MAX_RETRIES,
            ),
            fetch_max_retries: normalize_retry_count(
                "fetch_max_retries",
                raw.fetch_max_retries.as_ref(),
                DEFAULT_FETCH_MAX_RETRIES,
            ),
            host: raw
                .host
                .filter(|h| !h.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            api_url: raw.api_url,
            discovery: raw.discovery,
            detail_concurrency: raw
                .detail_concurrency
                .filter(|n| *n > 0)
                .unwrap_or(DEFAULT_DETAIL_CONCURRENCY),
            repositories,
        })
    }

    /// Whether metadata is generated for `target`
    pub fn metadata_enabled_for(&self, target: &RepositoryTarget) -> bool {
        target.generate_metadata.unwrap_or(self.generate_metadata)
    }

    /// Whether any repository generates metadata
    pub fn any_metadata_enabled(&self) -> bool {
        self.repositories.iter().any(|t| self.metadata_enabled_for(t))
    }

    /// Destination of the metadata file
    pub fn metadata_path(&self, invocation_dir: &Path) -> PathBuf {
        match self.metadata_location {
            MetadataLocation::Invocation => invocation_dir.join(&self.metadata_file),
            MetadataLocation::WorkingCopy => self.working_directory.join(&self.metadata_file),
        }
    }

    /// Retry budgets for git commands
    pub fn retry_budget(&self) -> RetryBudget {
        RetryBudget {
            command_attempts: self.max_retries,
            fetch_attempts: self.fetch_max_retries,
            ..RetryBudget::default()
        }
    }
}

fn strip_prefix(err: &Error) -> String {
    match err {
        Error::Config(msg) => msg.clone(),
        other => other.to_string(),
    }
}

fn validate_repository(raw: RawRepository) -> Result<RepositoryTarget> {
    let slug = format!("{}/{}", raw.owner, raw.name);
    if raw.owner.trim().is_empty() || raw.name.trim().is_empty() {
        return Err(Error::Config(format!(
            "repository entry `{slug}` needs both owner and name"
        )));
    }
    if raw.labels.iter().any(|l| l.trim().is_empty()) {
        return Err(Error::Config(format!(
            "repository {slug} has an empty label; list the labels to merge explicitly"
        )));
    }
    if raw.labels.is_empty() {
        warn!(repository = %slug, "no labels configured, no PRs will be merged");
    }

    let credential = resolve_credential(raw.token.as_deref(), raw.token_env.as_deref());
    match &credential {
        Some(c) => debug!(repository = %slug, source = ?c.source, "resolved credential"),
        None => warn!(repository = %slug, "no credential found, using anonymous access"),
    }

    Ok(RepositoryTarget {
        owner: raw.owner,
        name: raw.name,
        labels: raw.labels.into_iter().collect(),
        credential: credential.map(|c| c.token),
        generate_metadata: raw.generate_metadata,
    })
}

/// Validate a retry count, falling back to `default` with a warning
///
/// Accepts an integer or a numeric string in `1..=MAX_RETRY_CEILING`.
pub fn normalize_retry_count(name: &str, value: Option<&toml::Value>, default: u32) -> u32 {
    let Some(value) = value else {
        return default;
    };

    let parsed = match value {
        toml::Value::Integer(n) => Some(*n),
        toml::Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };

    match parsed.and_then(|n| u32::try_from(n).ok()) {
        Some(n) if (1..=MAX_RETRY_CEILING).contains(&n) => n,
        _ => {
            warn!(
                setting = name,
                value = %value,
                default,
                "invalid retry count, expected an integer between 1 and {MAX_RETRY_CEILING}"
            );
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.working_directory, PathBuf::from("."));
        assert_eq!(config.max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(config.fetch_max_retries, DEFAULT_FETCH_MAX_RETRIES);
        assert_eq!(config.host, DEFAULT_HOST);
        assert_eq!(config.discovery, DiscoveryMode::Search);
        assert!(!config.generate_metadata);
        assert!(config.repositories.is_empty());
    }

    #[test]
    fn test_full_config() {
        let config = Config::from_toml_str(
            r#"
            working_directory = "/tmp/wc"
            generate_metadata = true
            metadata_location = "working-copy"
            skip_identity = true
            max_retries = "4"
            fetch_max_retries = 7
            discovery = "list"

            [[repositories]]
            owner = "acme"
            name = "widgets"
            labels = ["merge-to:indev"]
            token = "inline"

            [[repositories]]
            owner = "acme"
            name = "gadgets"
            labels = ["merge-to:indev", "ready"]
            token = "other"
            generate_metadata = false
            "#,
        )
        .unwrap();

        assert_eq!(config.max_retries, 4);
        assert_eq!(config.fetch_max_retries, 7);
        assert_eq!(config.discovery, DiscoveryMode::List);
        assert!(config.skip_identity);
        assert_eq!(config.repositories.len(), 2);
        assert_eq!(config.repositories[0].slug(), "acme/widgets");
        assert_eq!(config.repositories[0].credential.as_deref(), Some("inline"));
        assert_eq!(config.repositories[1].labels.len(), 2);
        assert!(config.metadata_enabled_for(&config.repositories[0]));
        assert!(!config.metadata_enabled_for(&config.repositories[1]));
        assert_eq!(
            config.metadata_path(Path::new("/invoked")),
            PathBuf::from("/tmp/wc/build-metadata.json")
        );
    }

    #[test]
    fn test_metadata_path_relative_to_invocation() {
        let config = Config::default();
        assert_eq!(
            config.metadata_path(Path::new("/invoked")),
            PathBuf::from("/invoked/build-metadata.json")
        );
    }

    #[test]
    fn test_retry_count_out_of_range_falls_back() {
        assert_eq!(normalize_retry_count("r", Some(&toml::Value::Integer(0)), 3), 3);
        assert_eq!(normalize_retry_count("r", Some(&toml::Value::Integer(-2)), 3), 3);
        assert_eq!(normalize_retry_count("r", Some(&toml::Value::Integer(101)), 3), 3);
        assert_eq!(normalize_retry_count("r", Some(&toml::Value::Integer(100)), 3), 100);
        assert_eq!(normalize_retry_count("r", Some(&toml::Value::Integer(1)), 3), 1);
    }

    #[test]
    fn test_retry_count_non_numeric_falls_back() {
        assert_eq!(
            normalize_retry_count("r", Some(&toml::Value::String("lots".into())), 5),
            5
        );
        assert_eq!(normalize_retry_count("r", Some(&toml::Value::Float(2.5)), 5), 5);
        assert_eq!(normalize_retry_count("r", Some(&toml::Value::Boolean(true)), 5), 5);
        assert_eq!(
            normalize_retry_count("r", Some(&toml::Value::String(" 9 ".into())), 5),
            9
        );
        assert_eq!(normalize_retry_count("r", None, 5), 5);
    }

    #[test]
    fn test_empty_label_is_config_error() {
        let err = Config::from_toml_str(
            r#"
            [[repositories]]
            owner = "acme"
            name = "widgets"
            labels = [""]
            token = "t"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(msg) if msg.contains("empty label")));
    }

    #[test]
    fn test_no_labels_is_allowed() {
        let config = Config::from_toml_str(
            r#"
            [[repositories]]
            owner = "acme"
            name = "widgets"
            token = "t"
            "#,
        )
        .unwrap();
        assert!(config.repositories[0].labels.is_empty());
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(Config::from_toml_str("retries = 3").is_err());
    }

    #[test]
    fn test_invalid_api_url_rejected() {
        assert!(Config::from_toml_str("api_url = \"not a url\"").is_err());
    }
}
