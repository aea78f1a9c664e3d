//! Platform service construction

use crate::config::{Config, DEFAULT_HOST};
use crate::error::Result;
use crate::platform::{GitHubService, PlatformService};
use crate::types::RepositoryTarget;
use tracing::debug;

/// REST root for the configured host
///
/// An explicit `api_url` wins. Enterprise hosts serve the API under `/api/v3`.
pub fn api_base(config: &Config) -> String {
    if let Some(url) = &config.api_url {
        return url.clone();
    }
    if config.host == DEFAULT_HOST {
        "https://api.github.com".to_string()
    } else {
        format!("https://{}/api/v3", config.host)
    }
}

/// Build the API client for one repository, using that repository's own credential
pub fn create_platform_service(
    target: &RepositoryTarget,
    config: &Config,
) -> Result<Box<dyn PlatformService>> {
    let api_base = api_base(config);
    debug!(repository = %target.slug(), api_base = %api_base, "creating GitHub service");

    let service = GitHubService::new(
        target.credential.as_deref(),
        target.owner.clone(),
        target.name.clone(),
        &api_base,
    )?;
    Ok(Box::new(service))
}
