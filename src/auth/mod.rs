//! Credential resolution for repositories
//!
//! Supports inline tokens from the config file and environment variables.

use std::env;
use tracing::debug;

/// Environment variables consulted when a repository names no credential
pub const FALLBACK_TOKEN_VARS: [&str; 2] = ["GITHUB_TOKEN", "GH_TOKEN"];

/// Source of authentication token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthSource {
    /// Token written in the config file
    Config,
    /// Token from environment variable
    EnvVar,
}

/// A resolved credential and where it came from
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    /// The token itself
    pub token: String,
    /// Where the token was found
    pub source: AuthSource,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"***")
            .field("source", &self.source)
            .finish()
    }
}

/// Resolve the credential for one repository from the process environment
///
/// Order: inline `token`, then the variable named by `token_env`, then
/// [`FALLBACK_TOKEN_VARS`]. Empty values are treated as unset.
pub fn resolve_credential(token: Option<&str>, token_env: Option<&str>) -> Option<Credential> {
    resolve_credential_with(token, token_env, |var| env::var(var).ok())
}

/// Resolve the credential for one repository, reading variables through `lookup`
pub fn resolve_credential_with(
    token: Option<&str>,
    token_env: Option<&str>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Option<Credential> {
    if let Some(token) = token.map(str::trim).filter(|t| !t.is_empty()) {
        debug!("using token from config");
        return Some(Credential {
            token: token.to_string(),
            source: AuthSource::Config,
        });
    }

    token_env
        .into_iter()
        .chain(FALLBACK_TOKEN_VARS)
        .find_map(|var| {
            let value = lookup(var)?;
            let value = value.trim();
            if value.is_empty() {
                return None;
            }
            debug!(var, "using token from environment");
            Some(Credential {
                token: value.to_string(),
                source: AuthSource::EnvVar,
            })
        })
}
