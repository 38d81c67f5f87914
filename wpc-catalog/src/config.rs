//! Redmine connection configuration
//!
//! Resolution priority is ENV → TOML for every field. The base URL and
//! API key are mandatory: without them the sync surface cannot function,
//! so their absence fails startup rather than individual calls.

use wpc_common::config::TomlConfig;
use wpc_common::{Error, Result};

/// Resolved Redmine connection settings
#[derive(Debug, Clone)]
pub struct RedmineConfig {
    /// Base URL, e.g. "https://redmine.example.com"
    pub url: String,
    /// API key sent with every request
    pub token: String,
    /// Project identifier used when a sync request names no scope
    pub default_project: Option<String>,
    /// Tracker id filter applied when a sync request names none
    pub default_tracker: Option<String>,
    /// Page size for paginated fetches
    pub page_limit: usize,
    /// Optional global cap on items per sync run
    pub sync_limit: Option<usize>,
}

/// Default page size per request
pub const DEFAULT_PAGE_LIMIT: usize = 100;

impl RedmineConfig {
    /// Resolve from environment variables with TOML fallback
    ///
    /// Fatal when `REDMINE_URL` or `REDMINE_TOKEN` is missing from both
    /// sources.
    pub fn resolve(toml_config: &TomlConfig) -> Result<RedmineConfig> {
        let url = env_or("REDMINE_URL", toml_config.redmine_url.clone()).ok_or_else(|| {
            Error::Config(
                "REDMINE_URL is not configured (environment or config file)".to_string(),
            )
        })?;

        let token = env_or("REDMINE_TOKEN", toml_config.redmine_token.clone()).ok_or_else(|| {
            Error::Config(
                "REDMINE_TOKEN is not configured (environment or config file)".to_string(),
            )
        })?;

        let page_limit = match std::env::var("REDMINE_LIMIT_PER_REQUEST") {
            Ok(raw) => raw.parse().map_err(|_| {
                Error::Config(format!("REDMINE_LIMIT_PER_REQUEST is not a number: {raw}"))
            })?,
            Err(_) => DEFAULT_PAGE_LIMIT,
        };

        let sync_limit = match std::env::var("REDMINE_SYNC_LIMIT") {
            Ok(raw) => Some(raw.parse().map_err(|_| {
                Error::Config(format!("REDMINE_SYNC_LIMIT is not a number: {raw}"))
            })?),
            Err(_) => None,
        };

        Ok(RedmineConfig {
            url: url.trim_end_matches('/').to_string(),
            token,
            default_project: env_or(
                "REDMINE_DEFAULT_PROJECT",
                toml_config.redmine_default_project.clone(),
            ),
            default_tracker: env_or(
                "REDMINE_DEFAULT_TRACKER",
                toml_config.redmine_default_tracker.clone(),
            ),
            page_limit,
            sync_limit,
        })
    }
}

fn env_or(name: &str, fallback: Option<String>) -> Option<String> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .or(fallback)
}
