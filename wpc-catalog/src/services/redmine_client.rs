//! Redmine API client
//!
//! Read-only consumer of the tracker's issue and project listing
//! endpoints. All paging logic is written against the `IssueSource`
//! trait so the sync engine and the pagination driver can be exercised
//! with a scripted source.

use crate::config::RedmineConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::Instant;

const USER_AGENT: &str = "wpc-catalog/0.1 (work priority catalog)";
const HTTP_TIMEOUT_SECS: u64 = 30;
/// Pause between successive requests so the tracker is never hammered
const INTER_PAGE_DELAY_MS: u64 = 200;
/// Page size used when walking the project list
const PROJECT_PAGE_LIMIT: usize = 100;

/// Redmine client errors
#[derive(Debug, Error)]
pub enum RedmineError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication rejected (HTTP {0})")]
    Auth(u16),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Paged-fetch failure carrying how many items arrived before it
///
/// Fetch failures abort a sync run; the run summary still reports the
/// partial count.
#[derive(Debug, Error)]
#[error("fetch failed after {fetched} items: {source}")]
pub struct PagedFetchError {
    pub fetched: usize,
    #[source]
    pub source: RedmineError,
}

/// Issue listing filters
#[derive(Debug, Clone, Default)]
pub struct IssueQuery {
    /// Project identifier; None fetches across all visible projects
    pub project_id: Option<String>,
    /// Tracker id filter; None fetches every tracker
    pub tracker_id: Option<String>,
}

/// One page of the issue listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IssuePage {
    #[serde(default)]
    pub issues: Vec<RawIssue>,
    #[serde(default)]
    pub total_count: usize,
}

/// Issue payload as the tracker sends it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawIssue {
    pub id: i64,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub project: Option<IssueProject>,
    #[serde(default)]
    pub created_on: Option<String>,
    #[serde(default)]
    pub custom_fields: Option<Vec<CustomField>>,
    #[serde(default)]
    pub total_spent_hours: Option<f64>,
}

/// Project reference embedded in an issue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueProject {
    pub id: i64,
    pub name: String,
}

/// Custom field entry; looked up by stable numeric id, never by name
/// (display names can be renamed or localized upstream)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomField {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    /// String or array depending on the field type
    #[serde(default)]
    pub value: Option<serde_json::Value>,
}

/// One page of the project listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectPage {
    #[serde(default)]
    pub projects: Vec<RawProject>,
    #[serde(default)]
    pub total_count: usize,
}

/// Project entry from the listing endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawProject {
    pub id: i64,
    pub identifier: String,
    pub name: String,
}

/// Seam between the pagination/sync logic and the HTTP client
///
/// `RedmineClient` is the production implementation; tests drive the
/// same code paths with a scripted source.
pub trait IssueSource {
    fn fetch_page(
        &self,
        query: &IssueQuery,
        offset: usize,
        limit: usize,
    ) -> impl std::future::Future<Output = Result<IssuePage, RedmineError>> + Send;

    fn fetch_projects_page(
        &self,
        offset: usize,
        limit: usize,
    ) -> impl std::future::Future<Output = Result<ProjectPage, RedmineError>> + Send;
}

/// Fetch every page of an issue listing
///
/// Advances the offset by the page size until `total_count` is exhausted
/// or `hard_cap` is reached, whichever comes first. The final request is
/// trimmed so no more than `hard_cap` items are ever pulled. Raises
/// immediately on the first page failure; no partial-page retry.
pub async fn fetch_all_pages<S: IssueSource>(
    source: &S,
    query: &IssueQuery,
    page_size: usize,
    hard_cap: Option<usize>,
) -> Result<Vec<RawIssue>, PagedFetchError> {
    let mut issues: Vec<RawIssue> = Vec::new();
    let mut offset = 0usize;

    loop {
        let limit = match hard_cap {
            Some(cap) if issues.len() >= cap => break,
            Some(cap) => page_size.min(cap - issues.len()),
            None => page_size,
        };

        let page = source
            .fetch_page(query, offset, limit)
            .await
            .map_err(|source| PagedFetchError {
                fetched: issues.len(),
                source,
            })?;

        let received = page.issues.len();
        issues.extend(page.issues);

        tracing::debug!(
            offset = offset,
            received = received,
            accumulated = issues.len(),
            total_count = page.total_count,
            "Fetched issue page"
        );

        let has_more = page.total_count > offset + limit;
        offset += limit;

        if !has_more || received == 0 {
            break;
        }
        if let Some(cap) = hard_cap {
            if issues.len() >= cap {
                break;
            }
        }
    }

    if let Some(cap) = hard_cap {
        issues.truncate(cap);
    }

    tracing::info!(fetched = issues.len(), "Issue fetch complete");
    Ok(issues)
}

/// Translate a human-readable project name into its stable identifier
///
/// Walks the paginated project list. Within each page an exact name
/// match wins; failing that, a case-insensitive substring match in
/// either direction is accepted. Returns None (not an error) when
/// nothing matches anywhere; the caller decides the fallback.
pub async fn resolve_project_identifier<S: IssueSource>(
    source: &S,
    name: &str,
) -> Result<Option<String>, RedmineError> {
    let needle = name.to_lowercase();
    let mut offset = 0usize;

    loop {
        let page = source.fetch_projects_page(offset, PROJECT_PAGE_LIMIT).await?;

        if let Some(exact) = page.projects.iter().find(|p| p.name == name) {
            tracing::info!(
                identifier = %exact.identifier,
                name = %exact.name,
                "Project resolved (exact match)"
            );
            return Ok(Some(exact.identifier.clone()));
        }

        if let Some(fuzzy) = page.projects.iter().find(|p| {
            let candidate = p.name.to_lowercase();
            candidate.contains(&needle) || needle.contains(&candidate)
        }) {
            tracing::warn!(
                identifier = %fuzzy.identifier,
                name = %fuzzy.name,
                query = %name,
                "Project resolved by partial match"
            );
            return Ok(Some(fuzzy.identifier.clone()));
        }

        let has_more = page.total_count > offset + PROJECT_PAGE_LIMIT;
        if !has_more || page.projects.is_empty() {
            break;
        }
        offset += PROJECT_PAGE_LIMIT;
    }

    tracing::warn!(name = %name, "Project not found in tracker");
    Ok(None)
}

/// Fetch issues for a project known only by name
///
/// Resolves the name to an identifier first; when resolution fails,
/// falls back to an unfiltered fetch with client-side filtering on
/// `project.name`. The hard cap applies to the number of *matching*
/// issues in the fallback path.
pub async fn fetch_issues_by_project_name<S: IssueSource>(
    source: &S,
    name: &str,
    tracker_id: Option<String>,
    page_size: usize,
    hard_cap: Option<usize>,
) -> Result<Vec<RawIssue>, PagedFetchError> {
    let identifier = resolve_project_identifier(source, name)
        .await
        .map_err(|source| PagedFetchError { fetched: 0, source })?;

    if let Some(project_id) = identifier {
        let query = IssueQuery {
            project_id: Some(project_id),
            tracker_id,
        };
        return fetch_all_pages(source, &query, page_size, hard_cap).await;
    }

    tracing::warn!(
        name = %name,
        "No project identifier; falling back to client-side name filtering"
    );

    let query = IssueQuery {
        project_id: None,
        tracker_id,
    };
    let mut matching: Vec<RawIssue> = Vec::new();
    let mut offset = 0usize;

    loop {
        if let Some(cap) = hard_cap {
            if matching.len() >= cap {
                break;
            }
        }

        let page = source
            .fetch_page(&query, offset, page_size)
            .await
            .map_err(|source| PagedFetchError {
                fetched: matching.len(),
                source,
            })?;

        let received = page.issues.len();
        matching.extend(
            page.issues
                .into_iter()
                .filter(|issue| issue.project.as_ref().is_some_and(|p| p.name == name)),
        );

        let has_more = page.total_count > offset + page_size;
        offset += page_size;

        if !has_more || received == 0 {
            break;
        }
    }

    if let Some(cap) = hard_cap {
        matching.truncate(cap);
    }

    Ok(matching)
}

/// Spacing requests out to a fixed minimum interval
struct RateLimiter {
    last_request: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval: Duration) -> Self {
        Self {
            last_request: Mutex::new(None),
            min_interval,
        }
    }

    /// Wait if necessary to comply with the interval
    async fn wait(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.min_interval {
                let wait_time = self.min_interval - elapsed;
                tracing::debug!("Rate limiting: waiting {:?}", wait_time);
                tokio::time::sleep(wait_time).await;
            }
        }

        *last = Some(Instant::now());
    }
}

/// HTTP client for the Redmine REST API
pub struct RedmineClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
    rate_limiter: RateLimiter,
}

impl RedmineClient {
    /// Build from resolved configuration
    pub fn new(config: &RedmineConfig) -> Result<Self, RedmineError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()
            .map_err(|e| RedmineError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: config.url.clone(),
            api_key: config.token.clone(),
            rate_limiter: RateLimiter::new(Duration::from_millis(INTER_PAGE_DELAY_MS)),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, RedmineError> {
        self.rate_limiter.wait().await;

        let url = format!("{}/{}", self.base_url, path);
        tracing::debug!(url = %url, "Querying Redmine API");

        let response = self
            .http_client
            .get(&url)
            .header("X-Redmine-API-Key", &self.api_key)
            .query(params)
            .send()
            .await
            .map_err(|e| RedmineError::Network(e.to_string()))?;

        let status = response.status();

        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(RedmineError::Auth(status.as_u16()));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(500).collect();
            return Err(RedmineError::Api(status.as_u16(), snippet));
        }

        response
            .json()
            .await
            .map_err(|e| RedmineError::Parse(e.to_string()))
    }

    /// List all projects visible to the credential
    pub async fn list_projects(
        &self,
        limit: Option<usize>,
    ) -> Result<Vec<RawProject>, RedmineError> {
        let mut projects: Vec<RawProject> = Vec::new();
        let mut offset = 0usize;

        loop {
            if let Some(cap) = limit {
                if projects.len() >= cap {
                    break;
                }
            }

            let page = self.fetch_projects_page(offset, PROJECT_PAGE_LIMIT).await?;
            let received = page.projects.len();
            projects.extend(page.projects);

            let has_more = page.total_count > offset + PROJECT_PAGE_LIMIT;
            offset += PROJECT_PAGE_LIMIT;

            if !has_more || received == 0 {
                break;
            }
        }

        if let Some(cap) = limit {
            projects.truncate(cap);
        }

        Ok(projects)
    }

    /// One-item fetch confirming URL, credential and connectivity
    pub async fn probe(&self, project_id: Option<&str>) -> Result<usize, RedmineError> {
        let query = IssueQuery {
            project_id: project_id.map(str::to_string),
            tracker_id: None,
        };
        let page = self.fetch_page(&query, 0, 1).await?;
        tracing::info!(total_count = page.total_count, "Redmine connection ok");
        Ok(page.total_count)
    }
}

impl IssueSource for RedmineClient {
    async fn fetch_page(
        &self,
        query: &IssueQuery,
        offset: usize,
        limit: usize,
    ) -> Result<IssuePage, RedmineError> {
        let mut params: Vec<(&str, String)> = vec![
            ("status_id", "*".to_string()),
            ("limit", limit.to_string()),
            ("offset", offset.to_string()),
        ];
        if let Some(project_id) = &query.project_id {
            params.push(("project_id", project_id.clone()));
        }
        if let Some(tracker_id) = &query.tracker_id {
            params.push(("tracker_id", tracker_id.clone()));
        }

        self.get_json("issues.json", &params).await
    }

    async fn fetch_projects_page(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<ProjectPage, RedmineError> {
        let params: Vec<(&str, String)> = vec![
            ("limit", limit.to_string()),
            ("offset", offset.to_string()),
        ];

        self.get_json("projects.json", &params).await
    }
}
