//! Reconciliation of the local catalog against the external tracker
//!
//! One run walks Fetching → Mapping → Upserting and ends Completed or
//! Failed. Fetch failures are systemic and abort the run; mapping and
//! upsert failures are per-item, recorded in the summary, and never
//! abort. No state survives between runs: a re-run always traverses
//! from offset zero and lands on the same rows via idempotent upsert.

use crate::db::subjects::{self, UpsertOutcome};
use crate::models::{SyncFailure, SyncRun, SyncState};
use crate::scoring::SubjectKind;
use crate::services::issue_mapper::{self, CanonicalIssue};
use crate::services::redmine_client::{
    fetch_all_pages, fetch_issues_by_project_name, IssueQuery, IssueSource, RawIssue,
};
use sqlx::SqlitePool;
use tokio::sync::RwLock;

/// Target scope of a sync run
#[derive(Debug, Clone)]
pub enum SyncScope {
    /// Stable project identifier, passed straight to the listing endpoint
    ProjectId(String),
    /// Human-readable project name; resolved to an identifier first,
    /// with client-side name filtering as the fallback
    ProjectName(String),
}

impl SyncScope {
    fn describe(&self) -> String {
        match self {
            SyncScope::ProjectId(id) => format!("project {id}"),
            SyncScope::ProjectName(name) => format!("project named \"{name}\""),
        }
    }
}

/// Parameters of one sync run
#[derive(Debug, Clone)]
pub struct SyncRequest {
    pub scope: SyncScope,
    pub tracker_id: Option<String>,
    pub page_size: usize,
    /// Bounded-preview cap on total items; None fetches everything
    pub hard_cap: Option<usize>,
    /// Kind assigned to subjects created by this run
    pub kind: SubjectKind,
}

/// Execute one sync run
///
/// The returned `SyncRun` is the sole observable result; `status` is
/// kept updated at every state transition so an in-flight run can be
/// observed. Callers serialize runs (run-level mutex in `AppState`);
/// each item's upsert is independently atomic, so there is no run-level
/// rollback to coordinate.
pub async fn run_sync<S: IssueSource>(
    pool: &SqlitePool,
    source: &S,
    request: SyncRequest,
    status: &RwLock<Option<SyncRun>>,
) -> SyncRun {
    let mut run = SyncRun::new(request.scope.describe());
    tracing::info!(
        run_id = %run.run_id,
        scope = %run.scope,
        page_size = request.page_size,
        hard_cap = ?request.hard_cap,
        "Starting sync run"
    );

    run.transition_to(SyncState::Fetching);
    publish(status, &run).await;

    let fetched = match &request.scope {
        SyncScope::ProjectId(project_id) => {
            let query = IssueQuery {
                project_id: Some(project_id.clone()),
                tracker_id: request.tracker_id.clone(),
            };
            fetch_all_pages(source, &query, request.page_size, request.hard_cap).await
        }
        SyncScope::ProjectName(name) => {
            fetch_issues_by_project_name(
                source,
                name,
                request.tracker_id.clone(),
                request.page_size,
                request.hard_cap,
            )
            .await
        }
    };

    let issues: Vec<RawIssue> = match fetched {
        Ok(issues) => issues,
        Err(err) => {
            run.summary.fetched = err.fetched;
            run.error = Some(err.to_string());
            run.transition_to(SyncState::Failed);
            publish(status, &run).await;
            tracing::error!(
                run_id = %run.run_id,
                fetched = err.fetched,
                error = %err,
                "Sync run aborted during fetch"
            );
            return run;
        }
    };

    run.summary.fetched = issues.len();
    run.transition_to(SyncState::Mapping);
    publish(status, &run).await;

    let mut mapped: Vec<CanonicalIssue> = Vec::with_capacity(issues.len());
    for issue in &issues {
        // The mapper is total for well-formed payloads; an item without a
        // usable id cannot be keyed and is the one mapping failure mode.
        if issue.id <= 0 {
            run.summary.failed.push(SyncFailure {
                redmine_id: None,
                stage: "map".to_string(),
                message: format!("issue has invalid id {}", issue.id),
            });
            continue;
        }
        mapped.push(issue_mapper::map_issue(issue));
    }

    run.transition_to(SyncState::Upserting);
    publish(status, &run).await;

    for issue in &mapped {
        match subjects::upsert_external(pool, issue, request.kind).await {
            Ok(UpsertOutcome::Created) => run.summary.created += 1,
            Ok(UpsertOutcome::Updated) => run.summary.updated += 1,
            Err(err) => {
                tracing::warn!(
                    redmine_id = issue.redmine_id,
                    error = %err,
                    "Upsert failed; continuing with remaining items"
                );
                run.summary.failed.push(SyncFailure {
                    redmine_id: Some(issue.redmine_id),
                    stage: "upsert".to_string(),
                    message: err.to_string(),
                });
            }
        }
    }

    run.transition_to(SyncState::Completed);
    publish(status, &run).await;

    tracing::info!(
        run_id = %run.run_id,
        fetched = run.summary.fetched,
        created = run.summary.created,
        updated = run.summary.updated,
        failed = run.summary.failed.len(),
        "Sync run completed"
    );

    run
}

async fn publish(status: &RwLock<Option<SyncRun>>, run: &SyncRun) {
    *status.write().await = Some(run.clone());
}
