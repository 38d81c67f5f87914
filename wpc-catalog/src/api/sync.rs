//! Sync API handlers
//!
//! Administrative trigger and status for reconciliation runs, plus
//! tracker passthroughs used when picking a project scope.

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::models::SyncRun;
use crate::scoring::SubjectKind;
use crate::services::redmine_client::RawProject;
use crate::services::sync_engine::{self, SyncRequest, SyncScope};
use crate::AppState;

/// POST /sync request
#[derive(Debug, Deserialize)]
pub struct SyncTriggerRequest {
    /// Stable project identifier; wins over `project_name`
    #[serde(default)]
    pub project_id: Option<String>,
    /// Project name to resolve when no identifier is known
    #[serde(default)]
    pub project_name: Option<String>,
    #[serde(default)]
    pub tracker_id: Option<String>,
    #[serde(default)]
    pub page_size: Option<usize>,
    /// Bounded-preview cap on total items
    #[serde(default)]
    pub max_total: Option<usize>,
    /// Kind assigned to subjects created by this run
    #[serde(default)]
    pub kind: Option<SubjectKind>,
}

/// POST /sync
///
/// Triggers one reconciliation run and returns it once finished. Runs
/// are serialized: a second trigger waits for the first instead of
/// interleaving with it. The run itself (state + summary) is the
/// response even when the fetch stage failed; per-item failures are in
/// `summary.failed`.
pub async fn trigger_sync(
    State(state): State<AppState>,
    Json(request): Json<SyncTriggerRequest>,
) -> ApiResult<Json<SyncRun>> {
    let scope = if let Some(project_id) = request.project_id {
        SyncScope::ProjectId(project_id)
    } else if let Some(name) = request.project_name {
        SyncScope::ProjectName(name)
    } else if let Some(default) = state.redmine_config.default_project.clone() {
        SyncScope::ProjectId(default)
    } else {
        return Err(ApiError::BadRequest(
            "no sync scope: provide project_id or project_name, or configure a default project"
                .to_string(),
        ));
    };

    let sync_request = SyncRequest {
        scope,
        tracker_id: request
            .tracker_id
            .or_else(|| state.redmine_config.default_tracker.clone()),
        page_size: request.page_size.unwrap_or(state.redmine_config.page_limit),
        hard_cap: request.max_total.or(state.redmine_config.sync_limit),
        kind: request.kind.unwrap_or(SubjectKind::Feature),
    };

    // One run at a time; later triggers queue here
    let _guard = state.sync_lock.lock().await;
    let run = sync_engine::run_sync(
        &state.db,
        state.redmine.as_ref(),
        sync_request,
        &state.last_run,
    )
    .await;

    Ok(Json(run))
}

/// GET /sync/status response
#[derive(Debug, Serialize)]
pub struct SyncStatusResponse {
    pub run: Option<SyncRun>,
}

/// GET /sync/status
///
/// Current or most recent run; None when no run has happened since
/// startup (run state is process-local by design).
pub async fn sync_status(State(state): State<AppState>) -> Json<SyncStatusResponse> {
    let run = state.last_run.read().await.clone();
    Json(SyncStatusResponse { run })
}

#[derive(Debug, Deserialize)]
pub struct ProjectListParams {
    pub limit: Option<usize>,
}

/// GET /redmine/projects
///
/// Paged project listing passthrough, for finding the exact name or
/// identifier of a project.
pub async fn list_projects(
    State(state): State<AppState>,
    Query(params): Query<ProjectListParams>,
) -> ApiResult<Json<Vec<RawProject>>> {
    let projects = state.redmine.list_projects(params.limit).await?;
    Ok(Json(projects))
}

/// GET /redmine/probe response
#[derive(Debug, Serialize)]
pub struct ProbeResponse {
    pub ok: bool,
    /// Total issues visible in the probed scope
    pub total_count: usize,
}

/// GET /redmine/probe
///
/// One-item fetch confirming URL, credential and connectivity.
pub async fn probe(State(state): State<AppState>) -> ApiResult<Json<ProbeResponse>> {
    let total_count = state
        .redmine
        .probe(state.redmine_config.default_project.as_deref())
        .await?;
    Ok(Json(ProbeResponse {
        ok: true,
        total_count,
    }))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sync", post(trigger_sync))
        .route("/sync/status", get(sync_status))
        .route("/redmine/projects", get(list_projects))
        .route("/redmine/probe", get(probe))
}
