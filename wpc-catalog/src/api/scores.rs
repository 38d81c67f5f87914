//! Scoring API handlers
//!
//! Criteria and weights are independently addressable writes against the
//! same score row; preview computes without persisting anything.

use axum::{
    extract::{Path, Query, State},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::db::{scores, subjects};
use crate::error::{ApiError, ApiResult};
use crate::models::{Criteria, Weights, WeightsUpdate};
use crate::scoring::{self, SubjectKind};
use crate::AppState;

/// PUT /subjects/{id}/criteria
///
/// Validates every criterion into [0, 10] before anything is written;
/// an out-of-range value rejects the whole submission.
pub async fn update_criteria(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(criteria): Json<Criteria>,
) -> ApiResult<Json<scores::ScoreRecord>> {
    criteria.validate()?;

    let subject = subjects::load(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Subject not found: {id}")))?;

    let record =
        scores::update_criteria(&state.db, id, &criteria, &subject.kind.profile()).await?;
    tracing::info!(subject_id = id, score = ?record.score, "Criteria updated");
    Ok(Json(record))
}

/// PUT /subjects/{id}/weights
///
/// Omitted weights fall back to the subject kind's defaults; stored
/// criteria are untouched.
pub async fn update_weights(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(update): Json<WeightsUpdate>,
) -> ApiResult<Json<scores::ScoreRecord>> {
    let subject = subjects::load(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Subject not found: {id}")))?;

    let profile = subject.kind.profile();
    let weights = update.resolve(&profile)?;

    let record = scores::update_weights(&state.db, id, &weights, &profile).await?;
    tracing::info!(subject_id = id, score = ?record.score, "Weights updated");
    Ok(Json(record))
}

/// POST /score/preview request
#[derive(Debug, Deserialize)]
pub struct PreviewRequest {
    #[serde(default = "default_kind")]
    pub kind: SubjectKind,
    pub criteria: Criteria,
    #[serde(default)]
    pub weights: WeightsUpdate,
}

fn default_kind() -> SubjectKind {
    SubjectKind::Feature
}

/// POST /score/preview response
#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub score: f64,
    pub criteria: Criteria,
    pub weights: Weights,
}

/// POST /score/preview
///
/// Live computation without persistence.
pub async fn preview_score(
    Json(request): Json<PreviewRequest>,
) -> ApiResult<Json<PreviewResponse>> {
    request.criteria.validate()?;

    let profile = request.kind.profile();
    let weights = request.weights.resolve(&profile)?;
    let score = scoring::compute_score(&request.criteria, &weights, profile.dampening_factor);

    Ok(Json(PreviewResponse {
        score,
        criteria: request.criteria,
        weights,
    }))
}

#[derive(Debug, Deserialize)]
pub struct RankingParams {
    pub limit: Option<i64>,
}

/// GET /score/ranking
pub async fn ranking(
    State(state): State<AppState>,
    Query(params): Query<RankingParams>,
) -> ApiResult<Json<Vec<scores::RankingEntry>>> {
    let limit = params.limit.unwrap_or(50).clamp(1, 500);
    Ok(Json(scores::ranking(&state.db, limit).await?))
}

/// GET /score/stats
pub async fn stats(State(state): State<AppState>) -> ApiResult<Json<scores::ScoreStats>> {
    Ok(Json(scores::stats(&state.db).await?))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/subjects/:id/criteria", put(update_criteria))
        .route("/subjects/:id/weights", put(update_weights))
        .route("/score/preview", post(preview_score))
        .route("/score/ranking", get(ranking))
        .route("/score/stats", get(stats))
}
