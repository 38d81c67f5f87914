//! Consistency verification handlers
//!
//! Diagnostic surface over the checker; intended for operational use
//! (scheduled or manual), not the request path.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::services::consistency_checker::{self, VerifyReport, DEFAULT_THRESHOLD};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct VerifyParams {
    pub threshold: Option<f64>,
}

/// GET /consistency response
#[derive(Debug, Serialize)]
pub struct VerifyAllResponse {
    pub threshold: f64,
    pub mismatches: Vec<VerifyReport>,
}

/// GET /consistency
///
/// Recompute every persisted score and report the rows whose stored
/// value drifted beyond the threshold.
pub async fn verify_all(
    State(state): State<AppState>,
    Query(params): Query<VerifyParams>,
) -> ApiResult<Json<VerifyAllResponse>> {
    let threshold = params.threshold.unwrap_or(DEFAULT_THRESHOLD);
    if threshold < 0.0 {
        return Err(ApiError::BadRequest(
            "threshold must be non-negative".to_string(),
        ));
    }

    let mismatches = consistency_checker::verify_all(&state.db, threshold).await?;
    Ok(Json(VerifyAllResponse {
        threshold,
        mismatches,
    }))
}

/// GET /subjects/{id}/consistency
pub async fn verify_one(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<VerifyReport>> {
    let report = consistency_checker::verify(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No persisted score for subject {id}")))?;
    Ok(Json(report))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/consistency", get(verify_all))
        .route("/subjects/:id/consistency", get(verify_one))
}
