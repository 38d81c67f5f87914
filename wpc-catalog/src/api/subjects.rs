//! Subject API handlers
//!
//! Creation and local-field editing only. Externally-sourced fields are
//! not writable here under any request shape; they belong to the sync
//! engine.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::db::{scores, subjects};
use crate::error::{ApiError, ApiResult};
use crate::models::{LocalFieldsUpdate, NewSubject, Subject};
use crate::AppState;

/// Subject detail with its score record, when one exists
#[derive(Debug, Serialize)]
pub struct SubjectDetail {
    pub subject: Subject,
    pub score: Option<scores::ScoreRecord>,
}

/// POST /subjects
///
/// Create a manual subject (no external identifier).
pub async fn create_subject(
    State(state): State<AppState>,
    Json(new): Json<NewSubject>,
) -> ApiResult<Json<Subject>> {
    if new.title.trim().is_empty() {
        return Err(ApiError::BadRequest("title must not be empty".to_string()));
    }

    let subject = subjects::create_manual(&state.db, &new).await?;
    tracing::info!(subject_id = subject.id, kind = %subject.kind, "Subject created");
    Ok(Json(subject))
}

/// GET /subjects
pub async fn list_subjects(State(state): State<AppState>) -> ApiResult<Json<Vec<Subject>>> {
    Ok(Json(subjects::list(&state.db).await?))
}

/// GET /subjects/{id}
pub async fn get_subject(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<SubjectDetail>> {
    let subject = subjects::load(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Subject not found: {id}")))?;
    let score = scores::load(&state.db, id).await?;

    Ok(Json(SubjectDetail { subject, score }))
}

/// PUT /subjects/{id}
///
/// Replace the locally-editable field group.
pub async fn update_subject(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(update): Json<LocalFieldsUpdate>,
) -> ApiResult<Json<Subject>> {
    let subject = subjects::update_local_fields(&state.db, id, &update)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Subject not found: {id}")))?;

    tracing::info!(subject_id = id, "Subject local fields updated");
    Ok(Json(subject))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/subjects", get(list_subjects).post(create_subject))
        .route("/subjects/:id", get(get_subject).put(update_subject))
}
