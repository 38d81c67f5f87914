//! Score consistency verification
//!
//! The `scores.score` column is a cache of the pure scoring function.
//! Two independently evolving copies of the formula have drifted apart
//! before, so this checker recomputes every persisted score from its
//! stored criteria and weights and reports any row where the cache
//! disagrees. A mismatch is a finding for operational review, never an
//! error. Batch/diagnostic path, not request-path code.

use crate::db::scores;
use crate::scoring::{self, SubjectKind};
use anyhow::Result;
use serde::Serialize;
use sqlx::SqlitePool;

/// Recommended mismatch threshold, leaving headroom for the 2-decimal
/// rounding of stored values
pub const DEFAULT_THRESHOLD: f64 = 0.01;

/// Comparison of one subject's stored and recomputed score
#[derive(Debug, Clone, Serialize)]
pub struct VerifyReport {
    pub subject_id: i64,
    pub kind: SubjectKind,
    pub stored_score: Option<f64>,
    pub computed_score: f64,
    /// Absolute difference; None when no score is stored
    pub delta: Option<f64>,
}

impl VerifyReport {
    /// Whether the stored cache disagrees beyond the threshold
    pub fn is_mismatch(&self, threshold: f64) -> bool {
        match self.delta {
            Some(delta) => delta >= threshold,
            None => false,
        }
    }
}

/// Recompute one subject's score and compare against the stored value
///
/// Returns None when the subject has no score record.
pub async fn verify(pool: &SqlitePool, subject_id: i64) -> Result<Option<VerifyReport>> {
    let Some(subject) = crate::db::subjects::load(pool, subject_id).await? else {
        return Ok(None);
    };
    let Some(record) = scores::load(pool, subject_id).await? else {
        return Ok(None);
    };

    Ok(Some(build_report(&record, subject.kind)))
}

/// Recompute every persisted score and report rows that disagree
pub async fn verify_all(pool: &SqlitePool, threshold: f64) -> Result<Vec<VerifyReport>> {
    let records = scores::list_with_kind(pool).await?;
    let total = records.len();
    let mut mismatches = Vec::new();

    for (record, kind_str) in records {
        let Some(kind) = SubjectKind::parse(&kind_str) else {
            tracing::warn!(
                subject_id = record.subject_id,
                kind = %kind_str,
                "Skipping verification: unknown subject kind"
            );
            continue;
        };
        // Rows without a persisted score have nothing to compare
        if record.score.is_none() {
            continue;
        }

        let report = build_report(&record, kind);
        if report.is_mismatch(threshold) {
            tracing::warn!(
                subject_id = report.subject_id,
                stored = ?report.stored_score,
                computed = report.computed_score,
                "Score mismatch detected"
            );
            mismatches.push(report);
        }
    }

    tracing::info!(
        checked = total,
        mismatches = mismatches.len(),
        threshold = threshold,
        "Score consistency verification finished"
    );

    Ok(mismatches)
}

fn build_report(record: &scores::ScoreRecord, kind: SubjectKind) -> VerifyReport {
    let profile = kind.profile();
    let computed =
        scoring::compute_score(&record.criteria, &record.weights, profile.dampening_factor);

    VerifyReport {
        subject_id: record.subject_id,
        kind,
        stored_score: record.score,
        computed_score: computed,
        delta: record.score.map(|stored| (stored - computed).abs()),
    }
}
