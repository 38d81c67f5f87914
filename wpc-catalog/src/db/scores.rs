//! Score persistence
//!
//! One row per evaluated subject, created lazily on the first criteria
//! or weight write. Criteria updates never touch weight columns and
//! weight updates never touch criteria columns; both rewrite the cached
//! `score` through the one scoring engine.

use crate::models::{Criteria, Weights};
use crate::scoring::{self, ScoringProfile};
use anyhow::{anyhow, Result};
use serde::Serialize;
use sqlx::{Row, SqlitePool};

/// Persisted criteria + weights + cached score for one subject
#[derive(Debug, Clone, Serialize)]
pub struct ScoreRecord {
    pub subject_id: i64,
    pub criteria: Criteria,
    pub weights: Weights,
    pub score: Option<f64>,
}

/// Load the score record for a subject
pub async fn load(pool: &SqlitePool, subject_id: i64) -> Result<Option<ScoreRecord>> {
    let row = sqlx::query(
        r#"
        SELECT subject_id, origin, revenue, potential_revenue, client_impact,
               effort, uncertainty, risk,
               weight_origin, weight_revenue, weight_potential_revenue,
               weight_client_impact, weight_effort, weight_uncertainty,
               weight_risk, score
        FROM scores
        WHERE subject_id = ?
        "#,
    )
    .bind(subject_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(row_to_record))
}

/// Create the score row if missing, seeded with zero criteria and the
/// kind's default weights
async fn ensure_exists(
    pool: &SqlitePool,
    subject_id: i64,
    profile: &ScoringProfile,
) -> Result<()> {
    let defaults = &profile.default_weights;
    let initial_score = scoring::compute_score(
        &Criteria::default(),
        defaults,
        profile.dampening_factor,
    );

    sqlx::query(
        r#"
        INSERT INTO scores (
            subject_id,
            weight_origin, weight_revenue, weight_potential_revenue,
            weight_client_impact, weight_effort, weight_uncertainty,
            weight_risk, score, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP)
        ON CONFLICT(subject_id) DO NOTHING
        "#,
    )
    .bind(subject_id)
    .bind(defaults.origin)
    .bind(defaults.revenue)
    .bind(defaults.potential_revenue)
    .bind(defaults.client_impact)
    .bind(defaults.effort)
    .bind(defaults.uncertainty)
    .bind(defaults.risk)
    .bind(initial_score)
    .execute(pool)
    .await?;

    Ok(())
}

/// Persist new criteria values and refresh the cached score
///
/// Stored weights are read back and reused unchanged: submitting
/// criteria must never require resubmitting weights.
pub async fn update_criteria(
    pool: &SqlitePool,
    subject_id: i64,
    criteria: &Criteria,
    profile: &ScoringProfile,
) -> Result<ScoreRecord> {
    ensure_exists(pool, subject_id, profile).await?;

    let existing = load(pool, subject_id)
        .await?
        .ok_or_else(|| anyhow!("score row missing for subject {subject_id}"))?;
    let score = scoring::compute_score(criteria, &existing.weights, profile.dampening_factor);

    sqlx::query(
        r#"
        UPDATE scores
        SET origin = ?, revenue = ?, potential_revenue = ?, client_impact = ?,
            effort = ?, uncertainty = ?, risk = ?,
            score = ?, updated_at = CURRENT_TIMESTAMP
        WHERE subject_id = ?
        "#,
    )
    .bind(criteria.origin)
    .bind(criteria.revenue)
    .bind(criteria.potential_revenue)
    .bind(criteria.client_impact)
    .bind(criteria.effort)
    .bind(criteria.uncertainty)
    .bind(criteria.risk)
    .bind(score)
    .bind(subject_id)
    .execute(pool)
    .await?;

    Ok(ScoreRecord {
        subject_id,
        criteria: *criteria,
        weights: existing.weights,
        score: Some(score),
    })
}

/// Persist new weights and refresh the cached score
///
/// Stored criteria are read back and reused unchanged.
pub async fn update_weights(
    pool: &SqlitePool,
    subject_id: i64,
    weights: &Weights,
    profile: &ScoringProfile,
) -> Result<ScoreRecord> {
    ensure_exists(pool, subject_id, profile).await?;

    let existing = load(pool, subject_id)
        .await?
        .ok_or_else(|| anyhow!("score row missing for subject {subject_id}"))?;
    let score = scoring::compute_score(&existing.criteria, weights, profile.dampening_factor);

    sqlx::query(
        r#"
        UPDATE scores
        SET weight_origin = ?, weight_revenue = ?, weight_potential_revenue = ?,
            weight_client_impact = ?, weight_effort = ?, weight_uncertainty = ?,
            weight_risk = ?,
            score = ?, updated_at = CURRENT_TIMESTAMP
        WHERE subject_id = ?
        "#,
    )
    .bind(weights.origin)
    .bind(weights.revenue)
    .bind(weights.potential_revenue)
    .bind(weights.client_impact)
    .bind(weights.effort)
    .bind(weights.uncertainty)
    .bind(weights.risk)
    .bind(score)
    .bind(subject_id)
    .execute(pool)
    .await?;

    Ok(ScoreRecord {
        subject_id,
        criteria: existing.criteria,
        weights: *weights,
        score: Some(score),
    })
}

/// Ranking entry for score reporting
#[derive(Debug, Clone, Serialize)]
pub struct RankingEntry {
    pub subject_id: i64,
    pub redmine_id: Option<i64>,
    pub title: String,
    pub section: Option<String>,
    pub kind: String,
    pub score: Option<f64>,
}

/// Subjects ordered by score, best first
pub async fn ranking(pool: &SqlitePool, limit: i64) -> Result<Vec<RankingEntry>> {
    let rows = sqlx::query(
        r#"
        SELECT s.id, s.redmine_id, s.kind, s.section,
               COALESCE(s.title_override, s.title) AS display_title,
               sc.score
        FROM subjects s
        JOIN scores sc ON sc.subject_id = s.id
        WHERE sc.score IS NOT NULL
        ORDER BY sc.score DESC
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| RankingEntry {
            subject_id: row.get("id"),
            redmine_id: row.get("redmine_id"),
            title: row.get("display_title"),
            section: row.get("section"),
            kind: row.get("kind"),
            score: row.get("score"),
        })
        .collect())
}

/// Aggregate statistics over persisted scores
#[derive(Debug, Clone, Serialize)]
pub struct ScoreStats {
    pub evaluated: i64,
    pub average: Option<f64>,
    pub maximum: Option<f64>,
    pub minimum: Option<f64>,
}

pub async fn stats(pool: &SqlitePool) -> Result<ScoreStats> {
    let row = sqlx::query(
        r#"
        SELECT COUNT(*) AS evaluated,
               AVG(score) AS average,
               MAX(score) AS maximum,
               MIN(score) AS minimum
        FROM scores
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(ScoreStats {
        evaluated: row.get("evaluated"),
        average: row.get("average"),
        maximum: row.get("maximum"),
        minimum: row.get("minimum"),
    })
}

/// All score records joined with their subject's kind, for batch
/// verification
pub async fn list_with_kind(pool: &SqlitePool) -> Result<Vec<(ScoreRecord, String)>> {
    let rows = sqlx::query(
        r#"
        SELECT sc.subject_id, sc.origin, sc.revenue, sc.potential_revenue,
               sc.client_impact, sc.effort, sc.uncertainty, sc.risk,
               sc.weight_origin, sc.weight_revenue, sc.weight_potential_revenue,
               sc.weight_client_impact, sc.weight_effort, sc.weight_uncertainty,
               sc.weight_risk, sc.score,
               s.kind
        FROM scores sc
        JOIN subjects s ON s.id = sc.subject_id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let kind: String = row.get("kind");
            (row_to_record(row), kind)
        })
        .collect())
}

fn row_to_record(row: sqlx::sqlite::SqliteRow) -> ScoreRecord {
    ScoreRecord {
        subject_id: row.get("subject_id"),
        criteria: Criteria {
            origin: row.get("origin"),
            revenue: row.get("revenue"),
            potential_revenue: row.get("potential_revenue"),
            client_impact: row.get("client_impact"),
            effort: row.get("effort"),
            uncertainty: row.get("uncertainty"),
            risk: row.get("risk"),
        },
        weights: Weights {
            origin: row.get("weight_origin"),
            revenue: row.get("weight_revenue"),
            potential_revenue: row.get("weight_potential_revenue"),
            client_impact: row.get("weight_client_impact"),
            effort: row.get("weight_effort"),
            uncertainty: row.get("weight_uncertainty"),
            risk: row.get("weight_risk"),
        },
        score: row.get("score"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::subjects;
    use crate::models::NewSubject;
    use crate::scoring::SubjectKind;

    async fn subject_id(pool: &SqlitePool, kind: SubjectKind) -> i64 {
        subjects::create_manual(
            pool,
            &NewSubject {
                title: "Test subject".to_string(),
                kind,
                description: None,
                section: None,
                amount: None,
            },
        )
        .await
        .expect("create subject")
        .id
    }

    fn reference_criteria() -> Criteria {
        Criteria {
            origin: 0,
            revenue: 8,
            potential_revenue: 6,
            client_impact: 7,
            effort: 4,
            uncertainty: 4,
            risk: 2,
        }
    }

    #[tokio::test]
    async fn test_criteria_update_creates_row_lazily() {
        let pool = wpc_common::db::init::init_memory_database()
            .await
            .expect("db");
        let id = subject_id(&pool, SubjectKind::Feature).await;

        assert!(load(&pool, id).await.expect("load").is_none());

        let record = update_criteria(
            &pool,
            id,
            &reference_criteria(),
            &SubjectKind::Feature.profile(),
        )
        .await
        .expect("update");

        // 7.2 - 3.4*0.25 with the standard default weights
        assert_eq!(record.score, Some(6.35));
        assert_eq!(record.weights, Weights::standard());
    }

    #[tokio::test]
    async fn test_criteria_update_preserves_stored_weights() {
        let pool = wpc_common::db::init::init_memory_database()
            .await
            .expect("db");
        let id = subject_id(&pool, SubjectKind::Feature).await;
        let profile = SubjectKind::Feature.profile();

        let mut custom = Weights::standard();
        custom.revenue = 60.0;
        update_weights(&pool, id, &custom, &profile)
            .await
            .expect("weights");

        let record = update_criteria(&pool, id, &reference_criteria(), &profile)
            .await
            .expect("criteria");

        // Weight survived the criteria write
        assert_eq!(record.weights.revenue, 60.0);
        let stored = load(&pool, id).await.expect("load").expect("exists");
        assert_eq!(stored.weights.revenue, 60.0);
        assert_eq!(stored.criteria, reference_criteria());
    }

    #[tokio::test]
    async fn test_weight_update_preserves_stored_criteria() {
        let pool = wpc_common::db::init::init_memory_database()
            .await
            .expect("db");
        let id = subject_id(&pool, SubjectKind::Feature).await;
        let profile = SubjectKind::Feature.profile();

        update_criteria(&pool, id, &reference_criteria(), &profile)
            .await
            .expect("criteria");

        let mut custom = Weights::standard();
        custom.effort = 10.0;
        let record = update_weights(&pool, id, &custom, &profile)
            .await
            .expect("weights");

        assert_eq!(record.criteria, reference_criteria());
        // Score recomputed under the new weights:
        // negative = (4*10 + 4*30 + 2*30)/70 = 220/70; score differs from 6.35
        assert_ne!(record.score, Some(6.35));
    }

    #[tokio::test]
    async fn test_internal_project_uses_legacy_dampening() {
        let pool = wpc_common::db::init::init_memory_database()
            .await
            .expect("db");
        let id = subject_id(&pool, SubjectKind::InternalProject).await;

        let record = update_criteria(
            &pool,
            id,
            &reference_criteria(),
            &SubjectKind::InternalProject.profile(),
        )
        .await
        .expect("update");

        // 7.2 - 3.4*0.20 = 6.52
        assert_eq!(record.score, Some(6.52));
    }

    #[tokio::test]
    async fn test_ranking_orders_by_score() {
        let pool = wpc_common::db::init::init_memory_database()
            .await
            .expect("db");
        let profile = SubjectKind::Feature.profile();

        let low = subject_id(&pool, SubjectKind::Feature).await;
        let high = subject_id(&pool, SubjectKind::Feature).await;

        let mut weak = Criteria::default();
        weak.revenue = 2;
        update_criteria(&pool, low, &weak, &profile)
            .await
            .expect("low");
        update_criteria(&pool, high, &reference_criteria(), &profile)
            .await
            .expect("high");

        let ranking = ranking(&pool, 10).await.expect("ranking");
        assert_eq!(ranking.len(), 2);
        assert_eq!(ranking[0].subject_id, high);
        assert_eq!(ranking[1].subject_id, low);

        let stats = stats(&pool).await.expect("stats");
        assert_eq!(stats.evaluated, 2);
        assert_eq!(stats.maximum, Some(6.35));
    }
}
