//! Integration tests for the score consistency checker

mod common;

use common::test_pool;
use wpc_catalog::db::{scores, subjects};
use wpc_catalog::models::{Criteria, NewSubject};
use wpc_catalog::scoring::SubjectKind;
use wpc_catalog::services::consistency_checker::{verify, verify_all, DEFAULT_THRESHOLD};

async fn scored_subject(pool: &sqlx::SqlitePool, kind: SubjectKind) -> i64 {
    let subject = subjects::create_manual(
        pool,
        &NewSubject {
            title: "Checked subject".to_string(),
            kind,
            description: None,
            section: None,
            amount: None,
        },
    )
    .await
    .expect("create");

    let criteria = Criteria {
        origin: 0,
        revenue: 8,
        potential_revenue: 6,
        client_impact: 7,
        effort: 4,
        uncertainty: 4,
        risk: 2,
    };
    scores::update_criteria(pool, subject.id, &criteria, &kind.profile())
        .await
        .expect("criteria");

    subject.id
}

#[tokio::test]
async fn test_fresh_scores_are_consistent() {
    let pool = test_pool().await;
    scored_subject(&pool, SubjectKind::Feature).await;
    scored_subject(&pool, SubjectKind::InternalProject).await;

    let mismatches = verify_all(&pool, DEFAULT_THRESHOLD).await.expect("verify");
    assert!(mismatches.is_empty());
}

#[tokio::test]
async fn test_verify_reports_stored_and_computed() {
    let pool = test_pool().await;
    let id = scored_subject(&pool, SubjectKind::Feature).await;

    let report = verify(&pool, id).await.expect("verify").expect("report");
    assert_eq!(report.stored_score, Some(6.35));
    assert_eq!(report.computed_score, 6.35);
    assert_eq!(report.delta, Some(0.0));
    assert!(!report.is_mismatch(DEFAULT_THRESHOLD));
}

#[tokio::test]
async fn test_drifted_score_is_detected() {
    let pool = test_pool().await;
    let id = scored_subject(&pool, SubjectKind::Feature).await;

    // Simulate formula drift: the cached value no longer matches what
    // the engine computes from the stored criteria and weights
    sqlx::query("UPDATE scores SET score = 9.99 WHERE subject_id = ?")
        .bind(id)
        .execute(&pool)
        .await
        .expect("corrupt");

    let report = verify(&pool, id).await.expect("verify").expect("report");
    assert_eq!(report.stored_score, Some(9.99));
    assert_eq!(report.computed_score, 6.35);
    assert!(report.delta.expect("delta") > 3.0);
    assert!(report.is_mismatch(DEFAULT_THRESHOLD));

    let mismatches = verify_all(&pool, DEFAULT_THRESHOLD).await.expect("verify");
    assert_eq!(mismatches.len(), 1);
    assert_eq!(mismatches[0].subject_id, id);
}

#[tokio::test]
async fn test_threshold_tolerates_small_deltas() {
    let pool = test_pool().await;
    let id = scored_subject(&pool, SubjectKind::Feature).await;

    // Nudge the cache by less than the threshold
    sqlx::query("UPDATE scores SET score = 6.355 WHERE subject_id = ?")
        .bind(id)
        .execute(&pool)
        .await
        .expect("nudge");

    let mismatches = verify_all(&pool, DEFAULT_THRESHOLD).await.expect("verify");
    assert!(mismatches.is_empty());

    // A tighter threshold flags it
    let mismatches = verify_all(&pool, 0.001).await.expect("verify");
    assert_eq!(mismatches.len(), 1);
}

#[tokio::test]
async fn test_verify_unknown_subject_is_none() {
    let pool = test_pool().await;
    let report = verify(&pool, 12345).await.expect("verify");
    assert!(report.is_none());
}

#[tokio::test]
async fn test_internal_project_verified_with_its_own_dampening() {
    let pool = test_pool().await;
    let id = scored_subject(&pool, SubjectKind::InternalProject).await;

    let report = verify(&pool, id).await.expect("verify").expect("report");
    // 7.2 - 3.4*0.20, not the 0.25 used elsewhere
    assert_eq!(report.stored_score, Some(6.52));
    assert_eq!(report.computed_score, 6.52);
    assert!(!report.is_mismatch(DEFAULT_THRESHOLD));
}
