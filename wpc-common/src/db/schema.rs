//! Table schema for the catalog database
//!
//! All statements are `CREATE TABLE IF NOT EXISTS` so startup can apply
//! them unconditionally.
//!
//! Column groups on `subjects` matter: sync overwrites only the
//! externally-sourced group, local edits touch only the editable group.
//! The split is enforced by the queries in `wpc-catalog/src/db`, not by
//! the schema itself.

use crate::Result;
use sqlx::SqlitePool;
use tracing::info;

/// Create all catalog tables (idempotent)
pub async fn create_all_tables(pool: &SqlitePool) -> Result<()> {
    create_subjects_table(pool).await?;
    create_scores_table(pool).await?;
    info!("Database tables initialized (subjects, scores)");
    Ok(())
}

/// Prioritizable catalog items
///
/// `redmine_id` is the stable external identifier; NULL for subjects
/// created locally. Externally-sourced columns: title, sponsor,
/// project_name, created_on, completed_on, total_spent_hours.
/// Locally-editable columns: title_override, description, section, amount.
async fn create_subjects_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS subjects (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            redmine_id INTEGER UNIQUE,
            kind TEXT NOT NULL DEFAULT 'feature',
            title TEXT NOT NULL,
            title_override TEXT,
            description TEXT,
            section TEXT,
            sponsor TEXT,
            project_name TEXT,
            amount REAL,
            created_on TEXT,
            completed_on TEXT,
            total_spent_hours REAL,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Criteria, weights and the cached score, one row per evaluated subject
///
/// Created lazily on the first criteria or weight write. The `score`
/// column is a cache of the pure scoring function and is rewritten by
/// application code on every criteria or weight update; the consistency
/// checker compares it against an independent recomputation.
async fn create_scores_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS scores (
            subject_id INTEGER PRIMARY KEY
                REFERENCES subjects(id) ON DELETE CASCADE,
            origin INTEGER NOT NULL DEFAULT 0,
            revenue INTEGER NOT NULL DEFAULT 0,
            potential_revenue INTEGER NOT NULL DEFAULT 0,
            client_impact INTEGER NOT NULL DEFAULT 0,
            effort INTEGER NOT NULL DEFAULT 0,
            uncertainty INTEGER NOT NULL DEFAULT 0,
            risk INTEGER NOT NULL DEFAULT 0,
            weight_origin REAL NOT NULL DEFAULT 40,
            weight_revenue REAL NOT NULL DEFAULT 40,
            weight_potential_revenue REAL NOT NULL DEFAULT 20,
            weight_client_impact REAL NOT NULL DEFAULT 40,
            weight_effort REAL NOT NULL DEFAULT 40,
            weight_uncertainty REAL NOT NULL DEFAULT 30,
            weight_risk REAL NOT NULL DEFAULT 30,
            score REAL,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
