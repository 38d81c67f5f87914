//! Subject persistence
//!
//! Two write paths, one per column group:
//! - `upsert_external` (sync) writes only externally-sourced columns
//! - `update_local_fields` (user edits) writes only locally-editable ones
//!
//! Neither path may ever touch the other group's columns.

use crate::models::{LocalFieldsUpdate, NewSubject, Subject};
use crate::scoring::SubjectKind;
use crate::services::issue_mapper::CanonicalIssue;
use anyhow::{anyhow, Result};
use sqlx::{Row, SqlitePool};

/// Whether an upsert created a new row or refreshed an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

/// Create a manual subject (no external identifier)
pub async fn create_manual(pool: &SqlitePool, new: &NewSubject) -> Result<Subject> {
    let result = sqlx::query(
        r#"
        INSERT INTO subjects (kind, title, description, section, amount, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(new.kind.as_str())
    .bind(&new.title)
    .bind(&new.description)
    .bind(&new.section)
    .bind(new.amount)
    .execute(pool)
    .await?;

    let id = result.last_insert_rowid();
    load(pool, id)
        .await?
        .ok_or_else(|| anyhow!("subject {id} vanished after insert"))
}

/// Insert or refresh a subject from its canonical external fields
///
/// Single atomic statement keyed by `redmine_id`. On conflict only the
/// externally-sourced columns are overwritten; description, section,
/// amount, title_override and kind are left exactly as they were.
pub async fn upsert_external(
    pool: &SqlitePool,
    issue: &CanonicalIssue,
    kind: SubjectKind,
) -> Result<UpsertOutcome> {
    let existing = sqlx::query("SELECT 1 FROM subjects WHERE redmine_id = ?")
        .bind(issue.redmine_id)
        .fetch_optional(pool)
        .await?;

    sqlx::query(
        r#"
        INSERT INTO subjects (
            redmine_id, kind, title, sponsor, project_name,
            created_on, completed_on, total_spent_hours,
            created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        ON CONFLICT(redmine_id) DO UPDATE SET
            title = excluded.title,
            sponsor = excluded.sponsor,
            project_name = excluded.project_name,
            created_on = excluded.created_on,
            completed_on = excluded.completed_on,
            total_spent_hours = excluded.total_spent_hours,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(issue.redmine_id)
    .bind(kind.as_str())
    .bind(&issue.title)
    .bind(&issue.sponsor)
    .bind(&issue.project_name)
    .bind(&issue.created_on)
    .bind(&issue.completed_on)
    .bind(issue.total_spent_hours)
    .execute(pool)
    .await?;

    Ok(if existing.is_some() {
        UpsertOutcome::Updated
    } else {
        UpsertOutcome::Created
    })
}

/// Update the locally-editable field group
///
/// The whole group is replaced from the payload; externally-sourced
/// columns are not part of the statement at all. Returns None when the
/// subject does not exist.
pub async fn update_local_fields(
    pool: &SqlitePool,
    id: i64,
    update: &LocalFieldsUpdate,
) -> Result<Option<Subject>> {
    let result = sqlx::query(
        r#"
        UPDATE subjects
        SET title_override = ?,
            description = ?,
            section = ?,
            amount = ?,
            updated_at = CURRENT_TIMESTAMP
        WHERE id = ?
        "#,
    )
    .bind(&update.title_override)
    .bind(&update.description)
    .bind(&update.section)
    .bind(update.amount)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    load(pool, id).await
}

/// Load subject by local id
pub async fn load(pool: &SqlitePool, id: i64) -> Result<Option<Subject>> {
    let row = sqlx::query(&select_sql("WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.map(row_to_subject).transpose()
}

/// Load subject by external identifier
pub async fn load_by_redmine_id(pool: &SqlitePool, redmine_id: i64) -> Result<Option<Subject>> {
    let row = sqlx::query(&select_sql("WHERE redmine_id = ?"))
        .bind(redmine_id)
        .fetch_optional(pool)
        .await?;
    row.map(row_to_subject).transpose()
}

/// List all subjects, newest first
pub async fn list(pool: &SqlitePool) -> Result<Vec<Subject>> {
    let rows = sqlx::query(&select_sql("ORDER BY id DESC"))
        .fetch_all(pool)
        .await?;
    rows.into_iter().map(row_to_subject).collect()
}

fn select_sql(suffix: &str) -> String {
    format!(
        r#"
        SELECT id, redmine_id, kind, title, title_override, description,
               section, sponsor, project_name, amount,
               created_on, completed_on, total_spent_hours
        FROM subjects {suffix}
        "#
    )
}

fn row_to_subject(row: sqlx::sqlite::SqliteRow) -> Result<Subject> {
    let kind_str: String = row.get("kind");
    let kind = SubjectKind::parse(&kind_str)
        .ok_or_else(|| anyhow!("unknown subject kind in database: {kind_str}"))?;

    Ok(Subject {
        id: row.get("id"),
        redmine_id: row.get("redmine_id"),
        kind,
        title: row.get("title"),
        title_override: row.get("title_override"),
        description: row.get("description"),
        section: row.get("section"),
        sponsor: row.get("sponsor"),
        project_name: row.get("project_name"),
        amount: row.get("amount"),
        created_on: row.get("created_on"),
        completed_on: row.get("completed_on"),
        total_spent_hours: row.get("total_spent_hours"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canonical(redmine_id: i64, title: &str) -> CanonicalIssue {
        CanonicalIssue {
            redmine_id,
            title: title.to_string(),
            sponsor: "Bancor".to_string(),
            project_name: Some("UT Bancor | Mantenimiento".to_string()),
            created_on: Some("2024-02-10T09:15:00Z".to_string()),
            completed_on: None,
            total_spent_hours: Some(12.0),
        }
    }

    #[tokio::test]
    async fn test_upsert_creates_then_updates() {
        let pool = wpc_common::db::init::init_memory_database()
            .await
            .expect("db");

        let outcome = upsert_external(&pool, &canonical(42, "First title"), SubjectKind::Feature)
            .await
            .expect("upsert");
        assert_eq!(outcome, UpsertOutcome::Created);

        let outcome = upsert_external(&pool, &canonical(42, "Renamed title"), SubjectKind::Feature)
            .await
            .expect("upsert");
        assert_eq!(outcome, UpsertOutcome::Updated);

        let subject = load_by_redmine_id(&pool, 42)
            .await
            .expect("load")
            .expect("exists");
        assert_eq!(subject.title, "Renamed title");
    }

    #[tokio::test]
    async fn test_local_edit_survives_external_upsert() {
        let pool = wpc_common::db::init::init_memory_database()
            .await
            .expect("db");

        upsert_external(&pool, &canonical(7, "Synced"), SubjectKind::Backlog)
            .await
            .expect("upsert");
        let subject = load_by_redmine_id(&pool, 7)
            .await
            .expect("load")
            .expect("exists");

        let update = LocalFieldsUpdate {
            description: Some("local notes".to_string()),
            section: Some("Payments".to_string()),
            amount: Some(1500.0),
            title_override: Some("Our name".to_string()),
        };
        update_local_fields(&pool, subject.id, &update)
            .await
            .expect("update")
            .expect("exists");

        // Re-sync with fresher external data
        let mut fresher = canonical(7, "Synced v2");
        fresher.total_spent_hours = Some(99.0);
        upsert_external(&pool, &fresher, SubjectKind::Backlog)
            .await
            .expect("upsert");

        let subject = load_by_redmine_id(&pool, 7)
            .await
            .expect("load")
            .expect("exists");
        // External group refreshed
        assert_eq!(subject.title, "Synced v2");
        assert_eq!(subject.total_spent_hours, Some(99.0));
        // Local group untouched
        assert_eq!(subject.description.as_deref(), Some("local notes"));
        assert_eq!(subject.section.as_deref(), Some("Payments"));
        assert_eq!(subject.amount, Some(1500.0));
        assert_eq!(subject.title_override.as_deref(), Some("Our name"));
        assert_eq!(subject.display_title(), "Our name");
    }

    #[tokio::test]
    async fn test_local_update_does_not_touch_external_fields() {
        let pool = wpc_common::db::init::init_memory_database()
            .await
            .expect("db");

        upsert_external(&pool, &canonical(11, "Synced"), SubjectKind::Feature)
            .await
            .expect("upsert");
        let subject = load_by_redmine_id(&pool, 11)
            .await
            .expect("load")
            .expect("exists");

        let updated = update_local_fields(
            &pool,
            subject.id,
            &LocalFieldsUpdate {
                description: Some("notes".to_string()),
                ..LocalFieldsUpdate::default()
            },
        )
        .await
        .expect("update")
        .expect("exists");

        assert_eq!(updated.title, "Synced");
        assert_eq!(updated.sponsor.as_deref(), Some("Bancor"));
        assert_eq!(updated.created_on.as_deref(), Some("2024-02-10T09:15:00Z"));
    }

    #[tokio::test]
    async fn test_manual_subject_has_no_redmine_id() {
        let pool = wpc_common::db::init::init_memory_database()
            .await
            .expect("db");

        let subject = create_manual(
            &pool,
            &NewSubject {
                title: "Internal tooling idea".to_string(),
                kind: SubjectKind::Idea,
                description: None,
                section: None,
                amount: None,
            },
        )
        .await
        .expect("create");

        assert!(subject.redmine_id.is_none());
        assert_eq!(subject.kind, SubjectKind::Idea);
    }

    #[tokio::test]
    async fn test_update_missing_subject_returns_none() {
        let pool = wpc_common::db::init::init_memory_database()
            .await
            .expect("db");

        let result = update_local_fields(&pool, 999, &LocalFieldsUpdate::default())
            .await
            .expect("query");
        assert!(result.is_none());
    }
}
