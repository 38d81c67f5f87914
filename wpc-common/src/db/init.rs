//! Database initialization
//!
//! Opens (or creates) the SQLite database and applies the schema. Safe to
//! call on every startup: schema creation is idempotent.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // mode=rwc: read, write, create
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // Enable foreign keys
    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

    // WAL allows concurrent readers with one writer
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;

    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    super::schema::create_all_tables(&pool).await?;

    Ok(pool)
}

/// Create an in-memory database with the full schema (test support)
///
/// The pool is capped at a single connection: every connection to
/// `sqlite::memory:` is a distinct database, so a wider pool would hand
/// out empty databases.
pub async fn init_memory_database() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;

    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;
    super::schema::create_all_tables(&pool).await?;

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_init_database_creates_file_and_schema() {
        let temp = tempfile::tempdir().expect("tempdir");
        let db_path = temp.path().join("wpc.db");

        let pool = init_database(&db_path).await.expect("init_database");
        assert!(db_path.exists());

        // Schema is queryable
        sqlx::query("SELECT id, redmine_id, kind, title FROM subjects")
            .fetch_all(&pool)
            .await
            .expect("subjects table exists");
        sqlx::query("SELECT subject_id, score FROM scores")
            .fetch_all(&pool)
            .await
            .expect("scores table exists");
    }

    #[tokio::test]
    async fn test_init_database_is_idempotent() {
        let temp = tempfile::tempdir().expect("tempdir");
        let db_path = temp.path().join("wpc.db");

        let pool = init_database(&db_path).await.expect("first init");
        drop(pool);
        init_database(&db_path).await.expect("second init");
    }
}
