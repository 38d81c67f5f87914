//! wpc-catalog library interface
//!
//! Work Priority Catalog service: weighted scoring of catalog subjects
//! and read-only reconciliation against an external Redmine tracker.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod scoring;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use crate::config::RedmineConfig;
use crate::models::SyncRun;
use crate::services::redmine_client::RedmineClient;
use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Redmine API client
    pub redmine: Arc<RedmineClient>,
    /// Resolved Redmine settings (defaults for sync requests)
    pub redmine_config: Arc<RedmineConfig>,
    /// Serializes sync runs; concurrent triggers queue, never interleave
    pub sync_lock: Arc<Mutex<()>>,
    /// Current or most recent sync run, for the status endpoint
    pub last_run: Arc<RwLock<Option<SyncRun>>>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(db: SqlitePool, redmine: RedmineClient, redmine_config: RedmineConfig) -> Self {
        Self {
            db,
            redmine: Arc::new(redmine),
            redmine_config: Arc::new(redmine_config),
            sync_lock: Arc::new(Mutex::new(())),
            last_run: Arc::new(RwLock::new(None)),
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::subjects::routes())
        .merge(api::scores::routes())
        .merge(api::sync::routes())
        .merge(api::consistency::routes())
        .merge(api::health::routes())
        .with_state(state)
}
