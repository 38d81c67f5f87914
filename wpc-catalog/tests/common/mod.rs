//! Shared test support: in-memory app state and a scripted issue source

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use sqlx::SqlitePool;
use wpc_catalog::config::RedmineConfig;
use wpc_catalog::services::redmine_client::{
    IssuePage, IssueProject, IssueQuery, IssueSource, ProjectPage, RawIssue, RawProject,
    RedmineClient, RedmineError,
};
use wpc_catalog::AppState;

/// In-memory database with the full schema
pub async fn test_pool() -> SqlitePool {
    wpc_common::db::init::init_memory_database()
        .await
        .expect("Failed to create in-memory database")
}

/// App state over an in-memory database and a dummy (never-called)
/// tracker client
pub async fn test_state() -> AppState {
    let pool = test_pool().await;
    test_state_with_pool(pool)
}

pub fn test_state_with_pool(pool: SqlitePool) -> AppState {
    let config = RedmineConfig {
        url: "http://127.0.0.1:9".to_string(),
        token: "test-token".to_string(),
        default_project: None,
        default_tracker: None,
        page_limit: 100,
        sync_limit: None,
    };
    let client = RedmineClient::new(&config).expect("client");
    AppState::new(pool, client, config)
}

/// Scripted tracker source for driving the sync engine without a network
pub struct ScriptedSource {
    pub issues: Vec<RawIssue>,
    pub projects: Vec<RawProject>,
    /// Fail the nth issue-page request (0-based) when set
    pub fail_at_call: Option<usize>,
    calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(issues: Vec<RawIssue>) -> Self {
        Self {
            issues,
            projects: Vec::new(),
            fail_at_call: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_projects(mut self, projects: Vec<RawProject>) -> Self {
        self.projects = projects;
        self
    }

    pub fn failing_at(mut self, call: usize) -> Self {
        self.fail_at_call = Some(call);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl IssueSource for ScriptedSource {
    async fn fetch_page(
        &self,
        _query: &IssueQuery,
        offset: usize,
        limit: usize,
    ) -> Result<IssuePage, RedmineError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if Some(call) == self.fail_at_call {
            return Err(RedmineError::Api(500, "scripted failure".to_string()));
        }

        let end = (offset + limit).min(self.issues.len());
        let issues = if offset < end {
            self.issues[offset..end].to_vec()
        } else {
            Vec::new()
        };
        Ok(IssuePage {
            issues,
            total_count: self.issues.len(),
        })
    }

    async fn fetch_projects_page(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<ProjectPage, RedmineError> {
        let end = (offset + limit).min(self.projects.len());
        let projects = if offset < end {
            self.projects[offset..end].to_vec()
        } else {
            Vec::new()
        };
        Ok(ProjectPage {
            projects,
            total_count: self.projects.len(),
        })
    }
}

/// Raw issue shaped like the tracker's payload
pub fn raw_issue(id: i64, title: &str, project_name: &str) -> RawIssue {
    RawIssue {
        id,
        subject: Some(title.to_string()),
        project: Some(IssueProject {
            id: 1,
            name: project_name.to_string(),
        }),
        created_on: Some("2024-02-10T09:15:00Z".to_string()),
        custom_fields: None,
        total_spent_hours: Some(8.0),
    }
}

pub fn numbered_issues(count: usize) -> Vec<RawIssue> {
    (1..=count)
        .map(|i| raw_issue(i as i64, &format!("Issue {i}"), "UT Bancor | Mantenimiento"))
        .collect()
}
