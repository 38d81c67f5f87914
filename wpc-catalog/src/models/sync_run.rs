//! Sync run state machine
//!
//! A run progresses Idle → Fetching → Mapping → Upserting → Completed,
//! with Failed reachable from any non-terminal state. Runs are
//! process-local and never persisted: every run starts from offset zero,
//! so re-triggering after a crash or failure is always safe.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sync run state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SyncState {
    /// Run created, nothing started yet
    Idle,
    /// Paged fetch from the external tracker
    Fetching,
    /// Raw payloads projected to canonical fields
    Mapping,
    /// Field-partitioned upsert into local storage
    Upserting,
    /// Run finished; summary is final
    Completed,
    /// Fetch-stage failure aborted the run
    Failed,
}

/// One recorded per-item failure
///
/// Mapping and upsert failures are recorded here and the run continues;
/// only fetch-stage failures abort a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncFailure {
    /// External id of the offending item, when known
    pub redmine_id: Option<i64>,
    /// Stage that failed ("map" or "upsert")
    pub stage: String,
    pub message: String,
}

/// Per-run result counters, the sole observable outcome of a run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncSummary {
    /// Items fetched from the tracker (partial when the run failed mid-fetch)
    pub fetched: usize,
    /// Subjects created by this run
    pub created: usize,
    /// Subjects whose external fields were refreshed
    pub updated: usize,
    /// Per-item failures; never aborts the run
    pub failed: Vec<SyncFailure>,
}

/// In-memory sync run (current or most recent)
#[derive(Debug, Clone, Serialize)]
pub struct SyncRun {
    pub run_id: Uuid,
    pub state: SyncState,
    /// Human-readable description of the target scope
    pub scope: String,
    pub summary: SyncSummary,
    /// Fetch-stage error that aborted the run, when state is Failed
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl SyncRun {
    pub fn new(scope: String) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            state: SyncState::Idle,
            scope,
            summary: SyncSummary::default(),
            error: None,
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    /// Transition to a new state, stamping the end time on terminal states
    pub fn transition_to(&mut self, new_state: SyncState) {
        tracing::debug!(
            run_id = %self.run_id,
            old_state = ?self.state,
            new_state = ?new_state,
            "Sync run state transition"
        );
        self.state = new_state;
        if self.is_terminal() {
            self.ended_at = Some(Utc::now());
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.state, SyncState::Completed | SyncState::Failed)
    }
}
