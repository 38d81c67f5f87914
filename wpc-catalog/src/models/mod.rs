//! Domain models for the catalog service

pub mod score;
pub mod subject;
pub mod sync_run;

pub use score::{Criteria, ValidationError, Weights, WeightsUpdate};
pub use subject::{LocalFieldsUpdate, NewSubject, Subject};
pub use sync_run::{SyncFailure, SyncRun, SyncState, SyncSummary};
