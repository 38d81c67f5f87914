//! Subject kinds and their scoring profiles

use crate::models::score::Weights;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a catalog subject, resolved once when the subject enters the
/// system and dispatched from there on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectKind {
    Feature,
    Backlog,
    Idea,
    InternalProject,
}

impl SubjectKind {
    /// Stable string form used in the `subjects.kind` column
    pub fn as_str(&self) -> &'static str {
        match self {
            SubjectKind::Feature => "feature",
            SubjectKind::Backlog => "backlog",
            SubjectKind::Idea => "idea",
            SubjectKind::InternalProject => "internal_project",
        }
    }

    /// Parse the stored string form
    pub fn parse(s: &str) -> Option<SubjectKind> {
        match s {
            "feature" => Some(SubjectKind::Feature),
            "backlog" => Some(SubjectKind::Backlog),
            "idea" => Some(SubjectKind::Idea),
            "internal_project" => Some(SubjectKind::InternalProject),
            _ => None,
        }
    }

    /// Scoring profile for this kind
    ///
    /// The internal-project path historically shipped with a 0.20
    /// dampening factor while every other kind uses 0.25. The difference
    /// is kept: changing it would rewrite persisted internal-project
    /// scores, so unification needs a deliberate migration, not a code
    /// cleanup.
    pub fn profile(&self) -> ScoringProfile {
        match self {
            SubjectKind::Feature | SubjectKind::Backlog | SubjectKind::Idea => ScoringProfile {
                dampening_factor: 0.25,
                default_weights: Weights::standard(),
            },
            SubjectKind::InternalProject => ScoringProfile {
                dampening_factor: 0.20,
                default_weights: Weights::standard(),
            },
        }
    }
}

impl fmt::Display for SubjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-kind scoring parameters
///
/// `dampening_factor` scales how much the negative-criteria average
/// suppresses the final score. `default_weights` fill in omitted fields
/// on weight updates and seed newly created score rows.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringProfile {
    pub dampening_factor: f64,
    pub default_weights: Weights,
}
