//! Catalog subject model
//!
//! A subject row carries two disjoint column groups. The
//! externally-sourced group mirrors the tracker and is rewritten on every
//! sync; the locally-editable group belongs to catalog users and is never
//! touched by sync. Neither operation may cross into the other group.

use crate::scoring::SubjectKind;
use serde::{Deserialize, Serialize};

/// A prioritizable catalog item
#[derive(Debug, Clone, Serialize)]
pub struct Subject {
    pub id: i64,
    /// Stable external identifier; None for locally created subjects
    pub redmine_id: Option<i64>,
    pub kind: SubjectKind,

    // Externally-sourced fields
    pub title: String,
    pub sponsor: Option<String>,
    pub project_name: Option<String>,
    pub created_on: Option<String>,
    pub completed_on: Option<String>,
    pub total_spent_hours: Option<f64>,

    // Locally-editable fields
    pub title_override: Option<String>,
    pub description: Option<String>,
    pub section: Option<String>,
    pub amount: Option<f64>,
}

impl Subject {
    /// Display title: the local override wins over the synced title
    pub fn display_title(&self) -> &str {
        self.title_override.as_deref().unwrap_or(&self.title)
    }
}

/// Payload for creating a manual (non-synced) subject
#[derive(Debug, Clone, Deserialize)]
pub struct NewSubject {
    pub title: String,
    pub kind: SubjectKind,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub section: Option<String>,
    #[serde(default)]
    pub amount: Option<f64>,
}

/// Payload updating the locally-editable field group
///
/// The whole group is replaced: an omitted field clears its column. The
/// externally-sourced group is not addressable through this type at all.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocalFieldsUpdate {
    #[serde(default)]
    pub title_override: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub section: Option<String>,
    #[serde(default)]
    pub amount: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subject() -> Subject {
        Subject {
            id: 1,
            redmine_id: Some(42),
            kind: SubjectKind::Feature,
            title: "Synced title".to_string(),
            sponsor: Some("Bancor".to_string()),
            project_name: Some("UT Bancor | Mantenimiento".to_string()),
            created_on: None,
            completed_on: None,
            total_spent_hours: None,
            title_override: None,
            description: None,
            section: None,
            amount: None,
        }
    }

    #[test]
    fn test_display_title_prefers_override() {
        let mut s = subject();
        assert_eq!(s.display_title(), "Synced title");

        s.title_override = Some("Local name".to_string());
        assert_eq!(s.display_title(), "Local name");
    }
}
