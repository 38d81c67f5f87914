//! Projection of raw tracker issues into canonical subject fields
//!
//! Pure and total: a well-formed payload always maps, and anything
//! optional that is missing becomes None. Only the externally-sourced
//! field subset comes out of here; locally-editable fields never pass
//! through this module.

use crate::services::redmine_client::RawIssue;
use serde::Serialize;

/// Title used when the tracker sends an issue without a subject
const DEFAULT_TITLE: &str = "Untitled";
/// Sponsor label when the issue carries no project reference
const NO_PROJECT: &str = "No project";
/// Organizational prefix stripped from project names when deriving the
/// sponsor label
const ORG_PREFIX: &str = "UT ";
/// Stable id of the completion-date custom field. Ids survive renames
/// and localization upstream; display names do not.
const COMPLETION_DATE_FIELD_ID: i64 = 15;

/// Externally-sourced field subset of one issue
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalIssue {
    pub redmine_id: i64,
    pub title: String,
    /// Short sponsor label derived from the project name
    pub sponsor: String,
    /// Full project name as the tracker reports it
    pub project_name: Option<String>,
    pub created_on: Option<String>,
    /// Completion date custom field, kept verbatim
    pub completed_on: Option<String>,
    pub total_spent_hours: Option<f64>,
}

/// Map a raw issue to its canonical fields
pub fn map_issue(issue: &RawIssue) -> CanonicalIssue {
    let project_name = issue.project.as_ref().map(|p| p.name.clone());

    CanonicalIssue {
        redmine_id: issue.id,
        title: issue
            .subject
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        sponsor: parse_sponsor(project_name.as_deref()),
        project_name,
        created_on: issue.created_on.clone(),
        completed_on: custom_field_value(issue, COMPLETION_DATE_FIELD_ID),
        total_spent_hours: issue.total_spent_hours,
    }
}

/// Derive the sponsor label from a project's full name
///
/// "UT Bancor | Mantenimiento" -> "Bancor": the segment before the
/// separator with the organizational prefix stripped. Stripping that
/// leaves nothing keeps the unstripped segment.
pub fn parse_sponsor(project_name: Option<&str>) -> String {
    let Some(name) = project_name.filter(|n| !n.trim().is_empty()) else {
        return NO_PROJECT.to_string();
    };

    let segment = match name.split_once('|') {
        Some((before, _)) => before.trim(),
        None => name.trim(),
    };

    let stripped = strip_org_prefix(segment);
    if stripped.is_empty() {
        segment.to_string()
    } else {
        stripped.to_string()
    }
}

fn strip_org_prefix(segment: &str) -> &str {
    match segment.get(..ORG_PREFIX.len()) {
        Some(head) if head.eq_ignore_ascii_case(ORG_PREFIX) => segment[ORG_PREFIX.len()..].trim(),
        _ => segment,
    }
}

/// Extract a custom field value by its stable numeric id
fn custom_field_value(issue: &RawIssue, field_id: i64) -> Option<String> {
    let fields = issue.custom_fields.as_ref()?;
    let field = fields.iter().find(|cf| cf.id == field_id)?;
    let value = field.value.as_ref()?;

    match value {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
