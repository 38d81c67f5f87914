//! Criteria and weight value objects with range validation

use crate::scoring::ScoringProfile;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation failure naming the offending field
///
/// Values are rejected, never clamped: an out-of-range submission must not
/// mutate stored state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("criterion '{field}' must be between 0 and 10, got {value}")]
    CriterionOutOfRange { field: &'static str, value: i64 },

    #[error("weight '{field}' must be non-negative, got {value}")]
    NegativeWeight { field: &'static str, value: f64 },
}

/// Per-subject scored criteria, integers in [0, 10]
///
/// `origin` is persisted for reporting but deliberately excluded from the
/// score formula. Omitted fields default to 0, matching how a blank
/// evaluation form reads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Criteria {
    #[serde(default)]
    pub origin: i64,
    #[serde(default)]
    pub revenue: i64,
    #[serde(default)]
    pub potential_revenue: i64,
    #[serde(default)]
    pub client_impact: i64,
    #[serde(default)]
    pub effort: i64,
    #[serde(default)]
    pub uncertainty: i64,
    #[serde(default)]
    pub risk: i64,
}

impl Criteria {
    /// Check every criterion is inside [0, 10]
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in self.fields() {
            if !(0..=10).contains(&value) {
                return Err(ValidationError::CriterionOutOfRange { field, value });
            }
        }
        Ok(())
    }

    fn fields(&self) -> [(&'static str, i64); 7] {
        [
            ("origin", self.origin),
            ("revenue", self.revenue),
            ("potential_revenue", self.potential_revenue),
            ("client_impact", self.client_impact),
            ("effort", self.effort),
            ("uncertainty", self.uncertainty),
            ("risk", self.risk),
        ]
    }
}

/// Per-criterion emphasis factors, non-negative reals
///
/// Weights express relative emphasis within their group, nominally on a
/// 0-100 scale. They persist independently of criteria values: updating
/// one never resets the other.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    pub origin: f64,
    pub revenue: f64,
    pub potential_revenue: f64,
    pub client_impact: f64,
    pub effort: f64,
    pub uncertainty: f64,
    pub risk: f64,
}

impl Weights {
    /// The stock weight set shared by every subject kind
    pub fn standard() -> Weights {
        Weights {
            origin: 40.0,
            revenue: 40.0,
            potential_revenue: 20.0,
            client_impact: 40.0,
            effort: 40.0,
            uncertainty: 30.0,
            risk: 30.0,
        }
    }
}

/// Partial weight update; omitted fields fall back to the subject kind's
/// profile defaults
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct WeightsUpdate {
    pub origin: Option<f64>,
    pub revenue: Option<f64>,
    pub potential_revenue: Option<f64>,
    pub client_impact: Option<f64>,
    pub effort: Option<f64>,
    pub uncertainty: Option<f64>,
    pub risk: Option<f64>,
}

impl WeightsUpdate {
    /// Resolve against profile defaults, rejecting negative values
    pub fn resolve(&self, profile: &ScoringProfile) -> Result<Weights, ValidationError> {
        let defaults = &profile.default_weights;
        Ok(Weights {
            origin: resolve_weight("origin", self.origin, defaults.origin)?,
            revenue: resolve_weight("revenue", self.revenue, defaults.revenue)?,
            potential_revenue: resolve_weight(
                "potential_revenue",
                self.potential_revenue,
                defaults.potential_revenue,
            )?,
            client_impact: resolve_weight(
                "client_impact",
                self.client_impact,
                defaults.client_impact,
            )?,
            effort: resolve_weight("effort", self.effort, defaults.effort)?,
            uncertainty: resolve_weight("uncertainty", self.uncertainty, defaults.uncertainty)?,
            risk: resolve_weight("risk", self.risk, defaults.risk)?,
        })
    }
}

fn resolve_weight(
    field: &'static str,
    submitted: Option<f64>,
    default: f64,
) -> Result<f64, ValidationError> {
    match submitted {
        Some(value) if value < 0.0 => Err(ValidationError::NegativeWeight { field, value }),
        Some(value) => Ok(value),
        None => Ok(default),
    }
}
