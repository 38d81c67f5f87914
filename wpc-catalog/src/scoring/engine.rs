//! Pure weighted-scoring formula
//!
//! `score = positive_avg - negative_avg * dampening_factor`, where each
//! group average is `Σ(value · weight/100) / (Σweight/100)` and a group
//! with zero total weight averages to 0. The same function serves live
//! preview, persistence, and the consistency checker; the only per-kind
//! input is the dampening factor from `ScoringProfile`.
//!
//! The engine does not clamp: criteria range validation happens at the
//! boundary, and out-of-range inputs here are a caller bug.

use crate::models::score::{Criteria, Weights};

/// Compute the final score, rounded to 2 decimals
pub fn compute_score(criteria: &Criteria, weights: &Weights, dampening_factor: f64) -> f64 {
    round2(compute_score_raw(criteria, weights, dampening_factor))
}

/// Compute the score without the final rounding step
///
/// Intermediate averages are never rounded; only `compute_score` rounds,
/// and only once, on the final result.
pub fn compute_score_raw(criteria: &Criteria, weights: &Weights, dampening_factor: f64) -> f64 {
    let positive = group_average(&[
        (criteria.revenue, weights.revenue),
        (criteria.potential_revenue, weights.potential_revenue),
        (criteria.client_impact, weights.client_impact),
    ]);

    let negative = group_average(&[
        (criteria.effort, weights.effort),
        (criteria.uncertainty, weights.uncertainty),
        (criteria.risk, weights.risk),
    ]);

    positive - negative * dampening_factor
}

/// Percentage-weighted average of one criteria group
///
/// Weight sums are treated as percentages: the divisor is `Σweight/100`,
/// so weights summing to 100 reduce to a direct percentage-weighted mean.
/// Zero total weight yields 0, never a division by zero.
fn group_average(entries: &[(i64, f64)]) -> f64 {
    let weighted_sum: f64 = entries
        .iter()
        .map(|(value, weight)| *value as f64 * weight / 100.0)
        .sum();
    let weight_sum: f64 = entries.iter().map(|(_, weight)| weight).sum();

    if weight_sum > 0.0 {
        weighted_sum / (weight_sum / 100.0)
    } else {
        0.0
    }
}

/// Round to 2 decimals, half away from zero
///
/// Ties are decided by `f64::round` on the value scaled by 100, i.e. on
/// the binary double rather than its printed decimal form.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
