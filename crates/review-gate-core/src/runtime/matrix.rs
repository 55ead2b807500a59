// review-gate-core/src/runtime/matrix.rs
// ============================================================================
// Module: Success-Criteria Matrix
// Description: Deterministic verdicts from AI metric readings.
// Purpose: Turn a provider's metric map into pass/fail/neutral against a rule matrix.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! The matrix converts per-metric AI outputs into a deterministic verdict.
//! Missing metrics preserve fail-closed behavior: they either force a neutral
//! verdict (when the rule opts in) or count as unsatisfied comparisons.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use crate::core::identifiers::MetricId;
use crate::core::result::GateStatus;
use crate::core::result::MetricReading;
use crate::core::result::NeutralReason;
use crate::core::rule::Comparison;
use crate::core::rule::SuccessCriteria;

// ============================================================================
// SECTION: Matrix Outcome
// ============================================================================

/// One evaluated comparison, retained for report rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct CriterionCheck {
    /// The comparison as declared by the rule.
    pub comparison: Comparison,
    /// Actual metric value, absent when the metric is missing.
    pub actual: Option<f64>,
    /// True when the comparison is satisfied.
    pub satisfied: bool,
    /// True when the comparison belongs to the `any_of` group.
    pub disjunctive: bool,
}

/// Verdict produced by one matrix evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixOutcome {
    /// Three-valued verdict.
    pub status: GateStatus,
    /// Reason when the verdict is neutral.
    pub neutral_reason: Option<NeutralReason>,
    /// Metrics referenced by the criteria but absent from the provider map.
    pub missing: Vec<MetricId>,
    /// Every evaluated comparison in declaration order (`require` first).
    pub checks: Vec<CriterionCheck>,
}

// ============================================================================
// SECTION: Matrix Evaluation
// ============================================================================

/// Evaluates a success-criteria matrix against a provider metric map.
#[must_use]
pub fn evaluate_matrix(
    criteria: &SuccessCriteria,
    metrics: &BTreeMap<MetricId, MetricReading>,
) -> MatrixOutcome {
    let mut missing: Vec<MetricId> = Vec::new();
    let mut checks: Vec<CriterionCheck> = Vec::new();

    for comparison in &criteria.require {
        checks.push(check_comparison(comparison, metrics, false, &mut missing));
    }
    for comparison in &criteria.any_of {
        checks.push(check_comparison(comparison, metrics, true, &mut missing));
    }

    if !missing.is_empty() && criteria.neutral_on_missing_metrics {
        return MatrixOutcome {
            status: GateStatus::Neutral,
            neutral_reason: Some(NeutralReason::MissingMetrics),
            missing,
            checks,
        };
    }

    let require_ok = checks
        .iter()
        .filter(|check| !check.disjunctive)
        .all(|check| check.satisfied);
    let any_of_ok = criteria.any_of.is_empty()
        || checks.iter().any(|check| check.disjunctive && check.satisfied);

    let status = if require_ok && any_of_ok {
        GateStatus::Pass
    } else {
        GateStatus::Fail
    };

    MatrixOutcome {
        status,
        neutral_reason: None,
        missing,
        checks,
    }
}

/// Evaluates a single comparison, recording missing metrics.
fn check_comparison(
    comparison: &Comparison,
    metrics: &BTreeMap<MetricId, MetricReading>,
    disjunctive: bool,
    missing: &mut Vec<MetricId>,
) -> CriterionCheck {
    let actual = metrics.get(&comparison.metric).map(|reading| reading.value);
    let satisfied = actual.is_some_and(|value| comparison.op.satisfied(value, comparison.threshold));
    if actual.is_none() && !missing.contains(&comparison.metric) {
        missing.push(comparison.metric.clone());
    }
    CriterionCheck {
        comparison: comparison.clone(),
        actual,
        satisfied,
        disjunctive,
    }
}
