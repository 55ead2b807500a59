// review-gate-core/tests/matrix.rs
// ============================================================================
// Module: Success-Criteria Matrix Tests
// Description: Tests for deterministic matrix verdicts.
// ============================================================================
//! ## Overview
//! Validates the require/any_of verdict rules and the missing-metric
//! behavior in both neutral and fail-closed modes.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::collections::BTreeMap;

use review_gate_core::GateStatus;
use review_gate_core::MetricId;
use review_gate_core::NeutralReason;
use review_gate_core::SuccessCriteria;
use review_gate_core::evaluate_matrix;
use review_gate_core::result::MetricReading;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Builds a metric map from (id, value) pairs.
fn metrics(pairs: &[(&str, f64)]) -> BTreeMap<MetricId, MetricReading> {
    pairs
        .iter()
        .map(|(id, value)| {
            (MetricId::new(*id), MetricReading {
                value: *value,
                observations: vec![format!("{id} observed")],
            })
        })
        .collect()
}

/// Parses success criteria from YAML.
fn criteria(yaml: &str) -> SuccessCriteria {
    serde_yaml::from_str(yaml).unwrap()
}

// ============================================================================
// SECTION: Require Semantics
// ============================================================================

/// Tests that a satisfied require comparison passes.
#[test]
fn test_require_satisfied_passes() {
    let criteria = criteria("require:\n  - metric: score\n    gte: 0.8\n");
    let outcome = evaluate_matrix(&criteria, &metrics(&[("score", 0.85)]));
    assert_eq!(outcome.status, GateStatus::Pass);
    assert!(outcome.missing.is_empty());
}

/// Tests that an unsatisfied require comparison fails.
#[test]
fn test_require_unsatisfied_fails() {
    let criteria = criteria("require:\n  - metric: score\n    gte: 0.8\n");
    let outcome = evaluate_matrix(&criteria, &metrics(&[("score", 0.75)]));
    assert_eq!(outcome.status, GateStatus::Fail);
}

/// Tests that equality on the threshold passes under gte.
#[test]
fn test_require_boundary_passes() {
    let criteria = criteria("require:\n  - metric: score\n    gte: 0.8\n");
    let outcome = evaluate_matrix(&criteria, &metrics(&[("score", 0.8)]));
    assert_eq!(outcome.status, GateStatus::Pass);
}

/// Tests that one unsatisfied comparison among several forces a fail.
#[test]
fn test_any_unsatisfied_require_forces_fail() {
    let criteria = criteria(
        "require:\n  - metric: a\n    gte: 0.5\n  - metric: b\n    lte: 0.2\n",
    );
    let outcome = evaluate_matrix(&criteria, &metrics(&[("a", 0.9), ("b", 0.5)]));
    assert_eq!(outcome.status, GateStatus::Fail);
}

// ============================================================================
// SECTION: Disjunctive Semantics
// ============================================================================

/// Tests that any_of passes when one comparison is satisfied.
#[test]
fn test_any_of_one_satisfied_passes() {
    let criteria = criteria(
        "any_of:\n  - metric: a\n    gte: 0.9\n  - metric: b\n    lt: 0.5\n",
    );
    let outcome = evaluate_matrix(&criteria, &metrics(&[("a", 0.1), ("b", 0.1)]));
    assert_eq!(outcome.status, GateStatus::Pass);
}

/// Tests that any_of fails when no comparison is satisfied.
#[test]
fn test_any_of_none_satisfied_fails() {
    let criteria = criteria(
        "any_of:\n  - metric: a\n    gte: 0.9\n  - metric: b\n    lt: 0.5\n",
    );
    let outcome = evaluate_matrix(&criteria, &metrics(&[("a", 0.1), ("b", 0.9)]));
    assert_eq!(outcome.status, GateStatus::Fail);
}

/// Tests require and any_of combined.
#[test]
fn test_require_and_any_of_combined() {
    let criteria = criteria(
        "require:\n  - metric: a\n    gte: 0.5\nany_of:\n  - metric: b\n    eq: 1\n  - metric: c\n    eq: 2\n",
    );
    let pass = evaluate_matrix(&criteria, &metrics(&[("a", 0.6), ("b", 3.0), ("c", 2.0)]));
    assert_eq!(pass.status, GateStatus::Pass);
    let fail = evaluate_matrix(&criteria, &metrics(&[("a", 0.6), ("b", 3.0), ("c", 3.0)]));
    assert_eq!(fail.status, GateStatus::Fail);
}

// ============================================================================
// SECTION: Missing Metrics
// ============================================================================

/// Tests that a missing metric yields neutral when the rule opts in.
#[test]
fn test_missing_metric_neutral_when_opted_in() {
    let criteria = criteria(
        "require:\n  - metric: score\n    gte: 0.8\nneutral_on_missing_metrics: true\n",
    );
    let outcome = evaluate_matrix(&criteria, &metrics(&[]));
    assert_eq!(outcome.status, GateStatus::Neutral);
    assert_eq!(outcome.neutral_reason, Some(NeutralReason::MissingMetrics));
    assert_eq!(outcome.missing, vec![MetricId::new("score")]);
}

/// Tests that a missing metric counts as unsatisfied otherwise.
#[test]
fn test_missing_metric_unsatisfied_by_default() {
    let criteria = criteria("require:\n  - metric: score\n    gte: 0.8\n");
    let outcome = evaluate_matrix(&criteria, &metrics(&[]));
    assert_eq!(outcome.status, GateStatus::Fail);
    assert_eq!(outcome.missing, vec![MetricId::new("score")]);
}

// ============================================================================
// SECTION: Check Records
// ============================================================================

/// Tests that the outcome records every comparison with its actual value.
#[test]
fn test_checks_recorded_in_declaration_order() {
    let criteria = criteria(
        "require:\n  - metric: a\n    gte: 0.5\nany_of:\n  - metric: b\n    lt: 0.5\n",
    );
    let outcome = evaluate_matrix(&criteria, &metrics(&[("a", 0.7)]));
    assert_eq!(outcome.checks.len(), 2);
    assert_eq!(outcome.checks[0].comparison.metric, MetricId::new("a"));
    assert_eq!(outcome.checks[0].actual, Some(0.7));
    assert!(outcome.checks[0].satisfied);
    assert!(!outcome.checks[0].disjunctive);
    assert_eq!(outcome.checks[1].actual, None);
    assert!(outcome.checks[1].disjunctive);
}
