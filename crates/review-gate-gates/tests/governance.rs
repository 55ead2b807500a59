// review-gate-gates/tests/governance.rs
// ============================================================================
// Module: Governance Gate Tests
// Description: Tests for the required-context workflow cross-check.
// ============================================================================
//! ## Overview
//! Validates the per-context outcome codes, self-exemption, and the
//! no-contexts neutral.

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

mod common;

use std::sync::Arc;

use review_gate_core::GateContext;
use review_gate_core::GateHandler;
use review_gate_core::GateSpecEntry;
use review_gate_core::GateStatus;
use review_gate_core::NeutralReason;
use review_gate_gates::GovernancePolicyGate;

use common::MockAi;
use common::MockForge;
use common::context_with;
use common::policy_from_yaml;
use common::pr_with;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Builds a context requiring the `ci/test` status context.
fn governance_ctx(forge: Arc<MockForge>) -> GateContext {
    let mut ctx = context_with(
        policy_from_yaml("required_status_contexts: [ci/test]\n"),
        pr_with(Some(1), 1, 1),
        forge,
        Arc::new(MockAi::returning(serde_json::Value::Null)),
    );
    ctx.context_workflows
        .insert("ci/test".to_string(), ".github/workflows/test.yml".to_string());
    ctx
}

/// Runs the governance gate over the context.
async fn run_gate(ctx: &GateContext) -> review_gate_core::GateResult {
    GovernancePolicyGate
        .run(ctx, &GateSpecEntry::new("governance-policy"))
        .await
        .unwrap()
}

// ============================================================================
// SECTION: Outcomes
// ============================================================================

/// Tests the pass case with a correctly named workflow.
#[tokio::test]
async fn test_matching_workflow_passes() {
    let forge = Arc::new(MockForge::new());
    forge.put_content(".github/workflows/test.yml", "name: ci/test\non: [push]\n");
    let result = run_gate(&governance_ctx(forge)).await;
    assert_eq!(result.status, GateStatus::Pass);
}

/// Tests the missing-workflow outcome.
#[tokio::test]
async fn test_missing_workflow_fails() {
    let result = run_gate(&governance_ctx(Arc::new(MockForge::new()))).await;
    assert_eq!(result.status, GateStatus::Fail);
    assert_eq!(result.violations[0].code, "workflow_missing");
}

/// Tests the name-mismatch outcome.
#[tokio::test]
async fn test_name_mismatch_fails() {
    let forge = Arc::new(MockForge::new());
    forge.put_content(".github/workflows/test.yml", "name: something-else\n");
    let result = run_gate(&governance_ctx(forge)).await;
    assert_eq!(result.status, GateStatus::Fail);
    assert_eq!(result.violations[0].code, "workflow_name_mismatch");
}

/// Tests the unknown-context outcome when no mapping exists.
#[tokio::test]
async fn test_unmapped_context_fails() {
    let mut ctx = governance_ctx(Arc::new(MockForge::new()));
    ctx.context_workflows.clear();
    let result = run_gate(&ctx).await;
    assert_eq!(result.status, GateStatus::Fail);
    assert_eq!(result.violations[0].code, "unknown_context");
}

/// Tests self-exemption leaving no contexts to check.
#[tokio::test]
async fn test_self_exemption_is_neutral() {
    let mut ctx = context_with(
        policy_from_yaml("required_status_contexts: [review-gate]\n"),
        pr_with(Some(1), 1, 1),
        Arc::new(MockForge::new()),
        Arc::new(MockAi::returning(serde_json::Value::Null)),
    );
    ctx.check_name = "review-gate".to_string();
    let result = run_gate(&ctx).await;
    assert_eq!(result.status, GateStatus::Neutral);
    assert_eq!(result.neutral_reason, Some(NeutralReason::NoContextsRequired));
}

/// Tests the no-contexts neutral with an empty requirement list.
#[tokio::test]
async fn test_no_required_contexts_is_neutral() {
    let ctx = context_with(
        policy_from_yaml("{}"),
        pr_with(Some(1), 1, 1),
        Arc::new(MockForge::new()),
        Arc::new(MockAi::returning(serde_json::Value::Null)),
    );
    let result = run_gate(&ctx).await;
    assert_eq!(result.neutral_reason, Some(NeutralReason::NoContextsRequired));
}
