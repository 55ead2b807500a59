// review-gate-core/tests/launcher.rs
// ============================================================================
// Module: Gate Launcher Tests
// Description: Tests for sequential execution, identity, and isolation.
// ============================================================================
//! ## Overview
//! Validates id normalization, duplicate-id abort, order preservation,
//! cancellation promptness, the safe shell, and artifact-gate deferral.

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
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use review_gate_core::GateContext;
use review_gate_core::GateError;
use review_gate_core::GateHandler;
use review_gate_core::GateRegistry;
use review_gate_core::GateResult;
use review_gate_core::GateSpecEntry;
use review_gate_core::GateStatus;
use review_gate_core::LaunchError;
use review_gate_core::NeutralReason;
use review_gate_core::PolicyError;
use review_gate_core::run_configured_gates;

use common::MockAi;
use common::MockForge;
use common::context_with;
use common::policy_from_yaml;

// ============================================================================
// SECTION: Test Handlers
// ============================================================================

/// Handler that returns a pass while claiming a bogus identity.
struct ImpostorGate {
    /// Number of invocations observed.
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl GateHandler for ImpostorGate {
    async fn run(&self, _ctx: &GateContext, _spec: &GateSpecEntry) -> Result<GateResult, GateError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(GateResult::pass("impostor").with_observation("handler-declared identity"))
    }
}

/// Handler that always fails internally.
struct BrokenGate;

#[async_trait]
impl GateHandler for BrokenGate {
    async fn run(&self, _ctx: &GateContext, _spec: &GateSpecEntry) -> Result<GateResult, GateError> {
        Err(GateError::Internal("boom".to_string()))
    }
}

/// Handler that sleeps past any reasonable deadline.
struct SlowGate;

#[async_trait]
impl GateHandler for SlowGate {
    async fn run(&self, _ctx: &GateContext, _spec: &GateSpecEntry) -> Result<GateResult, GateError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(GateResult::pass("slow"))
    }
}

/// Handler that trips the run's cancellation signal.
struct TrippingGate {
    /// Token to cancel when invoked.
    token: CancellationToken,
}

#[async_trait]
impl GateHandler for TrippingGate {
    async fn run(&self, _ctx: &GateContext, _spec: &GateSpecEntry) -> Result<GateResult, GateError> {
        self.token.cancel();
        Err(GateError::Canceled)
    }
}

/// Builds a context over a simple multi-gate policy.
fn multi_gate_context(yaml: &str) -> GateContext {
    context_with(
        policy_from_yaml(yaml),
        Arc::new(MockForge::new()),
        Arc::new(MockAi::returning(serde_json::Value::Null)),
    )
}

// ============================================================================
// SECTION: Identity
// ============================================================================

/// Tests that the launcher overwrites handler-declared identities.
#[tokio::test]
async fn test_launcher_owns_identity() {
    let mut registry = GateRegistry::new();
    registry.register("echo", ImpostorGate {
        calls: Arc::new(AtomicUsize::new(0)),
    });
    let ctx = multi_gate_context("gates:\n  - type: echo\n    id: declared\n");

    let outcome = run_configured_gates(&registry, &ctx).await.unwrap();
    assert_eq!(outcome.results.len(), 1);
    assert_eq!(outcome.results[0].id.as_str(), "declared");
}

/// Tests that duplicate derived ids abort before any handler runs.
#[tokio::test]
async fn test_duplicate_ids_abort_without_execution() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut registry = GateRegistry::new();
    registry.register("echo", ImpostorGate {
        calls: Arc::clone(&calls),
    });
    let ctx = multi_gate_context("gates:\n  - type: echo\n  - type: echo\n");

    let err = run_configured_gates(&registry, &ctx).await.unwrap_err();
    assert!(matches!(
        err,
        LaunchError::Configuration(PolicyError::DuplicateGateIds { .. })
    ));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

// ============================================================================
// SECTION: Ordering and Cancellation
// ============================================================================

/// Tests that results preserve spec order.
#[tokio::test]
async fn test_results_preserve_spec_order() {
    let mut registry = GateRegistry::new();
    registry.register("echo", ImpostorGate {
        calls: Arc::new(AtomicUsize::new(0)),
    });
    let ctx = multi_gate_context(
        "gates:\n  - type: echo\n    id: zeta\n  - type: echo\n    id: alpha\n  - type: echo\n    id: mid\n",
    );

    let outcome = run_configured_gates(&registry, &ctx).await.unwrap();
    let ids: Vec<&str> = outcome.results.iter().map(|result| result.id.as_str()).collect();
    assert_eq!(ids, vec!["zeta", "alpha", "mid"]);
}

/// Tests that a pre-tripped signal yields zero results.
#[tokio::test]
async fn test_pre_cancelled_runs_nothing() {
    let mut registry = GateRegistry::new();
    registry.register("echo", ImpostorGate {
        calls: Arc::new(AtomicUsize::new(0)),
    });
    let ctx = multi_gate_context("gates:\n  - type: echo\n");
    ctx.cancel.cancel();

    let outcome = run_configured_gates(&registry, &ctx).await.unwrap();
    assert!(outcome.results.is_empty());
    assert!(outcome.canceled);
}

/// Tests that cancellation mid-run stops dispatch of later gates.
#[tokio::test]
async fn test_cancellation_stops_later_gates() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut registry = GateRegistry::new();
    registry.register("echo", ImpostorGate {
        calls: Arc::clone(&calls),
    });
    let ctx = multi_gate_context(
        "gates:\n  - type: echo\n    id: first\n  - type: trip\n  - type: echo\n    id: last\n",
    );
    registry.register("trip", TrippingGate {
        token: ctx.cancel.clone(),
    });

    let outcome = run_configured_gates(&registry, &ctx).await.unwrap();
    assert_eq!(outcome.results.len(), 1);
    assert_eq!(outcome.results[0].id.as_str(), "first");
    assert!(outcome.canceled);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

// ============================================================================
// SECTION: Safe Shell
// ============================================================================

/// Tests that an unknown gate type yields a synthetic neutral result.
#[tokio::test]
async fn test_unknown_type_is_unimplemented() {
    let registry = GateRegistry::new();
    let ctx = multi_gate_context("gates:\n  - type: not-a-gate\n");

    let outcome = run_configured_gates(&registry, &ctx).await.unwrap();
    assert_eq!(outcome.results.len(), 1);
    assert_eq!(outcome.results[0].status, GateStatus::Neutral);
    assert_eq!(
        outcome.results[0].neutral_reason,
        Some(NeutralReason::UnimplementedGate)
    );
}

/// Tests that handler errors become neutral internal errors.
#[tokio::test]
async fn test_internal_error_is_recovered() {
    let mut registry = GateRegistry::new();
    registry.register("broken", BrokenGate);
    let ctx = multi_gate_context("gates:\n  - type: broken\n");

    let outcome = run_configured_gates(&registry, &ctx).await.unwrap();
    assert_eq!(outcome.results[0].status, GateStatus::Neutral);
    assert_eq!(
        outcome.results[0].neutral_reason,
        Some(NeutralReason::InternalError)
    );
    assert_eq!(
        outcome.results[0].stats.get("error"),
        Some(&serde_json::Value::String("boom".to_string()))
    );
}

/// Tests that a slow handler times out neutral and later gates still run.
#[tokio::test]
async fn test_slow_handler_times_out() {
    let mut registry = GateRegistry::new();
    registry.register("slow", SlowGate);
    registry.register("echo", ImpostorGate {
        calls: Arc::new(AtomicUsize::new(0)),
    });
    let mut ctx = multi_gate_context("gates:\n  - type: slow\n  - type: echo\n");
    ctx.gate_timeout = Duration::from_millis(20);

    let outcome = run_configured_gates(&registry, &ctx).await.unwrap();
    assert_eq!(outcome.results.len(), 2);
    assert_eq!(outcome.results[0].neutral_reason, Some(NeutralReason::Timeout));
    assert_eq!(outcome.results[1].status, GateStatus::Pass);
}

// ============================================================================
// SECTION: Deferral
// ============================================================================

/// Tests that artifact gates are skipped while deferred.
#[tokio::test]
async fn test_artifact_gates_deferred() {
    let mut registry = GateRegistry::new();
    registry.register("echo", ImpostorGate {
        calls: Arc::new(AtomicUsize::new(0)),
    });
    let mut ctx = multi_gate_context(
        "gates:\n  - type: echo\n  - type: artifact.sarif\n    with:\n      artifact_name: scan\n",
    );
    ctx.artifact_gates_enabled = false;

    let outcome = run_configured_gates(&registry, &ctx).await.unwrap();
    assert_eq!(outcome.results.len(), 1);
    assert_eq!(outcome.results[0].id.as_str(), "echo");
    assert_eq!(outcome.deferred, 1);
    assert!(!outcome.canceled);
}
