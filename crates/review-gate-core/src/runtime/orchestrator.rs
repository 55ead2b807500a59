// review-gate-core/src/runtime/orchestrator.rs
// ============================================================================
// Module: Run Orchestrator
// Description: Gate launch coordination and verdict aggregation.
// Purpose: Produce one run result per event with partial-execution classification.
// Dependencies: crate::{core, runtime}
// ============================================================================

//! ## Overview
//! The orchestrator invokes the launcher and folds its gate results into a
//! single three-valued run verdict. Failures dominate partial executions; a
//! neutral verdict is elevated to fail only when gates actually ran and the
//! policy (or the process environment) opts in.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Instant;

use serde_json::Value;
use thiserror::Error;
use tracing::info;
use tracing::warn;

use crate::core::policy::PolicyError;
use crate::core::result::ConclusionReason;
use crate::core::result::ExecutionSummary;
use crate::core::result::GateResult;
use crate::core::result::GateStatus;
use crate::core::result::NeutralReason;
use crate::core::result::RunResult;
use crate::runtime::context::GateContext;
use crate::runtime::launcher::LaunchError;
use crate::runtime::launcher::LaunchOutcome;
use crate::runtime::launcher::run_configured_gates;
use crate::runtime::registry::GateRegistry;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Environment variable elevating a neutral overall verdict to fail.
pub const FAIL_ON_ERROR_ENV: &str = "REVIEW_GATE_FAIL_ON_ERROR";

/// Orchestrator configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OrchestratorConfig {
    /// Elevates neutral to fail regardless of the policy flag.
    pub fail_on_error: bool,
}

impl OrchestratorConfig {
    /// Builds a configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        let fail_on_error = std::env::var(FAIL_ON_ERROR_ENV)
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        Self {
            fail_on_error,
        }
    }
}

// ============================================================================
// SECTION: Orchestrator
// ============================================================================

/// Orchestrator errors surfaced to the check lifecycle.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The policy configuration is invalid; no handler was invoked.
    #[error(transparent)]
    Configuration(#[from] PolicyError),
}

/// Coordinates one event's gate execution and verdict aggregation.
pub struct Orchestrator {
    /// Registry resolving gate types to handlers.
    registry: GateRegistry,
    /// Aggregation configuration.
    config: OrchestratorConfig,
}

impl Orchestrator {
    /// Creates an orchestrator over the given registry.
    #[must_use]
    pub fn new(registry: GateRegistry, config: OrchestratorConfig) -> Self {
        Self {
            registry,
            config,
        }
    }

    /// Returns the gate registry.
    #[must_use]
    pub const fn registry(&self) -> &GateRegistry {
        &self.registry
    }

    /// Runs the configured gates and aggregates their verdicts.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::Configuration`] when the policy derives
    /// duplicate gate identifiers; zero gate results are emitted in that
    /// case.
    pub async fn run(&self, ctx: &GateContext) -> Result<RunResult, OrchestratorError> {
        let started = Instant::now();
        let outcome = match run_configured_gates(&self.registry, ctx).await {
            Ok(outcome) => outcome,
            Err(LaunchError::Configuration(err)) => return Err(OrchestratorError::Configuration(err)),
            Err(LaunchError::Internal(message)) => {
                warn!(error = %message, "launcher failed outside handler execution");
                LaunchOutcome {
                    results: vec![
                        GateResult::neutral("orchestrator", NeutralReason::InternalError)
                            .with_stat("error", Value::String(message)),
                    ],
                    deferred: 0,
                    canceled: false,
                }
            }
        };

        let fail_on_error = ctx.policy.fail_on_error || self.config.fail_on_error;
        let run = aggregate_run(
            outcome,
            ctx.policy.gates.len(),
            fail_on_error,
            elapsed_ms(started),
        );
        info!(
            overall = run.overall_status.as_str(),
            reason = run.conclusion_reason.as_str(),
            executed = run.execution_summary.executed,
            "run aggregated"
        );
        Ok(run)
    }
}

// ============================================================================
// SECTION: Aggregation
// ============================================================================

/// Folds a launch outcome into the overall run result.
#[must_use]
pub fn aggregate_run(
    outcome: LaunchOutcome,
    configured: usize,
    fail_on_error: bool,
    duration_ms: u64,
) -> RunResult {
    let executed = outcome.results.len();
    let passed = count_status(&outcome.results, GateStatus::Pass);
    let failed = count_status(&outcome.results, GateStatus::Fail);
    let neutral = count_status(&outcome.results, GateStatus::Neutral);
    let timed_out = outcome
        .results
        .iter()
        .any(|result| result.neutral_reason == Some(NeutralReason::Timeout));

    let eligible = configured.saturating_sub(outcome.deferred);
    let (mut overall_status, conclusion_reason) = if executed == 0 {
        (GateStatus::Neutral, ConclusionReason::NoGatesExecuted)
    } else if failed > 0 {
        (GateStatus::Fail, ConclusionReason::GatesFailed)
    } else if neutral > 0 {
        if timed_out {
            (GateStatus::Neutral, ConclusionReason::GateTimeouts)
        } else {
            (GateStatus::Neutral, ConclusionReason::GatesNeutral)
        }
    } else {
        (GateStatus::Pass, ConclusionReason::AllGatesPassed)
    };

    // fail_on_error only elevates runs whose gates executed and were neutral;
    // conclusion_reason is preserved across the elevation.
    if fail_on_error
        && overall_status == GateStatus::Neutral
        && matches!(
            conclusion_reason,
            ConclusionReason::GatesNeutral | ConclusionReason::GateTimeouts
        )
    {
        overall_status = GateStatus::Fail;
    }

    RunResult {
        overall_status,
        conclusion_reason,
        gates: outcome.results,
        execution_summary: ExecutionSummary {
            configured,
            executed,
            passed,
            failed,
            neutral,
            deferred: outcome.deferred,
            partial: executed < eligible,
            canceled: outcome.canceled,
        },
        duration_ms,
    }
}

/// Counts gate results with the given status.
fn count_status(results: &[GateResult], status: GateStatus) -> usize {
    results.iter().filter(|result| result.status == status).count()
}

/// Returns elapsed wall-clock milliseconds, saturating on overflow.
fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
