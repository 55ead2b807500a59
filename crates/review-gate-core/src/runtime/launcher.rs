// review-gate-core/src/runtime/launcher.rs
// ============================================================================
// Module: Gate Launcher
// Description: Sequential gate execution with per-gate crash isolation.
// Purpose: Walk the spec's gate list, normalize results, and own gate identity.
// Dependencies: crate::{core, runtime}, tokio
// ============================================================================

//! ## Overview
//! The launcher executes configured gates sequentially in spec order. Every
//! handler invocation is wrapped in a safe shell: timing is captured, errors
//! become neutral results, deadlines become neutral timeouts, and only the
//! cancellation sentinel stops dispatch. Gate identity is derived here and
//! overwrites whatever the handler declared; handlers own behavior, the
//! launcher owns identity.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Instant;

use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use tracing::warn;

use crate::core::identifiers::GateId;
use crate::core::policy::PolicyError;
use crate::core::result::GateResult;
use crate::core::result::NeutralReason;
use crate::runtime::context::GateContext;
use crate::runtime::registry::GateError;
use crate::runtime::registry::GateRegistry;

// ============================================================================
// SECTION: Launch Outcome
// ============================================================================

/// Results accumulated by one launcher pass.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LaunchOutcome {
    /// Gate results in spec order; cancellation truncates the tail.
    pub results: Vec<GateResult>,
    /// Number of artifact gates deferred to the CI-completion phase.
    pub deferred: usize,
    /// True when dispatch stopped because the cancellation signal fired.
    pub canceled: bool,
}

/// Launcher errors surfaced before or outside handler execution.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// The policy's derived gate identifiers are not unique.
    #[error(transparent)]
    Configuration(#[from] PolicyError),
    /// The launcher infrastructure itself failed.
    #[error("launcher internal error: {0}")]
    Internal(String),
}

// ============================================================================
// SECTION: Gate Execution
// ============================================================================

/// Runs the policy's configured gates against the context.
///
/// # Errors
///
/// Returns [`LaunchError::Configuration`] when two gate specs derive the
/// same identifier; in that case no handler was invoked.
pub async fn run_configured_gates(
    registry: &GateRegistry,
    ctx: &GateContext,
) -> Result<LaunchOutcome, LaunchError> {
    let ids = ctx.policy.derived_gate_ids()?;

    let mut outcome = LaunchOutcome::default();
    for (spec, id) in ctx.policy.gates.iter().zip(ids) {
        if ctx.cancel.is_cancelled() {
            outcome.canceled = true;
            break;
        }
        if spec.is_artifact_gate() && !ctx.artifact_gates_enabled {
            debug!(gate = %id, "deferring artifact gate until ci completion");
            outcome.deferred += 1;
            continue;
        }

        let started = Instant::now();
        let result = match registry.resolve(&spec.gate_type) {
            None => {
                warn!(gate = %id, gate_type = %spec.gate_type, "gate type not implemented");
                GateResult::neutral(id.clone(), NeutralReason::UnimplementedGate)
                    .with_observation(format!("gate type {} is not implemented", spec.gate_type))
            }
            Some(handler) => {
                let shell = tokio::select! {
                    () = ctx.cancel.cancelled() => {
                        outcome.canceled = true;
                        break;
                    }
                    shell = tokio::time::timeout(ctx.gate_timeout, handler.run(ctx, spec)) => shell,
                };
                match shell {
                    Err(_elapsed) => {
                        warn!(gate = %id, timeout_ms = %ctx.gate_timeout.as_millis(), "gate deadline exceeded");
                        GateResult::neutral(id.clone(), NeutralReason::Timeout)
                    }
                    Ok(Ok(result)) => result,
                    Ok(Err(GateError::Canceled)) => {
                        outcome.canceled = true;
                        break;
                    }
                    Ok(Err(GateError::Internal(message))) => {
                        warn!(gate = %id, error = %message, "gate handler failed");
                        GateResult::neutral(id.clone(), NeutralReason::InternalError)
                            .with_stat("error", Value::String(message))
                    }
                }
            }
        };
        outcome.results.push(finalize(result, id, started));
    }

    Ok(outcome)
}

/// Normalizes a handler result: the derived id wins and timing is stamped.
fn finalize(mut result: GateResult, id: GateId, started: Instant) -> GateResult {
    result.id = id;
    result.duration_ms = elapsed_ms(started);
    result
}

/// Returns elapsed wall-clock milliseconds, saturating on overflow.
fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
