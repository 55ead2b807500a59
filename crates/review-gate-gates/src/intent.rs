// review-gate-gates/src/intent.rs
// ============================================================================
// Module: Intent Declaration Gates
// Description: Declarative presence checks over the policy's intent block.
// Purpose: Force policy authors to declare goals and non-goals.
// Dependencies: review-gate-core
// ============================================================================

//! ## Overview
//! The `goal-declaration` and `forbidden-scopes` gates are intentionally
//! minimal: each reads one sequence from the policy's intent block and fails
//! when it is empty or absent.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use serde_json::Value;

use review_gate_core::GateContext;
use review_gate_core::GateError;
use review_gate_core::GateHandler;
use review_gate_core::GateResult;
use review_gate_core::GateSpecEntry;
use review_gate_core::Violation;

// ============================================================================
// SECTION: Goal Declaration
// ============================================================================

/// Goal presence gate (`goal-declaration`).
pub struct GoalDeclarationGate;

#[async_trait]
impl GateHandler for GoalDeclarationGate {
    async fn run(&self, ctx: &GateContext, spec: &GateSpecEntry) -> Result<GateResult, GateError> {
        let id = spec.derived_id();
        let goals = &ctx.policy.intent.goals;
        if goals.is_empty() {
            return Ok(GateResult::fail(id).with_violation(Violation::new(
                "missing_goals",
                "intent.goals must declare at least one goal",
            )));
        }
        Ok(GateResult::pass(id).with_stat("goals", Value::from(goals.len())))
    }
}

// ============================================================================
// SECTION: Forbidden Scopes
// ============================================================================

/// Non-goal presence gate (`forbidden-scopes`).
pub struct ForbiddenScopesGate;

#[async_trait]
impl GateHandler for ForbiddenScopesGate {
    async fn run(&self, ctx: &GateContext, spec: &GateSpecEntry) -> Result<GateResult, GateError> {
        let id = spec.derived_id();
        let non_goals = &ctx.policy.intent.non_goals;
        if non_goals.is_empty() {
            return Ok(GateResult::fail(id).with_violation(Violation::new(
                "missing_non_goals",
                "intent.non_goals must declare at least one non-goal",
            )));
        }
        Ok(GateResult::pass(id).with_stat("non_goals", Value::from(non_goals.len())))
    }
}
