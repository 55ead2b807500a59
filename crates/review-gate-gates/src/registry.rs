// review-gate-gates/src/registry.rs
// ============================================================================
// Module: Built-in Gate Registration
// Description: Static registration of every built-in gate handler.
// Purpose: Build the compile-time gate registry used by the orchestrator.
// Dependencies: review-gate-core
// ============================================================================

//! ## Overview
//! The built-in registry is the compile-time table of gate types. A gate
//! spec whose type does not appear here resolves to the launcher's synthetic
//! unimplemented result.

// ============================================================================
// SECTION: Imports
// ============================================================================

use review_gate_core::AI_RULE_GATE;
use review_gate_core::GateRegistry;

use crate::ai_rule::AiRuleGate;
use crate::artifact::json::JsonArtifactGate;
use crate::artifact::sarif::SarifArtifactGate;
use crate::governance::GovernancePolicyGate;
use crate::intent::ForbiddenScopesGate;
use crate::intent::GoalDeclarationGate;
use crate::limits::ReviewLimitsGate;

// ============================================================================
// SECTION: Built-in Registry
// ============================================================================

/// Builds a registry with every built-in gate handler registered.
#[must_use]
pub fn builtin_registry() -> GateRegistry {
    let mut registry = GateRegistry::new();
    registry.register("review-limits", ReviewLimitsGate);
    registry.register("goal-declaration", GoalDeclarationGate);
    registry.register("forbidden-scopes", ForbiddenScopesGate);
    registry.register("governance-policy", GovernancePolicyGate);
    registry.register(AI_RULE_GATE, AiRuleGate);
    registry.register("artifact.json", JsonArtifactGate);
    registry.register("artifact.sarif", SarifArtifactGate);
    registry
}
