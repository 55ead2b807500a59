// review-gate-gates/src/governance.rs
// ============================================================================
// Module: Governance Cross-Check Gate
// Description: Required status context to workflow definition cross-check.
// Purpose: Fail when a required context has no correctly-named workflow behind it.
// Dependencies: review-gate-core, serde_yaml
// ============================================================================

//! ## Overview
//! The `governance-policy` gate verifies that every externally-required
//! status context named in the policy maps to a workflow definition whose
//! declared name matches the context. The engine's own check is exempted to
//! avoid a self-dependency.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use review_gate_core::ForgeError;
use review_gate_core::GateContext;
use review_gate_core::GateError;
use review_gate_core::GateHandler;
use review_gate_core::GateResult;
use review_gate_core::GateSpecEntry;
use review_gate_core::NeutralReason;
use review_gate_core::Violation;

// ============================================================================
// SECTION: Handler
// ============================================================================

/// Governance cross-check gate (`governance-policy`).
pub struct GovernancePolicyGate;

#[async_trait]
impl GateHandler for GovernancePolicyGate {
    async fn run(&self, ctx: &GateContext, spec: &GateSpecEntry) -> Result<GateResult, GateError> {
        let id = spec.derived_id();
        let required: Vec<&String> = ctx
            .policy
            .required_status_contexts
            .iter()
            .filter(|context| context.as_str() != ctx.check_name)
            .collect();

        if required.is_empty() {
            return Ok(GateResult::neutral(id, NeutralReason::NoContextsRequired)
                .with_observation("no required status contexts remain after self-exemption"));
        }

        let mut violations = Vec::new();
        let mut checked = 0_u64;
        for context in required {
            if ctx.cancel.is_cancelled() {
                return Err(GateError::Canceled);
            }
            let Some(path) = ctx.context_workflows.get(context) else {
                violations.push(Violation::new(
                    "unknown_context",
                    format!("no workflow mapping configured for required context '{context}'"),
                ));
                continue;
            };
            debug!(context = %context, path = %path, "checking workflow definition for required context");
            match ctx.forge.get_content(&ctx.repo, path, &ctx.pr.head_sha).await {
                Err(ForgeError::NotFound(_)) => {
                    violations.push(Violation::new(
                        "workflow_missing",
                        format!("workflow file '{path}' for context '{context}' does not exist"),
                    ));
                }
                Err(err) => {
                    violations.push(Violation::new(
                        "workflow_check_error",
                        format!("workflow file '{path}' could not be fetched: {err}"),
                    ));
                }
                Ok(text) => match workflow_name(&text) {
                    Some(name) if name == *context => {
                        checked += 1;
                    }
                    Some(name) => {
                        violations.push(Violation::new(
                            "workflow_name_mismatch",
                            format!(
                                "workflow file '{path}' declares name '{name}', \
                                 required context is '{context}'"
                            ),
                        ));
                    }
                    None => {
                        violations.push(Violation::new(
                            "workflow_name_mismatch",
                            format!("workflow file '{path}' declares no name"),
                        ));
                    }
                },
            }
        }

        let mut result = if violations.is_empty() {
            GateResult::pass(id)
        } else {
            GateResult::fail(id)
        };
        result.violations = violations;
        result = result.with_stat("contexts_verified", Value::from(checked));
        Ok(result)
    }
}

/// Extracts the `name` declaration from a workflow definition file.
fn workflow_name(text: &str) -> Option<String> {
    let value: serde_yaml::Value = serde_yaml::from_str(text).ok()?;
    value.get("name").and_then(serde_yaml::Value::as_str).map(str::to_string)
}
