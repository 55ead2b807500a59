// review-gate-gates/src/ai_rule.rs
// ============================================================================
// Module: AI-Rule Gate
// Description: Rule-driven AI workflow dispatch and matrix evaluation.
// Purpose: Turn per-metric AI outputs into a deterministic gate verdict.
// Dependencies: review-gate-core
// ============================================================================

//! ## Overview
//! The `ai-rule` gate loads a rule document from the policy tree at the PR
//! head, gathers the evidence its capabilities request, dispatches the named
//! AI workflow, schema-validates the provider result, and feeds the metrics
//! through the success-criteria matrix. Schema failures on either side of
//! the workflow boundary are neutral, never failures.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Instant;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use review_gate_core::ForgeError;
use review_gate_core::GateContext;
use review_gate_core::GateError;
use review_gate_core::GateHandler;
use review_gate_core::GateResult;
use review_gate_core::GateSpecEntry;
use review_gate_core::GateStatus;
use review_gate_core::NeutralReason;
use review_gate_core::Violation;
use review_gate_core::WorkflowError;
use review_gate_core::WorkflowInput;
use review_gate_core::ProviderResult;
use review_gate_core::RuleCapability;
use review_gate_core::RuleProvenance;
use review_gate_core::RuleSpec;
use review_gate_core::evaluate_matrix;

use crate::evidence::changed_files_sorted;
use crate::evidence::collect_patches;
use crate::evidence::render_diff_summary;

// ============================================================================
// SECTION: Handler
// ============================================================================

/// AI-rule gate (`ai-rule`).
pub struct AiRuleGate;

#[async_trait]
impl GateHandler for AiRuleGate {
    async fn run(&self, ctx: &GateContext, spec: &GateSpecEntry) -> Result<GateResult, GateError> {
        let id = spec.derived_id();

        let Some(rule_file) = spec.config_str("rule_file") else {
            return Ok(GateResult::neutral(id, NeutralReason::RuleSchemaInvalid).with_violation(
                Violation::new("rule_schema", "ai-rule gate requires with.rule_file"),
            ));
        };
        if ctx.cancel.is_cancelled() {
            return Err(GateError::Canceled);
        }

        let rule_path = ctx.rule_path(rule_file);
        let text = match ctx.forge.get_content(&ctx.repo, &rule_path, &ctx.pr.head_sha).await {
            Ok(text) => text,
            Err(ForgeError::NotFound(_)) => {
                return Ok(GateResult::neutral(id, NeutralReason::RuleSchemaInvalid)
                    .with_violation(Violation::new(
                        "rule_schema",
                        format!("rule file '{rule_path}' does not exist at the head commit"),
                    )));
            }
            Err(err) => return Err(err.into()),
        };

        let rule = match RuleSpec::from_yaml(&text) {
            Ok(rule) => rule,
            Err(err) => {
                return Ok(GateResult::neutral(id, NeutralReason::RuleSchemaInvalid)
                    .with_violation(Violation::new("rule_schema", err.to_string())));
            }
        };

        let budgets = rule.budgets();
        let mut diff_summary = None;
        let mut file_patches = Vec::new();
        if rule.has_capability(RuleCapability::DiffSummary)
            || rule.has_capability(RuleCapability::FilePatches)
        {
            let files = changed_files_sorted(ctx).await?;
            if rule.has_capability(RuleCapability::DiffSummary) {
                diff_summary = Some(render_diff_summary(&ctx.pr, &files, budgets.max_files));
            }
            if rule.has_capability(RuleCapability::FilePatches) {
                file_patches = collect_patches(&files, &budgets);
            }
        }

        let input = WorkflowInput {
            pr_title: ctx.pr.title.clone(),
            pr_body: ctx.pr.body.clone(),
            diff_summary,
            file_patches,
            evaluations: rule.evaluations.clone(),
        };

        if ctx.cancel.is_cancelled() {
            return Err(GateError::Canceled);
        }
        debug!(rule = %rule.id, workflow = %rule.workflow_id, "dispatching ai workflow");
        let started = Instant::now();
        let raw = match ctx.ai.evaluate(&rule.workflow_id, input).await {
            Ok(raw) => raw,
            Err(WorkflowError::UnknownWorkflow(name)) => {
                return Ok(GateResult::neutral(id, NeutralReason::RuleSchemaInvalid)
                    .with_violation(Violation::new(
                        "rule_schema",
                        format!("rule names an unregistered workflow '{name}'"),
                    )));
            }
            Err(WorkflowError::Failed(message)) => return Err(GateError::Internal(message)),
        };
        let wall_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let provider: ProviderResult = match serde_json::from_value(raw) {
            Ok(provider) => provider,
            Err(err) => {
                return Ok(GateResult::neutral(id, NeutralReason::ProviderResultInvalid)
                    .with_violation(Violation::new(
                        "provider_schema",
                        format!("workflow result failed schema validation: {err}"),
                    )));
            }
        };

        let matrix = evaluate_matrix(&rule.success_criteria, &provider.metrics);
        let mut result = match matrix.neutral_reason {
            Some(reason) => GateResult::neutral(id, reason),
            None => {
                if matrix.status == GateStatus::Pass {
                    GateResult::pass(id)
                } else {
                    GateResult::fail(id)
                }
            }
        };
        if !matrix.missing.is_empty() {
            let missing: Vec<&str> = matrix.missing.iter().map(|metric| metric.as_str()).collect();
            result = result.with_violation(Violation::new(
                "missing_metrics",
                format!("provider result is missing metrics: {}", missing.join(", ")),
            ));
        }

        result.provenance = Some(RuleProvenance {
            wall_ms: Some(wall_ms),
            workflow_id: Some(rule.workflow_id.to_string()),
            ..provider.provenance.clone()
        });
        result = result.with_stat("metrics", Value::from(provider.metrics.len()));
        result.provider_result = Some(provider);
        result.rule = Some(rule);
        Ok(result)
    }
}
