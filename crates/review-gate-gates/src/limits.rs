// review-gate-gates/src/limits.rs
// ============================================================================
// Module: Diff-Size Limits Gate
// Description: Changed-file and diff-size limit enforcement.
// Purpose: Fail pull requests exceeding the policy's review size budget.
// Dependencies: review-gate-core
// ============================================================================

//! ## Overview
//! The `review-limits` gate compares the PR's changed-file count and an
//! estimated diff size against policy thresholds. The diff size is a
//! constant-factor heuristic over line churn, not a byte measurement; no
//! content is fetched. Equality passes; only strict excess fails.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

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

/// Diff-size limits gate (`review-limits`).
pub struct ReviewLimitsGate;

#[async_trait]
impl GateHandler for ReviewLimitsGate {
    async fn run(&self, ctx: &GateContext, spec: &GateSpecEntry) -> Result<GateResult, GateError> {
        let id = spec.derived_id();
        let max_changed_files = spec.config_u64("max_changed_files");
        let max_total_diff_kb = spec.config_u64("max_total_diff_kb");

        if max_changed_files.is_none() && max_total_diff_kb.is_none() {
            return Ok(GateResult::neutral(id, NeutralReason::MissingThreshold)
                .with_observation("no limits configured; set with.max_changed_files or with.max_total_diff_kb"));
        }

        let mut violations = Vec::new();
        let mut changed_files = ctx.pr.changed_files;

        if let Some(max) = max_changed_files {
            let changed = match changed_files {
                Some(changed) => changed,
                None => {
                    if ctx.cancel.is_cancelled() {
                        return Err(GateError::Canceled);
                    }
                    debug!(pr = ctx.pr.number, "changed_files absent; refreshing pr descriptor");
                    let refreshed = match ctx.forge.get_pr(&ctx.repo, ctx.pr.number).await {
                        Ok(refreshed) => refreshed,
                        Err(err) => {
                            return Ok(GateResult::neutral(id, NeutralReason::InternalError)
                                .with_stat("error", Value::String(err.to_string())));
                        }
                    };
                    match refreshed.changed_files {
                        Some(changed) => {
                            changed_files = Some(changed);
                            changed
                        }
                        None => {
                            return Ok(GateResult::neutral(id, NeutralReason::OversizeDiff)
                                .with_observation("the forge could not enumerate the changed files"));
                        }
                    }
                }
            };
            if changed > max {
                violations.push(Violation::new(
                    "max_changed_files",
                    format!("max_changed_files: {changed} > {max}"),
                ));
            }
        }

        let total_diff_kb = ctx.pr.churn().div_ceil(3);
        if let Some(max) = max_total_diff_kb {
            if total_diff_kb > max {
                violations.push(Violation::new(
                    "max_total_diff_kb",
                    format!("max_total_diff_kb: {total_diff_kb} > {max}"),
                ));
            }
        }

        let mut result = if violations.is_empty() {
            GateResult::pass(id)
        } else {
            GateResult::fail(id)
        };
        result.violations = violations;
        if let Some(changed) = changed_files {
            result = result.with_stat("changed_files", Value::from(changed));
        }
        result = result.with_stat("total_diff_kb", Value::from(total_diff_kb));
        Ok(result)
    }
}
