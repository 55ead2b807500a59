// review-gate-gates/src/evidence.rs
// ============================================================================
// Module: AI-Rule Evidence
// Description: Bounded diff summaries and patch evidence for workflow calls.
// Purpose: Gather rule-requested evidence within the rule's resource budgets.
// Dependencies: review-gate-core
// ============================================================================

//! ## Overview
//! Rules opt into evidence through capabilities: a compact enumerated diff
//! summary and bounded per-file patches. Files are ordered by churn
//! descending then path ascending, so the most substantial changes survive
//! budget truncation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt::Write as _;

use review_gate_core::ChangedFile;
use review_gate_core::GateContext;
use review_gate_core::GateError;
use review_gate_core::PatchEvidence;
use review_gate_core::PrDescriptor;
use review_gate_core::RuleBudgets;

// ============================================================================
// SECTION: File Enumeration
// ============================================================================

/// Marker appended to patches cut at the byte budget.
const TRUNCATION_MARKER: &str = "\n… [patch truncated]";

/// Fetches the PR's changed files sorted by churn descending, path ascending.
///
/// # Errors
///
/// Returns [`GateError::Canceled`] when the cancellation signal fired, or
/// [`GateError::Internal`] when the file listing fails.
pub(crate) async fn changed_files_sorted(ctx: &GateContext) -> Result<Vec<ChangedFile>, GateError> {
    if ctx.cancel.is_cancelled() {
        return Err(GateError::Canceled);
    }
    let mut files = ctx.forge.list_pr_files(&ctx.repo, ctx.pr.number).await?;
    files.sort_by(|a, b| b.churn().cmp(&a.churn()).then_with(|| a.path.cmp(&b.path)));
    Ok(files)
}

// ============================================================================
// SECTION: Diff Summary
// ============================================================================

/// Renders the compact enumerated diff summary for a workflow call.
pub fn render_diff_summary(
    pr: &PrDescriptor,
    files: &[ChangedFile],
    max_files: usize,
) -> String {
    let mut summary = format!(
        "{} files changed, +{}/-{} total",
        files.len(),
        pr.additions,
        pr.deletions
    );
    for file in files.iter().take(max_files) {
        let _ = write!(
            summary,
            "\n• {} ({}) +{}/-{}",
            file.path,
            file.status.as_str(),
            file.additions,
            file.deletions
        );
    }
    if files.len() > max_files {
        let _ = write!(summary, "\n… {} more files", files.len() - max_files);
    }
    summary
}

// ============================================================================
// SECTION: Patch Evidence
// ============================================================================

/// Collects bounded patch evidence from the sorted file list.
pub fn collect_patches(files: &[ChangedFile], budgets: &RuleBudgets) -> Vec<PatchEvidence> {
    files
        .iter()
        .filter_map(|file| file.patch.as_deref().map(|patch| (file, patch)))
        .take(budgets.max_patches)
        .map(|(file, patch)| {
            let (patch, truncated) = truncate_patch(patch, budgets.max_patch_bytes_per_file);
            PatchEvidence {
                path: file.path.clone(),
                patch,
                truncated,
            }
        })
        .collect()
}

/// Truncates a patch to the byte budget on a character boundary.
fn truncate_patch(patch: &str, max_bytes: usize) -> (String, bool) {
    if patch.len() <= max_bytes {
        return (patch.to_string(), false);
    }
    let mut end = max_bytes;
    while end > 0 && !patch.is_char_boundary(end) {
        end -= 1;
    }
    (format!("{}{TRUNCATION_MARKER}", &patch[..end]), true)
}
