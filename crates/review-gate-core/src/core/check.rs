// review-gate-core/src/core/check.rs
// ============================================================================
// Module: Review Gate Check Model
// Description: Forge-agnostic check run request and annotation shapes.
// Purpose: Define what the runtime writes back through the checks API.
// Dependencies: crate::core::identifiers, serde
// ============================================================================

//! ## Overview
//! A check is the structured build-status record attached to a commit. The
//! lifecycle publishes an in-progress check on the PR event and completes it
//! after reconciliation; both phases use the same request shape.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::CommitSha;

// ============================================================================
// SECTION: Check Vocabulary
// ============================================================================

/// Lifecycle status of a check run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    /// Check is still running.
    InProgress,
    /// Check has completed with a conclusion.
    Completed,
}

/// Conclusion of a completed check run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckConclusion {
    /// All gates passed.
    Success,
    /// At least one gate failed.
    Failure,
    /// The run could not produce a definitive verdict.
    Neutral,
}

/// Annotation level for inline check annotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationLevel {
    /// Blocking annotation.
    Failure,
    /// Non-blocking warning annotation.
    Warning,
    /// Informational annotation.
    Notice,
}

// ============================================================================
// SECTION: Check Output
// ============================================================================

/// A single inline annotation attached to a check update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckAnnotation {
    /// Repository-relative path.
    pub path: String,
    /// First annotated line (one-based).
    pub start_line: u64,
    /// Last annotated line (one-based).
    pub end_line: u64,
    /// Optional start column.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_column: Option<u64>,
    /// Optional end column.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_column: Option<u64>,
    /// Annotation level.
    pub annotation_level: AnnotationLevel,
    /// Annotation message.
    pub message: String,
}

/// Rendered output carried by a check run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckOutput {
    /// Short title.
    pub title: String,
    /// One-line summary.
    pub summary: String,
    /// Markdown body.
    pub text: String,
    /// Inline annotations (bounded by the lifecycle).
    #[serde(default)]
    pub annotations: Vec<CheckAnnotation>,
}

/// Request shape for creating or updating a check run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckRequest {
    /// Check name configured per deployment environment.
    pub name: String,
    /// Head commit fingerprint the check attaches to.
    pub head_sha: CommitSha,
    /// Lifecycle status.
    pub status: CheckStatus,
    /// Conclusion, required when status is completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conclusion: Option<CheckConclusion>,
    /// RFC3339 start time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    /// RFC3339 completion time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    /// Rendered output.
    pub output: CheckOutput,
}
