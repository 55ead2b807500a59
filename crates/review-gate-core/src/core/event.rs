// review-gate-core/src/core/event.rs
// ============================================================================
// Module: Review Gate Events
// Description: Abstract forge events consumed by the check lifecycle.
// Purpose: Decouple the runtime from forge-specific webhook shapes.
// Dependencies: crate::core::{identifiers, pr}, serde
// ============================================================================

//! ## Overview
//! The lifecycle consumes three abstract events: a pull request event
//! (phase one), a CI run completion (phase two reconciliation), and a rerun
//! request. Forge adapters translate webhook payloads into these shapes; the
//! webhook receiver itself is an external collaborator.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::CommitSha;
use crate::core::identifiers::RepoFullName;
use crate::core::pr::PrDescriptor;

// ============================================================================
// SECTION: PR Events
// ============================================================================

/// Pull request action that starts phase one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrAction {
    /// Pull request was opened.
    Opened,
    /// Pull request head was updated.
    Synchronized,
    /// Pull request was reopened.
    Reopened,
}

/// Phase-one pull request event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrEvent {
    /// Action that produced the event.
    pub action: PrAction,
    /// Repository the PR belongs to.
    pub repo: RepoFullName,
    /// Repository web URL when known.
    pub repo_url: Option<String>,
    /// Pull request descriptor at event time.
    pub pr: PrDescriptor,
}

// ============================================================================
// SECTION: CI Events
// ============================================================================

/// Phase-two CI run completion event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CiRunCompleted {
    /// Repository the run belongs to.
    pub repo: RepoFullName,
    /// Repository web URL when known.
    pub repo_url: Option<String>,
    /// Completed CI run identifier.
    pub run_id: u64,
    /// Head commit fingerprint the run was triggered for.
    pub head_sha: CommitSha,
    /// Head branch name when known.
    pub head_branch: Option<String>,
}

/// Rerun request event (check suite or check run rerequested).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RerunRequested {
    /// Repository the rerun targets.
    pub repo: RepoFullName,
    /// Repository web URL when known.
    pub repo_url: Option<String>,
    /// Head commit fingerprint from the rerun payload.
    pub head_sha: CommitSha,
    /// Head branch name when the payload carries one.
    pub head_branch: Option<String>,
    /// Pull request directly attached to the payload when present.
    pub pr: Option<PrDescriptor>,
}
