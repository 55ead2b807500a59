// review-gate-core/src/core/pr.rs
// ============================================================================
// Module: Review Gate PR Descriptor
// Description: Forge-agnostic pull request descriptor and changed-file model.
// Purpose: Provide the uniform PR shape consumed by every gate handler.
// Dependencies: crate::core::identifiers, serde
// ============================================================================

//! ## Overview
//! The PR descriptor is the forge-agnostic projection of a pull or merge
//! request. Adapters translate forge-specific webhook payloads into this
//! shape; gates must not depend on any field beyond what is defined here.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::CommitSha;

// ============================================================================
// SECTION: PR Descriptor
// ============================================================================

/// Forge-agnostic pull request descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrDescriptor {
    /// Pull request number.
    pub number: u64,
    /// Pull request title.
    pub title: String,
    /// Pull request body, empty when absent.
    pub body: String,
    /// Head commit fingerprint.
    pub head_sha: CommitSha,
    /// Base commit fingerprint.
    pub base_sha: CommitSha,
    /// Head branch name when known.
    pub head_branch: Option<String>,
    /// Number of changed files when the forge reports it.
    pub changed_files: Option<u64>,
    /// Total added lines.
    pub additions: u64,
    /// Total deleted lines.
    pub deletions: u64,
}

impl PrDescriptor {
    /// Returns the combined churn (additions plus deletions).
    #[must_use]
    pub const fn churn(&self) -> u64 {
        self.additions + self.deletions
    }
}

// ============================================================================
// SECTION: Changed Files
// ============================================================================

/// Status of a single changed file within a pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    /// File was added.
    Added,
    /// File was modified in place.
    Modified,
    /// File was removed.
    Removed,
    /// File was renamed.
    Renamed,
}

impl FileStatus {
    /// Returns the lowercase label for the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Modified => "modified",
            Self::Removed => "removed",
            Self::Renamed => "renamed",
        }
    }
}

/// A single changed file entry reported by the forge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedFile {
    /// Repository-relative path.
    pub path: String,
    /// Change status.
    pub status: FileStatus,
    /// Added lines in this file.
    pub additions: u64,
    /// Deleted lines in this file.
    pub deletions: u64,
    /// Unified diff patch text when the forge provides it.
    pub patch: Option<String>,
}

impl ChangedFile {
    /// Returns the combined churn for this file.
    #[must_use]
    pub const fn churn(&self) -> u64 {
        self.additions + self.deletions
    }
}
