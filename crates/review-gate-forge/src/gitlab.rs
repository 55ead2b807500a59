// review-gate-forge/src/gitlab.rs
// ============================================================================
// Module: GitLab-Style Webhook Adapter
// Description: GitLab-style merge request and pipeline hook translation.
// Purpose: Map merge_request and pipeline hooks onto the same core events.
// Dependencies: review-gate-core, serde
// ============================================================================

//! ## Overview
//! The GitLab-style adapter translates merge request hooks into the same PR
//! descriptor shape the GitHub-style adapter produces, so the runtime never
//! branches on the forge. Merge request hooks do not carry a base
//! fingerprint or churn totals; those fields default and the diff-limits
//! gate falls back to its single refresh call when it needs them.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;

use review_gate_core::CiRunCompleted;
use review_gate_core::CommitSha;
use review_gate_core::PrAction;
use review_gate_core::PrDescriptor;
use review_gate_core::PrEvent;
use review_gate_core::RepoFullName;

// ============================================================================
// SECTION: Shared Shapes
// ============================================================================

/// Project block common to every hook.
#[derive(Debug, Clone, Deserialize)]
pub struct GitlabProject {
    /// Fully qualified `group/project`.
    pub path_with_namespace: String,
    /// Project web URL.
    #[serde(default)]
    pub web_url: Option<String>,
}

/// Last commit block of a merge request hook.
#[derive(Debug, Clone, Deserialize)]
pub struct GitlabCommit {
    /// Commit fingerprint.
    pub id: String,
}

// ============================================================================
// SECTION: Merge Request Hooks
// ============================================================================

/// A `merge_request` hook payload.
#[derive(Debug, Clone, Deserialize)]
pub struct GitlabMergeRequestEvent {
    /// Hook object kind.
    pub object_kind: String,
    /// Merge request attributes.
    pub object_attributes: GitlabMergeRequestAttributes,
    /// Project block.
    pub project: GitlabProject,
}

/// Attribute block of a merge request hook.
#[derive(Debug, Clone, Deserialize)]
pub struct GitlabMergeRequestAttributes {
    /// Merge request internal id (per-project number).
    pub iid: u64,
    /// Title.
    #[serde(default)]
    pub title: Option<String>,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
    /// Hook action.
    #[serde(default)]
    pub action: Option<String>,
    /// Source branch name.
    #[serde(default)]
    pub source_branch: Option<String>,
    /// Last commit on the source branch.
    pub last_commit: GitlabCommit,
}

impl GitlabMergeRequestEvent {
    /// Translates the hook into a phase-one event, when the action maps.
    #[must_use]
    pub fn to_pr_event(&self) -> Option<PrEvent> {
        if self.object_kind != "merge_request" {
            return None;
        }
        let action = match self.object_attributes.action.as_deref() {
            Some("open") => PrAction::Opened,
            Some("update") => PrAction::Synchronized,
            Some("reopen") => PrAction::Reopened,
            _ => return None,
        };
        Some(PrEvent {
            action,
            repo: RepoFullName::new(self.project.path_with_namespace.clone()),
            repo_url: self.project.web_url.clone(),
            pr: PrDescriptor {
                number: self.object_attributes.iid,
                title: self.object_attributes.title.clone().unwrap_or_default(),
                body: self.object_attributes.description.clone().unwrap_or_default(),
                head_sha: CommitSha::new(self.object_attributes.last_commit.id.clone()),
                base_sha: CommitSha::new(String::new()),
                head_branch: self.object_attributes.source_branch.clone(),
                changed_files: None,
                additions: 0,
                deletions: 0,
            },
        })
    }
}

// ============================================================================
// SECTION: Pipeline Hooks
// ============================================================================

/// A `pipeline` hook payload.
#[derive(Debug, Clone, Deserialize)]
pub struct GitlabPipelineEvent {
    /// Hook object kind.
    pub object_kind: String,
    /// Pipeline attributes.
    pub object_attributes: GitlabPipelineAttributes,
    /// Project block.
    pub project: GitlabProject,
}

/// Attribute block of a pipeline hook.
#[derive(Debug, Clone, Deserialize)]
pub struct GitlabPipelineAttributes {
    /// Pipeline identifier.
    pub id: u64,
    /// Pipeline status.
    pub status: String,
    /// Branch the pipeline ran for.
    #[serde(rename = "ref", default)]
    pub git_ref: Option<String>,
    /// Commit fingerprint the pipeline ran for.
    pub sha: String,
}

impl GitlabPipelineEvent {
    /// Translates the hook into a phase-two CI completion event.
    #[must_use]
    pub fn to_ci_completed(&self) -> Option<CiRunCompleted> {
        if self.object_kind != "pipeline" {
            return None;
        }
        if !matches!(self.object_attributes.status.as_str(), "success" | "failed") {
            return None;
        }
        Some(CiRunCompleted {
            repo: RepoFullName::new(self.project.path_with_namespace.clone()),
            repo_url: self.project.web_url.clone(),
            run_id: self.object_attributes.id,
            head_sha: CommitSha::new(self.object_attributes.sha.clone()),
            head_branch: self.object_attributes.git_ref.clone(),
        })
    }
}
