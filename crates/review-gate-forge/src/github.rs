// review-gate-forge/src/github.rs
// ============================================================================
// Module: GitHub-Style Webhook Adapter
// Description: GitHub-style webhook payload shapes and event translation.
// Purpose: Map pull_request, workflow_run, and check_suite payloads onto core events.
// Dependencies: review-gate-core, serde
// ============================================================================

//! ## Overview
//! These shapes cover exactly the fields the runtime consumes; everything
//! else in the webhook payload is ignored by serde. Actions outside the
//! runtime's vocabulary translate to nothing rather than to an error, so
//! hosts can feed every delivery through the same adapter.

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
use review_gate_core::RerunRequested;

// ============================================================================
// SECTION: Shared Shapes
// ============================================================================

/// Repository block common to every payload.
#[derive(Debug, Clone, Deserialize)]
pub struct GithubRepository {
    /// Fully qualified `owner/name`.
    pub full_name: String,
    /// Repository web URL.
    #[serde(default)]
    pub html_url: Option<String>,
}

/// A head or base git reference.
#[derive(Debug, Clone, Deserialize)]
pub struct GithubGitRef {
    /// Commit fingerprint.
    pub sha: String,
    /// Branch name.
    #[serde(rename = "ref", default)]
    pub git_ref: Option<String>,
}

// ============================================================================
// SECTION: Pull Request Events
// ============================================================================

/// A `pull_request` webhook payload.
#[derive(Debug, Clone, Deserialize)]
pub struct GithubPullRequestEvent {
    /// Webhook action.
    pub action: String,
    /// Pull request block.
    pub pull_request: GithubPullRequest,
    /// Repository block.
    pub repository: GithubRepository,
}

/// Pull request block of a `pull_request` payload.
#[derive(Debug, Clone, Deserialize)]
pub struct GithubPullRequest {
    /// Pull request number.
    pub number: u64,
    /// Title.
    #[serde(default)]
    pub title: Option<String>,
    /// Body.
    #[serde(default)]
    pub body: Option<String>,
    /// Head reference.
    pub head: GithubGitRef,
    /// Base reference.
    pub base: GithubGitRef,
    /// Changed-file count when the forge includes it.
    #[serde(default)]
    pub changed_files: Option<u64>,
    /// Total added lines.
    #[serde(default)]
    pub additions: Option<u64>,
    /// Total deleted lines.
    #[serde(default)]
    pub deletions: Option<u64>,
}

impl GithubPullRequest {
    /// Translates the block into the forge-agnostic PR descriptor.
    #[must_use]
    pub fn to_descriptor(&self) -> PrDescriptor {
        PrDescriptor {
            number: self.number,
            title: self.title.clone().unwrap_or_default(),
            body: self.body.clone().unwrap_or_default(),
            head_sha: CommitSha::new(self.head.sha.clone()),
            base_sha: CommitSha::new(self.base.sha.clone()),
            head_branch: self.head.git_ref.clone(),
            changed_files: self.changed_files,
            additions: self.additions.unwrap_or_default(),
            deletions: self.deletions.unwrap_or_default(),
        }
    }
}

impl GithubPullRequestEvent {
    /// Translates the payload into a phase-one event, when the action maps.
    #[must_use]
    pub fn to_pr_event(&self) -> Option<PrEvent> {
        let action = match self.action.as_str() {
            "opened" => PrAction::Opened,
            "synchronize" => PrAction::Synchronized,
            "reopened" => PrAction::Reopened,
            _ => return None,
        };
        Some(PrEvent {
            action,
            repo: RepoFullName::new(self.repository.full_name.clone()),
            repo_url: self.repository.html_url.clone(),
            pr: self.pull_request.to_descriptor(),
        })
    }
}

// ============================================================================
// SECTION: Workflow Run Events
// ============================================================================

/// A `workflow_run` webhook payload.
#[derive(Debug, Clone, Deserialize)]
pub struct GithubWorkflowRunEvent {
    /// Webhook action.
    pub action: String,
    /// Workflow run block.
    pub workflow_run: GithubWorkflowRun,
    /// Repository block.
    pub repository: GithubRepository,
}

/// Workflow run block of a `workflow_run` payload.
#[derive(Debug, Clone, Deserialize)]
pub struct GithubWorkflowRun {
    /// Run identifier.
    pub id: u64,
    /// Head commit fingerprint.
    pub head_sha: String,
    /// Head branch name.
    #[serde(default)]
    pub head_branch: Option<String>,
    /// Run status.
    pub status: String,
}

impl GithubWorkflowRunEvent {
    /// Translates the payload into a phase-two CI completion event.
    #[must_use]
    pub fn to_ci_completed(&self) -> Option<CiRunCompleted> {
        if self.action != "completed" || self.workflow_run.status != "completed" {
            return None;
        }
        Some(CiRunCompleted {
            repo: RepoFullName::new(self.repository.full_name.clone()),
            repo_url: self.repository.html_url.clone(),
            run_id: self.workflow_run.id,
            head_sha: CommitSha::new(self.workflow_run.head_sha.clone()),
            head_branch: self.workflow_run.head_branch.clone(),
        })
    }
}

// ============================================================================
// SECTION: Check Suite Events
// ============================================================================

/// A `check_suite` or `check_run` rerun payload.
#[derive(Debug, Clone, Deserialize)]
pub struct GithubCheckSuiteEvent {
    /// Webhook action.
    pub action: String,
    /// Check suite block.
    pub check_suite: GithubCheckSuite,
    /// Repository block.
    pub repository: GithubRepository,
}

/// Check suite block of a rerun payload.
#[derive(Debug, Clone, Deserialize)]
pub struct GithubCheckSuite {
    /// Head commit fingerprint.
    pub head_sha: String,
    /// Head branch name.
    #[serde(default)]
    pub head_branch: Option<String>,
    /// Pull requests the forge attached to the suite.
    #[serde(default)]
    pub pull_requests: Vec<GithubPullRequest>,
}

impl GithubCheckSuiteEvent {
    /// Translates the payload into a rerun request event.
    #[must_use]
    pub fn to_rerun(&self) -> Option<RerunRequested> {
        if self.action != "rerequested" {
            return None;
        }
        Some(RerunRequested {
            repo: RepoFullName::new(self.repository.full_name.clone()),
            repo_url: self.repository.html_url.clone(),
            head_sha: CommitSha::new(self.check_suite.head_sha.clone()),
            head_branch: self.check_suite.head_branch.clone(),
            pr: self
                .check_suite
                .pull_requests
                .first()
                .map(GithubPullRequest::to_descriptor),
        })
    }
}
