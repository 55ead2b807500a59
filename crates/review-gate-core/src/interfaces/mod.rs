// review-gate-core/src/interfaces/mod.rs
// ============================================================================
// Module: Review Gate Interfaces
// Description: Backend-agnostic interfaces for the forge, AI workflows, and policy loading.
// Purpose: Define the contract surfaces consumed by the gate evaluation runtime.
// Dependencies: crate::core, async-trait, bytes
// ============================================================================

//! ## Overview
//! Interfaces define how the runtime integrates with external systems without
//! embedding forge-specific details. Implementations must fail closed on
//! missing or invalid data: transient failures surface as errors, never as
//! fabricated results. The runtime must not depend on forge fields beyond
//! what these contracts expose.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::core::check::CheckRequest;
use crate::core::identifiers::CheckId;
use crate::core::identifiers::CommitSha;
use crate::core::identifiers::MetricId;
use crate::core::identifiers::RepoFullName;
use crate::core::identifiers::WorkflowId;
use crate::core::policy::PolicySpec;
use crate::core::pr::ChangedFile;
use crate::core::pr::PrDescriptor;

// ============================================================================
// SECTION: Forge Client
// ============================================================================

/// Forge client errors.
#[derive(Debug, Error)]
pub enum ForgeError {
    /// The requested entity does not exist.
    #[error("forge entity not found: {0}")]
    NotFound(String),
    /// Transient transport or rate-limit failure; the caller may retry.
    #[error("transient forge error: {0}")]
    Transient(String),
    /// The forge returned a payload the client could not interpret.
    #[error("forge protocol error: {0}")]
    Protocol(String),
}

/// A completed or in-flight CI run reported by the forge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CiRun {
    /// Run identifier.
    pub id: u64,
    /// Event that triggered the run.
    pub event: String,
    /// Run status (`completed`, `in_progress`, `queued`).
    pub status: String,
    /// Run conclusion when completed.
    pub conclusion: Option<String>,
    /// Last update time as unix seconds, used for recency ordering.
    pub updated_at_unix: i64,
    /// Head commit fingerprint the run was triggered for.
    pub head_sha: CommitSha,
}

/// A named artifact attached to a CI run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CiArtifact {
    /// Artifact identifier.
    pub id: u64,
    /// Artifact name.
    pub name: String,
    /// Declared artifact size in bytes.
    pub size_in_bytes: u64,
}

/// A branch reference used by rerun PR resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchRef {
    /// Branch name.
    pub name: String,
    /// Branch head fingerprint.
    pub head_sha: CommitSha,
}

/// Abstract forge capability surface consumed by the runtime.
///
/// Every method is a suspension point; implementations must honor request
/// deadlines supplied by the host and must not retry indefinitely.
#[async_trait]
pub trait ForgeClient: Send + Sync {
    /// Fetches file content at a path for a ref.
    ///
    /// # Errors
    ///
    /// Returns [`ForgeError::NotFound`] when the path does not exist at the
    /// ref, or another [`ForgeError`] on transport failure.
    async fn get_content(
        &self,
        repo: &RepoFullName,
        path: &str,
        git_ref: &CommitSha,
    ) -> Result<String, ForgeError>;

    /// Fetches a pull request by number.
    ///
    /// # Errors
    ///
    /// Returns [`ForgeError`] when the PR cannot be fetched.
    async fn get_pr(&self, repo: &RepoFullName, number: u64) -> Result<PrDescriptor, ForgeError>;

    /// Lists open pull requests for the repository.
    ///
    /// # Errors
    ///
    /// Returns [`ForgeError`] when the listing fails.
    async fn list_open_prs(&self, repo: &RepoFullName) -> Result<Vec<PrDescriptor>, ForgeError>;

    /// Lists pull requests associated with a commit.
    ///
    /// # Errors
    ///
    /// Returns [`ForgeError`] when the listing fails.
    async fn list_prs_for_commit(
        &self,
        repo: &RepoFullName,
        sha: &CommitSha,
    ) -> Result<Vec<PrDescriptor>, ForgeError>;

    /// Lists the changed files of a pull request.
    ///
    /// # Errors
    ///
    /// Returns [`ForgeError`] when the listing fails.
    async fn list_pr_files(
        &self,
        repo: &RepoFullName,
        number: u64,
    ) -> Result<Vec<ChangedFile>, ForgeError>;

    /// Lists CI runs filtered by head fingerprint.
    ///
    /// # Errors
    ///
    /// Returns [`ForgeError`] when the listing fails.
    async fn list_workflow_runs(
        &self,
        repo: &RepoFullName,
        head_sha: &CommitSha,
    ) -> Result<Vec<CiRun>, ForgeError>;

    /// Lists the artifacts attached to a CI run.
    ///
    /// # Errors
    ///
    /// Returns [`ForgeError`] when the listing fails.
    async fn list_run_artifacts(
        &self,
        repo: &RepoFullName,
        run_id: u64,
    ) -> Result<Vec<CiArtifact>, ForgeError>;

    /// Downloads an artifact as a ZIP byte buffer.
    ///
    /// # Errors
    ///
    /// Returns [`ForgeError`] when the download fails.
    async fn download_artifact(
        &self,
        repo: &RepoFullName,
        artifact_id: u64,
    ) -> Result<Bytes, ForgeError>;

    /// Creates a check run and returns its identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ForgeError`] when the check cannot be created.
    async fn create_check(
        &self,
        repo: &RepoFullName,
        request: &CheckRequest,
    ) -> Result<CheckId, ForgeError>;

    /// Updates an existing check run in place.
    ///
    /// # Errors
    ///
    /// Returns [`ForgeError`] when the check cannot be updated.
    async fn update_check(
        &self,
        repo: &RepoFullName,
        check_id: &CheckId,
        request: &CheckRequest,
    ) -> Result<(), ForgeError>;

    /// Lists branches with their head fingerprints.
    ///
    /// # Errors
    ///
    /// Returns [`ForgeError`] when the listing fails.
    async fn list_branches(&self, repo: &RepoFullName) -> Result<Vec<BranchRef>, ForgeError>;
}

// ============================================================================
// SECTION: AI Workflow
// ============================================================================

/// AI workflow dispatch errors.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// No workflow is registered under the requested identifier.
    #[error("unknown workflow: {0}")]
    UnknownWorkflow(String),
    /// The workflow ran but failed to produce a result.
    #[error("workflow failed: {0}")]
    Failed(String),
}

/// Bounded patch evidence attached to a workflow call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchEvidence {
    /// Repository-relative path of the patched file.
    pub path: String,
    /// Unified diff text, possibly truncated.
    pub patch: String,
    /// True when the patch was truncated to the byte budget.
    pub truncated: bool,
}

/// Input handed to an AI workflow evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowInput {
    /// Pull request title.
    pub pr_title: String,
    /// Pull request body.
    pub pr_body: String,
    /// Compact enumerated diff summary when the rule requests it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff_summary: Option<String>,
    /// Bounded patch evidence when the rule requests it.
    #[serde(default)]
    pub file_patches: Vec<PatchEvidence>,
    /// Statements evaluated per metric.
    #[serde(default)]
    pub evaluations: BTreeMap<MetricId, String>,
}

/// Named AI workflow dispatcher.
///
/// Prompting, model selection, and tool use are opaque to the runtime; the
/// returned value is schema-validated by the caller before use.
#[async_trait]
pub trait AiWorkflow: Send + Sync {
    /// Evaluates a workflow and returns its raw result payload.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError`] when the workflow is unknown or fails.
    async fn evaluate(
        &self,
        workflow_id: &WorkflowId,
        input: WorkflowInput,
    ) -> Result<Value, WorkflowError>;
}

// ============================================================================
// SECTION: Policy Loader
// ============================================================================

/// Policy loader errors, mapped onto distinct check conclusions.
#[derive(Debug, Error)]
pub enum PolicyLoadError {
    /// No policy file exists at the head commit.
    #[error("no policy file found at head commit")]
    Missing,
    /// The policy file exists but fails schema validation.
    #[error("policy file is invalid: {0}")]
    Invalid(String),
    /// The policy could not be fetched; the caller may retry.
    #[error("transient policy fetch error: {0}")]
    Transient(String),
}

/// Policy document loader caching by `(repo, head fingerprint)`.
///
/// The fetch, parse, and cache mechanics are an external collaborator; the
/// runtime only depends on this contract.
#[async_trait]
pub trait PolicyLoader: Send + Sync {
    /// Loads the policy document at a head commit.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyLoadError`] when the policy is missing, invalid, or
    /// temporarily unavailable.
    async fn load(&self, repo: &RepoFullName, sha: &CommitSha) -> Result<PolicySpec, PolicyLoadError>;
}
