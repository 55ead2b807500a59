// review-gate-core/tests/common/mod.rs
// ============================================================================
// Module: Common Test Fixtures
// Description: Shared mocks and fixtures for core runtime tests.
// Purpose: Provide reusable forge, workflow, and policy-loader doubles.
// Dependencies: review-gate-core
// ============================================================================

//! ## Overview
//! This module provides in-memory doubles for the forge client, the AI
//! workflow dispatcher, and the policy loader, plus builders for PR
//! descriptors and policies used across the core test files.

#![allow(dead_code, reason = "Shared test helpers may be unused in some cases.")]
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    reason = "Test-only helpers may panic on mock misconfiguration."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;

use review_gate_core::AiWorkflow;
use review_gate_core::BranchRef;
use review_gate_core::ChangedFile;
use review_gate_core::CheckId;
use review_gate_core::CheckRequest;
use review_gate_core::CiArtifact;
use review_gate_core::CiRun;
use review_gate_core::CommitSha;
use review_gate_core::FileStatus;
use review_gate_core::ForgeClient;
use review_gate_core::ForgeError;
use review_gate_core::GateContext;
use review_gate_core::PolicyLoadError;
use review_gate_core::PolicyLoader;
use review_gate_core::PolicySpec;
use review_gate_core::PrDescriptor;
use review_gate_core::RepoFullName;
use review_gate_core::WorkflowError;
use review_gate_core::WorkflowId;
use review_gate_core::WorkflowInput;

// ============================================================================
// SECTION: Mock Forge
// ============================================================================

/// In-memory forge double recording every check write.
#[derive(Default)]
pub struct MockForge {
    /// File contents keyed by repository path.
    pub contents: Mutex<BTreeMap<String, String>>,
    /// Refreshed PR returned by `get_pr`.
    pub pr: Mutex<Option<PrDescriptor>>,
    /// Open PRs returned by `list_open_prs`.
    pub open_prs: Mutex<Vec<PrDescriptor>>,
    /// PRs returned by `list_prs_for_commit`.
    pub prs_for_commit: Mutex<Vec<PrDescriptor>>,
    /// Changed files returned by `list_pr_files`.
    pub pr_files: Mutex<Vec<ChangedFile>>,
    /// CI runs returned by `list_workflow_runs`.
    pub runs: Mutex<Vec<CiRun>>,
    /// Artifacts returned by `list_run_artifacts`.
    pub artifacts: Mutex<Vec<CiArtifact>>,
    /// Artifact bytes keyed by artifact id.
    pub artifact_bytes: Mutex<BTreeMap<u64, Vec<u8>>>,
    /// Branches returned by `list_branches`.
    pub branches: Mutex<Vec<BranchRef>>,
    /// Recorded `create_check` requests.
    pub created: Mutex<Vec<CheckRequest>>,
    /// Recorded `update_check` requests.
    pub updated: Mutex<Vec<(CheckId, CheckRequest)>>,
    /// Monotonic id source for created checks.
    pub next_check_id: Mutex<u64>,
}

impl MockForge {
    /// Creates an empty mock forge.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a file at a repository path.
    pub fn put_content(&self, path: &str, text: &str) {
        self.contents.lock().unwrap().insert(path.to_string(), text.to_string());
    }
}

#[async_trait]
impl ForgeClient for MockForge {
    async fn get_content(
        &self,
        _repo: &RepoFullName,
        path: &str,
        _git_ref: &CommitSha,
    ) -> Result<String, ForgeError> {
        self.contents
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| ForgeError::NotFound(path.to_string()))
    }

    async fn get_pr(&self, _repo: &RepoFullName, number: u64) -> Result<PrDescriptor, ForgeError> {
        self.pr
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| ForgeError::NotFound(format!("pr {number}")))
    }

    async fn list_open_prs(&self, _repo: &RepoFullName) -> Result<Vec<PrDescriptor>, ForgeError> {
        Ok(self.open_prs.lock().unwrap().clone())
    }

    async fn list_prs_for_commit(
        &self,
        _repo: &RepoFullName,
        _sha: &CommitSha,
    ) -> Result<Vec<PrDescriptor>, ForgeError> {
        Ok(self.prs_for_commit.lock().unwrap().clone())
    }

    async fn list_pr_files(
        &self,
        _repo: &RepoFullName,
        _number: u64,
    ) -> Result<Vec<ChangedFile>, ForgeError> {
        Ok(self.pr_files.lock().unwrap().clone())
    }

    async fn list_workflow_runs(
        &self,
        _repo: &RepoFullName,
        _head_sha: &CommitSha,
    ) -> Result<Vec<CiRun>, ForgeError> {
        Ok(self.runs.lock().unwrap().clone())
    }

    async fn list_run_artifacts(
        &self,
        _repo: &RepoFullName,
        _run_id: u64,
    ) -> Result<Vec<CiArtifact>, ForgeError> {
        Ok(self.artifacts.lock().unwrap().clone())
    }

    async fn download_artifact(
        &self,
        _repo: &RepoFullName,
        artifact_id: u64,
    ) -> Result<Bytes, ForgeError> {
        self.artifact_bytes
            .lock()
            .unwrap()
            .get(&artifact_id)
            .map(|bytes| Bytes::from(bytes.clone()))
            .ok_or_else(|| ForgeError::NotFound(format!("artifact {artifact_id}")))
    }

    async fn create_check(
        &self,
        _repo: &RepoFullName,
        request: &CheckRequest,
    ) -> Result<CheckId, ForgeError> {
        let mut next = self.next_check_id.lock().unwrap();
        *next += 1;
        let id = CheckId::new(format!("check-{}", *next));
        self.created.lock().unwrap().push(request.clone());
        Ok(id)
    }

    async fn update_check(
        &self,
        _repo: &RepoFullName,
        check_id: &CheckId,
        request: &CheckRequest,
    ) -> Result<(), ForgeError> {
        self.updated.lock().unwrap().push((check_id.clone(), request.clone()));
        Ok(())
    }

    async fn list_branches(&self, _repo: &RepoFullName) -> Result<Vec<BranchRef>, ForgeError> {
        Ok(self.branches.lock().unwrap().clone())
    }
}

// ============================================================================
// SECTION: Mock AI Workflow
// ============================================================================

/// In-memory AI workflow double returning a canned result.
pub struct MockAi {
    /// Result returned by `evaluate`; an error string becomes a failure.
    pub result: Mutex<Result<Value, String>>,
    /// Recorded workflow inputs.
    pub inputs: Mutex<Vec<WorkflowInput>>,
}

impl MockAi {
    /// Creates a mock returning the given value.
    pub fn returning(value: Value) -> Self {
        Self {
            result: Mutex::new(Ok(value)),
            inputs: Mutex::new(Vec::new()),
        }
    }

    /// Creates a mock that fails every evaluation.
    pub fn failing(message: &str) -> Self {
        Self {
            result: Mutex::new(Err(message.to_string())),
            inputs: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl AiWorkflow for MockAi {
    async fn evaluate(
        &self,
        _workflow_id: &WorkflowId,
        input: WorkflowInput,
    ) -> Result<Value, WorkflowError> {
        self.inputs.lock().unwrap().push(input);
        self.result
            .lock()
            .unwrap()
            .clone()
            .map_err(WorkflowError::Failed)
    }
}

// ============================================================================
// SECTION: Mock Policy Loader
// ============================================================================

/// In-memory policy loader double.
pub struct MockPolicies {
    /// Result returned by `load`.
    pub result: Mutex<Result<PolicySpec, MockPolicyError>>,
}

/// Cloneable stand-in for policy load errors.
#[derive(Debug, Clone)]
pub enum MockPolicyError {
    /// Policy file missing.
    Missing,
    /// Policy file invalid.
    Invalid(String),
    /// Transient fetch failure.
    Transient(String),
}

impl MockPolicies {
    /// Creates a loader returning the given policy.
    pub fn returning(policy: PolicySpec) -> Self {
        Self {
            result: Mutex::new(Ok(policy)),
        }
    }

    /// Creates a loader failing with the given error.
    pub fn failing(err: MockPolicyError) -> Self {
        Self {
            result: Mutex::new(Err(err)),
        }
    }
}

#[async_trait]
impl PolicyLoader for MockPolicies {
    async fn load(
        &self,
        _repo: &RepoFullName,
        _sha: &CommitSha,
    ) -> Result<PolicySpec, PolicyLoadError> {
        match self.result.lock().unwrap().clone() {
            Ok(policy) => Ok(policy),
            Err(MockPolicyError::Missing) => Err(PolicyLoadError::Missing),
            Err(MockPolicyError::Invalid(message)) => Err(PolicyLoadError::Invalid(message)),
            Err(MockPolicyError::Transient(message)) => Err(PolicyLoadError::Transient(message)),
        }
    }
}

// ============================================================================
// SECTION: Fixture Builders
// ============================================================================

/// Builds a PR descriptor with the given churn shape.
pub fn pr_with(changed_files: Option<u64>, additions: u64, deletions: u64) -> PrDescriptor {
    PrDescriptor {
        number: 7,
        title: "Add retry budget to the sync loop".to_string(),
        body: "Bounds retries and adds tests.".to_string(),
        head_sha: CommitSha::new("feedc0de"),
        base_sha: CommitSha::new("baseba5e"),
        head_branch: Some("feature/retry-budget".to_string()),
        changed_files,
        additions,
        deletions,
    }
}

/// Builds a changed file entry.
pub fn changed_file(path: &str, additions: u64, deletions: u64, patch: Option<&str>) -> ChangedFile {
    ChangedFile {
        path: path.to_string(),
        status: FileStatus::Modified,
        additions,
        deletions,
        patch: patch.map(str::to_string),
    }
}

/// Parses a policy document from YAML, panicking on error.
pub fn policy_from_yaml(yaml: &str) -> PolicySpec {
    PolicySpec::from_yaml(yaml).unwrap()
}

/// Builds a context over the given policy and doubles.
pub fn context_with(
    policy: PolicySpec,
    forge: Arc<MockForge>,
    ai: Arc<MockAi>,
) -> GateContext {
    GateContext::new(
        RepoFullName::new("cogni/sync-loop"),
        pr_with(Some(5), 30, 30),
        policy,
        forge,
        ai,
    )
}
