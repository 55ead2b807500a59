// review-gate-gates/tests/common/mod.rs
// ============================================================================
// Module: Common Test Fixtures
// Description: Shared mocks and fixtures for built-in gate tests.
// Purpose: Provide forge and workflow doubles plus zip artifact builders.
// Dependencies: review-gate-core, review-gate-gates, zip
// ============================================================================

//! ## Overview
//! This module provides in-memory doubles for the forge client and the AI
//! workflow dispatcher, context builders, and a helper for assembling ZIP
//! artifacts in memory.

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
use std::io::Cursor;
use std::io::Write as _;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use zip::ZipWriter;
use zip::write::FileOptions;

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
use review_gate_core::PolicySpec;
use review_gate_core::PrDescriptor;
use review_gate_core::RepoFullName;
use review_gate_core::WorkflowError;
use review_gate_core::WorkflowId;
use review_gate_core::WorkflowInput;

// ============================================================================
// SECTION: Mock Forge
// ============================================================================

/// In-memory forge double for gate tests.
#[derive(Default)]
pub struct MockForge {
    /// File contents keyed by repository path.
    pub contents: Mutex<BTreeMap<String, String>>,
    /// Refreshed PR returned by `get_pr`; absent means not found.
    pub pr: Mutex<Option<PrDescriptor>>,
    /// When set, `get_pr` fails with a transient error.
    pub pr_fails: Mutex<bool>,
    /// Changed files returned by `list_pr_files`.
    pub pr_files: Mutex<Vec<ChangedFile>>,
    /// CI runs returned by `list_workflow_runs`.
    pub runs: Mutex<Vec<CiRun>>,
    /// Artifacts returned by `list_run_artifacts`.
    pub artifacts: Mutex<Vec<CiArtifact>>,
    /// Artifact bytes keyed by artifact id.
    pub artifact_bytes: Mutex<BTreeMap<u64, Vec<u8>>>,
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

    /// Seeds a completed, successful pull-request CI run with one artifact.
    pub fn seed_run_with_artifact(&self, run_id: u64, artifact_name: &str, bytes: Vec<u8>) {
        self.runs.lock().unwrap().push(CiRun {
            id: run_id,
            event: "pull_request".to_string(),
            status: "completed".to_string(),
            conclusion: Some("success".to_string()),
            updated_at_unix: 1_000,
            head_sha: CommitSha::new("feedc0de"),
        });
        let size = u64::try_from(bytes.len()).unwrap();
        self.artifacts.lock().unwrap().push(CiArtifact {
            id: run_id * 10,
            name: artifact_name.to_string(),
            size_in_bytes: size,
        });
        self.artifact_bytes.lock().unwrap().insert(run_id * 10, bytes);
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
        if *self.pr_fails.lock().unwrap() {
            return Err(ForgeError::Transient("forge unavailable".to_string()));
        }
        self.pr
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| ForgeError::NotFound(format!("pr {number}")))
    }

    async fn list_open_prs(&self, _repo: &RepoFullName) -> Result<Vec<PrDescriptor>, ForgeError> {
        Ok(Vec::new())
    }

    async fn list_prs_for_commit(
        &self,
        _repo: &RepoFullName,
        _sha: &CommitSha,
    ) -> Result<Vec<PrDescriptor>, ForgeError> {
        Ok(Vec::new())
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
        _request: &CheckRequest,
    ) -> Result<CheckId, ForgeError> {
        Ok(CheckId::new("check-1"))
    }

    async fn update_check(
        &self,
        _repo: &RepoFullName,
        _check_id: &CheckId,
        _request: &CheckRequest,
    ) -> Result<(), ForgeError> {
        Ok(())
    }

    async fn list_branches(&self, _repo: &RepoFullName) -> Result<Vec<BranchRef>, ForgeError> {
        Ok(Vec::new())
    }
}

// ============================================================================
// SECTION: Mock AI Workflow
// ============================================================================

/// In-memory AI workflow double returning a canned result.
pub struct MockAi {
    /// Result returned by `evaluate`.
    pub result: Mutex<Result<Value, String>>,
    /// Recorded workflow inputs.
    pub inputs: Mutex<Vec<WorkflowInput>>,
    /// When set, `evaluate` reports an unknown workflow.
    pub unknown_workflow: Mutex<bool>,
}

impl MockAi {
    /// Creates a mock returning the given value.
    pub fn returning(value: Value) -> Self {
        Self {
            result: Mutex::new(Ok(value)),
            inputs: Mutex::new(Vec::new()),
            unknown_workflow: Mutex::new(false),
        }
    }
}

#[async_trait]
impl AiWorkflow for MockAi {
    async fn evaluate(
        &self,
        workflow_id: &WorkflowId,
        input: WorkflowInput,
    ) -> Result<Value, WorkflowError> {
        if *self.unknown_workflow.lock().unwrap() {
            return Err(WorkflowError::UnknownWorkflow(workflow_id.to_string()));
        }
        self.inputs.lock().unwrap().push(input);
        self.result
            .lock()
            .unwrap()
            .clone()
            .map_err(WorkflowError::Failed)
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

/// Builds a context over the given policy and doubles.
pub fn context_with(
    policy: PolicySpec,
    pr: PrDescriptor,
    forge: Arc<MockForge>,
    ai: Arc<MockAi>,
) -> GateContext {
    GateContext::new(RepoFullName::new("cogni/sync-loop"), pr, policy, forge, ai)
}

/// Parses a policy document from YAML, panicking on error.
pub fn policy_from_yaml(yaml: &str) -> PolicySpec {
    PolicySpec::from_yaml(yaml).unwrap()
}

// ============================================================================
// SECTION: Zip Builders
// ============================================================================

/// Builds an in-memory ZIP holding the given named entries.
pub fn zip_with_entries(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, text) in entries {
        writer.start_file(*name, FileOptions::default()).unwrap();
        writer.write_all(text.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}
