// review-gate-core/src/runtime/context.rs
// ============================================================================
// Module: Review Gate Run Context
// Description: Per-run context handed to every gate handler.
// Purpose: Expose the PR, policy, collaborators, and cancellation signal.
// Dependencies: crate::{core, interfaces}, tokio-util
// ============================================================================

//! ## Overview
//! The run context is owned exclusively by one event's execution. Handlers
//! receive it by reference, must be side-effect-free except through the forge
//! client, and must observe the cancellation signal at every externally
//! observable boundary.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::core::identifiers::RepoFullName;
use crate::core::policy::PolicySpec;
use crate::core::pr::PrDescriptor;
use crate::interfaces::AiWorkflow;
use crate::interfaces::ForgeClient;

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Default per-gate deadline in milliseconds.
pub const DEFAULT_GATE_TIMEOUT_MS: u64 = 30_000;

/// Default policy root directory inside the repository.
pub const DEFAULT_POLICY_ROOT: &str = ".cogni";

/// Default check name when the deployment does not configure one.
pub const DEFAULT_CHECK_NAME: &str = "review-gate";

// ============================================================================
// SECTION: Gate Context
// ============================================================================

/// Per-run context built by the lifecycle and consumed by gate handlers.
pub struct GateContext {
    /// Repository the run targets.
    pub repo: RepoFullName,
    /// Repository web URL when known, used for the vote deep link.
    pub repo_url: Option<String>,
    /// Pull request descriptor at event time.
    pub pr: PrDescriptor,
    /// Loaded policy document.
    pub policy: PolicySpec,
    /// Policy root directory inside the repository.
    pub policy_root: String,
    /// Check name this deployment publishes under.
    pub check_name: String,
    /// Forge client capability surface.
    pub forge: Arc<dyn ForgeClient>,
    /// AI workflow dispatcher.
    pub ai: Arc<dyn AiWorkflow>,
    /// Cancellation signal observed at every suspension point.
    pub cancel: CancellationToken,
    /// Per-gate deadline enforced by the launcher.
    pub gate_timeout: Duration,
    /// False during phase one, when external-artifact gates are deferred.
    pub artifact_gates_enabled: bool,
    /// Completed CI run identifier supplied by phase two.
    pub ci_run_id: Option<u64>,
    /// Mapping from required status context names to workflow file paths.
    pub context_workflows: BTreeMap<String, String>,
}

impl GateContext {
    /// Creates a context with default configuration.
    #[must_use]
    pub fn new(
        repo: RepoFullName,
        pr: PrDescriptor,
        policy: PolicySpec,
        forge: Arc<dyn ForgeClient>,
        ai: Arc<dyn AiWorkflow>,
    ) -> Self {
        Self {
            repo,
            repo_url: None,
            pr,
            policy,
            policy_root: DEFAULT_POLICY_ROOT.to_string(),
            check_name: DEFAULT_CHECK_NAME.to_string(),
            forge,
            ai,
            cancel: CancellationToken::new(),
            gate_timeout: Duration::from_millis(DEFAULT_GATE_TIMEOUT_MS),
            artifact_gates_enabled: true,
            ci_run_id: None,
            context_workflows: BTreeMap::new(),
        }
    }

    /// Returns the repository path of a rule file referenced by a gate spec.
    #[must_use]
    pub fn rule_path(&self, rule_file: &str) -> String {
        format!("{}/rules/{}", self.policy_root, rule_file)
    }

    /// Returns the repository path of the policy document itself.
    #[must_use]
    pub fn policy_path(&self) -> String {
        format!("{}/repo-spec.yaml", self.policy_root)
    }
}
