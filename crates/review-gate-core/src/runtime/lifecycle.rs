// review-gate-core/src/runtime/lifecycle.rs
// ============================================================================
// Module: Two-Phase Check Lifecycle
// Description: PR-event publication and CI-completion reconciliation.
// Purpose: Publish, stash, and patch checks keyed by head commit fingerprint.
// Dependencies: crate::{core, interfaces, runtime}, dashmap, time, tokio
// ============================================================================

//! ## Overview
//! Phase one runs on a PR event: the policy is loaded from the head commit,
//! non-artifact gates run, and an in-progress check is published with its id
//! stashed in the outstanding-check map. Phase two runs on CI completion:
//! the open PR whose head still matches the event is resolved (the staleness
//! guard), gates re-run with artifact ingestion enabled, and the stashed
//! check is patched in place. The map is the sole coordination artifact
//! between the two phases; both are otherwise stateless.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::core::check::AnnotationLevel;
use crate::core::check::CheckAnnotation;
use crate::core::check::CheckConclusion;
use crate::core::check::CheckOutput;
use crate::core::check::CheckRequest;
use crate::core::check::CheckStatus;
use crate::core::event::CiRunCompleted;
use crate::core::event::PrEvent;
use crate::core::event::RerunRequested;
use crate::core::hashing::HashError;
use crate::core::identifiers::CheckId;
use crate::core::identifiers::CommitSha;
use crate::core::identifiers::RepoFullName;
use crate::core::policy::PolicySpec;
use crate::core::pr::PrDescriptor;
use crate::core::result::GateStatus;
use crate::core::result::RunResult;
use crate::core::result::Severity;
use crate::interfaces::AiWorkflow;
use crate::interfaces::ForgeClient;
use crate::interfaces::ForgeError;
use crate::interfaces::PolicyLoadError;
use crate::interfaces::PolicyLoader;
use crate::runtime::context::DEFAULT_CHECK_NAME;
use crate::runtime::context::DEFAULT_GATE_TIMEOUT_MS;
use crate::runtime::context::DEFAULT_POLICY_ROOT;
use crate::runtime::context::GateContext;
use crate::runtime::orchestrator::Orchestrator;
use crate::runtime::orchestrator::OrchestratorError;
use crate::runtime::render::Report;
use crate::runtime::render::render_report;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum inline annotations attached per check update.
const MAX_ANNOTATIONS: usize = 50;

/// Default time-to-live for outstanding-check entries in seconds.
const DEFAULT_OUTSTANDING_TTL_SECS: i64 = 3_600;

/// Environment variable overriding the published check name.
pub const CHECK_NAME_ENV: &str = "REVIEW_GATE_CHECK_NAME";

// ============================================================================
// SECTION: Outstanding Checks
// ============================================================================

/// One stashed check awaiting phase-two reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
struct OutstandingEntry {
    /// Check identifier published in phase one.
    check_id: CheckId,
    /// Insertion time as unix seconds, used by the TTL reaper.
    created_unix: i64,
}

/// Process-wide map from commit fingerprint keys to outstanding check ids.
///
/// Entries are created in phase one, consumed in phase two, and reaped by a
/// TTL covering worst-case CI lag. The map is safe for concurrent readers
/// and writers; it is the only state that outlives an event.
#[derive(Default)]
pub struct OutstandingChecks {
    /// Stashed entries keyed by `repo:pr:head:policy_hash`.
    entries: DashMap<String, OutstandingEntry>,
}

impl OutstandingChecks {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Stashes a check id under the given key.
    pub fn insert(&self, key: impl Into<String>, check_id: CheckId, now_unix: i64) {
        self.entries.insert(key.into(), OutstandingEntry {
            check_id,
            created_unix: now_unix,
        });
    }

    /// Removes and returns the check id stashed under the key.
    #[must_use]
    pub fn take(&self, key: &str) -> Option<CheckId> {
        self.entries.remove(key).map(|(_, entry)| entry.check_id)
    }

    /// Evicts entries older than the TTL, returning the eviction count.
    pub fn reap(&self, ttl_secs: i64, now_unix: i64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| now_unix - entry.created_unix < ttl_secs);
        before - self.entries.len()
    }

    /// Returns the number of stashed entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when no entry is stashed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Spawns a background reaper evicting stale entries on an interval.
    pub fn spawn_reaper(
        shared: Arc<Self>,
        ttl: Duration,
        period: Duration,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                let evicted = shared.reap(ttl_secs, now_unix());
                if evicted > 0 {
                    debug!(evicted, "reaped outstanding check entries");
                }
            }
        })
    }
}

/// Builds the outstanding-check key for one PR head and policy.
fn outstanding_key(
    repo: &RepoFullName,
    pr_number: u64,
    head_sha: &CommitSha,
    policy_hash: &str,
) -> String {
    format!("{repo}:{pr_number}:{head_sha}:{policy_hash}")
}

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Lifecycle configuration shared across events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleConfig {
    /// Check name published to the forge.
    pub check_name: String,
    /// Policy root directory inside repositories.
    pub policy_root: String,
    /// Per-gate deadline enforced by the launcher.
    pub gate_timeout: Duration,
    /// Time-to-live for outstanding-check entries in seconds.
    pub outstanding_ttl_secs: i64,
    /// Mapping from required status context names to workflow file paths.
    pub context_workflows: BTreeMap<String, String>,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            check_name: DEFAULT_CHECK_NAME.to_string(),
            policy_root: DEFAULT_POLICY_ROOT.to_string(),
            gate_timeout: Duration::from_millis(DEFAULT_GATE_TIMEOUT_MS),
            outstanding_ttl_secs: DEFAULT_OUTSTANDING_TTL_SECS,
            context_workflows: BTreeMap::new(),
        }
    }
}

impl LifecycleConfig {
    /// Builds a configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(name) = std::env::var(CHECK_NAME_ENV) {
            if !name.is_empty() {
                config.check_name = name;
            }
        }
        config
    }
}

// ============================================================================
// SECTION: Lifecycle Errors
// ============================================================================

/// Lifecycle errors surfaced to the event host.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// A check could not be written back to the forge.
    #[error(transparent)]
    Forge(#[from] ForgeError),
    /// The policy hash could not be computed.
    #[error(transparent)]
    Hash(#[from] HashError),
}

// ============================================================================
// SECTION: Check Lifecycle
// ============================================================================

/// Two-phase check lifecycle coordinator.
pub struct CheckLifecycle {
    /// Gate orchestrator shared across events.
    orchestrator: Orchestrator,
    /// Outstanding-check map shared across events.
    outstanding: Arc<OutstandingChecks>,
    /// Lifecycle configuration.
    config: LifecycleConfig,
    /// Forge client capability surface.
    forge: Arc<dyn ForgeClient>,
    /// AI workflow dispatcher.
    ai: Arc<dyn AiWorkflow>,
    /// Policy loader collaborator.
    policies: Arc<dyn PolicyLoader>,
}

impl CheckLifecycle {
    /// Creates a lifecycle over the given collaborators.
    #[must_use]
    pub fn new(
        orchestrator: Orchestrator,
        forge: Arc<dyn ForgeClient>,
        ai: Arc<dyn AiWorkflow>,
        policies: Arc<dyn PolicyLoader>,
        config: LifecycleConfig,
    ) -> Self {
        Self {
            orchestrator,
            outstanding: Arc::new(OutstandingChecks::new()),
            config,
            forge,
            ai,
            policies,
        }
    }

    /// Returns the outstanding-check map.
    #[must_use]
    pub const fn outstanding(&self) -> &Arc<OutstandingChecks> {
        &self.outstanding
    }

    /// Phase one: handles a PR opened/synchronized/reopened event.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError`] when the check cannot be written or the
    /// policy hash cannot be computed.
    pub async fn on_pr_event(&self, event: &PrEvent) -> Result<(), LifecycleError> {
        let _ = self.outstanding.reap(self.config.outstanding_ttl_secs, now_unix());

        let policy = match self.policies.load(&event.repo, &event.pr.head_sha).await {
            Ok(policy) => policy,
            Err(err) => {
                return self
                    .publish_policy_error(&event.repo, &event.pr.head_sha, &err)
                    .await;
            }
        };

        let ctx = self.build_context(
            event.repo.clone(),
            event.repo_url.clone(),
            event.pr.clone(),
            policy,
            false,
            None,
        );

        let run = match self.orchestrator.run(&ctx).await {
            Ok(run) => run,
            Err(OrchestratorError::Configuration(err)) => {
                return self
                    .publish_failure(&event.repo, &event.pr.head_sha, "Policy configuration error", &err.to_string())
                    .await;
            }
        };

        let report = render_report(&run, &ctx.policy, ctx.repo_url.as_deref(), ctx.pr.number);
        let request = self.check_request_in_progress(&event.pr.head_sha, &report);
        let check_id = self.forge.create_check(&event.repo, &request).await?;
        let policy_hash = ctx.policy.canonical_hash()?;
        let key = outstanding_key(&event.repo, ctx.pr.number, &event.pr.head_sha, &policy_hash);
        self.outstanding.insert(key, check_id, now_unix());
        info!(
            pr = ctx.pr.number,
            provisional = run.overall_status.as_str(),
            "published in-progress check; awaiting ci completion"
        );
        Ok(())
    }

    /// Phase two: reconciles a completed CI run against the stashed check.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError`] when the check cannot be written or the
    /// policy hash cannot be computed.
    pub async fn on_ci_completed(&self, event: &CiRunCompleted) -> Result<(), LifecycleError> {
        let open = self.forge.list_open_prs(&event.repo).await?;
        let Some(pr) = open.into_iter().find(|pr| pr.head_sha == event.head_sha) else {
            info!(head = %event.head_sha, "ci completion is stale; no open pr matches the head");
            return Ok(());
        };

        let policy = match self.policies.load(&event.repo, &event.head_sha).await {
            Ok(policy) => policy,
            Err(err) => {
                return self
                    .publish_policy_error(&event.repo, &event.head_sha, &err)
                    .await;
            }
        };
        let policy_hash = policy.canonical_hash()?;
        let key = outstanding_key(&event.repo, pr.number, &event.head_sha, &policy_hash);
        let stashed = self.outstanding.take(&key);

        let ctx = self.build_context(
            event.repo.clone(),
            event.repo_url.clone(),
            pr,
            policy,
            true,
            Some(event.run_id),
        );
        let run = match self.orchestrator.run(&ctx).await {
            Ok(run) => run,
            Err(OrchestratorError::Configuration(err)) => {
                return self
                    .publish_failure(&event.repo, &event.head_sha, "Policy configuration error", &err.to_string())
                    .await;
            }
        };

        let report = render_report(&run, &ctx.policy, ctx.repo_url.as_deref(), ctx.pr.number);
        let request = self.check_request_completed(&event.head_sha, &run, &report);
        match stashed {
            Some(check_id) => {
                self.forge.update_check(&event.repo, &check_id, &request).await?;
                info!(pr = ctx.pr.number, check = %check_id, "patched stashed check");
            }
            None => {
                // Out-of-order delivery: phase two arrived before phase one
                // stashed an id, so a fresh check is created instead.
                let check_id = self.forge.create_check(&event.repo, &request).await?;
                info!(pr = ctx.pr.number, check = %check_id, "created fresh check; no stashed id");
            }
        }
        Ok(())
    }

    /// Phase two: handles a check-suite or check-run rerun request.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError`] when the check cannot be written.
    pub async fn on_rerun_requested(&self, event: &RerunRequested) -> Result<(), LifecycleError> {
        let Some(pr) = self.resolve_rerun_pr(event).await? else {
            warn!(head = %event.head_sha, "rerun pr resolution is ambiguous; publishing neutral check");
            let output = CheckOutput {
                title: self.config.check_name.clone(),
                summary: "Cannot determine the pull request for this rerun".to_string(),
                text: "The rerun payload matched no unique open pull request; \
                       no PR was commented or updated."
                    .to_string(),
                annotations: Vec::new(),
            };
            let request = CheckRequest {
                name: self.config.check_name.clone(),
                head_sha: event.head_sha.clone(),
                status: CheckStatus::Completed,
                conclusion: Some(CheckConclusion::Neutral),
                started_at: Some(now_rfc3339()),
                completed_at: Some(now_rfc3339()),
                output,
            };
            let _ = self.forge.create_check(&event.repo, &request).await?;
            return Ok(());
        };

        let policy = match self.policies.load(&event.repo, &pr.head_sha).await {
            Ok(policy) => policy,
            Err(err) => {
                return self.publish_policy_error(&event.repo, &pr.head_sha, &err).await;
            }
        };
        let head_sha = pr.head_sha.clone();
        let ctx = self.build_context(
            event.repo.clone(),
            event.repo_url.clone(),
            pr,
            policy,
            true,
            None,
        );
        let run = match self.orchestrator.run(&ctx).await {
            Ok(run) => run,
            Err(OrchestratorError::Configuration(err)) => {
                return self
                    .publish_failure(&event.repo, &head_sha, "Policy configuration error", &err.to_string())
                    .await;
            }
        };
        let report = render_report(&run, &ctx.policy, ctx.repo_url.as_deref(), ctx.pr.number);
        let request = self.check_request_completed(&head_sha, &run, &report);
        let _ = self.forge.create_check(&event.repo, &request).await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // PR resolution
    // ------------------------------------------------------------------

    /// Resolves the PR a rerun targets, or nothing when ambiguous.
    async fn resolve_rerun_pr(
        &self,
        event: &RerunRequested,
    ) -> Result<Option<PrDescriptor>, ForgeError> {
        if let Some(pr) = &event.pr {
            return Ok(Some(pr.clone()));
        }

        let associated = self.forge.list_prs_for_commit(&event.repo, &event.head_sha).await?;
        let mut exact: Vec<PrDescriptor> = associated
            .into_iter()
            .filter(|pr| pr.head_sha == event.head_sha)
            .collect();
        if exact.len() == 1 {
            return Ok(exact.pop());
        }

        if let Some(branch) = &event.head_branch {
            let open = self.forge.list_open_prs(&event.repo).await?;
            let mut by_branch: Vec<PrDescriptor> = open
                .into_iter()
                .filter(|pr| pr.head_branch.as_deref() == Some(branch.as_str()))
                .collect();
            if by_branch.len() == 1 {
                return Ok(by_branch.pop());
            }
        }

        let branches = self.forge.list_branches(&event.repo).await?;
        let matching: Vec<String> = branches
            .into_iter()
            .filter(|branch| branch.head_sha == event.head_sha)
            .map(|branch| branch.name)
            .collect();
        if matching.len() == 1 {
            let open = self.forge.list_open_prs(&event.repo).await?;
            let mut by_branch: Vec<PrDescriptor> = open
                .into_iter()
                .filter(|pr| pr.head_branch.as_deref() == matching.first().map(String::as_str))
                .collect();
            if by_branch.len() == 1 {
                return Ok(by_branch.pop());
            }
        }

        Ok(None)
    }

    // ------------------------------------------------------------------
    // Check construction
    // ------------------------------------------------------------------

    /// Builds the per-run context for one event.
    fn build_context(
        &self,
        repo: RepoFullName,
        repo_url: Option<String>,
        pr: PrDescriptor,
        policy: PolicySpec,
        artifact_gates_enabled: bool,
        ci_run_id: Option<u64>,
    ) -> GateContext {
        let mut ctx = GateContext::new(repo, pr, policy, Arc::clone(&self.forge), Arc::clone(&self.ai));
        ctx.repo_url = repo_url;
        ctx.policy_root = self.config.policy_root.clone();
        ctx.check_name = self.config.check_name.clone();
        ctx.gate_timeout = self.config.gate_timeout;
        ctx.artifact_gates_enabled = artifact_gates_enabled;
        ctx.ci_run_id = ci_run_id;
        ctx.context_workflows = self.config.context_workflows.clone();
        ctx
    }

    /// Builds an in-progress check request for phase one.
    fn check_request_in_progress(&self, head_sha: &CommitSha, report: &Report) -> CheckRequest {
        CheckRequest {
            name: self.config.check_name.clone(),
            head_sha: head_sha.clone(),
            status: CheckStatus::InProgress,
            conclusion: None,
            started_at: Some(now_rfc3339()),
            completed_at: None,
            output: CheckOutput {
                title: self.config.check_name.clone(),
                summary: report.summary.clone(),
                text: report.text.clone(),
                annotations: Vec::new(),
            },
        }
    }

    /// Builds a completed check request carrying annotations.
    fn check_request_completed(
        &self,
        head_sha: &CommitSha,
        run: &RunResult,
        report: &Report,
    ) -> CheckRequest {
        let (annotations, omitted) = build_annotations(run);
        let mut text = report.text.clone();
        if omitted > 0 {
            text.push_str(&format!("\n_{omitted} annotation(s) omitted_\n"));
        }
        CheckRequest {
            name: self.config.check_name.clone(),
            head_sha: head_sha.clone(),
            status: CheckStatus::Completed,
            conclusion: Some(conclusion_for(run.overall_status)),
            started_at: Some(now_rfc3339()),
            completed_at: Some(now_rfc3339()),
            output: CheckOutput {
                title: self.config.check_name.clone(),
                summary: report.summary.clone(),
                text,
                annotations,
            },
        }
    }

    /// Publishes a completed check for a policy-load failure.
    async fn publish_policy_error(
        &self,
        repo: &RepoFullName,
        head_sha: &CommitSha,
        err: &PolicyLoadError,
    ) -> Result<(), LifecycleError> {
        let (conclusion, summary, text) = match err {
            PolicyLoadError::Missing => (
                CheckConclusion::Failure,
                format!("No {}/repo-spec.yaml found", self.config.policy_root),
                format!(
                    "This repository has no policy document at `{}/repo-spec.yaml` \
                     on the head commit. Add one to enable review gates.",
                    self.config.policy_root
                ),
            ),
            PolicyLoadError::Invalid(message) => (
                CheckConclusion::Failure,
                "Policy file is invalid".to_string(),
                format!("The policy document failed validation:\n\n```\n{message}\n```"),
            ),
            PolicyLoadError::Transient(message) => (
                CheckConclusion::Neutral,
                "Policy fetch failed; push again or rerun the check to retry".to_string(),
                format!("Fetching the policy document failed transiently:\n\n```\n{message}\n```"),
            ),
        };
        warn!(head = %head_sha, error = %err, "policy load failed");
        let request = CheckRequest {
            name: self.config.check_name.clone(),
            head_sha: head_sha.clone(),
            status: CheckStatus::Completed,
            conclusion: Some(conclusion),
            started_at: Some(now_rfc3339()),
            completed_at: Some(now_rfc3339()),
            output: CheckOutput {
                title: self.config.check_name.clone(),
                summary,
                text,
                annotations: Vec::new(),
            },
        };
        let _ = self.forge.create_check(repo, &request).await?;
        Ok(())
    }

    /// Publishes a completed failure check with the given summary and body.
    async fn publish_failure(
        &self,
        repo: &RepoFullName,
        head_sha: &CommitSha,
        summary: &str,
        text: &str,
    ) -> Result<(), LifecycleError> {
        let request = CheckRequest {
            name: self.config.check_name.clone(),
            head_sha: head_sha.clone(),
            status: CheckStatus::Completed,
            conclusion: Some(CheckConclusion::Failure),
            started_at: Some(now_rfc3339()),
            completed_at: Some(now_rfc3339()),
            output: CheckOutput {
                title: self.config.check_name.clone(),
                summary: summary.to_string(),
                text: text.to_string(),
                annotations: Vec::new(),
            },
        };
        let _ = self.forge.create_check(repo, &request).await?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Annotation Construction
// ============================================================================

/// Builds inline annotations from violations with a normalized path and line.
///
/// Returns the bounded annotation list and the number of omitted candidates.
fn build_annotations(run: &RunResult) -> (Vec<CheckAnnotation>, usize) {
    let mut annotations = Vec::new();
    let mut omitted = 0_usize;
    for gate in &run.gates {
        for violation in &gate.violations {
            let (Some(path), Some(line)) = (&violation.path, violation.line) else {
                continue;
            };
            if annotations.len() >= MAX_ANNOTATIONS {
                omitted += 1;
                continue;
            }
            let level = match violation.level {
                Some(Severity::Error) => AnnotationLevel::Failure,
                _ => AnnotationLevel::Warning,
            };
            annotations.push(CheckAnnotation {
                path: path.clone(),
                start_line: line,
                end_line: line,
                start_column: violation.column,
                end_column: violation.column,
                annotation_level: level,
                message: format!("{}: {}", violation.code, violation.message),
            });
        }
    }
    (annotations, omitted)
}

/// Maps an overall run status onto a check conclusion.
const fn conclusion_for(status: GateStatus) -> CheckConclusion {
    match status {
        GateStatus::Pass => CheckConclusion::Success,
        GateStatus::Fail => CheckConclusion::Failure,
        GateStatus::Neutral => CheckConclusion::Neutral,
    }
}

// ============================================================================
// SECTION: Time Helpers
// ============================================================================

/// Returns the current unix time in seconds.
fn now_unix() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

/// Returns the current time as an RFC3339 string.
fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .map_or_else(|_| String::new(), |value| value)
}
