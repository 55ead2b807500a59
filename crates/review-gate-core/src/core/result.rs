// review-gate-core/src/core/result.rs
// ============================================================================
// Module: Review Gate Results
// Description: Gate results, run results, and verdict vocabulary.
// Purpose: Define the normalized result shapes produced by the runtime.
// Dependencies: crate::core::{identifiers, rule}, serde
// ============================================================================

//! ## Overview
//! Every gate handler produces a [`GateResult`]; the orchestrator aggregates
//! them into a [`RunResult`]. Statuses are three-valued and neutral outcomes
//! carry a closed-enumeration reason so the renderer and the check lifecycle
//! never interpret free-form strings.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::identifiers::GateId;
use crate::core::identifiers::MetricId;
use crate::core::rule::RuleSpec;

// ============================================================================
// SECTION: Status Vocabulary
// ============================================================================

/// Three-valued gate status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateStatus {
    /// Gate passed.
    Pass,
    /// Gate failed.
    Fail,
    /// Gate could not produce a definitive verdict.
    Neutral,
}

impl GateStatus {
    /// Returns the lowercase label for the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Fail => "fail",
            Self::Neutral => "neutral",
        }
    }
}

/// Closed enumeration of reasons for a neutral gate result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeutralReason {
    /// Gate type is not implemented in the registry.
    UnimplementedGate,
    /// Handler exceeded its deadline.
    Timeout,
    /// Handler returned an internal error.
    InternalError,
    /// No suitable CI artifact could be located.
    MissingArtifact,
    /// Artifact exceeded the configured size limit.
    ArtifactTooLarge,
    /// Artifact bytes could not be decoded or parsed.
    ParseError,
    /// Artifact content did not match the expected tool format.
    InvalidFormat,
    /// Effective diff limits could not be computed.
    OversizeDiff,
    /// No limit thresholds were configured for the gate.
    MissingThreshold,
    /// No required status contexts remain after self-exemption.
    NoContextsRequired,
    /// Rule document failed schema validation.
    RuleSchemaInvalid,
    /// AI workflow result failed schema validation.
    ProviderResultInvalid,
    /// Criteria referenced metrics absent from the provider result.
    MissingMetrics,
}

impl NeutralReason {
    /// Returns the snake-case label for the reason.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::UnimplementedGate => "unimplemented_gate",
            Self::Timeout => "timeout",
            Self::InternalError => "internal_error",
            Self::MissingArtifact => "missing_artifact",
            Self::ArtifactTooLarge => "artifact_too_large",
            Self::ParseError => "parse_error",
            Self::InvalidFormat => "invalid_format",
            Self::OversizeDiff => "oversize_diff",
            Self::MissingThreshold => "missing_threshold",
            Self::NoContextsRequired => "no_contexts_required",
            Self::RuleSchemaInvalid => "rule_schema_invalid",
            Self::ProviderResultInvalid => "provider_result_invalid",
            Self::MissingMetrics => "missing_metrics",
        }
    }
}

/// Normalized violation severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Informational finding.
    Info,
    /// Warning finding.
    Warning,
    /// Error finding.
    Error,
}

impl Severity {
    /// Returns the lowercase label for the severity.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

// ============================================================================
// SECTION: Violations
// ============================================================================

/// A single violation record emitted by a gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    /// Stable violation code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Normalized repository-relative path when applicable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// One-based line number when applicable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u64>,
    /// One-based column number when applicable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<u64>,
    /// Normalized severity when applicable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<Severity>,
    /// Tool-specific metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

impl Violation {
    /// Creates a violation with only a code and message.
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            path: None,
            line: None,
            column: None,
            level: None,
            meta: None,
        }
    }
}

// ============================================================================
// SECTION: Gate Result
// ============================================================================

/// Provenance for an AI-rule evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RuleProvenance {
    /// Model provider name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// Model identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Provider-side run identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    /// Wall-clock time of the workflow call in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wall_ms: Option<u64>,
    /// Workflow identifier that produced the result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<String>,
}

/// A single metric reading produced by an AI workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricReading {
    /// Numeric metric value.
    pub value: f64,
    /// Human-readable observations supporting the value.
    #[serde(default)]
    pub observations: Vec<String>,
}

/// Schema-validated AI workflow result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderResult {
    /// Metric readings keyed by metric identifier.
    pub metrics: BTreeMap<MetricId, MetricReading>,
    /// Workflow summary text.
    pub summary: String,
    /// Workflow provenance.
    pub provenance: RuleProvenance,
}

/// Normalized result of one gate execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateResult {
    /// Derived gate identifier (always assigned by the launcher).
    pub id: GateId,
    /// Three-valued status.
    pub status: GateStatus,
    /// Reason for a neutral status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neutral_reason: Option<NeutralReason>,
    /// Ordered violation records.
    #[serde(default)]
    pub violations: Vec<Violation>,
    /// Ordered human-readable observations.
    #[serde(default)]
    pub observations: Vec<String>,
    /// Free-form numeric and string telemetry.
    #[serde(default)]
    pub stats: BTreeMap<String, Value>,
    /// Wall-clock duration of the handler in milliseconds.
    #[serde(default)]
    pub duration_ms: u64,
    /// AI-rule provenance when applicable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provenance: Option<RuleProvenance>,
    /// Raw schema-validated provider result when applicable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_result: Option<ProviderResult>,
    /// Echoed rule document when applicable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<RuleSpec>,
}

impl GateResult {
    /// Creates a passing result with the given id.
    #[must_use]
    pub fn pass(id: impl Into<GateId>) -> Self {
        Self::with_status(id, GateStatus::Pass)
    }

    /// Creates a failing result with the given id.
    #[must_use]
    pub fn fail(id: impl Into<GateId>) -> Self {
        Self::with_status(id, GateStatus::Fail)
    }

    /// Creates a neutral result with the given id and reason.
    #[must_use]
    pub fn neutral(id: impl Into<GateId>, reason: NeutralReason) -> Self {
        let mut result = Self::with_status(id, GateStatus::Neutral);
        result.neutral_reason = Some(reason);
        result
    }

    /// Creates an empty result with the given status.
    fn with_status(id: impl Into<GateId>, status: GateStatus) -> Self {
        Self {
            id: id.into(),
            status,
            neutral_reason: None,
            violations: Vec::new(),
            observations: Vec::new(),
            stats: BTreeMap::new(),
            duration_ms: 0,
            provenance: None,
            provider_result: None,
            rule: None,
        }
    }

    /// Appends a violation and returns the result for chaining.
    #[must_use]
    pub fn with_violation(mut self, violation: Violation) -> Self {
        self.violations.push(violation);
        self
    }

    /// Appends an observation and returns the result for chaining.
    #[must_use]
    pub fn with_observation(mut self, observation: impl Into<String>) -> Self {
        self.observations.push(observation.into());
        self
    }

    /// Inserts a stats entry and returns the result for chaining.
    #[must_use]
    pub fn with_stat(mut self, key: impl Into<String>, value: Value) -> Self {
        self.stats.insert(key.into(), value);
        self
    }
}

// ============================================================================
// SECTION: Run Result
// ============================================================================

/// Reason recorded alongside the aggregated run status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConclusionReason {
    /// No gate produced a result.
    NoGatesExecuted,
    /// At least one gate failed.
    GatesFailed,
    /// At least one gate was neutral and none failed.
    GatesNeutral,
    /// At least one gate timed out and none failed.
    GateTimeouts,
    /// Every executed gate passed.
    AllGatesPassed,
}

impl ConclusionReason {
    /// Returns the snake-case label for the reason.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NoGatesExecuted => "no_gates_executed",
            Self::GatesFailed => "gates_failed",
            Self::GatesNeutral => "gates_neutral",
            Self::GateTimeouts => "gate_timeouts",
            Self::AllGatesPassed => "all_gates_passed",
        }
    }
}

/// Counts and flags describing one run's execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ExecutionSummary {
    /// Number of gates configured in the policy.
    pub configured: usize,
    /// Number of gates that produced a result.
    pub executed: usize,
    /// Number of passing gates.
    pub passed: usize,
    /// Number of failing gates.
    pub failed: usize,
    /// Number of neutral gates.
    pub neutral: usize,
    /// Number of gates deferred to the CI-completion phase.
    pub deferred: usize,
    /// True when fewer gates ran than were eligible.
    pub partial: bool,
    /// True when the run was interrupted by cancellation.
    pub canceled: bool,
}

/// Aggregated output of one event's gate execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    /// Overall three-valued status.
    pub overall_status: GateStatus,
    /// Reason backing the overall status.
    pub conclusion_reason: ConclusionReason,
    /// Gate results in spec order; partial executions truncate the tail.
    pub gates: Vec<GateResult>,
    /// Execution counts and flags.
    pub execution_summary: ExecutionSummary,
    /// Total run duration in milliseconds.
    pub duration_ms: u64,
}
