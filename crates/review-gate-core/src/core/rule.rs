// review-gate-core/src/core/rule.rs
// ============================================================================
// Module: Review Gate Rule Documents
// Description: AI-rule document model with success-criteria invariants.
// Purpose: Define the rule shape validated before any workflow dispatch.
// Dependencies: crate::core::identifiers, serde, serde_yaml
// ============================================================================

//! ## Overview
//! Rule documents name an AI workflow, the statements it evaluates, and the
//! success-criteria matrix that turns metric readings into a verdict. Load
//! time enforces the matrix invariants: every comparison carries exactly one
//! operator, thresholds are numeric, and at least one of `require`/`any_of`
//! is present. The legacy `{metric, threshold}` shorthand is rejected.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;
use serde::ser::SerializeMap;
use serde_json::Value;
use thiserror::Error;

use crate::core::identifiers::MetricId;
use crate::core::identifiers::RuleId;
use crate::core::identifiers::WorkflowId;

// ============================================================================
// SECTION: Rule Specification
// ============================================================================

/// Canonical AI-rule document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSpec {
    /// Rule identifier.
    pub id: RuleId,
    /// Rule schema version.
    pub schema_version: String,
    /// Named AI workflow dispatched for this rule.
    pub workflow_id: WorkflowId,
    /// Statements evaluated per metric, keyed by metric identifier.
    #[serde(default)]
    pub evaluations: BTreeMap<MetricId, String>,
    /// Success-criteria matrix.
    pub success_criteria: SuccessCriteria,
    /// Optional resource budgets for evidence gathering.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_budgets: Option<RuleBudgets>,
    /// Capabilities the rule requests for evidence gathering.
    #[serde(default)]
    pub x_capabilities: Vec<RuleCapability>,
}

impl RuleSpec {
    /// Parses a rule document from YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::Parse`] when the YAML is malformed or does not
    /// match the rule shape.
    pub fn from_yaml(text: &str) -> Result<Self, RuleError> {
        let rule: Self = serde_yaml::from_str(text).map_err(|err| RuleError::Parse(err.to_string()))?;
        rule.validate()?;
        Ok(rule)
    }

    /// Validates the rule invariants enforced at load time.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError`] when validation fails.
    pub fn validate(&self) -> Result<(), RuleError> {
        if self.workflow_id.as_str().is_empty() {
            return Err(RuleError::MissingWorkflow);
        }
        self.success_criteria.validate()
    }

    /// Returns the effective evidence budgets for this rule.
    #[must_use]
    pub fn budgets(&self) -> RuleBudgets {
        self.x_budgets.clone().unwrap_or_default()
    }

    /// Returns true when the rule requests the given capability.
    #[must_use]
    pub fn has_capability(&self, capability: RuleCapability) -> bool {
        self.x_capabilities.contains(&capability)
    }
}

/// Capabilities a rule may request for evidence gathering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleCapability {
    /// Compact enumerated summary of the changed files.
    DiffSummary,
    /// Bounded per-file patch evidence.
    FilePatches,
}

/// Resource budgets bounding evidence attached to a workflow call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleBudgets {
    /// Maximum number of files enumerated in the diff summary.
    #[serde(default = "default_max_files")]
    pub max_files: usize,
    /// Maximum number of file patches attached.
    #[serde(default = "default_max_patches")]
    pub max_patches: usize,
    /// Maximum bytes kept per attached patch.
    #[serde(default = "default_max_patch_bytes")]
    pub max_patch_bytes_per_file: usize,
}

impl Default for RuleBudgets {
    fn default() -> Self {
        Self {
            max_files: default_max_files(),
            max_patches: default_max_patches(),
            max_patch_bytes_per_file: default_max_patch_bytes(),
        }
    }
}

/// Default file budget for diff summaries.
const fn default_max_files() -> usize {
    25
}

/// Default patch count budget.
const fn default_max_patches() -> usize {
    5
}

/// Default per-file patch byte budget.
const fn default_max_patch_bytes() -> usize {
    16_384
}

// ============================================================================
// SECTION: Success Criteria
// ============================================================================

/// Success-criteria matrix with mandatory and disjunctive comparisons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SuccessCriteria {
    /// Comparisons that must all be satisfied.
    #[serde(default)]
    pub require: Vec<Comparison>,
    /// Comparisons of which at least one must be satisfied.
    #[serde(default)]
    pub any_of: Vec<Comparison>,
    /// Yields a neutral verdict when referenced metrics are missing.
    #[serde(default)]
    pub neutral_on_missing_metrics: bool,
}

impl SuccessCriteria {
    /// Validates the matrix invariants.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::MissingCriteria`] when neither `require` nor
    /// `any_of` carries a comparison.
    pub fn validate(&self) -> Result<(), RuleError> {
        if self.require.is_empty() && self.any_of.is_empty() {
            return Err(RuleError::MissingCriteria);
        }
        Ok(())
    }

    /// Returns the metrics referenced by any comparison, in sorted order.
    #[must_use]
    pub fn referenced_metrics(&self) -> BTreeSet<MetricId> {
        self.require
            .iter()
            .chain(self.any_of.iter())
            .map(|comparison| comparison.metric.clone())
            .collect()
    }
}

/// Comparison operator applied between a metric value and a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOp {
    /// Greater than or equal.
    Gte,
    /// Strictly greater than.
    Gt,
    /// Less than or equal.
    Lte,
    /// Strictly less than.
    Lt,
    /// Exactly equal.
    Eq,
}

impl ComparisonOp {
    /// Returns the snake-case key used in rule documents.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Gte => "gte",
            Self::Gt => "gt",
            Self::Lte => "lte",
            Self::Lt => "lt",
            Self::Eq => "eq",
        }
    }

    /// Returns the display symbol used in rendered reports.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::Gte => ">=",
            Self::Gt => ">",
            Self::Lte => "<=",
            Self::Lt => "<",
            Self::Eq => "=",
        }
    }

    /// Returns true when `value` relates to `threshold` under this operator.
    #[must_use]
    pub fn satisfied(&self, value: f64, threshold: f64) -> bool {
        match self {
            Self::Gte => value >= threshold,
            Self::Gt => value > threshold,
            Self::Lte => value <= threshold,
            Self::Lt => value < threshold,
            Self::Eq => (value - threshold).abs() == 0.0,
        }
    }
}

/// A single `{metric, <op>: threshold}` comparison.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawComparison")]
pub struct Comparison {
    /// Metric identifier the comparison reads.
    pub metric: MetricId,
    /// Comparison operator.
    pub op: ComparisonOp,
    /// Numeric threshold.
    pub threshold: f64,
}

impl Serialize for Comparison {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("metric", self.metric.as_str())?;
        map.serialize_entry(self.op.as_str(), &self.threshold)?;
        map.end()
    }
}

/// Raw comparison shape accepted from rule documents.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawComparison {
    /// Metric identifier.
    metric: String,
    /// Greater-than-or-equal threshold.
    #[serde(default)]
    gte: Option<f64>,
    /// Greater-than threshold.
    #[serde(default)]
    gt: Option<f64>,
    /// Less-than-or-equal threshold.
    #[serde(default)]
    lte: Option<f64>,
    /// Less-than threshold.
    #[serde(default)]
    lt: Option<f64>,
    /// Equality threshold.
    #[serde(default)]
    eq: Option<f64>,
    /// Legacy shorthand field, always rejected.
    #[serde(default)]
    threshold: Option<Value>,
}

impl TryFrom<RawComparison> for Comparison {
    type Error = RuleError;

    fn try_from(raw: RawComparison) -> Result<Self, Self::Error> {
        if raw.metric.is_empty() {
            return Err(RuleError::InvalidComparison("comparison metric must not be empty".to_string()));
        }
        if raw.threshold.is_some() {
            return Err(RuleError::InvalidComparison(format!(
                "metric {}: legacy threshold shorthand is rejected; use one of gte|gt|lte|lt|eq",
                raw.metric
            )));
        }
        let mut ops: Vec<(ComparisonOp, f64)> = Vec::new();
        if let Some(threshold) = raw.gte {
            ops.push((ComparisonOp::Gte, threshold));
        }
        if let Some(threshold) = raw.gt {
            ops.push((ComparisonOp::Gt, threshold));
        }
        if let Some(threshold) = raw.lte {
            ops.push((ComparisonOp::Lte, threshold));
        }
        if let Some(threshold) = raw.lt {
            ops.push((ComparisonOp::Lt, threshold));
        }
        if let Some(threshold) = raw.eq {
            ops.push((ComparisonOp::Eq, threshold));
        }
        let Some((op, threshold)) = ops.first().copied() else {
            return Err(RuleError::InvalidComparison(format!(
                "metric {}: comparison carries no operator",
                raw.metric
            )));
        };
        if ops.len() > 1 {
            return Err(RuleError::InvalidComparison(format!(
                "metric {}: comparison carries more than one operator",
                raw.metric
            )));
        }
        Ok(Self {
            metric: MetricId::new(raw.metric),
            op,
            threshold,
        })
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Rule document errors.
#[derive(Debug, Error)]
pub enum RuleError {
    /// YAML parse or shape error.
    #[error("rule parse error: {0}")]
    Parse(String),
    /// Neither `require` nor `any_of` carries a comparison.
    #[error("success_criteria must declare at least one of require or any_of")]
    MissingCriteria,
    /// Rule does not name a workflow.
    #[error("rule must name a workflow_id")]
    MissingWorkflow,
    /// A comparison violates the matrix invariants.
    #[error("invalid comparison: {0}")]
    InvalidComparison(String),
}
