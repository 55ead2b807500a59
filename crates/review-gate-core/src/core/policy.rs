// review-gate-core/src/core/policy.rs
// ============================================================================
// Module: Review Gate Policy Specification
// Description: Per-repository policy document model and validation.
// Purpose: Define the canonical policy shape with derived gate identities.
// Dependencies: crate::core::{hashing, identifiers}, serde, serde_yaml
// ============================================================================

//! ## Overview
//! The policy document is the per-repository YAML that declares intent and
//! the ordered gate list. Gate identity is derived here and owned by the
//! launcher; duplicate derived identifiers are a fatal configuration error
//! detected before any handler executes.
//!
//! Security posture: policy documents are untrusted repository content; the
//! runtime only ever interprets them, it never executes them.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::core::hashing::HashError;
use crate::core::hashing::hash_canonical_json;
use crate::core::identifiers::GateId;

// ============================================================================
// SECTION: Gate Type Constants
// ============================================================================

/// Gate type string for AI-rule gates.
pub const AI_RULE_GATE: &str = "ai-rule";

/// Gate type prefix shared by external-artifact gates.
pub const ARTIFACT_GATE_PREFIX: &str = "artifact.";

// ============================================================================
// SECTION: Policy Specification
// ============================================================================

/// Canonical per-repository policy document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PolicySpec {
    /// Declared intent for the repository.
    #[serde(default)]
    pub intent: IntentSpec,
    /// Ordered gate specifications.
    #[serde(default)]
    pub gates: Vec<GateSpecEntry>,
    /// Elevates a neutral overall verdict to fail when gates executed.
    #[serde(default)]
    pub fail_on_error: bool,
    /// Externally-required status contexts checked by governance gates.
    #[serde(default)]
    pub required_status_contexts: Vec<String>,
    /// Optional governance addresses used by the report renderer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cogni_dao: Option<DaoSpec>,
}

impl PolicySpec {
    /// Parses a policy document from YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::Parse`] when the YAML is malformed or does not
    /// match the policy shape.
    pub fn from_yaml(text: &str) -> Result<Self, PolicyError> {
        serde_yaml::from_str(text).map_err(|err| PolicyError::Parse(err.to_string()))
    }

    /// Derives the gate identifier for every configured gate, in spec order.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::DuplicateGateIds`] when two gate specs derive
    /// the same identifier.
    pub fn derived_gate_ids(&self) -> Result<Vec<GateId>, PolicyError> {
        let ids: Vec<GateId> = self.gates.iter().map(GateSpecEntry::derived_id).collect();
        let mut seen = Vec::with_capacity(ids.len());
        let mut duplicates = Vec::new();
        for id in &ids {
            if seen.contains(&id.as_str()) {
                if !duplicates.contains(&id.as_str().to_string()) {
                    duplicates.push(id.as_str().to_string());
                }
            } else {
                seen.push(id.as_str());
            }
        }
        if duplicates.is_empty() {
            Ok(ids)
        } else {
            Err(PolicyError::DuplicateGateIds {
                duplicates,
            })
        }
    }

    /// Validates the policy invariants enforced before execution.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError`] when validation fails.
    pub fn validate(&self) -> Result<(), PolicyError> {
        self.derived_gate_ids().map(|_| ())
    }

    /// Computes the canonical hash of the policy document.
    ///
    /// # Errors
    ///
    /// Returns [`HashError::Canonicalization`] when serialization fails.
    pub fn canonical_hash(&self) -> Result<String, HashError> {
        hash_canonical_json(self)
    }
}

/// Declared repository intent consumed by the presence-check gates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct IntentSpec {
    /// Ordered goals the repository declares.
    #[serde(default)]
    pub goals: Vec<String>,
    /// Ordered non-goals the repository declares.
    #[serde(default)]
    pub non_goals: Vec<String>,
}

// ============================================================================
// SECTION: Gate Specifications
// ============================================================================

/// One entry in the policy's ordered gate list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateSpecEntry {
    /// Gate type resolved against the registry.
    #[serde(rename = "type")]
    pub gate_type: String,
    /// Explicit identifier overriding derivation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Free-form per-type configuration mapping.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub with: Value,
}

impl GateSpecEntry {
    /// Creates a gate spec entry with no explicit id or configuration.
    #[must_use]
    pub fn new(gate_type: impl Into<String>) -> Self {
        Self {
            gate_type: gate_type.into(),
            id: None,
            with: Value::Null,
        }
    }

    /// Derives the unique gate identifier for this entry.
    ///
    /// Precedence: explicit `id`; for AI-rule gates, the rule file basename
    /// without extension; otherwise the gate type.
    #[must_use]
    pub fn derived_id(&self) -> GateId {
        if let Some(id) = &self.id {
            return GateId::new(id);
        }
        if self.gate_type == AI_RULE_GATE {
            if let Some(rule_file) = self.config_str("rule_file") {
                return GateId::new(rule_basename(rule_file));
            }
        }
        GateId::new(&self.gate_type)
    }

    /// Returns a string configuration value under `with`.
    #[must_use]
    pub fn config_str(&self, key: &str) -> Option<&str> {
        self.with.get(key).and_then(Value::as_str)
    }

    /// Returns an unsigned integer configuration value under `with`.
    #[must_use]
    pub fn config_u64(&self, key: &str) -> Option<u64> {
        self.with.get(key).and_then(Value::as_u64)
    }

    /// Returns true when this entry is an external-artifact gate.
    #[must_use]
    pub fn is_artifact_gate(&self) -> bool {
        self.gate_type.starts_with(ARTIFACT_GATE_PREFIX)
    }
}

/// Returns the basename of a rule file path without its extension.
fn rule_basename(path: &str) -> &str {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rfind('.') {
        Some(idx) if idx > 0 => &name[..idx],
        _ => name,
    }
}

// ============================================================================
// SECTION: Governance Block
// ============================================================================

/// Governance addresses used by the renderer's merge-vote deep link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DaoSpec {
    /// DAO address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dao: Option<String>,
    /// Voting plugin address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin: Option<String>,
    /// Signal contract address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal: Option<String>,
    /// Chain identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
}

impl DaoSpec {
    /// Returns true when every field required by the vote link is present.
    #[must_use]
    pub const fn is_fully_configured(&self) -> bool {
        self.dao.is_some() && self.plugin.is_some() && self.signal.is_some() && self.chain_id.is_some()
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Policy document errors.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// YAML parse or shape error.
    #[error("policy parse error: {0}")]
    Parse(String),
    /// Two gate specs derived the same identifier.
    #[error("duplicate gate ids: {}", duplicates.join(", "))]
    DuplicateGateIds {
        /// Identifiers derived by more than one gate spec.
        duplicates: Vec<String>,
    },
}
