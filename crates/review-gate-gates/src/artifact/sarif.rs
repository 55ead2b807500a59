// review-gate-gates/src/artifact/sarif.rs
// ============================================================================
// Module: SARIF Artifact Gate
// Description: SARIF 2.1.0 report ingestion.
// Purpose: Normalize SARIF results into violation records per physical location.
// Dependencies: review-gate-core, serde_json
// ============================================================================

//! ## Overview
//! The `artifact.sarif` gate validates the `{version, runs[]}` envelope and
//! walks each run's results. A result with no locations yields one violation
//! with no path; otherwise one violation per physical location, using the
//! artifact location URI and the region's start line and column.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use review_gate_core::GateContext;
use review_gate_core::GateError;
use review_gate_core::GateHandler;
use review_gate_core::GateResult;
use review_gate_core::GateSpecEntry;
use review_gate_core::NeutralReason;
use review_gate_core::Violation;
use review_gate_core::severity_from_label;

use crate::artifact::ArtifactFetch;
use crate::artifact::fetch_artifact;
use crate::artifact::finish_artifact_gate;
use crate::artifact::parse_config;

// ============================================================================
// SECTION: Handler
// ============================================================================

/// SARIF artifact ingestion gate (`artifact.sarif`).
pub struct SarifArtifactGate;

#[async_trait]
impl GateHandler for SarifArtifactGate {
    async fn run(&self, ctx: &GateContext, spec: &GateSpecEntry) -> Result<GateResult, GateError> {
        let id = spec.derived_id();
        let config = match parse_config(&spec.with) {
            Ok(config) => config,
            Err(message) => {
                return Ok(GateResult::neutral(id, NeutralReason::InvalidFormat).with_violation(
                    Violation::new("invalid_config", format!("invalid artifact gate configuration: {message}")),
                ));
            }
        };

        let (run_id, entry_name, value) = match fetch_artifact(ctx, &config).await? {
            ArtifactFetch::Parsed {
                run_id,
                entry_name,
                value,
            } => (run_id, entry_name, value),
            ArtifactFetch::Failed {
                reason,
                message,
            } => {
                return Ok(GateResult::neutral(id, reason)
                    .with_violation(Violation::new(reason.as_str(), message)));
            }
        };

        match parse_sarif(&value) {
            Ok(findings) => Ok(finish_artifact_gate(id, &config, run_id, &entry_name, findings)),
            Err(message) => Ok(GateResult::neutral(id, NeutralReason::InvalidFormat)
                .with_violation(Violation::new("invalid_format", message))),
        }
    }
}

// ============================================================================
// SECTION: SARIF Shapes
// ============================================================================

/// SARIF log envelope.
#[derive(Debug, Deserialize)]
struct SarifLog {
    /// SARIF schema version.
    version: String,
    /// Analysis runs.
    runs: Vec<SarifRun>,
}

/// One analysis run in a SARIF log.
#[derive(Debug, Deserialize)]
struct SarifRun {
    /// Results recorded by the run.
    #[serde(default)]
    results: Vec<SarifResult>,
}

/// One result in a SARIF run.
#[derive(Debug, Deserialize)]
struct SarifResult {
    /// Rule identifier.
    #[serde(rename = "ruleId", default)]
    rule_id: Option<String>,
    /// SARIF level (`error`, `warning`, `note`, `info`, `none`).
    #[serde(default)]
    level: Option<String>,
    /// Result message.
    message: SarifMessage,
    /// Physical locations.
    #[serde(default)]
    locations: Vec<SarifLocation>,
}

/// Message object of a SARIF result.
#[derive(Debug, Deserialize)]
struct SarifMessage {
    /// Plain message text.
    #[serde(default)]
    text: Option<String>,
}

/// Location wrapper of a SARIF result.
#[derive(Debug, Deserialize)]
struct SarifLocation {
    /// Physical location of the finding.
    #[serde(rename = "physicalLocation", default)]
    physical: Option<SarifPhysicalLocation>,
}

/// Physical location of a SARIF finding.
#[derive(Debug, Deserialize)]
struct SarifPhysicalLocation {
    /// Artifact the finding points into.
    #[serde(rename = "artifactLocation", default)]
    artifact_location: Option<SarifArtifactLocation>,
    /// Region within the artifact.
    #[serde(default)]
    region: Option<SarifRegion>,
}

/// Artifact reference of a SARIF physical location.
#[derive(Debug, Deserialize)]
struct SarifArtifactLocation {
    /// Artifact URI as reported by the tool.
    #[serde(default)]
    uri: Option<String>,
}

/// Region of a SARIF physical location.
#[derive(Debug, Deserialize)]
struct SarifRegion {
    /// One-based start line.
    #[serde(rename = "startLine", default)]
    start_line: Option<u64>,
    /// One-based start column.
    #[serde(rename = "startColumn", default)]
    start_column: Option<u64>,
}

// ============================================================================
// SECTION: SARIF Parser
// ============================================================================

/// SARIF level assumed when a result declares none.
const DEFAULT_SARIF_LEVEL: &str = "warning";

/// Parses a SARIF 2.1.0 log into raw violations.
pub fn parse_sarif(value: &Value) -> Result<Vec<Violation>, String> {
    let log: SarifLog = serde_json::from_value(value.clone())
        .map_err(|err| format!("payload does not match the sarif shape: {err}"))?;
    if !log.version.starts_with("2.") {
        return Err(format!("unsupported sarif version '{}'", log.version));
    }

    let mut findings = Vec::new();
    for run in log.runs {
        for result in run.results {
            let code = result.rule_id.unwrap_or_else(|| "sarif".to_string());
            let message = result.message.text.unwrap_or_default();
            let level = severity_from_label(result.level.as_deref().unwrap_or(DEFAULT_SARIF_LEVEL));

            let physical: Vec<&SarifPhysicalLocation> = result
                .locations
                .iter()
                .filter_map(|location| location.physical.as_ref())
                .collect();
            if physical.is_empty() {
                let mut violation = Violation::new(code.clone(), message.clone());
                violation.level = Some(level);
                findings.push(violation);
                continue;
            }
            for location in physical {
                let mut violation = Violation::new(code.clone(), message.clone());
                violation.path = location
                    .artifact_location
                    .as_ref()
                    .and_then(|artifact| artifact.uri.clone());
                if let Some(region) = &location.region {
                    violation.line = region.start_line;
                    violation.column = region.start_column;
                }
                violation.level = Some(level);
                findings.push(violation);
            }
        }
    }
    Ok(findings)
}
