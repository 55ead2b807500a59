// review-gate-gates/src/artifact/json.rs
// ============================================================================
// Module: JSON Artifact Gate
// Description: ESLint and Ruff JSON report ingestion.
// Purpose: Normalize tool-specific JSON findings into violation records.
// Dependencies: review-gate-core, serde_json
// ============================================================================

//! ## Overview
//! The `artifact.json` gate requires an explicit parser selection because
//! JSON report shapes are tool-specific. Each parser walks its tool's shape
//! and produces violations with raw paths; path and severity normalization
//! happens in the shared pipeline.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use serde_json::json;

use review_gate_core::GateContext;
use review_gate_core::GateError;
use review_gate_core::GateHandler;
use review_gate_core::GateResult;
use review_gate_core::GateSpecEntry;
use review_gate_core::NeutralReason;
use review_gate_core::Severity;
use review_gate_core::Violation;
use review_gate_core::severity_from_number;

use crate::artifact::ArtifactFetch;
use crate::artifact::ArtifactParser;
use crate::artifact::fetch_artifact;
use crate::artifact::finish_artifact_gate;
use crate::artifact::parse_config;

// ============================================================================
// SECTION: Handler
// ============================================================================

/// JSON artifact ingestion gate (`artifact.json`).
pub struct JsonArtifactGate;

#[async_trait]
impl GateHandler for JsonArtifactGate {
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
        let Some(parser) = config.parser else {
            return Ok(GateResult::neutral(id, NeutralReason::InvalidFormat).with_violation(
                Violation::new("invalid_config", "artifact.json requires with.parser (eslint_json or ruff_json)"),
            ));
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

        let findings = match parser {
            ArtifactParser::EslintJson => parse_eslint(&value),
            ArtifactParser::RuffJson => parse_ruff(&value),
        };
        match findings {
            Ok(findings) => Ok(finish_artifact_gate(id, &config, run_id, &entry_name, findings)),
            Err(message) => Ok(GateResult::neutral(id, NeutralReason::InvalidFormat)
                .with_violation(Violation::new("invalid_format", message))),
        }
    }
}

// ============================================================================
// SECTION: ESLint Parser
// ============================================================================

/// One file entry in an ESLint JSON report.
#[derive(Debug, Deserialize)]
struct EslintEntry {
    /// Absolute or relative path the tool reports.
    #[serde(rename = "filePath")]
    file_path: String,
    /// Messages recorded against the file.
    #[serde(default)]
    messages: Vec<EslintMessage>,
}

/// One message in an ESLint file entry.
#[derive(Debug, Deserialize)]
struct EslintMessage {
    /// Rule identifier, absent for parse-level problems.
    #[serde(rename = "ruleId", default)]
    rule_id: Option<String>,
    /// Numeric severity (2 error, 1 warning).
    #[serde(default)]
    severity: Option<i64>,
    /// Message text.
    message: String,
    /// One-based line.
    #[serde(default)]
    line: Option<u64>,
    /// One-based column.
    #[serde(default)]
    column: Option<u64>,
    /// One-based end line when the tool reports a span.
    #[serde(rename = "endLine", default)]
    end_line: Option<u64>,
}

/// Parses an ESLint JSON report into raw violations.
pub fn parse_eslint(value: &Value) -> Result<Vec<Violation>, String> {
    let entries: Vec<EslintEntry> = serde_json::from_value(value.clone())
        .map_err(|err| format!("payload does not match the eslint_json shape: {err}"))?;
    let mut findings = Vec::new();
    for entry in entries {
        for message in entry.messages {
            let mut violation = Violation::new(
                message.rule_id.unwrap_or_else(|| "eslint".to_string()),
                message.message,
            );
            violation.path = Some(entry.file_path.clone());
            violation.line = message.line;
            violation.column = message.column;
            violation.level = Some(severity_from_number(message.severity.unwrap_or(1)));
            if let Some(end_line) = message.end_line {
                violation.meta = Some(json!({ "endLine": end_line }));
            }
            findings.push(violation);
        }
    }
    Ok(findings)
}

// ============================================================================
// SECTION: Ruff Parser
// ============================================================================

/// One diagnostic in a Ruff JSON report.
#[derive(Debug, Deserialize)]
struct RuffEntry {
    /// Rule code, absent for syntax errors.
    #[serde(default)]
    code: Option<String>,
    /// Message text.
    message: String,
    /// Absolute or relative path the tool reports.
    filename: String,
    /// Start location.
    #[serde(default)]
    location: Option<RuffLocation>,
    /// Documentation URL when the tool provides one.
    #[serde(default)]
    url: Option<String>,
}

/// A row/column location in a Ruff diagnostic.
#[derive(Debug, Deserialize)]
struct RuffLocation {
    /// One-based row.
    row: u64,
    /// One-based column.
    column: u64,
}

/// Parses a Ruff JSON report into raw violations.
pub fn parse_ruff(value: &Value) -> Result<Vec<Violation>, String> {
    let entries: Vec<RuffEntry> = serde_json::from_value(value.clone())
        .map_err(|err| format!("payload does not match the ruff_json shape: {err}"))?;
    let mut findings = Vec::new();
    for entry in entries {
        let mut violation = Violation::new(
            entry.code.unwrap_or_else(|| "ruff".to_string()),
            entry.message,
        );
        violation.path = Some(entry.filename);
        if let Some(location) = entry.location {
            violation.line = Some(location.row);
            violation.column = Some(location.column);
        }
        violation.level = Some(Severity::Error);
        if let Some(url) = entry.url {
            violation.meta = Some(json!({ "url": url }));
        }
        findings.push(violation);
    }
    Ok(findings)
}
