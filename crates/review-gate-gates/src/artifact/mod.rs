// review-gate-gates/src/artifact/mod.rs
// ============================================================================
// Module: External Artifact Subsystem
// Description: CI run location, artifact download, and finding normalization.
// Purpose: Ingest tool output attached to the PR head's CI run with size guards.
// Dependencies: review-gate-core, zip
// ============================================================================

//! ## Overview
//! Artifact gates locate the correct CI run for the PR head, download the
//! named artifact as a ZIP with a size guard applied both before and after
//! the transfer, select a JSON or SARIF entry, and hand the parsed value to
//! a tool-specific parser. Findings then flow through a shared normalization
//! pipeline: path and severity normalization, an unmappable-path summary,
//! and a bounded finding list with an explicit truncation record.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod json;
pub mod sarif;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Cursor;
use std::io::Read as _;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use tracing::warn;
use zip::ZipArchive;
use zip::result::ZipError;

use review_gate_core::GateContext;
use review_gate_core::GateError;
use review_gate_core::GateId;
use review_gate_core::GateResult;
use review_gate_core::NeutralReason;
use review_gate_core::Severity;
use review_gate_core::Violation;
use review_gate_core::normalize_path;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Default cap on the violation list per gate.
const DEFAULT_MAX_FINDINGS: usize = 1_000;

/// Default artifact size limit in megabytes.
const DEFAULT_ARTIFACT_SIZE_MB: u64 = 25;

/// Tool-specific parser selection for `artifact.json`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactParser {
    /// ESLint JSON report format.
    EslintJson,
    /// Ruff JSON report format.
    RuffJson,
}

/// Failure policy mapping findings onto the gate status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FailOn {
    /// Fail on error-level findings.
    #[default]
    Errors,
    /// Fail on warning- or error-level findings.
    WarningsOrErrors,
    /// Fail on any finding.
    Any,
    /// Never fail; report only.
    None,
}

/// Parsed `with` configuration shared by the artifact gates.
#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactConfig {
    /// Exact artifact name to ingest.
    pub artifact_name: String,
    /// Exact ZIP entry to select; first JSON/SARIF entry when absent.
    #[serde(default)]
    pub artifact_path: Option<String>,
    /// Parser selection, required for `artifact.json`.
    #[serde(default)]
    pub parser: Option<ArtifactParser>,
    /// Cap on the violation list.
    #[serde(default = "default_max_findings")]
    pub max_findings: usize,
    /// Artifact size limit in megabytes, asserted before and after download.
    #[serde(default = "default_artifact_size_mb")]
    pub artifact_size_mb: u64,
    /// Failure policy.
    #[serde(default)]
    pub fail_on: FailOn,
}

/// Default for [`ArtifactConfig::max_findings`].
const fn default_max_findings() -> usize {
    DEFAULT_MAX_FINDINGS
}

/// Default for [`ArtifactConfig::artifact_size_mb`].
const fn default_artifact_size_mb() -> u64 {
    DEFAULT_ARTIFACT_SIZE_MB
}

// ============================================================================
// SECTION: Artifact Fetch
// ============================================================================

/// Outcome of locating and decoding the configured artifact.
pub(crate) enum ArtifactFetch {
    /// The artifact was located, decoded, and JSON-parsed.
    Parsed {
        /// CI run the artifact was taken from.
        run_id: u64,
        /// Selected ZIP entry name.
        entry_name: String,
        /// Parsed JSON payload.
        value: Value,
    },
    /// The artifact could not be ingested; the gate goes neutral.
    Failed {
        /// Neutral reason to report.
        reason: NeutralReason,
        /// Human-readable explanation.
        message: String,
    },
}

/// Locates the PR's CI run and decodes the configured artifact.
///
/// # Errors
///
/// Returns [`GateError::Canceled`] when the cancellation signal fired, or
/// [`GateError::Internal`] on forge transport failures.
pub(crate) async fn fetch_artifact(
    ctx: &GateContext,
    config: &ArtifactConfig,
) -> Result<ArtifactFetch, GateError> {
    if ctx.cancel.is_cancelled() {
        return Err(GateError::Canceled);
    }

    let run_id = match select_run(ctx).await? {
        Ok(run_id) => run_id,
        Err(failure) => return Ok(failure),
    };

    if ctx.cancel.is_cancelled() {
        return Err(GateError::Canceled);
    }
    let artifacts = ctx.forge.list_run_artifacts(&ctx.repo, run_id).await?;
    let Some(artifact) = artifacts.iter().find(|artifact| artifact.name == config.artifact_name)
    else {
        return Ok(ArtifactFetch::Failed {
            reason: NeutralReason::MissingArtifact,
            message: format!("run {run_id} has no artifact named '{}'", config.artifact_name),
        });
    };

    let limit_bytes = config.artifact_size_mb.saturating_mul(1024 * 1024);
    if artifact.size_in_bytes > limit_bytes {
        warn!(artifact = %artifact.name, declared = artifact.size_in_bytes, "artifact exceeds size limit");
        return Ok(ArtifactFetch::Failed {
            reason: NeutralReason::ArtifactTooLarge,
            message: format!(
                "artifact '{}' declares {} bytes, limit is {} MiB",
                artifact.name, artifact.size_in_bytes, config.artifact_size_mb
            ),
        });
    }

    if ctx.cancel.is_cancelled() {
        return Err(GateError::Canceled);
    }
    let bytes = ctx.forge.download_artifact(&ctx.repo, artifact.id).await?;
    let actual = u64::try_from(bytes.len()).unwrap_or(u64::MAX);
    if actual > limit_bytes {
        return Ok(ArtifactFetch::Failed {
            reason: NeutralReason::ArtifactTooLarge,
            message: format!(
                "artifact '{}' downloaded {} bytes, limit is {} MiB",
                artifact.name, actual, config.artifact_size_mb
            ),
        });
    }

    decode_entry(config, run_id, &bytes)
}

/// Selects the CI run to ingest from, preferring the phase-two run id.
async fn select_run(ctx: &GateContext) -> Result<Result<u64, ArtifactFetch>, GateError> {
    if let Some(run_id) = ctx.ci_run_id {
        return Ok(Ok(run_id));
    }
    let runs = ctx.forge.list_workflow_runs(&ctx.repo, &ctx.pr.head_sha).await?;
    let mut candidates: Vec<_> = runs
        .iter()
        .filter(|run| run.status == "completed" && is_pr_triggered(&run.event))
        .collect();
    candidates.sort_by(|a, b| b.updated_at_unix.cmp(&a.updated_at_unix));
    let chosen = candidates
        .iter()
        .find(|run| run.conclusion.as_deref() == Some("success"))
        .or_else(|| candidates.first());
    match chosen {
        Some(run) => {
            debug!(run = run.id, conclusion = run.conclusion.as_deref().unwrap_or("none"), "selected ci run");
            Ok(Ok(run.id))
        }
        None => Ok(Err(ArtifactFetch::Failed {
            reason: NeutralReason::MissingArtifact,
            message: format!(
                "no completed pull-request CI run found for head {}",
                ctx.pr.head_sha
            ),
        })),
    }
}

/// Returns true when a CI run was triggered by a pull or merge request.
fn is_pr_triggered(event: &str) -> bool {
    matches!(event, "pull_request" | "pull_request_target" | "merge_request")
}

/// Opens the ZIP, selects an entry, and JSON-parses its contents.
fn decode_entry(config: &ArtifactConfig, run_id: u64, bytes: &[u8]) -> Result<ArtifactFetch, GateError> {
    let mut archive = match ZipArchive::new(Cursor::new(bytes)) {
        Ok(archive) => archive,
        Err(err) => {
            return Ok(ArtifactFetch::Failed {
                reason: NeutralReason::ParseError,
                message: format!("artifact is not a valid zip archive: {err}"),
            });
        }
    };

    let entry_name = match &config.artifact_path {
        Some(path) => {
            if !archive.file_names().any(|name| name == path.as_str()) {
                return Ok(ArtifactFetch::Failed {
                    reason: NeutralReason::MissingArtifact,
                    message: format!("zip entry '{path}' not found in artifact"),
                });
            }
            path.clone()
        }
        None => {
            let Some(name) = archive
                .file_names()
                .find(|name| has_report_extension(name))
                .map(str::to_string)
            else {
                return Ok(ArtifactFetch::Failed {
                    reason: NeutralReason::MissingArtifact,
                    message: "artifact contains no .json or .sarif entry".to_string(),
                });
            };
            name
        }
    };

    let mut text = String::new();
    let read = archive
        .by_name(&entry_name)
        .map_err(|err| match err {
            ZipError::FileNotFound => GateError::Internal(format!("zip entry '{entry_name}' vanished")),
            other => GateError::Internal(other.to_string()),
        })
        .and_then(|mut file| {
            file.read_to_string(&mut text)
                .map_err(|err| GateError::Internal(err.to_string()))
        });
    if let Err(err) = read {
        return Ok(ArtifactFetch::Failed {
            reason: NeutralReason::ParseError,
            message: format!("zip entry '{entry_name}' could not be decoded as UTF-8: {err}"),
        });
    }

    match serde_json::from_str::<Value>(&text) {
        Ok(value) => Ok(ArtifactFetch::Parsed {
            run_id,
            entry_name,
            value,
        }),
        Err(err) => Ok(ArtifactFetch::Failed {
            reason: NeutralReason::ParseError,
            message: format!("zip entry '{entry_name}' is not valid JSON: {err}"),
        }),
    }
}

/// Returns true for entry names with a JSON or SARIF extension.
fn has_report_extension(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.ends_with(".json") || lower.ends_with(".sarif")
}

// ============================================================================
// SECTION: Finding Normalization
// ============================================================================

/// Applies the shared normalization pipeline and computes the gate status.
pub(crate) fn finish_artifact_gate(
    id: GateId,
    config: &ArtifactConfig,
    run_id: u64,
    entry_name: &str,
    findings: Vec<Violation>,
) -> GateResult {
    let finding_count = findings.len();
    let mut unmappable: Vec<String> = Vec::new();
    let mut violations: Vec<Violation> = Vec::with_capacity(finding_count);
    let mut errors = 0_usize;
    let mut warnings = 0_usize;

    for mut violation in findings {
        if let Some(original) = violation.path.take() {
            match normalize_path(&original) {
                Some(path) => violation.path = Some(path),
                None => unmappable.push(original),
            }
        }
        match violation.level {
            Some(Severity::Error) => errors += 1,
            Some(Severity::Warning) => warnings += 1,
            _ => {}
        }
        violations.push(violation);
    }

    if !unmappable.is_empty() {
        let mut summary = Violation::new(
            "unmappable_paths",
            format!(
                "{} finding path(s) could not be mapped into the repository: {}",
                unmappable.len(),
                unmappable.join(", ")
            ),
        );
        summary.level = Some(Severity::Info);
        violations.push(summary);
    }

    if violations.len() > config.max_findings {
        let omitted = violations.len() - config.max_findings;
        violations.truncate(config.max_findings);
        let mut truncated = Violation::new(
            "findings_truncated",
            format!("{omitted} finding(s) omitted beyond the max_findings cap"),
        );
        truncated.level = Some(Severity::Info);
        violations.push(truncated);
    }

    let failing = match config.fail_on {
        FailOn::Errors => errors > 0,
        FailOn::WarningsOrErrors => errors + warnings > 0,
        FailOn::Any => finding_count > 0,
        FailOn::None => false,
    };

    let mut result = if failing {
        GateResult::fail(id)
    } else {
        GateResult::pass(id)
    };
    result.violations = violations;
    result = result
        .with_stat("findings", Value::from(finding_count))
        .with_stat("errors", Value::from(errors))
        .with_stat("warnings", Value::from(warnings))
        .with_stat("run_id", Value::from(run_id))
        .with_stat("entry", Value::from(entry_name));
    result
}

/// Parses the gate spec's `with` mapping into an artifact configuration.
pub(crate) fn parse_config(with: &Value) -> Result<ArtifactConfig, String> {
    serde_json::from_value(with.clone()).map_err(|err| err.to_string())
}
