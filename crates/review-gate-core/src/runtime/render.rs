// review-gate-core/src/runtime/render.rs
// ============================================================================
// Module: Report Renderer
// Description: Summary line and markdown body for check output.
// Purpose: Render one run result into deterministic human-readable output.
// Dependencies: crate::core, url
// ============================================================================

//! ## Overview
//! The renderer is a pure function of the run result and the policy's
//! governance block: identical inputs produce byte-identical output, which is
//! what makes check retries idempotent. Gate sections are grouped by status
//! (failed, neutral, passed) and sorted alphabetically within each group.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt::Write as _;

use url::Url;

use crate::core::policy::DaoSpec;
use crate::core::policy::PolicySpec;
use crate::core::result::ConclusionReason;
use crate::core::result::GateResult;
use crate::core::result::GateStatus;
use crate::core::result::RunResult;
use crate::core::rule::Comparison;

// ============================================================================
// SECTION: Output Limits
// ============================================================================

/// Maximum violations rendered per gate section.
const MAX_RENDERED_VIOLATIONS: usize = 20;

/// Maximum observations rendered per gate section.
const MAX_RENDERED_OBSERVATIONS: usize = 20;

/// Maximum observations rendered per referenced metric.
const MAX_METRIC_OBSERVATIONS: usize = 10;

/// Maximum characters kept per rendered observation.
const MAX_OBSERVATION_CHARS: usize = 1_000;

/// Base URL of the governance vote portal.
pub const VOTE_PORTAL_BASE: &str = "https://vote.cognidao.org";

// ============================================================================
// SECTION: Report
// ============================================================================

/// Rendered check output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// Single-line summary.
    pub summary: String,
    /// Markdown body.
    pub text: String,
}

/// Renders the summary line and markdown body for a run result.
#[must_use]
pub fn render_report(
    run: &RunResult,
    policy: &PolicySpec,
    repo_url: Option<&str>,
    pr_number: u64,
) -> Report {
    let summary = render_summary(run);
    let mut text = String::new();

    if run.overall_status == GateStatus::Fail {
        if let Some(link) = vote_link(policy.cogni_dao.as_ref(), repo_url, pr_number) {
            let _ = writeln!(text, "{link}");
            text.push('\n');
        }
    }

    let counts = &run.execution_summary;
    let _ = writeln!(
        text,
        "{} ✅ {} passed | ❌ {} failed | ⚠️ {} neutral",
        status_emoji(run.overall_status),
        counts.passed,
        counts.failed,
        counts.neutral
    );
    let _ = writeln!(text, "_completed in {} ms_", run.duration_ms);

    for status in [GateStatus::Fail, GateStatus::Neutral, GateStatus::Pass] {
        let mut group: Vec<&GateResult> =
            run.gates.iter().filter(|gate| gate.status == status).collect();
        group.sort_by(|a, b| a.id.cmp(&b.id));
        for gate in group {
            render_gate_section(&mut text, gate);
        }
    }

    Report {
        summary,
        text,
    }
}

/// Renders the one-line summary for a run result.
fn render_summary(run: &RunResult) -> String {
    let counts = &run.execution_summary;
    match run.conclusion_reason {
        ConclusionReason::AllGatesPassed => "All gates passed".to_string(),
        ConclusionReason::GatesFailed => format!("{} gate(s) failed", counts.failed),
        ConclusionReason::GatesNeutral => {
            if run.overall_status == GateStatus::Fail {
                "Neutral gates treated as failures".to_string()
            } else {
                format!("{} gate(s) neutral", counts.neutral)
            }
        }
        ConclusionReason::GateTimeouts => {
            if run.overall_status == GateStatus::Fail {
                "Gate timeouts treated as failures".to_string()
            } else {
                "Gate execution timed out".to_string()
            }
        }
        ConclusionReason::NoGatesExecuted => "No gates executed".to_string(),
    }
}

// ============================================================================
// SECTION: Gate Sections
// ============================================================================

/// Renders one gate section into the body.
fn render_gate_section(text: &mut String, gate: &GateResult) {
    let _ = write!(text, "\n### {} {}\n\n", status_emoji(gate.status), gate.id);

    render_criteria(text, gate);
    render_violations(text, gate);
    render_observations(text, gate);
    render_stats(text, gate);

    let _ = writeln!(text, "- duration: {} ms", gate.duration_ms);
    if let Some(provenance) = &gate.provenance {
        if provenance.provider.is_some() || provenance.model.is_some() {
            let _ = writeln!(
                text,
                "- model: {} / {}",
                provenance.provider.as_deref().unwrap_or("unknown"),
                provenance.model.as_deref().unwrap_or("unknown")
            );
        }
    }
    if let Some(reason) = gate.neutral_reason {
        let _ = writeln!(text, "- neutral reason: {}", reason.as_str());
    }
}

/// Renders AI-rule criteria lines with nested metric observations.
fn render_criteria(text: &mut String, gate: &GateResult) {
    let (Some(rule), Some(provider)) = (&gate.rule, &gate.provider_result) else {
        return;
    };
    let comparisons: Vec<&Comparison> = rule
        .success_criteria
        .require
        .iter()
        .chain(rule.success_criteria.any_of.iter())
        .collect();
    for comparison in comparisons {
        let value = provider
            .metrics
            .get(&comparison.metric)
            .map_or_else(|| "missing".to_string(), |reading| reading.value.to_string());
        let _ = writeln!(
            text,
            "- **{}:** {} {} {}",
            comparison.metric,
            value,
            comparison.op.symbol(),
            comparison.threshold
        );
        if let Some(statement) = rule.evaluations.get(&comparison.metric) {
            let _ = writeln!(text, "  - {statement}");
        }
        if let Some(reading) = provider.metrics.get(&comparison.metric) {
            for observation in reading.observations.iter().take(MAX_METRIC_OBSERVATIONS) {
                let _ = writeln!(text, "  - {}", clip(observation));
            }
        }
    }
}

/// Renders violation bullets with path and meta sub-bullets.
fn render_violations(text: &mut String, gate: &GateResult) {
    for violation in gate.violations.iter().take(MAX_RENDERED_VIOLATIONS) {
        let _ = writeln!(text, "- {} — {}", violation.code, violation.message);
        if let Some(path) = &violation.path {
            match violation.line {
                Some(line) => {
                    let _ = writeln!(text, "  - path: {path}:{line}");
                }
                None => {
                    let _ = writeln!(text, "  - path: {path}");
                }
            }
        }
        if let Some(meta) = &violation.meta {
            let _ = writeln!(text, "  - meta: {meta}");
        }
    }
    if gate.violations.len() > MAX_RENDERED_VIOLATIONS {
        let _ = writeln!(
            text,
            "- _{} more violation(s) not shown_",
            gate.violations.len() - MAX_RENDERED_VIOLATIONS
        );
    }
}

/// Renders plain observations for non-AI gates.
fn render_observations(text: &mut String, gate: &GateResult) {
    if gate.provider_result.is_some() {
        return;
    }
    for observation in gate.observations.iter().take(MAX_RENDERED_OBSERVATIONS) {
        let _ = writeln!(text, "- {}", clip(observation));
    }
}

/// Renders scalar stats, excluding internal keys.
fn render_stats(text: &mut String, gate: &GateResult) {
    for (key, value) in &gate.stats {
        if key == "error" || key.starts_with('_') {
            continue;
        }
        match value {
            serde_json::Value::String(string) => {
                let _ = writeln!(text, "- {key}: {string}");
            }
            serde_json::Value::Number(number) => {
                let _ = writeln!(text, "- {key}: {number}");
            }
            serde_json::Value::Bool(boolean) => {
                let _ = writeln!(text, "- {key}: {boolean}");
            }
            _ => {}
        }
    }
}

/// Clips an observation to the rendered character budget.
fn clip(observation: &str) -> String {
    if observation.chars().count() <= MAX_OBSERVATION_CHARS {
        observation.to_string()
    } else {
        let clipped: String = observation.chars().take(MAX_OBSERVATION_CHARS).collect();
        format!("{clipped}…")
    }
}

/// Returns the display emoji for a status.
const fn status_emoji(status: GateStatus) -> &'static str {
    match status {
        GateStatus::Pass => "✅",
        GateStatus::Fail => "❌",
        GateStatus::Neutral => "⚠️",
    }
}

// ============================================================================
// SECTION: Vote Link
// ============================================================================

/// Builds the governance-vote deep link when the DAO block is complete.
fn vote_link(dao: Option<&DaoSpec>, repo_url: Option<&str>, pr_number: u64) -> Option<String> {
    let dao = dao?;
    if !dao.is_fully_configured() {
        return None;
    }
    let repo_url = repo_url?;
    let mut url = Url::parse(VOTE_PORTAL_BASE).ok()?;
    url.set_path("/merge-change");
    url.query_pairs_mut()
        .append_pair("dao", dao.dao.as_deref()?)
        .append_pair("plugin", dao.plugin.as_deref()?)
        .append_pair("signal", dao.signal.as_deref()?)
        .append_pair("chainId", &dao.chain_id?.to_string())
        .append_pair("repoUrl", repo_url)
        .append_pair("pr", &pr_number.to_string())
        .append_pair("action", "merge")
        .append_pair("target", "change");
    Some(format!("[🗳️ Propose a vote to merge this change]({url})"))
}
