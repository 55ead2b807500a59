// review-gate-core/src/runtime/normalize.rs
// ============================================================================
// Module: Normalization Helpers
// Description: CI path stripping and tool severity normalization.
// Purpose: Map tool-specific paths and levels onto the repo-relative vocabulary.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Artifact parsers report absolute CI paths and tool-specific severity
//! scales. These helpers reduce both to the runtime's canonical forms: a
//! repo-relative slash-separated path (or nothing, when the path cannot be
//! mapped) and the three-level severity scale. Both functions are idempotent
//! over their own output.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::result::Severity;

// ============================================================================
// SECTION: Path Normalization
// ============================================================================

/// Normalizes a tool-reported path to a repo-relative slash-separated path.
///
/// Known CI prefixes are stripped in a fixed order: the GitHub runner tree,
/// the Docker workspace, the GitLab builds tree, and their Windows
/// drive-letter equivalents. Paths that remain absolute after stripping
/// cannot be mapped and yield `None`.
#[must_use]
pub fn normalize_path(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    let forward = trimmed.replace('\\', "/");
    let stripped = strip_ci_prefix(&forward);
    if stripped.is_empty() || stripped.starts_with('/') || has_drive_prefix(stripped) {
        return None;
    }
    Some(stripped.to_string())
}

/// Strips one known CI workspace prefix, returning the input when none match.
fn strip_ci_prefix(path: &str) -> &str {
    if let Some(rest) = path.strip_prefix("/home/runner/work/") {
        if let Some(relative) = skip_segments(rest, 2) {
            return relative;
        }
    }
    if let Some(rest) = path.strip_prefix("/github/workspace/") {
        return rest;
    }
    if let Some(rest) = path.strip_prefix("/builds/") {
        if let Some(relative) = skip_segments(rest, 2) {
            return relative;
        }
    }
    if let Some(rest) = strip_drive(path) {
        if let Some(tail) = rest.strip_prefix("/a/") {
            if let Some(relative) = skip_segments(tail, 2) {
                return relative;
            }
        }
        if let Some(relative) = rest.strip_prefix("/github/workspace/") {
            return relative;
        }
        if let Some(tail) = rest.strip_prefix("/builds/") {
            if let Some(relative) = skip_segments(tail, 2) {
                return relative;
            }
        }
    }
    path
}

/// Skips `count` leading slash-separated segments, requiring each non-empty.
fn skip_segments(path: &str, count: usize) -> Option<&str> {
    let mut rest = path;
    for _ in 0..count {
        let idx = rest.find('/')?;
        if idx == 0 {
            return None;
        }
        rest = &rest[idx + 1..];
    }
    if rest.is_empty() {
        None
    } else {
        Some(rest)
    }
}

/// Strips a Windows drive-letter prefix, returning the remainder.
fn strip_drive(path: &str) -> Option<&str> {
    let bytes = path.as_bytes();
    if bytes.len() > 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        Some(&path[2..])
    } else {
        None
    }
}

/// Returns true when the path starts with a Windows drive-letter root.
fn has_drive_prefix(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

// ============================================================================
// SECTION: Severity Normalization
// ============================================================================

/// Normalizes a numeric tool severity onto the three-level scale.
#[must_use]
pub const fn severity_from_number(level: i64) -> Severity {
    if level >= 2 {
        Severity::Error
    } else if level == 1 {
        Severity::Warning
    } else {
        Severity::Info
    }
}

/// Normalizes a severity label onto the three-level scale.
///
/// Unrecognized labels, including SARIF `note`/`info`/`none`, map to info.
#[must_use]
pub fn severity_from_label(label: &str) -> Severity {
    match label.to_ascii_lowercase().as_str() {
        "error" | "err" | "e" | "fatal" => Severity::Error,
        "warning" | "warn" | "w" => Severity::Warning,
        _ => Severity::Info,
    }
}
