// review-gate-core/tests/policy.rs
// ============================================================================
// Module: Policy Specification Tests
// Description: Tests for policy parsing, id derivation, and validation.
// ============================================================================
//! ## Overview
//! Validates YAML parsing, derived gate identity precedence, duplicate
//! detection, and the governance block.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use review_gate_core::GateSpecEntry;
use review_gate_core::PolicyError;
use review_gate_core::PolicySpec;

// ============================================================================
// SECTION: Parsing
// ============================================================================

/// Tests parsing a full policy document.
#[test]
fn test_policy_parses_full_document() {
    let policy = PolicySpec::from_yaml(
        r"
intent:
  goals: [keep the sync loop bounded]
  non_goals: [rewriting the scheduler]
gates:
  - type: review-limits
    with:
      max_changed_files: 30
      max_total_diff_kb: 100
  - type: ai-rule
    with:
      rule_file: dont-rebuild-oss.yaml
  - type: artifact.sarif
    id: sarif-scan
    with:
      artifact_name: scan-results
fail_on_error: true
required_status_contexts: [ci/test]
cogni_dao:
  dao: '0xd40'
  plugin: '0x91u9'
  signal: '0x5190'
  chain_id: 11155111
",
    )
    .unwrap();

    assert_eq!(policy.gates.len(), 3);
    assert!(policy.fail_on_error);
    assert_eq!(policy.required_status_contexts, vec!["ci/test".to_string()]);
    assert!(policy.cogni_dao.as_ref().unwrap().is_fully_configured());
    assert_eq!(policy.gates[0].config_u64("max_changed_files"), Some(30));
}

/// Tests that an empty document yields an empty default policy.
#[test]
fn test_policy_defaults() {
    let policy = PolicySpec::from_yaml("{}").unwrap();
    assert!(policy.gates.is_empty());
    assert!(!policy.fail_on_error);
    assert!(policy.cogni_dao.is_none());
}

/// Tests that malformed YAML is a parse error.
#[test]
fn test_policy_rejects_malformed_yaml() {
    let err = PolicySpec::from_yaml("gates: [ {").unwrap_err();
    assert!(matches!(err, PolicyError::Parse(_)));
}

// ============================================================================
// SECTION: Identity Derivation
// ============================================================================

/// Tests that an explicit id wins over derivation.
#[test]
fn test_explicit_id_wins() {
    let policy = PolicySpec::from_yaml(
        r"
gates:
  - type: ai-rule
    id: custom
    with:
      rule_file: dont-rebuild-oss.yaml
",
    )
    .unwrap();
    assert_eq!(policy.gates[0].derived_id().as_str(), "custom");
}

/// Tests that ai-rule ids derive from the rule file basename.
#[test]
fn test_ai_rule_id_from_basename() {
    let policy = PolicySpec::from_yaml(
        r"
gates:
  - type: ai-rule
    with:
      rule_file: nested/dir/dont-rebuild-oss.yaml
",
    )
    .unwrap();
    assert_eq!(policy.gates[0].derived_id().as_str(), "dont-rebuild-oss");
}

/// Tests that non-AI gates derive their id from the type.
#[test]
fn test_type_id_fallback() {
    let entry = GateSpecEntry::new("review-limits");
    assert_eq!(entry.derived_id().as_str(), "review-limits");
}

/// Tests that two AI rules referencing the same file are a fatal error.
#[test]
fn test_duplicate_derived_ids_are_fatal() {
    let policy = PolicySpec::from_yaml(
        r"
gates:
  - type: ai-rule
    with:
      rule_file: dont-rebuild-oss.yaml
  - type: ai-rule
    with:
      rule_file: rules/dont-rebuild-oss.yaml
",
    )
    .unwrap();
    let err = policy.derived_gate_ids().unwrap_err();
    match err {
        PolicyError::DuplicateGateIds {
            duplicates,
        } => assert_eq!(duplicates, vec!["dont-rebuild-oss".to_string()]),
        other => panic!("unexpected error: {other}"),
    }
}

/// Tests that distinct ids validate cleanly.
#[test]
fn test_unique_ids_validate() {
    let policy = PolicySpec::from_yaml(
        r"
gates:
  - type: review-limits
  - type: goal-declaration
  - type: forbidden-scopes
",
    )
    .unwrap();
    assert!(policy.validate().is_ok());
    let ids = policy.derived_gate_ids().unwrap();
    assert_eq!(ids.len(), 3);
}

// ============================================================================
// SECTION: Hashing and Classification
// ============================================================================

/// Tests that equal policies hash identically and different ones do not.
#[test]
fn test_canonical_hash_is_stable() {
    let a = PolicySpec::from_yaml("gates:\n  - type: review-limits\n").unwrap();
    let b = PolicySpec::from_yaml("gates:\n  - type: review-limits\n").unwrap();
    let c = PolicySpec::from_yaml("gates:\n  - type: goal-declaration\n").unwrap();
    assert_eq!(a.canonical_hash().unwrap(), b.canonical_hash().unwrap());
    assert_ne!(a.canonical_hash().unwrap(), c.canonical_hash().unwrap());
}

/// Tests artifact gate classification by type prefix.
#[test]
fn test_artifact_gate_classification() {
    assert!(GateSpecEntry::new("artifact.json").is_artifact_gate());
    assert!(GateSpecEntry::new("artifact.sarif").is_artifact_gate());
    assert!(!GateSpecEntry::new("review-limits").is_artifact_gate());
}

/// Tests that a partial DAO block is not fully configured.
#[test]
fn test_partial_dao_block() {
    let policy = PolicySpec::from_yaml(
        r"
cogni_dao:
  dao: '0xd40'
  plugin: '0x91u9'
",
    )
    .unwrap();
    assert!(!policy.cogni_dao.unwrap().is_fully_configured());
}
