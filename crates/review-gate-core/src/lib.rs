// review-gate-core/src/lib.rs
// ============================================================================
// Module: Review Gate Core Library
// Description: Public API surface for the Review Gate core.
// Purpose: Expose core types, interfaces, and runtime helpers.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Review Gate core provides the gate evaluation runtime for pull request
//! policy enforcement: registry dispatch, sequential gate execution with
//! per-gate isolation, verdict aggregation, report rendering, and the
//! two-phase check lifecycle. It is forge-agnostic and integrates through
//! explicit interfaces rather than embedding into a specific platform.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use self::core::*;

pub use interfaces::AiWorkflow;
pub use interfaces::BranchRef;
pub use interfaces::CiArtifact;
pub use interfaces::CiRun;
pub use interfaces::ForgeClient;
pub use interfaces::ForgeError;
pub use interfaces::PatchEvidence;
pub use interfaces::PolicyLoadError;
pub use interfaces::PolicyLoader;
pub use interfaces::WorkflowError;
pub use interfaces::WorkflowInput;
pub use runtime::CheckLifecycle;
pub use runtime::aggregate_run;
pub use runtime::GateContext;
pub use runtime::GateError;
pub use runtime::GateHandler;
pub use runtime::GateRegistry;
pub use runtime::LaunchError;
pub use runtime::LaunchOutcome;
pub use runtime::LifecycleConfig;
pub use runtime::LifecycleError;
pub use runtime::MatrixOutcome;
pub use runtime::Orchestrator;
pub use runtime::OrchestratorConfig;
pub use runtime::OrchestratorError;
pub use runtime::OutstandingChecks;
pub use runtime::Report;
pub use runtime::evaluate_matrix;
pub use runtime::normalize_path;
pub use runtime::render_report;
pub use runtime::run_configured_gates;
pub use runtime::severity_from_label;
pub use runtime::severity_from_number;
