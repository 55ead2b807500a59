// review-gate-core/src/runtime/mod.rs
// ============================================================================
// Module: Review Gate Runtime
// Description: Gate execution engine, aggregation, rendering, and lifecycle.
// Purpose: Execute configured gates against a PR and publish the verdict.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Runtime modules implement the gate evaluation path: registry dispatch, the
//! sequential launcher with its safe shell, verdict aggregation, report
//! rendering, and the two-phase check lifecycle. All event surfaces must call
//! into the same orchestrator to preserve invariance.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod context;
pub mod launcher;
pub mod lifecycle;
pub mod matrix;
pub mod normalize;
pub mod orchestrator;
pub mod registry;
pub mod render;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use context::DEFAULT_CHECK_NAME;
pub use context::DEFAULT_GATE_TIMEOUT_MS;
pub use context::DEFAULT_POLICY_ROOT;
pub use context::GateContext;
pub use launcher::LaunchError;
pub use launcher::LaunchOutcome;
pub use launcher::run_configured_gates;
pub use lifecycle::CHECK_NAME_ENV;
pub use lifecycle::CheckLifecycle;
pub use lifecycle::LifecycleConfig;
pub use lifecycle::LifecycleError;
pub use lifecycle::OutstandingChecks;
pub use matrix::CriterionCheck;
pub use matrix::MatrixOutcome;
pub use matrix::evaluate_matrix;
pub use normalize::normalize_path;
pub use normalize::severity_from_label;
pub use normalize::severity_from_number;
pub use orchestrator::FAIL_ON_ERROR_ENV;
pub use orchestrator::Orchestrator;
pub use orchestrator::OrchestratorConfig;
pub use orchestrator::OrchestratorError;
pub use orchestrator::aggregate_run;
pub use registry::GateError;
pub use registry::GateHandler;
pub use registry::GateRegistry;
pub use render::Report;
pub use render::VOTE_PORTAL_BASE;
pub use render::render_report;
