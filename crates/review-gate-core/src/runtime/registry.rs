// review-gate-core/src/runtime/registry.rs
// ============================================================================
// Module: Gate Registry
// Description: Static registry resolving gate type strings to handlers.
// Purpose: Route gate execution by type with O(1) lookup.
// Dependencies: crate::{core, runtime::context}, async-trait
// ============================================================================

//! ## Overview
//! The registry is the only place that knows which gate types exist. Handlers
//! are registered once at startup; a gate spec whose type is unknown resolves
//! to the launcher's synthetic unimplemented result instead of aborting the
//! run.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use async_trait::async_trait;
use thiserror::Error;

use crate::core::policy::GateSpecEntry;
use crate::core::result::GateResult;
use crate::interfaces::ForgeError;
use crate::interfaces::WorkflowError;
use crate::runtime::context::GateContext;

// ============================================================================
// SECTION: Handler Contract
// ============================================================================

/// Gate handler errors recovered by the launcher's safe shell.
#[derive(Debug, Error)]
pub enum GateError {
    /// The run's cancellation signal fired; the launcher stops dispatching.
    #[error("gate canceled")]
    Canceled,
    /// The handler failed; translated to a neutral internal-error result.
    #[error("gate internal error: {0}")]
    Internal(String),
}

impl From<ForgeError> for GateError {
    fn from(err: ForgeError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<WorkflowError> for GateError {
    fn from(err: WorkflowError) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Uniform contract every gate handler obeys.
///
/// Handlers are side-effect-free except through the context's forge client,
/// observe the cancellation signal at every suspension point, and never
/// panic: failures are returned as [`GateError`] values.
#[async_trait]
pub trait GateHandler: Send + Sync {
    /// Runs the gate against the per-run context.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::Canceled`] when the cancellation signal fired, or
    /// [`GateError::Internal`] on any other failure.
    async fn run(&self, ctx: &GateContext, spec: &GateSpecEntry) -> Result<GateResult, GateError>;
}

// ============================================================================
// SECTION: Registry
// ============================================================================

/// Static gate registry keyed by gate type string.
#[derive(Default)]
pub struct GateRegistry {
    /// Handler implementations keyed by gate type.
    handlers: BTreeMap<String, Box<dyn GateHandler>>,
}

impl GateRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: BTreeMap::new(),
        }
    }

    /// Registers a handler under the given gate type.
    pub fn register(&mut self, gate_type: impl Into<String>, handler: impl GateHandler + 'static) {
        self.handlers.insert(gate_type.into(), Box::new(handler));
    }

    /// Resolves a gate type to its handler.
    #[must_use]
    pub fn resolve(&self, gate_type: &str) -> Option<&dyn GateHandler> {
        self.handlers.get(gate_type).map(AsRef::as_ref)
    }

    /// Returns the registered gate types in sorted order.
    pub fn gate_types(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    /// Returns the number of registered handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns true when no handler is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
