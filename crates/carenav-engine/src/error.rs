//! Aggregate error type for the orchestrator
//!
//! Each subsystem keeps its own error enum; this type is the seam callers
//! see. The propagation policy: manifest and configuration problems fail
//! loud at registration, incomplete answers are a recoverable interaction
//! state, and a scoring failure aborts the publish step with nothing
//! written.

use carenav_flow::FlowError;
use carenav_manifest::{ManifestError, ModuleId};
use carenav_outcome::DigestError;
use carenav_scoring::{ScoringConfigError, ScoringError};

/// Top-level CareNav engine error
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Manifest failed to parse or validate
    #[error("manifest error: {0}")]
    Manifest(#[from] ManifestError),

    /// Scoring configuration failed to validate or bind
    #[error("scoring configuration error: {0}")]
    Config(#[from] ScoringConfigError),

    /// State machine rejected an operation
    #[error("flow error: {0}")]
    Flow(#[from] FlowError),

    /// Scoring pass failed; no outcome was written
    #[error("scoring failed: {0}")]
    Scoring(#[from] ScoringError),

    /// Outcome construction failed; no outcome was written
    #[error("publish failed: {0}")]
    Publish(#[from] DigestError),

    /// No module registered under this id
    #[error("module not registered: {0}")]
    UnknownModule(ModuleId),

    /// Publish requested before the walk finished
    #[error("session is not complete")]
    SessionNotComplete,
}

impl EngineError {
    /// Whether the caller can recover by collecting more answers
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Flow(flow) if flow.is_recoverable())
    }
}
