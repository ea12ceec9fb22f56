//! Pluggable scoring strategies
//!
//! Strategies are resolved once, at module-registration time, through a
//! map keyed by the typed [`ModuleId`]. There is no string-path dispatch
//! at call time: an unknown module fails at registration, not mid-walk.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use carenav_manifest::{AnswerSet, ModuleId, ModuleManifest};

use crate::config::{ScoringConfig, ScoringConfigError};
use crate::engine::{score, ScoringError, ScoringResult};
use crate::flags::FlagSet;

/// A deterministic scoring implementation
///
/// # Safety
/// Implementations must be deterministic: identical `(manifest, answers,
/// flags)` inputs must produce identical results, and the escalation
/// invariant (`final_tier >= base_tier`) must hold for every output.
pub trait ScoringStrategy: Send + Sync + fmt::Debug {
    /// Run one scoring pass
    ///
    /// # Errors
    /// Returns [`ScoringError`] on any failure; partial results are never
    /// produced.
    fn score(
        &self,
        manifest: &ModuleManifest,
        answers: &AnswerSet,
        flags: &FlagSet,
    ) -> Result<ScoringResult, ScoringError>;

    /// Strategy name (for logs and diagnostics)
    fn name(&self) -> &'static str;
}

/// The shipped strategy: weighted domain subtotals, threshold-banded base
/// tier, escalation-only overrides and modifiers
#[derive(Debug, Clone)]
pub struct WeightedDomainStrategy {
    config: ScoringConfig,
}

impl WeightedDomainStrategy {
    /// Bind a configuration to a manifest
    ///
    /// Every question, domain and flag reference is checked here, at
    /// construction, so scoring can never trip over a dangling reference.
    ///
    /// # Errors
    /// Returns [`ScoringConfigError`] for any reference the manifest does
    /// not satisfy.
    pub fn bind(config: ScoringConfig, manifest: &ModuleManifest) -> Result<Self, ScoringConfigError> {
        config.validate()?;
        config.bind(manifest)?;
        Ok(Self { config })
    }

    /// The bound configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }
}

impl ScoringStrategy for WeightedDomainStrategy {
    fn score(
        &self,
        manifest: &ModuleManifest,
        answers: &AnswerSet,
        flags: &FlagSet,
    ) -> Result<ScoringResult, ScoringError> {
        score(&self.config, manifest, answers, flags)
    }

    fn name(&self) -> &'static str {
        "weighted-domain"
    }
}

/// Strategy map keyed by typed module id
#[derive(Debug, Default)]
pub struct StrategyRegistry {
    strategies: RwLock<HashMap<ModuleId, Arc<dyn ScoringStrategy>>>,
}

impl StrategyRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the strategy for a module, replacing any prior entry
    pub fn register(&self, module: ModuleId, strategy: Arc<dyn ScoringStrategy>) {
        debug!(module = %module, strategy = strategy.name(), "strategy registered");
        self.strategies.write().insert(module, strategy);
    }

    /// Resolve the strategy for a module
    #[must_use]
    pub fn resolve(&self, module: &ModuleId) -> Option<Arc<dyn ScoringStrategy>> {
        self.strategies.read().get(module).map(Arc::clone)
    }

    /// Number of registered modules
    #[must_use]
    pub fn len(&self) -> usize {
        self.strategies.read().len()
    }

    /// Whether no strategies are registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strategies.read().is_empty()
    }
}
