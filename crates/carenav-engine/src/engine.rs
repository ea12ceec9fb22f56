//! The assessment orchestrator
//!
//! Ties the four components together along the one data path the system
//! has: manifest loading, session walking, scoring, publication. All
//! resolution (manifest validation, config binding, strategy lookup)
//! happens at module registration; a running session can no longer hit a
//! dangling reference.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use carenav_flow::{AssessmentSession, Phase};
use carenav_manifest::{AnswerSet, ManifestRegistry, ModuleId, ModuleManifest};
use carenav_outcome::{publish, InMemoryOutcomeStore, Outcome, OutcomeStore, StateKey};
use carenav_scoring::{
    compute_flags, FlagSet, ScoringConfig, ScoringResult, StrategyRegistry,
    WeightedDomainStrategy,
};

use crate::error::EngineError;

/// Orchestrates assessment modules end to end
///
/// The manifest registry, strategy registry and outcome store are shared
/// across sessions; each session itself is single-user and synchronous.
#[derive(Debug)]
pub struct AssessmentEngine {
    manifests: ManifestRegistry,
    strategies: StrategyRegistry,
    active: RwLock<HashMap<ModuleId, Arc<ModuleManifest>>>,
    store: Arc<dyn OutcomeStore>,
}

impl Default for AssessmentEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AssessmentEngine {
    /// Create an engine with an in-memory outcome store
    #[must_use]
    pub fn new() -> Self {
        Self::with_store(Arc::new(InMemoryOutcomeStore::new()))
    }

    /// Create an engine over a caller-supplied store (e.g. a persistent
    /// one living behind the same trait)
    #[must_use]
    pub fn with_store(store: Arc<dyn OutcomeStore>) -> Self {
        Self {
            manifests: ManifestRegistry::new(),
            strategies: StrategyRegistry::new(),
            active: RwLock::new(HashMap::new()),
            store,
        }
    }

    /// Register a module from a JSON manifest and its scoring config
    ///
    /// Loads and validates the manifest, binds the configuration against
    /// it and registers the scoring strategy under the typed module id.
    /// Every reference problem surfaces here, before any session starts.
    ///
    /// # Errors
    /// [`EngineError::Manifest`] or [`EngineError::Config`].
    pub fn register_module(
        &self,
        manifest_json: &str,
        config: ScoringConfig,
    ) -> Result<Arc<ModuleManifest>, EngineError> {
        let manifest = self.manifests.load_json(manifest_json)?;
        self.register_loaded(manifest.clone(), config)?;
        Ok(manifest)
    }

    /// Register a module from a YAML manifest and its scoring config
    ///
    /// # Errors
    /// [`EngineError::Manifest`] or [`EngineError::Config`].
    pub fn register_module_yaml(
        &self,
        manifest_yaml: &str,
        config: ScoringConfig,
    ) -> Result<Arc<ModuleManifest>, EngineError> {
        let manifest = self.manifests.load_yaml(manifest_yaml)?;
        self.register_loaded(manifest.clone(), config)?;
        Ok(manifest)
    }

    fn register_loaded(
        &self,
        manifest: Arc<ModuleManifest>,
        config: ScoringConfig,
    ) -> Result<(), EngineError> {
        let strategy = WeightedDomainStrategy::bind(config, &manifest)?;
        self.strategies
            .register(manifest.module.id.clone(), Arc::new(strategy));
        self.active
            .write()
            .insert(manifest.module.id.clone(), Arc::clone(&manifest));
        info!(
            module = %manifest.module.id,
            version = %manifest.module.version,
            "module registered"
        );
        Ok(())
    }

    /// The active manifest for a module
    #[must_use]
    pub fn manifest(&self, module: &ModuleId) -> Option<Arc<ModuleManifest>> {
        self.active.read().get(module).map(Arc::clone)
    }

    /// Start a fresh session over a registered module
    ///
    /// # Errors
    /// [`EngineError::UnknownModule`] if the module was never registered.
    pub fn start_session(&self, module: &ModuleId) -> Result<AssessmentSession, EngineError> {
        let manifest = self
            .manifest(module)
            .ok_or_else(|| EngineError::UnknownModule(module.clone()))?;
        Ok(AssessmentSession::new(manifest))
    }

    /// Score an answer set against a registered module without publishing
    ///
    /// Answers are first reduced to their effective projection; flags are
    /// rebuilt from scratch from that projection.
    ///
    /// # Errors
    /// [`EngineError::UnknownModule`] or [`EngineError::Scoring`].
    pub fn score_answers(
        &self,
        module: &ModuleId,
        answers: &AnswerSet,
    ) -> Result<(ScoringResult, FlagSet), EngineError> {
        let manifest = self
            .manifest(module)
            .ok_or_else(|| EngineError::UnknownModule(module.clone()))?;
        let strategy = self
            .strategies
            .resolve(module)
            .ok_or_else(|| EngineError::UnknownModule(module.clone()))?;

        let effective = carenav_flow::visibility::effective_answers(&manifest, answers);
        let flags = compute_flags(&manifest, &effective);
        let result = strategy.score(&manifest, &effective, &flags)?;
        debug!(module = %module, tier = result.final_tier.label(), "answers scored");
        Ok((result, flags))
    }

    /// Score a completed session and publish the outcome under `state_key`
    ///
    /// The deterministic pipeline is authoritative: whatever advisory text
    /// downstream layers add, the tier decision is made here and only
    /// here. A scoring failure aborts cleanly; nothing is written.
    ///
    /// # Errors
    /// [`EngineError::SessionNotComplete`], [`EngineError::UnknownModule`],
    /// [`EngineError::Scoring`] or [`EngineError::Publish`].
    pub fn complete_and_publish(
        &self,
        session: &AssessmentSession,
        state_key: StateKey,
    ) -> Result<Arc<Outcome>, EngineError> {
        if session.phase() != Phase::Completed {
            return Err(EngineError::SessionNotComplete);
        }
        let module = &session.manifest().module;
        let (result, flags) = self.score_answers(&module.id, session.answers())?;
        let outcome = publish(
            self.store.as_ref(),
            state_key,
            module.clone(),
            &result,
            flags,
        )?;
        Ok(outcome)
    }

    /// Read the live outcome for a key
    #[must_use]
    pub fn outcome(&self, key: &StateKey) -> Option<Arc<Outcome>> {
        self.store.get(key)
    }

    /// The shared outcome store
    #[must_use]
    pub fn store(&self) -> &Arc<dyn OutcomeStore> {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carenav_manifest::AnswerValue;
    use carenav_manifest::QuestionId;

    const MANIFEST: &str = r#"{
        "module": {"id": "mini", "version": "1.0.0"},
        "sections": [{"id": "s", "kind": "form", "questions": [
            {"id": "memory", "kind": "single_select", "domain": "cognition", "options": [
                {"value": "fine"},
                {"value": "confused", "flags": ["cognitive_decline"]}
            ]}
        ]}]
    }"#;

    const CONFIG: &str = r#"{
        "points": {"memory": {"by_value": {"fine": 0.0, "confused": 2.0}}},
        "domains": {"cognition": 3.0},
        "tiers": [
            {"upper": 3.0, "tier": "independent"},
            {"tier": "in_home_support"}
        ]
    }"#;

    fn engine() -> AssessmentEngine {
        let engine = AssessmentEngine::new();
        engine
            .register_module(MANIFEST, ScoringConfig::from_json(CONFIG).unwrap())
            .unwrap();
        engine
    }

    #[test]
    fn register_resolves_everything_up_front() {
        let engine = engine();
        assert!(engine.manifest(&ModuleId::new("mini")).is_some());
        assert!(engine.manifest(&ModuleId::new("ghost")).is_none());
    }

    #[test]
    fn register_rejects_unbindable_config() {
        let engine = AssessmentEngine::new();
        let config = r#"{
            "points": {"memory": {"by_value": {}}},
            "domains": {"cognition": 3.0},
            "tiers": [{"tier": "independent"}],
            "overrides": [{
                "id": "r",
                "trigger": {"all_of": ["flag_nobody_declared"]},
                "floor": "memory_care"
            }]
        }"#;
        let err = engine
            .register_module(MANIFEST, ScoringConfig::from_json(config).unwrap())
            .unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn start_session_requires_registration() {
        let engine = AssessmentEngine::new();
        assert!(matches!(
            engine.start_session(&ModuleId::new("mini")),
            Err(EngineError::UnknownModule(_))
        ));
    }

    #[test]
    fn publish_requires_completed_session() {
        let engine = engine();
        let session = engine.start_session(&ModuleId::new("mini")).unwrap();
        let err = engine
            .complete_and_publish(&session, StateKey::from("k"))
            .unwrap_err();
        assert!(matches!(err, EngineError::SessionNotComplete));
        assert!(engine.outcome(&StateKey::from("k")).is_none());
    }

    #[test]
    fn score_answers_without_publishing() {
        let engine = engine();
        let mut answers = AnswerSet::new();
        answers.insert(QuestionId::new("memory"), AnswerValue::from("confused"));

        let (result, flags) = engine
            .score_answers(&ModuleId::new("mini"), &answers)
            .unwrap();
        assert_eq!(result.raw_score, 6.0);
        assert_eq!(flags.active().count(), 1);
        assert!(engine.store().is_empty());
    }
}
