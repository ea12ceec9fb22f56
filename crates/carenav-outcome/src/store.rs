//! The shared keyed outcome store
//!
//! Exactly one live outcome exists per state key; a retake replaces the
//! prior outcome wholesale, never merges into it. Readers get a shared
//! immutable handle. Persistence across process restarts is an external
//! collaborator behind the same trait.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::outcome::{Outcome, StateKey};

/// Keyed store downstream personalization reads outcomes from
pub trait OutcomeStore: Send + Sync + fmt::Debug {
    /// Write an outcome, replacing any prior outcome under its key
    ///
    /// Returns the shared handle now live in the store.
    fn put(&self, outcome: Outcome) -> Arc<Outcome>;

    /// Read the live outcome for a key
    fn get(&self, key: &StateKey) -> Option<Arc<Outcome>>;

    /// Drop the live outcome for a key; returns whether one existed
    fn remove(&self, key: &StateKey) -> bool;

    /// Number of live outcomes
    fn len(&self) -> usize;

    /// Whether the store is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-process store backed by a concurrent map
#[derive(Debug, Default)]
pub struct InMemoryOutcomeStore {
    outcomes: DashMap<StateKey, Arc<Outcome>>,
}

impl InMemoryOutcomeStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl OutcomeStore for InMemoryOutcomeStore {
    fn put(&self, outcome: Outcome) -> Arc<Outcome> {
        let key = outcome.state_key().clone();
        let handle = Arc::new(outcome);
        let replaced = self
            .outcomes
            .insert(key.clone(), Arc::clone(&handle))
            .is_some();
        debug!(key = %key, digest = %handle.digest().short(), replaced, "outcome stored");
        handle
    }

    fn get(&self, key: &StateKey) -> Option<Arc<Outcome>> {
        self.outcomes.get(key).map(|entry| Arc::clone(&entry))
    }

    fn remove(&self, key: &StateKey) -> bool {
        self.outcomes.remove(key).is_some()
    }

    fn len(&self) -> usize {
        self.outcomes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use carenav_manifest::{ModuleHeader, ModuleId};
    use carenav_scoring::{FlagSet, ScoringResult, Tier};

    fn outcome(key: &str, tier: Tier) -> Outcome {
        let result = ScoringResult {
            base_tier: tier,
            final_tier: tier,
            raw_score: 0.0,
            domain_scores: BTreeMap::new(),
            confidence: 1.0,
            rationale: vec![],
            overrides_applied: vec![],
            modifiers_applied: vec![],
        };
        Outcome::build(
            StateKey::from(key),
            ModuleHeader {
                id: ModuleId::new("care-needs"),
                version: "1.0.0".to_string(),
            },
            &result,
            FlagSet::default(),
        )
        .unwrap()
    }

    #[test]
    fn store_round_trip() {
        let store = InMemoryOutcomeStore::new();
        assert!(store.is_empty());

        store.put(outcome("user-1", Tier::Independent));
        let read = store.get(&StateKey::from("user-1")).unwrap();
        assert_eq!(read.recommendation(), Tier::Independent);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn retake_replaces_wholesale() {
        let store = InMemoryOutcomeStore::new();
        store.put(outcome("user-1", Tier::Independent));
        store.put(outcome("user-1", Tier::MemoryCare));

        // one live outcome per key, the latest
        assert_eq!(store.len(), 1);
        let read = store.get(&StateKey::from("user-1")).unwrap();
        assert_eq!(read.recommendation(), Tier::MemoryCare);
    }

    #[test]
    fn remove_drops_live_outcome() {
        let store = InMemoryOutcomeStore::new();
        store.put(outcome("user-1", Tier::Independent));
        assert!(store.remove(&StateKey::from("user-1")));
        assert!(!store.remove(&StateKey::from("user-1")));
        assert!(store.get(&StateKey::from("user-1")).is_none());
    }

    #[test]
    fn keys_are_independent() {
        let store = InMemoryOutcomeStore::new();
        store.put(outcome("user-1", Tier::Independent));
        store.put(outcome("user-2", Tier::AssistedLiving));
        assert_eq!(store.len(), 2);
        assert_eq!(
            store.get(&StateKey::from("user-2")).unwrap().recommendation(),
            Tier::AssistedLiving
        );
    }
}
