//! Outcome publication
//!
//! Publishing is all-or-nothing: the canonical outcome is built fully
//! before anything touches the store, so a failed build writes nothing.
//! Publishing the same inputs twice yields byte-identical outcomes and is
//! therefore safe to repeat.

use std::sync::Arc;

use tracing::info;

use carenav_manifest::ModuleHeader;
use carenav_scoring::{FlagSet, ScoringResult};

use crate::digest::DigestError;
use crate::outcome::{Outcome, StateKey};
use crate::store::OutcomeStore;

/// Build the canonical outcome and write it under `state_key`
///
/// Any prior outcome under the same key is replaced wholesale.
///
/// # Errors
/// Returns [`DigestError`] if the outcome cannot be built; the store is
/// untouched in that case.
pub fn publish(
    store: &dyn OutcomeStore,
    state_key: StateKey,
    module: ModuleHeader,
    result: &ScoringResult,
    flags: FlagSet,
) -> Result<Arc<Outcome>, DigestError> {
    let outcome = Outcome::build(state_key, module, result, flags)?;
    info!(
        key = %outcome.state_key(),
        recommendation = outcome.recommendation().label(),
        confidence = outcome.confidence(),
        "outcome published"
    );
    Ok(store.put(outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use carenav_manifest::ModuleId;
    use carenav_scoring::Tier;

    use crate::store::InMemoryOutcomeStore;

    fn module() -> ModuleHeader {
        ModuleHeader {
            id: ModuleId::new("care-needs"),
            version: "1.0.0".to_string(),
        }
    }

    fn result(tier: Tier) -> ScoringResult {
        ScoringResult {
            base_tier: tier,
            final_tier: tier,
            raw_score: 3.0,
            domain_scores: BTreeMap::new(),
            confidence: 0.9,
            rationale: vec![],
            overrides_applied: vec![],
            modifiers_applied: vec![],
        }
    }

    #[test]
    fn publish_writes_under_key() {
        let store = InMemoryOutcomeStore::new();
        let published = publish(
            &store,
            StateKey::from("user-1"),
            module(),
            &result(Tier::InHomeSupport),
            FlagSet::default(),
        )
        .unwrap();

        let read = store.get(&StateKey::from("user-1")).unwrap();
        assert_eq!(read.digest(), published.digest());
    }

    #[test]
    fn republish_is_idempotent() {
        let store = InMemoryOutcomeStore::new();
        let first = publish(
            &store,
            StateKey::from("user-1"),
            module(),
            &result(Tier::InHomeSupport),
            FlagSet::default(),
        )
        .unwrap();
        let second = publish(
            &store,
            StateKey::from("user-1"),
            module(),
            &result(Tier::InHomeSupport),
            FlagSet::default(),
        )
        .unwrap();

        assert_eq!(*first, *second);
        assert_eq!(first.digest(), second.digest());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn retake_fully_replaces() {
        let store = InMemoryOutcomeStore::new();
        publish(
            &store,
            StateKey::from("user-1"),
            module(),
            &result(Tier::InHomeSupport),
            FlagSet::default(),
        )
        .unwrap();
        publish(
            &store,
            StateKey::from("user-1"),
            module(),
            &result(Tier::SkilledNursing),
            FlagSet::default(),
        )
        .unwrap();

        let read = store.get(&StateKey::from("user-1")).unwrap();
        assert_eq!(read.recommendation(), Tier::SkilledNursing);
        assert_eq!(store.len(), 1);
    }
}
