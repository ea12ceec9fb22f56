//! Flag derivation from answers
//!
//! Flags are never accumulated incrementally: every scoring pass rebuilds
//! the whole [`FlagSet`] from `(manifest, answers)`, so retakes and
//! resubmissions cannot leak stale flags. Callers pass the *effective*
//! answer projection; answers retained for hidden steps never raise flags.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::trace;

use carenav_manifest::{AnswerSet, FlagId, ModuleManifest};

/// Boolean signals derived from answers
///
/// Keys are exactly the manifest's declared flag vocabulary; the set is
/// closed by construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlagSet {
    flags: BTreeMap<FlagId, bool>,
}

impl FlagSet {
    /// Whether a flag is raised
    #[inline]
    #[must_use]
    pub fn is_set(&self, flag: &FlagId) -> bool {
        self.flags.get(flag).copied().unwrap_or(false)
    }

    /// Whether the flag belongs to the declared vocabulary
    #[inline]
    #[must_use]
    pub fn is_declared(&self, flag: &FlagId) -> bool {
        self.flags.contains_key(flag)
    }

    /// Raised flags, in stable order
    pub fn active(&self) -> impl Iterator<Item = &FlagId> {
        self.flags.iter().filter(|(_, set)| **set).map(|(f, _)| f)
    }

    /// Number of raised flags among the given candidates
    #[must_use]
    pub fn active_count(&self, among: &[FlagId]) -> usize {
        among.iter().filter(|f| self.is_set(f)).count()
    }

    /// All entries, declared order
    pub fn iter(&self) -> impl Iterator<Item = (&FlagId, bool)> {
        self.flags.iter().map(|(f, set)| (f, *set))
    }

    /// Size of the declared vocabulary
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.flags.len()
    }

    /// Whether the vocabulary is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}

/// Rebuild the flag set from scratch
///
/// A pure function: repeated calls with unchanged input yield an equal
/// result. Every declared flag is present in the output, raised iff some
/// answered question has a selected option carrying it.
#[must_use]
pub fn compute_flags(manifest: &ModuleManifest, answers: &AnswerSet) -> FlagSet {
    let mut flags: BTreeMap<FlagId, bool> = manifest
        .declared_flags()
        .into_iter()
        .map(|f| (f, false))
        .collect();

    for question in manifest.questions() {
        let Some(answer) = answers.get(&question.id) else {
            continue;
        };
        for value in answer.selected_values() {
            let Some(option) = question.option(value) else {
                continue;
            };
            for flag in &option.flags {
                trace!(question = %question.id, flag = %flag, "flag raised");
                flags.insert(flag.clone(), true);
            }
        }
    }

    FlagSet { flags }
}
