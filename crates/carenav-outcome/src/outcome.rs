//! The canonical published outcome
//!
//! An [`Outcome`] is the one object the scoring core exposes outward.
//! Downstream personalization reads its flags and recommendation; nothing
//! downstream may alter it. Construction is canonical: identical inputs
//! build byte-identical outcomes, digest included.

use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

use carenav_manifest::{DomainId, ModuleHeader};
use carenav_scoring::{FlagSet, ScoringResult, Tier};

use crate::digest::{DigestError, OutcomeDigest};

/// Caller-supplied key an outcome is filed under
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateKey(String);

impl StateKey {
    /// Create a new state key
    #[inline]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// View as a string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for StateKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StateKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// The immutable result of one completed assessment run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    state_key: StateKey,
    module: ModuleHeader,
    recommendation: Tier,
    confidence: f64,
    flags: FlagSet,
    domain_scores: BTreeMap<DomainId, f64>,
    tags: Vec<String>,
    summary: String,
    digest: OutcomeDigest,
}

/// Hash-relevant view: everything except the digest itself
#[derive(Serialize)]
struct DigestInput<'a> {
    state_key: &'a StateKey,
    module: &'a ModuleHeader,
    recommendation: Tier,
    confidence: f64,
    flags: &'a FlagSet,
    domain_scores: &'a BTreeMap<DomainId, f64>,
    tags: &'a [String],
    summary: &'a str,
}

impl Outcome {
    /// Build the canonical outcome for a scoring result
    ///
    /// Tags are derived deterministically: one `tier:` tag plus one tag
    /// per raised flag, in stable order. The summary leads with the
    /// recommendation and the first rationale line.
    ///
    /// # Errors
    /// Returns [`DigestError`] if digest serialization fails.
    pub fn build(
        state_key: StateKey,
        module: ModuleHeader,
        result: &ScoringResult,
        flags: FlagSet,
    ) -> Result<Self, DigestError> {
        let recommendation = result.final_tier;

        let mut tags = vec![format!("tier:{}", recommendation.key())];
        tags.extend(flags.active().map(|flag| format!("flag:{flag}")));

        let summary = match result.rationale.first() {
            Some(line) => format!("{} recommended. {line}", recommendation.label()),
            None => format!("{} recommended.", recommendation.label()),
        };

        let digest = OutcomeDigest::of(&DigestInput {
            state_key: &state_key,
            module: &module,
            recommendation,
            confidence: result.confidence,
            flags: &flags,
            domain_scores: &result.domain_scores,
            tags: &tags,
            summary: &summary,
        })?;

        Ok(Self {
            state_key,
            module,
            recommendation,
            confidence: result.confidence,
            flags,
            domain_scores: result.domain_scores.clone(),
            tags,
            summary,
            digest,
        })
    }

    /// Key this outcome is filed under
    #[inline]
    #[must_use]
    pub fn state_key(&self) -> &StateKey {
        &self.state_key
    }

    /// Module the assessment ran against
    #[inline]
    #[must_use]
    pub fn module(&self) -> &ModuleHeader {
        &self.module
    }

    /// Recommended care tier
    #[inline]
    #[must_use]
    pub fn recommendation(&self) -> Tier {
        self.recommendation
    }

    /// Combined confidence, within `[0, 1]`
    #[inline]
    #[must_use]
    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    /// Derived flags, for downstream personalization
    #[inline]
    #[must_use]
    pub fn flags(&self) -> &FlagSet {
        &self.flags
    }

    /// Weighted subtotal per domain
    #[inline]
    #[must_use]
    pub fn domain_scores(&self) -> &BTreeMap<DomainId, f64> {
        &self.domain_scores
    }

    /// Deterministic tags (tier plus raised flags)
    #[inline]
    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Human-readable one-line summary
    #[inline]
    #[must_use]
    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// Identity digest over the canonical form
    #[inline]
    #[must_use]
    pub fn digest(&self) -> OutcomeDigest {
        self.digest
    }

    /// Whether the stored digest matches the current content
    ///
    /// # Errors
    /// Returns [`DigestError`] if digest serialization fails.
    pub fn verify(&self) -> Result<bool, DigestError> {
        let recomputed = OutcomeDigest::of(&DigestInput {
            state_key: &self.state_key,
            module: &self.module,
            recommendation: self.recommendation,
            confidence: self.confidence,
            flags: &self.flags,
            domain_scores: &self.domain_scores,
            tags: &self.tags,
            summary: &self.summary,
        })?;
        Ok(recomputed == self.digest)
    }
}
