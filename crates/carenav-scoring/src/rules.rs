//! Override and modifier rules
//!
//! Both rule families are declarative data evaluated against the derived
//! [`FlagSet`]: overrides force a tier floor for unambiguously severe
//! combinations, modifiers escalate further when risks compound. Neither
//! can ever lower a tier (escalation-only policy).

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

use carenav_manifest::FlagId;

use crate::flags::FlagSet;
use crate::tier::Tier;

/// Identifies one override or modifier rule
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleId(String);

impl RuleId {
    /// Create a new rule id
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

impl Display for RuleId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RuleId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Flag combination that fires a rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleTrigger {
    /// Every listed flag is raised
    AllOf(Vec<FlagId>),

    /// At least one listed flag is raised
    AnyOf(Vec<FlagId>),

    /// At least `count` of the listed flags are raised
    AtLeast {
        /// Minimum raised-flag count
        count: usize,
        /// Candidate flags
        flags: Vec<FlagId>,
    },
}

impl RuleTrigger {
    /// Whether the trigger fires under the given flag set
    #[must_use]
    pub fn matches(&self, flags: &FlagSet) -> bool {
        match self {
            Self::AllOf(required) => required.iter().all(|f| flags.is_set(f)),
            Self::AnyOf(candidates) => candidates.iter().any(|f| flags.is_set(f)),
            Self::AtLeast { count, flags: candidates } => {
                flags.active_count(candidates) >= *count
            }
        }
    }

    /// Flags this trigger reads
    #[must_use]
    pub fn flags(&self) -> &[FlagId] {
        match self {
            Self::AllOf(flags) | Self::AnyOf(flags) | Self::AtLeast { flags, .. } => flags,
        }
    }
}

/// Forces a minimum tier when severe combinations are present
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideRule {
    /// Stable rule id
    pub id: RuleId,

    /// Flag combination that fires the rule
    pub trigger: RuleTrigger,

    /// Tier floor enforced when the rule fires
    pub floor: Tier,

    /// Human-readable rationale fragment
    #[serde(default)]
    pub reason: String,
}

/// Escalates further when risk factors compound
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifierRule {
    /// Stable rule id
    pub id: RuleId,

    /// Flag combination that fires the rule
    pub trigger: RuleTrigger,

    /// Escalation applied when the rule fires
    pub effect: ModifierEffect,

    /// Human-readable rationale fragment
    #[serde(default)]
    pub reason: String,
}

/// Escalation applied by a fired modifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierEffect {
    /// Raise by a fixed number of tier steps (saturating at the top)
    Raise(u8),

    /// Jump straight to the highest tier
    RaiseToMax,
}
