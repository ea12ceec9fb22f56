//! The care-need tier vocabulary
//!
//! Tiers are a fixed, ordered, five-value scale. Post-processing rules may
//! only move a result up this scale, never down (escalation-only policy).

use serde::{Deserialize, Serialize};

/// Ordinal care-need classification
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// No meaningful support needs identified
    Independent,

    /// Periodic in-home help with daily living
    InHomeSupport,

    /// Residential setting with daily assistance available
    AssistedLiving,

    /// Secured setting with cognitive-care staffing
    MemoryCare,

    /// Round-the-clock clinical care
    SkilledNursing,
}

impl Tier {
    /// All tiers, lowest first
    pub const ALL: [Tier; 5] = [
        Tier::Independent,
        Tier::InHomeSupport,
        Tier::AssistedLiving,
        Tier::MemoryCare,
        Tier::SkilledNursing,
    ];

    /// The highest tier on the scale
    pub const MAX: Tier = Tier::SkilledNursing;

    /// Position on the scale, lowest = 0
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Tier at a scale position
    #[inline]
    #[must_use]
    pub fn from_index(index: usize) -> Option<Tier> {
        Self::ALL.get(index).copied()
    }

    /// Move up the scale by `steps`, saturating at the top
    #[inline]
    #[must_use]
    pub fn raise(self, steps: u8) -> Tier {
        let target = self.index().saturating_add(steps as usize);
        Self::from_index(target.min(Self::ALL.len() - 1)).unwrap_or(Self::MAX)
    }

    /// Stable machine-readable name, matching the serde wire name
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Tier::Independent => "independent",
            Tier::InHomeSupport => "in_home_support",
            Tier::AssistedLiving => "assisted_living",
            Tier::MemoryCare => "memory_care",
            Tier::SkilledNursing => "skilled_nursing",
        }
    }

    /// Human-readable recommendation label
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Tier::Independent => "Independent living",
            Tier::InHomeSupport => "In-home support",
            Tier::AssistedLiving => "Assisted living",
            Tier::MemoryCare => "Memory care",
            Tier::SkilledNursing => "Skilled nursing",
        }
    }
}
