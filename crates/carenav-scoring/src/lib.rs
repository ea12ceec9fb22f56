//! CareNav Scoring Engine
//!
//! Domain-weighted scoring over a completed answer set, with an
//! escalation-only tier policy.
//!
//! # Core Concepts
//!
//! - [`compute_flags`] / [`FlagSet`]: flags rebuilt from scratch on every
//!   pass, never accumulated
//! - [`ScoringConfig`]: every tunable (points, weights, thresholds, rules,
//!   confidence weighting) is supplied data, validated and bound at load
//! - [`score`]: points -> weighted domains -> base tier -> override floors
//!   -> modifier escalations -> confidence -> rationale
//! - [`Tier`]: fixed five-value ordinal vocabulary
//! - [`ScoringStrategy`] / [`StrategyRegistry`]: typed-id strategy
//!   resolution at registration time
//!
//! The pipeline is pure, synchronous and CPU-bound; nothing here touches
//! I/O.

#![warn(unreachable_pub)]

mod config;
mod engine;
mod flags;
mod rules;
mod strategy;
mod tier;

pub use config::{
    ConfidenceCombiner, ConfidenceRule, CountBand, PointRule, RangeBand, ScoringConfig,
    ScoringConfigError, TierBand, WEIGHT_RANGE,
};
pub use engine::{score, ScoringError, ScoringResult};
pub use flags::{compute_flags, FlagSet};
pub use rules::{ModifierEffect, ModifierRule, OverrideRule, RuleId, RuleTrigger};
pub use strategy::{ScoringStrategy, StrategyRegistry, WeightedDomainStrategy};
pub use tier::Tier;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
