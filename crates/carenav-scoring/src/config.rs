//! Scoring configuration
//!
//! Everything tunable about the algorithm is data here, not code: point
//! tables, domain weights, tier thresholds, override/modifier rules and
//! the confidence weighting. Threshold values in particular are supplied
//! and tuned per deployment, never hard-coded.
//!
//! A configuration is validated twice: [`ScoringConfig::validate`] checks
//! internal shape at parse time, and [`ScoringConfig::bind`] checks every
//! question, domain and flag reference against a concrete manifest before
//! any scoring runs. An undeclared flag reference is fatal here, at load
//! time, so it can never surface mid-assessment.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use carenav_manifest::{AnswerValue, DomainId, FlagId, ModuleManifest, QuestionId, QuestionKind};

use crate::rules::{ModifierRule, OverrideRule, RuleId};
use crate::tier::Tier;

/// Domain weights must stay within this inclusive range
pub const WEIGHT_RANGE: (f64, f64) = (1.0, 3.0);

/// Tunable scoring parameters for one module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Per-question point rules
    pub points: BTreeMap<QuestionId, PointRule>,

    /// Domain weights (1.0–3.0 inclusive)
    pub domains: BTreeMap<DomainId, f64>,

    /// Ordered, non-overlapping raw-score bands, lowest first; the last
    /// band is unbounded
    pub tiers: Vec<TierBand>,

    /// Ordered tier-floor rules
    #[serde(default)]
    pub overrides: Vec<OverrideRule>,

    /// Ordered escalation rules
    #[serde(default)]
    pub modifiers: Vec<ModifierRule>,

    /// Confidence weighting
    #[serde(default)]
    pub confidence: ConfidenceRule,
}

impl ScoringConfig {
    /// Parse a JSON configuration document and validate its shape
    ///
    /// # Errors
    /// Returns [`ScoringConfigError`] on malformed JSON or an internally
    /// inconsistent configuration.
    pub fn from_json(raw: &str) -> Result<Self, ScoringConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate internal shape: weight ranges, threshold ordering, band
    /// ordering, trigger well-formedness
    ///
    /// # Errors
    /// Returns the first inconsistency found.
    pub fn validate(&self) -> Result<(), ScoringConfigError> {
        for (domain, weight) in &self.domains {
            if !weight.is_finite() || *weight < WEIGHT_RANGE.0 || *weight > WEIGHT_RANGE.1 {
                return Err(ScoringConfigError::WeightRange {
                    domain: domain.clone(),
                    weight: *weight,
                });
            }
        }

        let Some((tail, bounded)) = self.tiers.split_last() else {
            return Err(ScoringConfigError::EmptyTierTable);
        };
        if tail.upper.is_some() {
            return Err(ScoringConfigError::UnboundedTail);
        }
        let mut last_upper = f64::NEG_INFINITY;
        for band in bounded {
            let Some(upper) = band.upper else {
                return Err(ScoringConfigError::UnboundedTail);
            };
            if !upper.is_finite() || upper <= last_upper {
                return Err(ScoringConfigError::ThresholdOrder);
            }
            last_upper = upper;
        }
        let mut last_tier: Option<Tier> = None;
        for band in &self.tiers {
            if let Some(prev) = last_tier {
                if band.tier <= prev {
                    return Err(ScoringConfigError::BandOrder);
                }
            }
            last_tier = Some(band.tier);
        }

        for (question, rule) in &self.points {
            rule.validate(question)?;
        }

        for rule in &self.overrides {
            check_trigger(&rule.id, rule.trigger.flags().len(), trigger_count(&rule.trigger))?;
        }
        for rule in &self.modifiers {
            check_trigger(&rule.id, rule.trigger.flags().len(), trigger_count(&rule.trigger))?;
        }

        if let ConfidenceCombiner::Weighted { completeness_weight } = self.confidence.combine {
            if !(0.0..=1.0).contains(&completeness_weight) {
                return Err(ScoringConfigError::ConfidenceWeight(completeness_weight));
            }
        }
        Ok(())
    }

    /// Check every external reference against a concrete manifest
    ///
    /// Point rules must name existing questions of a compatible kind, each
    /// scored question must carry a weighted domain, and every flag named
    /// by a rule must belong to the manifest's declared vocabulary.
    ///
    /// # Errors
    /// Returns the first dangling or incompatible reference.
    pub fn bind(&self, manifest: &ModuleManifest) -> Result<(), ScoringConfigError> {
        let declared = manifest.declared_flags();

        for (question_id, rule) in &self.points {
            let Some(question) = manifest.question(question_id) else {
                return Err(ScoringConfigError::UnknownQuestion(question_id.clone()));
            };
            if !rule.fits(question.kind) {
                return Err(ScoringConfigError::RuleShape {
                    question: question_id.clone(),
                    kind: question.kind,
                });
            }
            let Some(domain) = &question.domain else {
                return Err(ScoringConfigError::MissingDomain {
                    question: question_id.clone(),
                });
            };
            if !self.domains.contains_key(domain) {
                return Err(ScoringConfigError::UnknownDomain(domain.clone()));
            }
        }

        for rule in &self.overrides {
            for flag in rule.trigger.flags() {
                if !declared.contains(flag) {
                    return Err(ScoringConfigError::UnknownFlag {
                        rule: rule.id.clone(),
                        flag: flag.clone(),
                    });
                }
            }
        }
        for rule in &self.modifiers {
            for flag in rule.trigger.flags() {
                if !declared.contains(flag) {
                    return Err(ScoringConfigError::UnknownFlag {
                        rule: rule.id.clone(),
                        flag: flag.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Base tier for a raw score
    #[must_use]
    pub fn tier_for(&self, raw_score: f64) -> Option<Tier> {
        for band in &self.tiers {
            match band.upper {
                Some(upper) if raw_score < upper => return Some(band.tier),
                Some(_) => {}
                None => return Some(band.tier),
            }
        }
        None
    }
}

fn trigger_count(trigger: &crate::rules::RuleTrigger) -> Option<usize> {
    match trigger {
        crate::rules::RuleTrigger::AtLeast { count, .. } => Some(*count),
        _ => None,
    }
}

fn check_trigger(
    rule: &RuleId,
    flag_count: usize,
    at_least: Option<usize>,
) -> Result<(), ScoringConfigError> {
    if flag_count == 0 {
        return Err(ScoringConfigError::EmptyTrigger(rule.clone()));
    }
    if at_least == Some(0) {
        return Err(ScoringConfigError::ZeroCount(rule.clone()));
    }
    Ok(())
}

/// How one question's answer turns into raw points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointRule {
    /// Direct value lookup (single-select and boolean questions; boolean
    /// answers use the keys `"true"` / `"false"`)
    ByValue(BTreeMap<String, f64>),

    /// Item-count banding for multi-select questions. Counting, not
    /// per-item summing, keeps long multi-selects from running away.
    ByCount(Vec<CountBand>),

    /// Threshold banding for numeric questions
    ByRange(Vec<RangeBand>),
}

impl PointRule {
    /// Whether this rule shape fits a question kind
    #[must_use]
    pub fn fits(&self, kind: QuestionKind) -> bool {
        matches!(
            (self, kind),
            (Self::ByValue(_), QuestionKind::SingleSelect | QuestionKind::Boolean)
                | (Self::ByCount(_), QuestionKind::MultiSelect)
                | (Self::ByRange(_), QuestionKind::Number)
        )
    }

    /// Raw points for an answer; unmatched values score zero
    #[must_use]
    pub fn points_for(&self, answer: &AnswerValue) -> f64 {
        match self {
            Self::ByValue(table) => match answer {
                AnswerValue::Text(value) => table.get(value).copied().unwrap_or(0.0),
                AnswerValue::Bool(b) => table
                    .get(if *b { "true" } else { "false" })
                    .copied()
                    .unwrap_or(0.0),
                _ => 0.0,
            },
            Self::ByCount(bands) => {
                let count = match answer {
                    AnswerValue::Multi(values) => values.len(),
                    _ => return 0.0,
                };
                bands
                    .iter()
                    .filter(|band| count >= band.min_count)
                    .map(|band| band.points)
                    .last()
                    .unwrap_or(0.0)
            }
            Self::ByRange(bands) => {
                let AnswerValue::Number(n) = answer else {
                    return 0.0;
                };
                bands
                    .iter()
                    .filter(|band| *n >= band.min)
                    .map(|band| band.points)
                    .last()
                    .unwrap_or(0.0)
            }
        }
    }

    fn validate(&self, question: &QuestionId) -> Result<(), ScoringConfigError> {
        match self {
            Self::ByValue(_) => Ok(()),
            Self::ByCount(bands) => {
                let mut last: Option<usize> = None;
                for band in bands {
                    if band.min_count == 0 || last.map_or(false, |l| band.min_count <= l) {
                        return Err(ScoringConfigError::BandThresholds(question.clone()));
                    }
                    last = Some(band.min_count);
                }
                Ok(())
            }
            Self::ByRange(bands) => {
                let mut last = f64::NEG_INFINITY;
                for band in bands {
                    if !band.min.is_finite() || band.min <= last {
                        return Err(ScoringConfigError::BandThresholds(question.clone()));
                    }
                    last = band.min;
                }
                Ok(())
            }
        }
    }
}

/// One multi-select count band: `count >= min_count` yields `points`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CountBand {
    /// Minimum selected-item count
    pub min_count: usize,

    /// Points awarded
    pub points: f64,
}

/// One numeric band: `value >= min` yields `points`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeBand {
    /// Inclusive lower bound
    pub min: f64,

    /// Points awarded
    pub points: f64,
}

/// One tier band: scores below `upper` (or all remaining scores for the
/// unbounded tail) map to `tier`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierBand {
    /// Exclusive upper bound; `None` marks the unbounded tail band
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper: Option<f64>,

    /// Tier assigned to scores in this band
    pub tier: Tier,
}

/// Confidence weighting
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceRule {
    /// How the completeness and boundary-distance terms combine
    pub combine: ConfidenceCombiner,
}

impl Default for ConfidenceRule {
    fn default() -> Self {
        Self {
            combine: ConfidenceCombiner::Average,
        }
    }
}

/// Combination of the two confidence terms
///
/// Both terms contribute monotonically under every combiner: raising
/// either term never lowers the combined confidence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceCombiner {
    /// Arithmetic mean of the two terms
    Average,

    /// The weaker of the two terms
    Min,

    /// `w * completeness + (1 - w) * boundary_distance`
    Weighted {
        /// Weight on the completeness term, within `[0, 1]`
        completeness_weight: f64,
    },
}

/// Errors raised while parsing, validating or binding a scoring config
#[derive(Debug, thiserror::Error)]
pub enum ScoringConfigError {
    /// Document is not valid JSON
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Rule references a flag outside the manifest's declared vocabulary
    #[error("rule {rule} references undeclared flag {flag}")]
    UnknownFlag {
        /// Offending rule
        rule: RuleId,
        /// Undeclared flag
        flag: FlagId,
    },

    /// Point rule for a question the manifest does not declare
    #[error("point rule for unknown question {0}")]
    UnknownQuestion(QuestionId),

    /// Point rule shape does not fit the question kind
    #[error("point rule for question {question} does not fit kind {kind:?}")]
    RuleShape {
        /// Scored question
        question: QuestionId,
        /// Its declared kind
        kind: QuestionKind,
    },

    /// Scored question without a domain
    #[error("question {question} is scored but declares no domain")]
    MissingDomain {
        /// Scored question
        question: QuestionId,
    },

    /// Question domain missing from the weight table
    #[error("domain {0} has no configured weight")]
    UnknownDomain(DomainId),

    /// Domain weight outside 1.0–3.0
    #[error("domain weight for {domain} out of range: {weight}")]
    WeightRange {
        /// Offending domain
        domain: DomainId,
        /// Configured weight
        weight: f64,
    },

    /// No tier bands configured
    #[error("tier threshold table is empty")]
    EmptyTierTable,

    /// Thresholds not strictly increasing or not finite
    #[error("tier thresholds must be finite and strictly increasing")]
    ThresholdOrder,

    /// Last band carries an upper bound, or an interior band does not
    #[error("exactly the last tier band must be unbounded")]
    UnboundedTail,

    /// Band tiers must strictly escalate
    #[error("tier bands must map to strictly escalating tiers")]
    BandOrder,

    /// Count/range bands of a point rule not strictly increasing
    #[error("point bands for question {0} must be strictly increasing")]
    BandThresholds(QuestionId),

    /// Trigger with no flags
    #[error("rule {0} has an empty trigger")]
    EmptyTrigger(RuleId),

    /// At-least trigger with count zero
    #[error("rule {0} has an at-least trigger with count 0")]
    ZeroCount(RuleId),

    /// Weighted combiner weight outside [0, 1]
    #[error("confidence completeness weight out of range: {0}")]
    ConfidenceWeight(f64),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleTrigger;

    fn minimal_config() -> ScoringConfig {
        ScoringConfig {
            points: BTreeMap::new(),
            domains: BTreeMap::from([(DomainId::new("mobility"), 2.0)]),
            tiers: vec![
                TierBand { upper: Some(4.0), tier: Tier::Independent },
                TierBand { upper: Some(9.0), tier: Tier::InHomeSupport },
                TierBand { upper: None, tier: Tier::AssistedLiving },
            ],
            overrides: vec![],
            modifiers: vec![],
            confidence: ConfidenceRule::default(),
        }
    }

    #[test]
    fn valid_config_passes() {
        minimal_config().validate().unwrap();
    }

    #[test]
    fn reject_weight_out_of_range() {
        let mut config = minimal_config();
        config.domains.insert(DomainId::new("cognition"), 4.5);
        assert!(matches!(
            config.validate(),
            Err(ScoringConfigError::WeightRange { .. })
        ));
    }

    #[test]
    fn reject_unsorted_thresholds() {
        let mut config = minimal_config();
        config.tiers[1].upper = Some(2.0);
        assert!(matches!(
            config.validate(),
            Err(ScoringConfigError::ThresholdOrder)
        ));
    }

    #[test]
    fn reject_bounded_tail() {
        let mut config = minimal_config();
        config.tiers[2].upper = Some(99.0);
        assert!(matches!(
            config.validate(),
            Err(ScoringConfigError::UnboundedTail)
        ));
    }

    #[test]
    fn reject_non_escalating_bands() {
        let mut config = minimal_config();
        config.tiers[1].tier = Tier::Independent;
        assert!(matches!(config.validate(), Err(ScoringConfigError::BandOrder)));
    }

    #[test]
    fn reject_empty_trigger() {
        let mut config = minimal_config();
        config.overrides.push(OverrideRule {
            id: RuleId::new("hollow"),
            trigger: RuleTrigger::AllOf(vec![]),
            floor: Tier::AssistedLiving,
            reason: String::new(),
        });
        assert!(matches!(
            config.validate(),
            Err(ScoringConfigError::EmptyTrigger(_))
        ));
    }

    #[test]
    fn tier_for_walks_bands_in_order() {
        let config = minimal_config();
        assert_eq!(config.tier_for(0.0), Some(Tier::Independent));
        assert_eq!(config.tier_for(4.0), Some(Tier::InHomeSupport));
        assert_eq!(config.tier_for(8.9), Some(Tier::InHomeSupport));
        assert_eq!(config.tier_for(50.0), Some(Tier::AssistedLiving));
    }

    #[test]
    fn point_rule_by_value() {
        let rule = PointRule::ByValue(BTreeMap::from([
            ("walker".to_string(), 2.0),
            ("true".to_string(), 1.0),
        ]));
        assert_eq!(rule.points_for(&AnswerValue::from("walker")), 2.0);
        assert_eq!(rule.points_for(&AnswerValue::from("pogo")), 0.0);
        assert_eq!(rule.points_for(&AnswerValue::Bool(true)), 1.0);
        assert_eq!(rule.points_for(&AnswerValue::Bool(false)), 0.0);
    }

    #[test]
    fn point_rule_by_count_banding() {
        let rule = PointRule::ByCount(vec![
            CountBand { min_count: 1, points: 1.0 },
            CountBand { min_count: 3, points: 2.0 },
            CountBand { min_count: 5, points: 3.0 },
        ]);
        assert_eq!(rule.points_for(&AnswerValue::Multi(vec![])), 0.0);
        assert_eq!(rule.points_for(&AnswerValue::from(vec!["a", "b"])), 1.0);
        assert_eq!(rule.points_for(&AnswerValue::from(vec!["a", "b", "c", "d"])), 2.0);
        assert_eq!(
            rule.points_for(&AnswerValue::from(vec!["a", "b", "c", "d", "e", "f"])),
            3.0
        );
    }

    #[test]
    fn point_rule_by_range() {
        let rule = PointRule::ByRange(vec![
            RangeBand { min: 1.0, points: 1.0 },
            RangeBand { min: 3.0, points: 3.0 },
        ]);
        assert_eq!(rule.points_for(&AnswerValue::Number(0.0)), 0.0);
        assert_eq!(rule.points_for(&AnswerValue::Number(2.0)), 1.0);
        assert_eq!(rule.points_for(&AnswerValue::Number(7.0)), 3.0);
    }

    #[test]
    fn config_json_round_trip() {
        let raw = r#"{
            "points": {
                "walking": {"by_value": {"walker": 2.0, "unaided": 0.0}},
                "adl_help": {"by_count": [{"min_count": 1, "points": 1.0}]}
            },
            "domains": {"mobility": 2.0},
            "tiers": [
                {"upper": 4.0, "tier": "independent"},
                {"tier": "in_home_support"}
            ],
            "overrides": [{
                "id": "toileting-availability",
                "trigger": {"all_of": ["needs_toileting_help"]},
                "floor": "assisted_living",
                "reason": "Toileting assistance requires someone available"
            }],
            "modifiers": [{
                "id": "compounding-risk",
                "trigger": {"at_least": {"count": 2, "flags": ["a", "b"]}},
                "effect": {"raise": 1}
            }]
        }"#;
        let config = ScoringConfig::from_json(raw).unwrap();
        assert_eq!(config.points.len(), 2);
        assert_eq!(config.overrides.len(), 1);

        let round: ScoringConfig =
            serde_json::from_str(&serde_json::to_string(&config).unwrap()).unwrap();
        assert_eq!(round, config);
    }
}
