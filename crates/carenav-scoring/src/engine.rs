//! The scoring pass
//!
//! `score` is the deterministic pipeline: per-question points, weighted
//! domain aggregation, base-tier mapping, override floors, modifier
//! escalations, confidence, rationale. It is pure and synchronous; any
//! failure surfaces as [`ScoringError`] and nothing partial escapes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use carenav_flow::visibility::applicable_questions;
use carenav_manifest::{AnswerSet, DomainId, FlagId, ModuleManifest, QuestionId};

use crate::config::{ConfidenceCombiner, ScoringConfig, TierBand};
use crate::flags::FlagSet;
use crate::rules::{ModifierEffect, RuleId};
use crate::tier::Tier;

/// Everything a scoring pass produces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringResult {
    /// Tier the weighted score mapped to before rules ran
    pub base_tier: Tier,

    /// Tier after override floors and modifier escalations; never below
    /// `base_tier`
    pub final_tier: Tier,

    /// Sum of weighted domain subtotals
    pub raw_score: f64,

    /// Weighted subtotal per configured domain
    pub domain_scores: BTreeMap<DomainId, f64>,

    /// Combined confidence, within `[0, 1]`
    pub confidence: f64,

    /// Human-readable account of what drove the result
    pub rationale: Vec<String>,

    /// Override rules that fired, in rule order
    pub overrides_applied: Vec<RuleId>,

    /// Modifier rules that fired, in rule order
    pub modifiers_applied: Vec<RuleId>,
}

/// Errors raised during a scoring pass
///
/// A scoring error aborts the run; no Outcome may be published from a
/// failed pass.
#[derive(Debug, thiserror::Error)]
pub enum ScoringError {
    /// Flag set carries a key outside the manifest's declared vocabulary
    #[error("flag set contains undeclared flag {0}")]
    UndeclaredFlag(FlagId),

    /// Point rule references a question the manifest does not know;
    /// the config was bound against a different manifest
    #[error("point rule references unbound question {0}")]
    UnboundQuestion(QuestionId),

    /// Scored question lost its domain between bind and score
    #[error("scored question {0} has no domain")]
    MissingDomain(QuestionId),

    /// Weighted score left the finite range
    #[error("raw score {0} is not finite")]
    NonFiniteScore(f64),

    /// No tier band matched; the config escaped validation
    #[error("no tier band matches raw score {0}")]
    NoTierBand(f64),
}

/// Run the full scoring pipeline
///
/// `answers` must be the effective projection (hidden-step answers
/// excluded) and `flags` the set derived from those same answers.
///
/// # Errors
/// Any pipeline failure is returned as [`ScoringError`]; partial results
/// are never produced.
pub fn score(
    config: &ScoringConfig,
    manifest: &ModuleManifest,
    answers: &AnswerSet,
    flags: &FlagSet,
) -> Result<ScoringResult, ScoringError> {
    let declared = manifest.declared_flags();
    for (flag, _) in flags.iter() {
        if !declared.contains(flag) {
            return Err(ScoringError::UndeclaredFlag(flag.clone()));
        }
    }

    // 1 + 2: per-question points, aggregated per weighted domain
    let mut domain_scores: BTreeMap<DomainId, f64> = config
        .domains
        .keys()
        .map(|d| (d.clone(), 0.0))
        .collect();
    for (question_id, rule) in &config.points {
        let Some(answer) = answers.get(question_id) else {
            continue;
        };
        let points = rule.points_for(answer);
        if points == 0.0 {
            continue;
        }
        let question = manifest
            .question(question_id)
            .ok_or_else(|| ScoringError::UnboundQuestion(question_id.clone()))?;
        let domain = question
            .domain
            .as_ref()
            .ok_or_else(|| ScoringError::MissingDomain(question_id.clone()))?;
        let weight = config.domains.get(domain).copied().unwrap_or(1.0);
        *domain_scores.entry(domain.clone()).or_insert(0.0) += points * weight;
    }
    let raw_score: f64 = domain_scores.values().sum();
    if !raw_score.is_finite() {
        return Err(ScoringError::NonFiniteScore(raw_score));
    }

    // 3: base tier from the threshold table
    let base_tier = config
        .tier_for(raw_score)
        .ok_or(ScoringError::NoTierBand(raw_score))?;

    let mut rationale = Vec::new();
    let mut current = base_tier;

    // 4: override floors (escalation only)
    let mut overrides_applied = Vec::new();
    for rule in &config.overrides {
        if !rule.trigger.matches(flags) {
            continue;
        }
        current = current.max(rule.floor);
        overrides_applied.push(rule.id.clone());
        rationale.push(override_line(&rule.id, &rule.reason, rule.floor));
        debug!(rule = %rule.id, floor = rule.floor.label(), "override fired");
    }

    // 5: modifier escalations, bounded below by what overrides forced
    let mut modifiers_applied = Vec::new();
    for rule in &config.modifiers {
        if !rule.trigger.matches(flags) {
            continue;
        }
        current = match rule.effect {
            ModifierEffect::Raise(steps) => current.raise(steps),
            ModifierEffect::RaiseToMax => Tier::MAX,
        };
        modifiers_applied.push(rule.id.clone());
        rationale.push(modifier_line(&rule.id, &rule.reason, rule.effect));
        debug!(rule = %rule.id, tier = current.label(), "modifier fired");
    }
    let final_tier = current;

    // 6: confidence from completeness and boundary distance
    let (answered, applicable) = completeness_counts(manifest, answers);
    let completeness = if applicable == 0 {
        1.0
    } else {
        answered as f64 / applicable as f64
    };
    let boundary = boundary_distance(&config.tiers, raw_score);
    let confidence = combine(config.confidence.combine, completeness, boundary);

    // 7: top contributing domains
    if let Some(line) = domain_summary(&domain_scores) {
        rationale.push(line);
    }

    debug!(
        raw_score,
        base = base_tier.label(),
        fin = final_tier.label(),
        confidence,
        "scoring pass complete"
    );

    Ok(ScoringResult {
        base_tier,
        final_tier,
        raw_score,
        domain_scores,
        confidence,
        rationale,
        overrides_applied,
        modifiers_applied,
    })
}

fn override_line(id: &RuleId, reason: &str, floor: Tier) -> String {
    if reason.is_empty() {
        format!("Rule {id} enforces a minimum of {}", floor.label())
    } else {
        format!("{reason} (minimum: {})", floor.label())
    }
}

fn modifier_line(id: &RuleId, reason: &str, effect: ModifierEffect) -> String {
    let what = match effect {
        ModifierEffect::Raise(steps) => format!("raised {steps} tier step(s)"),
        ModifierEffect::RaiseToMax => format!("escalated to {}", Tier::MAX.label()),
    };
    if reason.is_empty() {
        format!("Rule {id}: {what}")
    } else {
        format!("{reason} ({what})")
    }
}

fn domain_summary(domain_scores: &BTreeMap<DomainId, f64>) -> Option<String> {
    let mut contributing: Vec<(&DomainId, f64)> = domain_scores
        .iter()
        .filter(|(_, score)| **score > 0.0)
        .map(|(domain, score)| (domain, *score))
        .collect();
    if contributing.is_empty() {
        return None;
    }
    contributing.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    let top: Vec<String> = contributing
        .iter()
        .take(2)
        .map(|(domain, score)| format!("{domain} ({score:.1})"))
        .collect();
    Some(format!("Strongest contributing domains: {}", top.join(", ")))
}

fn completeness_counts(manifest: &ModuleManifest, answers: &AnswerSet) -> (usize, usize) {
    let applicable = applicable_questions(manifest, answers);
    let answered = applicable
        .iter()
        .filter(|q| answers.contains(&q.id))
        .count();
    (answered, applicable.len())
}

/// Normalized distance of the score from the nearest tier threshold
///
/// 1.0 means the score sits comfortably inside a band, 0.0 means it sits
/// on a boundary. Normalization is against half the narrowest band, so a
/// score one band-half away from every threshold is maximally confident.
fn boundary_distance(tiers: &[TierBand], score: f64) -> f64 {
    let uppers: Vec<f64> = tiers.iter().filter_map(|band| band.upper).collect();
    if uppers.is_empty() {
        return 1.0;
    }
    let nearest = uppers
        .iter()
        .map(|threshold| (score - threshold).abs())
        .fold(f64::INFINITY, f64::min);

    let mut widths = vec![uppers[0]];
    widths.extend(uppers.windows(2).map(|pair| pair[1] - pair[0]));
    let half = widths.iter().copied().fold(f64::INFINITY, f64::min) / 2.0;
    if half <= 0.0 {
        return 0.0;
    }
    (nearest / half).clamp(0.0, 1.0)
}

fn combine(combiner: ConfidenceCombiner, completeness: f64, boundary: f64) -> f64 {
    let combined = match combiner {
        ConfidenceCombiner::Average => (completeness + boundary) / 2.0,
        ConfidenceCombiner::Min => completeness.min(boundary),
        ConfidenceCombiner::Weighted { completeness_weight } => {
            completeness_weight * completeness + (1.0 - completeness_weight) * boundary
        }
    };
    combined.clamp(0.0, 1.0)
}
