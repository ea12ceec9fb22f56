//! Testing utilities for the CareNav workspace
//!
//! Shared fixtures: a realistic senior-care assessment manifest and one
//! tuned scoring configuration. The numeric thresholds here are a sample
//! tuning, not a canonical truth.

#![allow(missing_docs)]

use carenav_manifest::{AnswerSet, AnswerValue, ManifestLoader, ModuleManifest, QuestionId};
use carenav_scoring::ScoringConfig;

/// A realistic care-needs module: living situation, mobility, daily
/// living, cognition, with gated follow-up questions.
pub const SAMPLE_MANIFEST_JSON: &str = r#"{
    "module": {"id": "care-needs", "version": "1.2.0"},
    "sections": [
        {"id": "intro", "kind": "info", "title": "About this assessment"},
        {"id": "living", "kind": "form", "title": "Living situation", "questions": [
            {"id": "lives_alone", "label": "Who do they live with?", "kind": "single_select",
             "domain": "support_network", "options": [
                {"value": "alone", "label": "Lives alone", "flags": ["lives_alone"]},
                {"value": "with_partner", "label": "With a spouse or partner"},
                {"value": "with_family", "label": "With family"}
            ]},
            {"id": "visitors", "label": "How often does someone check in?", "kind": "single_select",
             "domain": "support_network",
             "visible_if": {"all": [{"field": "lives_alone", "equals": "alone"}]},
             "options": [
                {"value": "daily", "label": "Daily"},
                {"value": "weekly", "label": "A few times a week"},
                {"value": "rarely", "label": "Rarely", "flags": ["no_support_network"]}
            ]}
        ]},
        {"id": "mobility", "kind": "form", "title": "Getting around", "questions": [
            {"id": "walking", "label": "How do they get around?", "kind": "single_select",
             "domain": "mobility", "options": [
                {"value": "unaided", "label": "Without help"},
                {"value": "cane", "label": "With a cane"},
                {"value": "walker", "label": "With a walker", "flags": ["mobility_aid"]},
                {"value": "wheelchair", "label": "In a wheelchair", "flags": ["mobility_aid"]}
            ]},
            {"id": "falls", "label": "Falls in the last year?", "kind": "single_select",
             "domain": "mobility", "options": [
                {"value": "none", "label": "None"},
                {"value": "once", "label": "Once"},
                {"value": "several", "label": "More than once", "flags": ["multiple_falls"]}
            ]}
        ]},
        {"id": "daily_living", "kind": "form", "title": "Day-to-day help", "questions": [
            {"id": "adl_help", "label": "Which activities need help?", "kind": "multi_select",
             "domain": "daily_living", "required": false, "options": [
                {"value": "bathing", "label": "Bathing"},
                {"value": "dressing", "label": "Dressing"},
                {"value": "toileting", "label": "Toileting", "flags": ["needs_toileting_help"]},
                {"value": "eating", "label": "Eating"},
                {"value": "medication", "label": "Managing medication", "flags": ["medication_management"]}
            ]}
        ]},
        {"id": "cognition", "kind": "form", "title": "Memory and thinking", "questions": [
            {"id": "memory", "label": "Memory trouble?", "kind": "single_select",
             "domain": "cognition", "options": [
                {"value": "fine", "label": "No trouble"},
                {"value": "sometimes_forgetful", "label": "Sometimes forgetful"},
                {"value": "often_confused", "label": "Often confused", "flags": ["moderate_cognitive_decline"]},
                {"value": "severe_confusion", "label": "Severe confusion", "flags": ["severe_cognitive_decline"]}
            ]},
            {"id": "wandering", "label": "Wandering or getting lost?", "kind": "single_select",
             "domain": "cognition",
             "visible_if": {"any": [
                {"field": "memory", "in": ["often_confused", "severe_confusion"]}
             ]},
             "options": [
                {"value": "never", "label": "Never"},
                {"value": "sometimes", "label": "Sometimes", "flags": ["wandering_risk"]},
                {"value": "often", "label": "Often", "flags": ["wandering_risk"]}
            ]}
        ]},
        {"id": "results", "kind": "results", "title": "Recommendation"}
    ]
}"#;

/// One tuned scoring configuration for [`SAMPLE_MANIFEST_JSON`]
pub const SAMPLE_CONFIG_JSON: &str = r#"{
    "points": {
        "lives_alone": {"by_value": {"alone": 2.0, "with_partner": 0.0, "with_family": 0.0}},
        "visitors": {"by_value": {"daily": 0.0, "weekly": 1.0, "rarely": 2.0}},
        "walking": {"by_value": {"unaided": 0.0, "cane": 1.0, "walker": 2.0, "wheelchair": 3.0}},
        "falls": {"by_value": {"none": 0.0, "once": 1.0, "several": 2.0}},
        "adl_help": {"by_count": [
            {"min_count": 1, "points": 1.0},
            {"min_count": 3, "points": 2.0},
            {"min_count": 5, "points": 3.0}
        ]},
        "memory": {"by_value": {
            "fine": 0.0, "sometimes_forgetful": 1.0,
            "often_confused": 2.0, "severe_confusion": 4.0
        }},
        "wandering": {"by_value": {"never": 0.0, "sometimes": 1.0, "often": 2.0}}
    },
    "domains": {
        "mobility": 2.0,
        "daily_living": 2.0,
        "cognition": 3.0,
        "support_network": 2.0
    },
    "tiers": [
        {"upper": 2.0, "tier": "independent"},
        {"upper": 8.0, "tier": "in_home_support"},
        {"upper": 16.0, "tier": "assisted_living"},
        {"upper": 24.0, "tier": "memory_care"},
        {"tier": "skilled_nursing"}
    ],
    "overrides": [
        {
            "id": "toileting-availability",
            "trigger": {"all_of": ["needs_toileting_help"]},
            "floor": "assisted_living",
            "reason": "Toileting assistance requires someone available around the clock"
        },
        {
            "id": "severe-cognition-alone",
            "trigger": {"all_of": ["severe_cognitive_decline", "lives_alone"]},
            "floor": "memory_care",
            "reason": "Severe cognitive impairment without live-in support"
        }
    ],
    "modifiers": [
        {
            "id": "compounding-risk",
            "trigger": {"at_least": {"count": 2, "flags": [
                "moderate_cognitive_decline", "multiple_falls",
                "no_support_network", "medication_management", "mobility_aid"
            ]}},
            "effect": {"raise": 1},
            "reason": "Multiple co-occurring risk factors"
        },
        {
            "id": "pervasive-risk",
            "trigger": {"at_least": {"count": 3, "flags": [
                "moderate_cognitive_decline", "multiple_falls",
                "no_support_network", "medication_management", "mobility_aid"
            ]}},
            "effect": "raise_to_max",
            "reason": "Risk factors across most domains"
        }
    ],
    "confidence": {"combine": "average"}
}"#;

pub fn sample_manifest() -> ModuleManifest {
    ManifestLoader::from_json(SAMPLE_MANIFEST_JSON).expect("sample manifest is valid")
}

pub fn sample_config() -> ScoringConfig {
    ScoringConfig::from_json(SAMPLE_CONFIG_JSON).expect("sample config is valid")
}

/// Build an answer set from literal entries
pub fn answer_set(entries: &[(&str, AnswerValue)]) -> AnswerSet {
    entries
        .iter()
        .map(|(question, value)| (QuestionId::new(*question), value.clone()))
        .collect()
}

/// The lowest-risk complete answer set for the sample manifest
pub fn low_risk_answers() -> AnswerSet {
    answer_set(&[
        ("lives_alone", AnswerValue::from("with_family")),
        ("walking", AnswerValue::from("unaided")),
        ("falls", AnswerValue::from("none")),
        ("adl_help", AnswerValue::Multi(vec![])),
        ("memory", AnswerValue::from("fine")),
    ])
}
