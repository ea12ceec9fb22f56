//! Typed manifest schema
//!
//! The in-memory form of a versioned assessment module document. Loaded
//! once per version, validated fail-fast, then treated as read-only and
//! shared across sessions behind an `Arc`.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::answer::AnswerValue;
use crate::ids::{DomainId, FlagId, ModuleId, QuestionId, SectionId};
use crate::predicate::Predicate;

/// Module identity: id plus document version
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModuleHeader {
    /// Stable module id
    pub id: ModuleId,

    /// Document version string (e.g. "1.2.0")
    pub version: String,
}

/// A validated assessment module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleManifest {
    /// Module identity
    pub module: ModuleHeader,

    /// Ordered walk steps
    pub sections: Vec<Section>,
}

impl ModuleManifest {
    /// Find a section by id
    #[inline]
    #[must_use]
    pub fn section(&self, id: &SectionId) -> Option<&Section> {
        self.sections.iter().find(|s| &s.id == id)
    }

    /// Find a question by id, searching all sections
    #[must_use]
    pub fn question(&self, id: &QuestionId) -> Option<&Question> {
        self.questions().find(|q| &q.id == id)
    }

    /// Iterate all questions in document order
    pub fn questions(&self) -> impl Iterator<Item = &Question> {
        self.sections.iter().flat_map(|s| s.questions.iter())
    }

    /// The closed flag vocabulary declared by this manifest
    ///
    /// Every flag that can ever be set is declared on at least one option;
    /// scoring configuration referencing anything outside this set is
    /// rejected before runtime.
    #[must_use]
    pub fn declared_flags(&self) -> BTreeSet<FlagId> {
        self.questions()
            .flat_map(|q| q.options.iter())
            .flat_map(|o| o.flags.iter().cloned())
            .collect()
    }

    /// Domains referenced by questions, deduplicated
    #[must_use]
    pub fn declared_domains(&self) -> BTreeSet<DomainId> {
        self.questions()
            .filter_map(|q| q.domain.clone())
            .collect()
    }
}

/// One step of the assessment walk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Unique section id
    pub id: SectionId,

    /// Display title
    #[serde(default)]
    pub title: String,

    /// Step kind
    pub kind: SectionKind,

    /// Gate: section is visible only while this holds (fail-closed)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible_if: Option<Predicate>,

    /// Questions, non-empty exactly for `Form` sections
    #[serde(default)]
    pub questions: Vec<Question>,
}

/// Section kinds form the walk's vocabulary; anything else is rejected at
/// parse time rather than limping through scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    /// Informational interstitial, no questions
    Info,

    /// Question-bearing step
    Form,

    /// Terminal results step, no questions
    Results,
}

impl SectionKind {
    /// Whether sections of this kind carry questions
    #[inline]
    #[must_use]
    pub fn carries_questions(self) -> bool {
        matches!(self, Self::Form)
    }
}

/// A single question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Unique question id
    pub id: QuestionId,

    /// Display label
    #[serde(default)]
    pub label: String,

    /// Answer shape
    pub kind: QuestionKind,

    /// Scoring domain this question contributes to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<DomainId>,

    /// Unanswered required questions block advancement
    #[serde(default = "default_required")]
    pub required: bool,

    /// Declared options; the `flags` on each option form the declarative
    /// value-to-flag rule table
    #[serde(default)]
    pub options: Vec<AnswerOption>,

    /// Gate: question is asked only while this holds (fail-closed)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible_if: Option<Predicate>,
}

fn default_required() -> bool {
    true
}

impl Question {
    /// Find a declared option by value
    #[inline]
    #[must_use]
    pub fn option(&self, value: &str) -> Option<&AnswerOption> {
        self.options.iter().find(|o| o.value == value)
    }

    /// Whether an answer value has the right shape for this question
    #[must_use]
    pub fn accepts(&self, value: &AnswerValue) -> bool {
        matches!(
            (self.kind, value),
            (QuestionKind::SingleSelect, AnswerValue::Text(_))
                | (QuestionKind::MultiSelect, AnswerValue::Multi(_))
                | (QuestionKind::Number, AnswerValue::Number(_))
                | (QuestionKind::Boolean, AnswerValue::Bool(_))
        )
    }
}

/// Question answer shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    /// Exactly one option value
    SingleSelect,

    /// Zero or more option values
    MultiSelect,

    /// Free numeric entry
    Number,

    /// Yes/no
    Boolean,
}

impl QuestionKind {
    /// Whether questions of this kind declare options
    #[inline]
    #[must_use]
    pub fn has_options(self) -> bool {
        matches!(self, Self::SingleSelect | Self::MultiSelect)
    }
}

/// A declared option on a select question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerOption {
    /// Stable option value submitted as the answer
    pub value: String,

    /// Display label
    #[serde(default)]
    pub label: String,

    /// Flags set when this option is selected
    #[serde(default)]
    pub flags: Vec<FlagId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: &str, kind: QuestionKind, options: Vec<AnswerOption>) -> Question {
        Question {
            id: QuestionId::new(id),
            label: String::new(),
            kind,
            domain: None,
            required: true,
            options,
            visible_if: None,
        }
    }

    fn option(value: &str, flags: &[&str]) -> AnswerOption {
        AnswerOption {
            value: value.to_string(),
            label: String::new(),
            flags: flags.iter().map(|f| FlagId::new(*f)).collect(),
        }
    }

    #[test]
    fn question_accepts_matching_shapes() {
        let q = question("walking", QuestionKind::SingleSelect, vec![option("cane", &[])]);
        assert!(q.accepts(&AnswerValue::from("cane")));
        assert!(!q.accepts(&AnswerValue::Bool(true)));

        let q = question("falls", QuestionKind::Number, vec![]);
        assert!(q.accepts(&AnswerValue::Number(2.0)));
        assert!(!q.accepts(&AnswerValue::from("2")));
    }

    #[test]
    fn manifest_declared_flags_deduplicated() {
        let manifest = ModuleManifest {
            module: ModuleHeader {
                id: ModuleId::new("care-needs"),
                version: "1.0.0".to_string(),
            },
            sections: vec![Section {
                id: SectionId::new("mobility"),
                title: String::new(),
                kind: SectionKind::Form,
                visible_if: None,
                questions: vec![
                    question(
                        "walking",
                        QuestionKind::SingleSelect,
                        vec![option("wheelchair", &["uses_wheelchair"]), option("cane", &[])],
                    ),
                    question(
                        "falls",
                        QuestionKind::SingleSelect,
                        vec![option("several", &["multiple_falls", "uses_wheelchair"])],
                    ),
                ],
            }],
        };

        let flags: Vec<_> = manifest
            .declared_flags()
            .into_iter()
            .map(|f| f.to_string())
            .collect();
        assert_eq!(flags, vec!["multiple_falls", "uses_wheelchair"]);
    }

    #[test]
    fn manifest_question_lookup_across_sections() {
        let manifest = ModuleManifest {
            module: ModuleHeader {
                id: ModuleId::new("care-needs"),
                version: "1.0.0".to_string(),
            },
            sections: vec![
                Section {
                    id: SectionId::new("intro"),
                    title: String::new(),
                    kind: SectionKind::Info,
                    visible_if: None,
                    questions: vec![],
                },
                Section {
                    id: SectionId::new("mobility"),
                    title: String::new(),
                    kind: SectionKind::Form,
                    visible_if: None,
                    questions: vec![question("walking", QuestionKind::Boolean, vec![])],
                },
            ],
        };

        assert!(manifest.question(&QuestionId::new("walking")).is_some());
        assert!(manifest.question(&QuestionId::new("missing")).is_none());
        assert!(manifest.section(&SectionId::new("intro")).is_some());
    }

    #[test]
    fn section_kind_wire_names() {
        assert_eq!(serde_json::to_string(&SectionKind::Info).unwrap(), "\"info\"");
        assert_eq!(
            serde_json::to_string(&QuestionKind::SingleSelect).unwrap(),
            "\"single_select\""
        );
    }
}
