//! Manifest parsing and fail-fast validation
//!
//! `load` is a pure parse + validate: either the whole document is
//! structurally sound and becomes a [`ModuleManifest`], or loading fails
//! with the first [`ManifestError`] found. There is no partial or
//! best-effort load.

use std::collections::HashSet;

use tracing::debug;

use crate::ids::{QuestionId, SectionId};
use crate::manifest::{ModuleManifest, Question, QuestionKind, Section, SectionKind};

/// Errors raised while loading a manifest document
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    /// Document is not valid JSON
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Document is not valid YAML
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Module id or version missing
    #[error("module header is incomplete: {0}")]
    IncompleteHeader(String),

    /// No sections declared
    #[error("module {0} declares no sections")]
    NoSections(String),

    /// Section id repeated
    #[error("duplicate section id: {0}")]
    DuplicateSection(SectionId),

    /// Question id repeated
    #[error("duplicate question id: {0}")]
    DuplicateQuestion(QuestionId),

    /// Option value repeated within one question
    #[error("duplicate option value {value:?} on question {question}")]
    DuplicateOption {
        /// Owning question
        question: QuestionId,
        /// Repeated value
        value: String,
    },

    /// Info/results section carries questions, or form section has none
    #[error("section {section} of kind {kind:?} {problem}")]
    SectionShape {
        /// Offending section
        section: SectionId,
        /// Declared kind
        kind: SectionKind,
        /// What is wrong
        problem: &'static str,
    },

    /// Select question without options, or options on a non-select question
    #[error("question {question} of kind {kind:?} {problem}")]
    QuestionShape {
        /// Offending question
        question: QuestionId,
        /// Declared kind
        kind: QuestionKind,
        /// What is wrong
        problem: &'static str,
    },

    /// Empty id where one is required
    #[error("empty id on {0}")]
    EmptyId(String),

    /// Predicate names a question that does not exist
    #[error("predicate on {at} references unknown question {field}")]
    UnknownPredicateField {
        /// Location of the predicate
        at: String,
        /// Missing question
        field: QuestionId,
    },

    /// Predicate names a question that occurs later in step order
    #[error("predicate on {at} references {field}, which does not occur earlier in step order")]
    ForwardReference {
        /// Location of the predicate
        at: String,
        /// Forward-referenced question
        field: QuestionId,
    },
}

/// Loads and validates manifest documents
#[derive(Debug, Clone, Copy, Default)]
pub struct ManifestLoader;

impl ManifestLoader {
    /// Parse and validate a JSON manifest document
    ///
    /// # Errors
    /// Returns the first structural problem found; nothing is loaded
    /// partially.
    pub fn from_json(raw: &str) -> Result<ModuleManifest, ManifestError> {
        let manifest: ModuleManifest = serde_json::from_str(raw)?;
        Self::validate(&manifest)?;
        debug!(
            module = %manifest.module.id,
            version = %manifest.module.version,
            sections = manifest.sections.len(),
            "manifest loaded"
        );
        Ok(manifest)
    }

    /// Parse and validate a YAML manifest document
    ///
    /// # Errors
    /// Returns the first structural problem found; nothing is loaded
    /// partially.
    pub fn from_yaml(raw: &str) -> Result<ModuleManifest, ManifestError> {
        let manifest: ModuleManifest = serde_yaml::from_str(raw)?;
        Self::validate(&manifest)?;
        debug!(
            module = %manifest.module.id,
            version = %manifest.module.version,
            sections = manifest.sections.len(),
            "manifest loaded"
        );
        Ok(manifest)
    }

    /// Validate an already-parsed manifest
    ///
    /// Checks, in order: header completeness, unique section/question ids,
    /// section and question shape, option uniqueness, and that every
    /// predicate references only questions occurring strictly earlier in
    /// step order (a section gate may not read its own questions).
    ///
    /// # Errors
    /// Returns the first violation found.
    pub fn validate(manifest: &ModuleManifest) -> Result<(), ManifestError> {
        if manifest.module.id.is_empty() {
            return Err(ManifestError::IncompleteHeader("id is empty".to_string()));
        }
        if manifest.module.version.is_empty() {
            return Err(ManifestError::IncompleteHeader(format!(
                "module {} has no version",
                manifest.module.id
            )));
        }
        if manifest.sections.is_empty() {
            return Err(ManifestError::NoSections(manifest.module.id.to_string()));
        }

        let mut section_ids = HashSet::new();
        let mut question_ids = HashSet::new();
        for section in &manifest.sections {
            if section.id.is_empty() {
                return Err(ManifestError::EmptyId("a section".to_string()));
            }
            if !section_ids.insert(section.id.clone()) {
                return Err(ManifestError::DuplicateSection(section.id.clone()));
            }
            check_section_shape(section)?;
            for question in &section.questions {
                if question.id.is_empty() {
                    return Err(ManifestError::EmptyId(format!("a question in section {}", section.id)));
                }
                if !question_ids.insert(question.id.clone()) {
                    return Err(ManifestError::DuplicateQuestion(question.id.clone()));
                }
                check_question_shape(question)?;
            }
        }

        check_predicate_order(manifest)?;
        Ok(())
    }
}

fn check_section_shape(section: &Section) -> Result<(), ManifestError> {
    if section.kind.carries_questions() {
        if section.questions.is_empty() {
            return Err(ManifestError::SectionShape {
                section: section.id.clone(),
                kind: section.kind,
                problem: "has no questions",
            });
        }
    } else if !section.questions.is_empty() {
        return Err(ManifestError::SectionShape {
            section: section.id.clone(),
            kind: section.kind,
            problem: "must not contain questions",
        });
    }
    Ok(())
}

fn check_question_shape(question: &Question) -> Result<(), ManifestError> {
    if question.kind.has_options() {
        if question.options.is_empty() {
            return Err(ManifestError::QuestionShape {
                question: question.id.clone(),
                kind: question.kind,
                problem: "declares no options",
            });
        }
        let mut values = HashSet::new();
        for option in &question.options {
            if !values.insert(option.value.as_str()) {
                return Err(ManifestError::DuplicateOption {
                    question: question.id.clone(),
                    value: option.value.clone(),
                });
            }
            if option.flags.iter().any(|f| f.is_empty()) {
                return Err(ManifestError::EmptyId(format!(
                    "a flag on question {}",
                    question.id
                )));
            }
        }
    } else if !question.options.is_empty() {
        return Err(ManifestError::QuestionShape {
            question: question.id.clone(),
            kind: question.kind,
            problem: "must not declare options",
        });
    }
    Ok(())
}

/// Enforce the acyclic-by-construction invariant: every predicate field
/// must name a question answered before the predicate can be evaluated.
fn check_predicate_order(manifest: &ModuleManifest) -> Result<(), ManifestError> {
    let all_ids: HashSet<&QuestionId> = manifest.questions().map(|q| &q.id).collect();
    let mut earlier: HashSet<&QuestionId> = HashSet::new();

    for section in &manifest.sections {
        // A section gate is evaluated before any of its own questions are
        // answered, so it may only read strictly earlier sections.
        if let Some(predicate) = &section.visible_if {
            for field in predicate.fields() {
                check_field(field, &all_ids, &earlier, &format!("section {}", section.id))?;
            }
        }

        let mut in_section: HashSet<&QuestionId> = HashSet::new();
        for question in &section.questions {
            if let Some(predicate) = &question.visible_if {
                for field in predicate.fields() {
                    if in_section.contains(field) {
                        continue;
                    }
                    check_field(field, &all_ids, &earlier, &format!("question {}", question.id))?;
                }
            }
            in_section.insert(&question.id);
        }
        earlier.extend(in_section);
    }
    Ok(())
}

fn check_field(
    field: &QuestionId,
    all_ids: &HashSet<&QuestionId>,
    earlier: &HashSet<&QuestionId>,
    at: &str,
) -> Result<(), ManifestError> {
    if !all_ids.contains(field) {
        return Err(ManifestError::UnknownPredicateField {
            at: at.to_string(),
            field: field.clone(),
        });
    }
    if !earlier.contains(field) {
        return Err(ManifestError::ForwardReference {
            at: at.to_string(),
            field: field.clone(),
        });
    }
    Ok(())
}
