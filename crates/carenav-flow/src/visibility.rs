//! Visibility evaluation over the current answer set
//!
//! Everything here is a pure function of `(manifest, answers)` and is
//! re-evaluated on every answer change. Predicates follow the fail-closed
//! policy of [`carenav_manifest::Predicate`]: an unanswered gating field
//! hides the gated step or question.

use carenav_manifest::{AnswerSet, ModuleManifest, Question, Section};

/// The ordered list of currently visible steps
#[must_use]
pub fn visible_sections<'m>(manifest: &'m ModuleManifest, answers: &AnswerSet) -> Vec<&'m Section> {
    manifest
        .sections
        .iter()
        .filter(|section| section_visible(section, answers))
        .collect()
}

/// Whether one section is currently visible
#[inline]
#[must_use]
pub fn section_visible(section: &Section, answers: &AnswerSet) -> bool {
    section
        .visible_if
        .as_ref()
        .map_or(true, |p| p.evaluate(answers))
}

/// The currently visible questions of a section, in declaration order
#[must_use]
pub fn visible_questions<'m>(section: &'m Section, answers: &AnswerSet) -> Vec<&'m Question> {
    section
        .questions
        .iter()
        .filter(|question| question_visible(question, answers))
        .collect()
}

/// Whether one question is currently visible
#[inline]
#[must_use]
pub fn question_visible(question: &Question, answers: &AnswerSet) -> bool {
    question
        .visible_if
        .as_ref()
        .map_or(true, |p| p.evaluate(answers))
}

/// All currently applicable questions: visible questions of visible steps
///
/// This is the denominator of the answer-completeness ratio.
#[must_use]
pub fn applicable_questions<'m>(
    manifest: &'m ModuleManifest,
    answers: &AnswerSet,
) -> Vec<&'m Question> {
    visible_sections(manifest, answers)
        .into_iter()
        .flat_map(|section| visible_questions(section, answers))
        .collect()
}

/// Answers restricted to currently applicable questions
///
/// Answers collected for steps that later became hidden are retained in the
/// session but excluded here, so they never reach scoring.
#[must_use]
pub fn effective_answers(manifest: &ModuleManifest, answers: &AnswerSet) -> AnswerSet {
    let applicable: std::collections::HashSet<_> = applicable_questions(manifest, answers)
        .into_iter()
        .map(|q| q.id.clone())
        .collect();
    answers
        .iter()
        .filter(|(question, _)| applicable.contains(*question))
        .map(|(question, value)| (question.clone(), value.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use carenav_manifest::{AnswerValue, ManifestLoader, QuestionId, SectionId};

    fn manifest() -> ModuleManifest {
        ManifestLoader::from_json(
            r#"{
            "module": {"id": "care-needs", "version": "1.0.0"},
            "sections": [
                {"id": "living", "kind": "form", "questions": [
                    {"id": "lives_alone", "kind": "boolean"}
                ]},
                {"id": "support", "kind": "form",
                 "visible_if": {"all": [{"field": "lives_alone", "equals": true}]},
                 "questions": [
                    {"id": "visitors", "kind": "boolean"},
                    {"id": "visitor_help", "kind": "boolean",
                     "visible_if": {"all": [{"field": "visitors", "equals": true}]}}
                ]},
                {"id": "results", "kind": "results"}
            ]
        }"#,
        )
        .unwrap()
    }

    fn ids(sections: &[&Section]) -> Vec<String> {
        sections.iter().map(|s| s.id.to_string()).collect()
    }

    #[test]
    fn gated_section_hidden_until_answered() {
        let manifest = manifest();
        let answers = AnswerSet::new();
        // fail-closed: the gate field is unanswered
        assert_eq!(
            ids(&visible_sections(&manifest, &answers)),
            vec!["living", "results"]
        );
    }

    #[test]
    fn gated_section_appears_with_answer() {
        let manifest = manifest();
        let mut answers = AnswerSet::new();
        answers.insert(QuestionId::new("lives_alone"), AnswerValue::Bool(true));
        assert_eq!(
            ids(&visible_sections(&manifest, &answers)),
            vec!["living", "support", "results"]
        );
    }

    #[test]
    fn gated_question_within_section() {
        let manifest = manifest();
        let mut answers = AnswerSet::new();
        answers.insert(QuestionId::new("lives_alone"), AnswerValue::Bool(true));

        let support = manifest.section(&SectionId::new("support")).unwrap();
        let visible: Vec<_> = visible_questions(support, &answers)
            .iter()
            .map(|q| q.id.to_string())
            .collect();
        assert_eq!(visible, vec!["visitors"]);

        answers.insert(QuestionId::new("visitors"), AnswerValue::Bool(true));
        let visible: Vec<_> = visible_questions(support, &answers)
            .iter()
            .map(|q| q.id.to_string())
            .collect();
        assert_eq!(visible, vec!["visitors", "visitor_help"]);
    }

    #[test]
    fn effective_answers_drop_hidden_steps() {
        let manifest = manifest();
        let mut answers = AnswerSet::new();
        answers.insert(QuestionId::new("lives_alone"), AnswerValue::Bool(true));
        answers.insert(QuestionId::new("visitors"), AnswerValue::Bool(true));

        // changing the earlier answer hides the support section; its
        // answers stay in the set but drop out of the effective view
        answers.insert(QuestionId::new("lives_alone"), AnswerValue::Bool(false));
        assert_eq!(answers.len(), 2);

        let effective = effective_answers(&manifest, &answers);
        assert_eq!(effective.len(), 1);
        assert!(effective.contains(&QuestionId::new("lives_alone")));
        assert!(!effective.contains(&QuestionId::new("visitors")));
    }

    #[test]
    fn applicable_questions_follow_visibility() {
        let manifest = manifest();
        let answers = AnswerSet::new();
        assert_eq!(applicable_questions(&manifest, &answers).len(), 1);

        let mut answers = AnswerSet::new();
        answers.insert(QuestionId::new("lives_alone"), AnswerValue::Bool(true));
        assert_eq!(applicable_questions(&manifest, &answers).len(), 2);
    }
}
