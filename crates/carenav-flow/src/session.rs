//! Assessment session state machine
//!
//! One session walks one user through one manifest. The session owns the
//! [`AnswerSet`] exclusively; visibility is re-derived from the answers on
//! every operation rather than cached, so going back and changing an
//! earlier answer immediately reshapes the rest of the walk.

use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use carenav_manifest::{AnswerSet, AnswerValue, ModuleManifest, QuestionId, Section, SectionId};

use crate::error::FlowError;
use crate::visibility::{
    applicable_questions, effective_answers, visible_questions, visible_sections,
};

/// Session lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// No answers submitted yet
    NotStarted,

    /// At least one submission, walk not finished
    InProgress,

    /// Advanced past the last visible step
    Completed,
}

/// Phases reachable from `from`
#[must_use]
pub fn allowed_transitions(from: Phase) -> Vec<Phase> {
    use Phase::*;
    match from {
        NotStarted => vec![InProgress, NotStarted],
        InProgress => vec![InProgress, Completed, NotStarted],
        Completed => vec![InProgress, NotStarted],
    }
}

fn allowed(from: Phase, to: Phase) -> bool {
    allowed_transitions(from).into_iter().any(|p| p == to)
}

/// Validate a phase transition
///
/// # Errors
/// Returns [`FlowError::IllegalTransition`] for anything outside the
/// allowed table.
pub fn validate_transition(from: Phase, to: Phase) -> Result<(), FlowError> {
    if allowed(from, to) {
        Ok(())
    } else {
        Err(FlowError::IllegalTransition { from, to })
    }
}

/// Unique session identity, for logs and correlation only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Display for SessionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One user's walk through one assessment module
///
/// Single-threaded by design: there are no concurrent writers to a
/// session's answers, and every operation is synchronous and in-memory.
#[derive(Debug, Clone)]
pub struct AssessmentSession {
    id: SessionId,
    manifest: Arc<ModuleManifest>,
    answers: AnswerSet,
    cursor: usize,
    phase: Phase,
}

impl AssessmentSession {
    /// Start a fresh session over a shared manifest
    #[must_use]
    pub fn new(manifest: Arc<ModuleManifest>) -> Self {
        let id = SessionId::generate();
        debug!(session = %id, module = %manifest.module.id, "session created");
        Self {
            id,
            manifest,
            answers: AnswerSet::new(),
            cursor: 0,
            phase: Phase::NotStarted,
        }
    }

    /// Session identity
    #[inline]
    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Current lifecycle phase
    #[inline]
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The manifest this session walks
    #[inline]
    #[must_use]
    pub fn manifest(&self) -> &Arc<ModuleManifest> {
        &self.manifest
    }

    /// All answers collected so far, including ones for now-hidden steps
    #[inline]
    #[must_use]
    pub fn answers(&self) -> &AnswerSet {
        &self.answers
    }

    /// Ordered list of currently visible steps
    #[must_use]
    pub fn visible_steps(&self) -> Vec<&Section> {
        visible_sections(&self.manifest, &self.answers)
    }

    /// The step the cursor currently points at
    #[must_use]
    pub fn current_step(&self) -> Option<&Section> {
        let steps = self.visible_steps();
        if steps.is_empty() {
            return None;
        }
        let index = self.cursor.min(steps.len() - 1);
        steps.get(index).copied()
    }

    /// Submit answers for one step
    ///
    /// Values are merged into the answer set, overwriting prior answers
    /// for revisited questions. Flags are **not** derived here: the flag
    /// set is recomputed from scratch at scoring time, which is what makes
    /// resubmission idempotent.
    ///
    /// # Errors
    /// Rejects unknown or hidden steps, questions that do not belong to
    /// the step, shape-mismatched values, and undeclared option values.
    /// Nothing is merged if any submitted answer is rejected.
    pub fn submit(
        &mut self,
        step_id: &SectionId,
        step_answers: Vec<(QuestionId, AnswerValue)>,
    ) -> Result<(), FlowError> {
        if self.phase == Phase::Completed {
            return Err(FlowError::SessionComplete);
        }
        let section = self
            .manifest
            .section(step_id)
            .ok_or_else(|| FlowError::UnknownStep(step_id.clone()))?;
        if !crate::visibility::section_visible(section, &self.answers) {
            return Err(FlowError::HiddenStep(step_id.clone()));
        }

        // validate everything before merging anything
        for (question_id, value) in &step_answers {
            let question = section
                .questions
                .iter()
                .find(|q| &q.id == question_id)
                .ok_or_else(|| FlowError::ForeignQuestion {
                    step: step_id.clone(),
                    question: question_id.clone(),
                })?;
            if !question.accepts(value) {
                return Err(FlowError::ValueShape {
                    question: question_id.clone(),
                    kind: question.kind,
                });
            }
            for selected in value.selected_values() {
                if question.kind.has_options() && question.option(selected).is_none() {
                    return Err(FlowError::UnknownOption {
                        question: question_id.clone(),
                        value: selected.to_string(),
                    });
                }
            }
        }

        if self.phase == Phase::NotStarted {
            validate_transition(self.phase, Phase::InProgress)?;
            self.phase = Phase::InProgress;
        }
        for (question_id, value) in step_answers {
            self.answers.insert(question_id, value);
        }
        debug!(session = %self.id, step = %step_id, "answers submitted");
        Ok(())
    }

    /// Move to the next visible step
    ///
    /// Leaving a form step requires every visible required question of that
    /// step to be answered; otherwise [`FlowError::IncompleteAnswers`] is
    /// returned and the cursor stays put (recoverable). Advancing past the
    /// last visible step completes the session.
    ///
    /// # Errors
    /// [`FlowError::IncompleteAnswers`] (recoverable) or
    /// [`FlowError::SessionComplete`].
    pub fn advance(&mut self) -> Result<Phase, FlowError> {
        if self.phase == Phase::Completed {
            return Err(FlowError::SessionComplete);
        }
        let (step_count, index, current_id, missing) = {
            let steps = self.visible_steps();
            if steps.is_empty() {
                (0, 0, None, Vec::new())
            } else {
                let index = self.cursor.min(steps.len() - 1);
                let current = steps[index];
                (
                    steps.len(),
                    index,
                    Some(current.id.clone()),
                    self.missing_required(current),
                )
            }
        };
        let Some(current_id) = current_id else {
            validate_transition(self.phase, Phase::Completed)?;
            self.phase = Phase::Completed;
            return Ok(self.phase);
        };
        if !missing.is_empty() {
            return Err(FlowError::IncompleteAnswers {
                step: current_id,
                missing,
            });
        }

        if self.phase == Phase::NotStarted {
            validate_transition(self.phase, Phase::InProgress)?;
            self.phase = Phase::InProgress;
        }

        if index + 1 >= step_count {
            validate_transition(self.phase, Phase::Completed)?;
            self.phase = Phase::Completed;
            debug!(session = %self.id, "session completed");
        } else {
            self.cursor = index + 1;
            debug!(session = %self.id, from = %current_id, "advanced");
        }
        Ok(self.phase)
    }

    /// Move to the previous visible step
    ///
    /// Stepping back from a completed session reopens it. At the first
    /// step, `back` is a no-op.
    pub fn back(&mut self) {
        if self.phase == Phase::Completed {
            self.phase = Phase::InProgress;
            let last = self.visible_steps().len().saturating_sub(1);
            self.cursor = last;
            debug!(session = %self.id, "session reopened");
            return;
        }
        self.cursor = self.cursor.saturating_sub(1);
    }

    /// Discard every answer and return to the beginning
    pub fn restart(&mut self) {
        self.answers.clear();
        self.cursor = 0;
        self.phase = Phase::NotStarted;
        debug!(session = %self.id, "session restarted");
    }

    /// Answers restricted to currently visible steps and questions
    ///
    /// This is the projection scoring consumes; answers retained for
    /// hidden steps never appear here.
    #[must_use]
    pub fn effective_answers(&self) -> AnswerSet {
        effective_answers(&self.manifest, &self.answers)
    }

    /// (answered, applicable) counts for the completeness ratio
    #[must_use]
    pub fn completeness_counts(&self) -> (usize, usize) {
        let applicable = applicable_questions(&self.manifest, &self.answers);
        let answered = applicable
            .iter()
            .filter(|q| self.answers.contains(&q.id))
            .count();
        (answered, applicable.len())
    }

    fn missing_required(&self, section: &Section) -> Vec<QuestionId> {
        visible_questions(section, &self.answers)
            .into_iter()
            .filter(|q| q.required && !self.answers.contains(&q.id))
            .map(|q| q.id.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carenav_manifest::ManifestLoader;
    use pretty_assertions::assert_eq;

    fn manifest() -> Arc<ModuleManifest> {
        Arc::new(
            ManifestLoader::from_json(
                r#"{
                "module": {"id": "care-needs", "version": "1.0.0"},
                "sections": [
                    {"id": "intro", "kind": "info", "title": "Welcome"},
                    {"id": "living", "kind": "form", "questions": [
                        {"id": "lives_alone", "kind": "boolean"},
                        {"id": "notes", "kind": "number", "required": false}
                    ]},
                    {"id": "support", "kind": "form",
                     "visible_if": {"all": [{"field": "lives_alone", "equals": true}]},
                     "questions": [
                        {"id": "visitors", "kind": "single_select", "options": [
                            {"value": "daily"}, {"value": "rarely"}
                        ]}
                    ]},
                    {"id": "results", "kind": "results"}
                ]
            }"#,
            )
            .unwrap(),
        )
    }

    #[test]
    fn fresh_session_is_not_started() {
        let session = AssessmentSession::new(manifest());
        assert_eq!(session.phase(), Phase::NotStarted);
        assert_eq!(session.current_step().unwrap().id, SectionId::new("intro"));
    }

    #[test]
    fn submit_moves_to_in_progress() {
        let mut session = AssessmentSession::new(manifest());
        session
            .submit(
                &SectionId::new("living"),
                vec![(QuestionId::new("lives_alone"), AnswerValue::Bool(false))],
            )
            .unwrap();
        assert_eq!(session.phase(), Phase::InProgress);
    }

    #[test]
    fn submit_rejects_unknown_step() {
        let mut session = AssessmentSession::new(manifest());
        let err = session.submit(&SectionId::new("ghost"), vec![]).unwrap_err();
        assert!(matches!(err, FlowError::UnknownStep(_)));
    }

    #[test]
    fn submit_rejects_hidden_step() {
        let mut session = AssessmentSession::new(manifest());
        let err = session
            .submit(
                &SectionId::new("support"),
                vec![(QuestionId::new("visitors"), AnswerValue::from("daily"))],
            )
            .unwrap_err();
        assert!(matches!(err, FlowError::HiddenStep(_)));
    }

    #[test]
    fn submit_rejects_foreign_question() {
        let mut session = AssessmentSession::new(manifest());
        let err = session
            .submit(
                &SectionId::new("living"),
                vec![(QuestionId::new("visitors"), AnswerValue::from("daily"))],
            )
            .unwrap_err();
        assert!(matches!(err, FlowError::ForeignQuestion { .. }));
    }

    #[test]
    fn submit_rejects_shape_mismatch_atomically() {
        let mut session = AssessmentSession::new(manifest());
        let err = session
            .submit(
                &SectionId::new("living"),
                vec![
                    (QuestionId::new("lives_alone"), AnswerValue::Bool(true)),
                    (QuestionId::new("notes"), AnswerValue::from("oops")),
                ],
            )
            .unwrap_err();
        assert!(matches!(err, FlowError::ValueShape { .. }));
        // the valid answer in the same batch must not have been merged
        assert!(session.answers().is_empty());
        assert_eq!(session.phase(), Phase::NotStarted);
    }

    #[test]
    fn submit_rejects_undeclared_option() {
        let mut session = AssessmentSession::new(manifest());
        session
            .submit(
                &SectionId::new("living"),
                vec![(QuestionId::new("lives_alone"), AnswerValue::Bool(true))],
            )
            .unwrap();
        let err = session
            .submit(
                &SectionId::new("support"),
                vec![(QuestionId::new("visitors"), AnswerValue::from("hourly"))],
            )
            .unwrap_err();
        assert!(matches!(err, FlowError::UnknownOption { .. }));
    }

    #[test]
    fn advance_blocks_on_missing_required() {
        let mut session = AssessmentSession::new(manifest());
        session.advance().unwrap(); // intro -> living
        let err = session.advance().unwrap_err();
        let FlowError::IncompleteAnswers { step, missing } = &err else {
            panic!("expected incomplete answers, got {err:?}");
        };
        assert_eq!(step, &SectionId::new("living"));
        assert_eq!(missing, &vec![QuestionId::new("lives_alone")]);
        assert!(err.is_recoverable());

        // still on the same step; answering unblocks
        session
            .submit(
                &SectionId::new("living"),
                vec![(QuestionId::new("lives_alone"), AnswerValue::Bool(false))],
            )
            .unwrap();
        session.advance().unwrap();
    }

    #[test]
    fn full_walk_to_completion() {
        let mut session = AssessmentSession::new(manifest());
        session.advance().unwrap(); // intro -> living
        session
            .submit(
                &SectionId::new("living"),
                vec![(QuestionId::new("lives_alone"), AnswerValue::Bool(true))],
            )
            .unwrap();
        session.advance().unwrap(); // living -> support (visible now)
        session
            .submit(
                &SectionId::new("support"),
                vec![(QuestionId::new("visitors"), AnswerValue::from("rarely"))],
            )
            .unwrap();
        session.advance().unwrap(); // support -> results
        assert_eq!(session.advance().unwrap(), Phase::Completed);
        assert!(session.advance().is_err());
    }

    #[test]
    fn back_changes_visibility_and_retains_answers() {
        let mut session = AssessmentSession::new(manifest());
        session.advance().unwrap();
        session
            .submit(
                &SectionId::new("living"),
                vec![(QuestionId::new("lives_alone"), AnswerValue::Bool(true))],
            )
            .unwrap();
        session.advance().unwrap();
        session
            .submit(
                &SectionId::new("support"),
                vec![(QuestionId::new("visitors"), AnswerValue::from("rarely"))],
            )
            .unwrap();

        // go back and flip the gating answer
        session.back();
        session
            .submit(
                &SectionId::new("living"),
                vec![(QuestionId::new("lives_alone"), AnswerValue::Bool(false))],
            )
            .unwrap();

        // raw answers retained, effective answers exclude the hidden step
        assert!(session.answers().contains(&QuestionId::new("visitors")));
        let effective = session.effective_answers();
        assert!(!effective.contains(&QuestionId::new("visitors")));
    }

    #[test]
    fn back_reopens_completed_session() {
        let mut session = AssessmentSession::new(manifest());
        session.advance().unwrap();
        session
            .submit(
                &SectionId::new("living"),
                vec![(QuestionId::new("lives_alone"), AnswerValue::Bool(false))],
            )
            .unwrap();
        session.advance().unwrap(); // living -> results (support hidden)
        assert_eq!(session.advance().unwrap(), Phase::Completed);

        session.back();
        assert_eq!(session.phase(), Phase::InProgress);
    }

    #[test]
    fn restart_clears_everything() {
        let mut session = AssessmentSession::new(manifest());
        session
            .submit(
                &SectionId::new("living"),
                vec![(QuestionId::new("lives_alone"), AnswerValue::Bool(true))],
            )
            .unwrap();
        session.restart();
        assert_eq!(session.phase(), Phase::NotStarted);
        assert!(session.answers().is_empty());
    }

    #[test]
    fn completeness_counts_follow_visibility() {
        let mut session = AssessmentSession::new(manifest());
        // living visible: lives_alone + notes applicable
        assert_eq!(session.completeness_counts(), (0, 2));

        session
            .submit(
                &SectionId::new("living"),
                vec![(QuestionId::new("lives_alone"), AnswerValue::Bool(true))],
            )
            .unwrap();
        // support now visible: three applicable, one answered
        assert_eq!(session.completeness_counts(), (1, 3));
    }

    #[test]
    fn transition_table() {
        assert!(validate_transition(Phase::NotStarted, Phase::InProgress).is_ok());
        assert!(validate_transition(Phase::Completed, Phase::InProgress).is_ok());
        assert!(validate_transition(Phase::NotStarted, Phase::Completed).is_err());
    }
}
