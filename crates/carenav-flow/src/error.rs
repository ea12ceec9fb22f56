//! Flow error types
//!
//! Two severities live here: [`FlowError::IncompleteAnswers`] is a normal,
//! recoverable interaction state (the walk simply does not advance), while
//! everything else indicates a caller bug or a manifest/session mismatch.

use carenav_manifest::{QuestionId, QuestionKind, SectionId};

use crate::session::Phase;

/// Errors raised by the assessment session state machine
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    /// Step id does not exist in the manifest
    #[error("unknown step: {0}")]
    UnknownStep(SectionId),

    /// Step exists but is hidden under the current answers
    #[error("step {0} is not currently visible")]
    HiddenStep(SectionId),

    /// Question submitted under a step it does not belong to
    #[error("question {question} does not belong to step {step}")]
    ForeignQuestion {
        /// Step that was submitted to
        step: SectionId,
        /// Question that does not belong there
        question: QuestionId,
    },

    /// Answer value shape does not match the question kind
    #[error("answer to {question} does not match question kind {kind:?}")]
    ValueShape {
        /// Question being answered
        question: QuestionId,
        /// Declared kind
        kind: QuestionKind,
    },

    /// Select answer uses a value the manifest never declared
    #[error("unknown option value {value:?} for question {question}")]
    UnknownOption {
        /// Question being answered
        question: QuestionId,
        /// Undeclared value
        value: String,
    },

    /// Required questions unanswered; advancement is blocked, nothing else
    #[error("step {step} has unanswered required questions: {missing:?}")]
    IncompleteAnswers {
        /// Step that cannot be left yet
        step: SectionId,
        /// Visible required questions still unanswered
        missing: Vec<QuestionId>,
    },

    /// Phase transition not in the allowed table
    #[error("illegal phase transition: {from:?} -> {to:?}")]
    IllegalTransition {
        /// Current phase
        from: Phase,
        /// Requested phase
        to: Phase,
    },

    /// Operation not valid on a completed session
    #[error("session is already complete")]
    SessionComplete,
}

impl FlowError {
    /// Whether the caller can recover by collecting more answers
    ///
    /// Only the required-question gate is recoverable; every other variant
    /// is a programming or manifest error.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::IncompleteAnswers { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incomplete_answers_is_recoverable() {
        let err = FlowError::IncompleteAnswers {
            step: SectionId::new("mobility"),
            missing: vec![QuestionId::new("walking")],
        };
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("mobility"));
    }

    #[test]
    fn other_errors_are_not_recoverable() {
        assert!(!FlowError::UnknownStep(SectionId::new("ghost")).is_recoverable());
        assert!(!FlowError::SessionComplete.is_recoverable());
    }
}
