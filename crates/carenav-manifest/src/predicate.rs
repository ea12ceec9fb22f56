//! Visibility predicates over prior answers
//!
//! A predicate is a boolean expression over answers to questions that occur
//! strictly earlier in step order (the loader enforces the ordering).
//!
//! # Fail-closed policy
//!
//! A condition referencing an unanswered question evaluates to **false**.
//! This is deliberate: a step gated on an answer the user has not given yet
//! stays hidden until the gating answer exists, rather than flashing into
//! view and disappearing again.

use serde::{Deserialize, Serialize};

use crate::answer::{AnswerSet, AnswerValue};
use crate::ids::QuestionId;

/// Boolean expression over prior answers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Predicate {
    /// True when at least one condition holds
    Any(Vec<Condition>),

    /// True when every condition holds
    All(Vec<Condition>),
}

impl Predicate {
    /// Evaluate against the current answer set (fail-closed)
    #[must_use]
    pub fn evaluate(&self, answers: &AnswerSet) -> bool {
        match self {
            Self::Any(conditions) => conditions.iter().any(|c| c.evaluate(answers)),
            Self::All(conditions) => conditions.iter().all(|c| c.evaluate(answers)),
        }
    }

    /// Question ids this predicate reads
    pub fn fields(&self) -> impl Iterator<Item = &QuestionId> {
        let conditions = match self {
            Self::Any(conditions) | Self::All(conditions) => conditions,
        };
        conditions.iter().map(|c| &c.field)
    }
}

/// A single field test within a predicate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// Question whose answer is tested
    pub field: QuestionId,

    /// The test applied to the answer
    #[serde(flatten)]
    pub test: ConditionTest,
}

impl Condition {
    /// Evaluate against the current answer set (fail-closed)
    #[must_use]
    pub fn evaluate(&self, answers: &AnswerSet) -> bool {
        let Some(answer) = answers.get(&self.field) else {
            return false;
        };
        match &self.test {
            ConditionTest::Equals(expected) => answer.matches(expected),
            ConditionTest::In(candidates) => candidates.iter().any(|c| answer.matches(c)),
        }
    }
}

/// Comparison applied by a [`Condition`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionTest {
    /// Answer equals the value (multi-select: any selected value equals it)
    Equals(AnswerValue),

    /// Answer equals one of the values
    In(Vec<AnswerValue>),
}
