//! Answer values and the per-session answer set

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::ids::QuestionId;

/// A single submitted answer value
///
/// `SingleSelect` answers are [`AnswerValue::Text`] holding the option
/// value, `MultiSelect` answers are [`AnswerValue::Multi`] holding the
/// selected option values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    /// Boolean question answer
    Bool(bool),

    /// Numeric question answer
    Number(f64),

    /// Single-select option value
    Text(String),

    /// Multi-select option values
    Multi(Vec<String>),
}

impl AnswerValue {
    /// Scalar match with multi-select containment semantics
    ///
    /// A multi-select answer matches a scalar expectation when any selected
    /// value equals it. Two values of mismatched shape never match.
    #[must_use]
    pub fn matches(&self, expected: &AnswerValue) -> bool {
        match (self, expected) {
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => (a - b).abs() < f64::EPSILON,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Multi(selected), Self::Text(value)) => selected.iter().any(|s| s == value),
            _ => false,
        }
    }

    /// Selected option values, for select-kind answers
    ///
    /// Returns one value for a single-select answer, all values for a
    /// multi-select answer, and nothing for boolean/number answers.
    #[must_use]
    pub fn selected_values(&self) -> Vec<&str> {
        match self {
            Self::Text(value) => vec![value.as_str()],
            Self::Multi(values) => values.iter().map(String::as_str).collect(),
            Self::Bool(_) | Self::Number(_) => Vec::new(),
        }
    }

    /// Number of selected items (multi-select banding input)
    #[inline]
    #[must_use]
    pub fn selection_count(&self) -> usize {
        match self {
            Self::Multi(values) => values.len(),
            _ => 1,
        }
    }
}

impl From<bool> for AnswerValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for AnswerValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for AnswerValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<Vec<&str>> for AnswerValue {
    fn from(values: Vec<&str>) -> Self {
        Self::Multi(values.into_iter().map(str::to_string).collect())
    }
}

/// Accumulated answers for one assessment session
///
/// Owned exclusively by the active session. Entries keep first-submission
/// order; resubmitting a question overwrites its value in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerSet {
    entries: IndexMap<QuestionId, AnswerValue>,
}

impl AnswerSet {
    /// Create an empty answer set
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an answer, overwriting any prior value for the question
    #[inline]
    pub fn insert(&mut self, question: QuestionId, value: AnswerValue) {
        self.entries.insert(question, value);
    }

    /// Look up an answer
    #[inline]
    #[must_use]
    pub fn get(&self, question: &QuestionId) -> Option<&AnswerValue> {
        self.entries.get(question)
    }

    /// Whether the question has been answered
    #[inline]
    #[must_use]
    pub fn contains(&self, question: &QuestionId) -> bool {
        self.entries.contains_key(question)
    }

    /// Remove all answers (restart semantics)
    #[inline]
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of answered questions
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no questions have been answered
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate answers in first-submission order
    pub fn iter(&self) -> impl Iterator<Item = (&QuestionId, &AnswerValue)> {
        self.entries.iter()
    }
}

impl FromIterator<(QuestionId, AnswerValue)> for AnswerSet {
    fn from_iter<I: IntoIterator<Item = (QuestionId, AnswerValue)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
