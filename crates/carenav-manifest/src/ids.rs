//! Identifier newtypes for the assessment vocabulary
//!
//! Every id that crosses a module boundary is a distinct type so that a
//! question id can never be passed where a flag id is expected.

use std::fmt::{self, Display, Formatter};

macro_rules! string_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash,
            serde::Serialize, serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new id from anything string-like
            #[inline]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// View as a string slice
            #[inline]
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Check for the empty id (rejected by validation)
            #[inline]
            #[must_use]
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(
    /// Identifies an assessment module (one manifest family)
    ModuleId
);

string_id!(
    /// Identifies a section (one step of the walk) within a module
    SectionId
);

string_id!(
    /// Identifies a question within a module
    QuestionId
);

string_id!(
    /// Identifies a boolean flag derived from an answer
    FlagId
);

string_id!(
    /// Identifies a clinical/functional domain (mobility, cognition, ...)
    DomainId
);
