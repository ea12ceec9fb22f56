//! CareNav Manifest System
//!
//! Typed, validated assessment manifests: the declarative document that
//! drives the form walk and the scoring engine.
//!
//! # Core Concepts
//!
//! - [`ModuleManifest`]: versioned module of ordered [`Section`]s
//! - [`Question`] / [`AnswerOption`]: the question vocabulary, with the
//!   declarative option-to-flag rule table
//! - [`Predicate`]: fail-closed visibility expressions over prior answers
//! - [`AnswerSet`]: the per-session accumulated answers
//! - [`ManifestLoader`]: pure parse + fail-fast validation
//! - [`ManifestRegistry`]: per-version, process-lifetime cache
//!
//! # Example
//!
//! ```rust,ignore
//! use carenav_manifest::ManifestLoader;
//!
//! let manifest = ManifestLoader::from_json(raw_document)?;
//! let flags = manifest.declared_flags();
//! ```

#![warn(unreachable_pub)]

mod answer;
mod ids;
mod loader;
mod manifest;
mod predicate;
mod registry;

pub use answer::{AnswerSet, AnswerValue};
pub use ids::{DomainId, FlagId, ModuleId, QuestionId, SectionId};
pub use loader::{ManifestError, ManifestLoader};
pub use manifest::{
    AnswerOption, ModuleHeader, ModuleManifest, Question, QuestionKind, Section, SectionKind,
};
pub use predicate::{Condition, ConditionTest, Predicate};
pub use registry::ManifestRegistry;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
