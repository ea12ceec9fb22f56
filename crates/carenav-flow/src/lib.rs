//! CareNav Form State Machine
//!
//! Walks a user through the ordered, conditionally visible steps of an
//! assessment manifest.
//!
//! # Core Concepts
//!
//! - [`AssessmentSession`]: owns one walk and its [`carenav_manifest::AnswerSet`]
//! - [`Phase`]: `NotStarted -> InProgress -> Completed`, with validated
//!   transitions
//! - [`visibility`]: pure fail-closed visibility evaluation, re-run on
//!   every answer change
//! - Required questions gate advancement recoverably; answers for steps
//!   that become hidden are retained but excluded from the effective view

#![warn(unreachable_pub)]

mod error;
mod session;
pub mod visibility;

pub use error::FlowError;
pub use session::{allowed_transitions, validate_transition, AssessmentSession, Phase, SessionId};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
