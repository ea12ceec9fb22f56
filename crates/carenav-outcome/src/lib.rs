//! CareNav Outcome Publisher
//!
//! Canonical, immutable outcomes and the shared keyed store downstream
//! personalization reads them from.
//!
//! # Core Concepts
//!
//! - [`Outcome`]: the one object the scoring core exposes outward,
//!   immutable once published
//! - [`OutcomeDigest`]: Blake3 identity over the canonical JSON form;
//!   identical inputs publish byte-identical outcomes
//! - [`OutcomeStore`] / [`InMemoryOutcomeStore`]: exactly one live outcome
//!   per [`StateKey`], wholesale replacement on retake
//! - [`publish`]: all-or-nothing build + write

#![warn(unreachable_pub)]

mod digest;
mod outcome;
mod publisher;
mod store;

pub use digest::{DigestError, OutcomeDigest};
pub use outcome::{Outcome, StateKey};
pub use publisher::publish;
pub use store::{InMemoryOutcomeStore, OutcomeStore};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
