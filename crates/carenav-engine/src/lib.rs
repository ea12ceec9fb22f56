//! CareNav Assessment Engine
//!
//! Orchestrator facade over the four-stage pipeline: manifest loading,
//! session walking, domain-weighted scoring, outcome publication. Data
//! flows strictly in that order.
//!
//! # Example
//!
//! ```rust,ignore
//! use carenav_engine::AssessmentEngine;
//!
//! let engine = AssessmentEngine::new();
//! engine.register_module(manifest_json, scoring_config)?;
//!
//! let mut session = engine.start_session(&module_id)?;
//! // ... submit answers, advance ...
//! let outcome = engine.complete_and_publish(&session, state_key)?;
//! ```

#![warn(unreachable_pub)]

mod engine;
mod error;

pub use engine::AssessmentEngine;
pub use error::EngineError;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
