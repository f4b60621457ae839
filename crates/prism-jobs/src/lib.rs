//! PRISM run orchestration.
//!
//! [`Orchestrator`] iterates scales or retest pairs, runs the estimators from
//! `prism-analysis` on each unit independently, and persists the results
//! through a [`prism_core::traits::PsychometricsStore`].

pub mod cli;
pub mod orchestrator;
pub mod outcome;

pub use orchestrator::Orchestrator;
pub use outcome::{JobKind, Outcome, RunSummary, UnitOutcome};
