//! Trait seams between the statistical core and its collaborators.

pub mod store;

pub use store::{PsychometricsStore, ResponseFilter, RetestWritePolicy, WriteSummary};
