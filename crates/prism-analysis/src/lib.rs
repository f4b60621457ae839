//! PRISM statistical core.
//!
//! Pure functions over in-memory data: nothing here touches the store.
//! Data flows one way: response records -> [`matrix::assemble`] ->
//! estimators ([`reliability`], [`loadings`]) or, for retest pairs,
//! [`matrix::ScaleSums`] -> [`retest::correlate`].

pub mod descriptive;
pub mod loadings;
pub mod matrix;
pub mod rejection;
pub mod reliability;
pub mod retest;

pub use rejection::RejectionReason;
