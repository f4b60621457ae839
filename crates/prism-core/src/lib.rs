//! PRISM core: shared types, the store contract, errors, configuration,
//! tracing setup, and constants used by every other PRISM crate.

pub mod config;
pub mod constants;
pub mod errors;
pub mod traits;
pub mod tracing;
pub mod types;
