//! Observability for PRISM.
//! `tracing` crate with `EnvFilter`, per-crate log levels via `PRISM_LOG`.

pub mod fields;
pub mod setup;

pub use setup::init_tracing;
