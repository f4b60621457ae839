//! SQLite adapter for the PRISM store contracts.
//!
//! [`DatabaseManager`] owns the serialized connection and runs migrations;
//! [`SqliteStore`] implements [`prism_core::traits::PsychometricsStore`] on top
//! of the query modules.

pub mod connection;
pub mod migrations;
pub mod queries;
pub mod store;

pub use connection::DatabaseManager;
pub use store::SqliteStore;
