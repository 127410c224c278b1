//! Import controller, configuration and status endpoint for the dialect
//! dictionary importer.
//!
//! The binary in `main.rs` wires these to a [`wld_store_sqlite::SqliteStore`]
//! and, for staged runs, a [`wld_fixture::StagingStore`].

pub mod api;
pub mod config;
pub mod controller;
pub mod error;

pub use config::ImportConfig;
pub use controller::{Controller, FileReport, RunOptions, RunSummary, Selection};
pub use error::{ImportError, Result};

#[cfg(test)]
mod tests;
