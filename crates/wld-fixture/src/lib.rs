//! Staging back-end and fixture output.
//!
//! [`StagingStore`] resolves identities against per-run in-memory tables and
//! streams every new record to a JSON fixture document; [`SkipWriter`] keeps
//! the companion log of rejected lines. Nothing here touches a database.

pub mod error;
mod store;
mod table;
mod writer;

pub use error::{Error, Result};
pub use store::StagingStore;
pub use table::Table;
pub use writer::{FixtureWriter, SkipWriter};
