//! SQLite backend for the dialect dictionary importer.
//!
//! [`SqliteStore`] is both the persistent [`wld_core::store::IdentityStore`]
//! and the durable [`wld_core::catalog::Catalog`]. All database access runs
//! through [`tokio_rusqlite`] on a dedicated thread without blocking the async
//! runtime.

mod encode;
mod resolve;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
