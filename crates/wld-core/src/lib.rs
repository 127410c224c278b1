//! Core types and trait definitions for the dialect dictionary importer.
//!
//! Entities, key tuples, run status and the two store traits. No file, HTTP
//! or database code lives here; every other crate in the workspace builds on
//! these types.

// Trait methods spell out `impl Future + Send` where callers need it.
#![allow(async_fn_in_trait)]

pub mod catalog;
pub mod error;
pub mod key;
pub mod model;
pub mod status;
pub mod store;

pub use error::{Error, Result};
