//! Reader for the tab-separated survey exports.
//!
//! Turns one source file into a stream of normalised [`schema::Line`]s. Pure
//! synchronous; no database or output dependencies.
//!
//! # Quick start
//!
//! ```no_run
//! use std::{fs::File, io::BufReader};
//!
//! use wld_tsv::{SourceReader, validate};
//!
//! let file = File::open("d2a5.tsv").unwrap();
//! let reader = SourceReader::open(BufReader::new(file), None).unwrap();
//! for line in reader {
//!   let line = line.unwrap();
//!   println!("{}: check {}", line.number, validate::check(&line.line));
//! }
//! ```

pub mod error;
pub mod mines;
pub mod schema;
mod source;
pub mod validate;

pub use error::{Error, Result};
pub use mines::MineRule;
pub use schema::{Line, SchemaVersion};
pub use source::{SourceLine, SourceReader};
