//! Concrete collectors for cfgtree.
//!
//! - [`FileCollector`]: TOML or JSON documents, revisioned by content digest
//! - [`EnvCollector`]: prefixed environment variables

mod env;
mod error;
mod file;

pub use env::{EnvCollector, DEFAULT_DELIMITER};
pub use error::SourceError;
pub use file::{FileCollector, Format};
