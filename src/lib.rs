//! cfgtree - prioritized configuration trees with hierarchical inheritance
//!
//! Values are gathered from an ordered list of collectors (files,
//! environment, in-memory maps), merged into a single ordered tree with
//! last-writer-wins semantics, and resolved per entity through a declared
//! ownership hierarchy.
//!
//! ```no_run
//! use cfgtree::{Builder, EnvCollector, FileCollector};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), cfgtree::Error> {
//! let config = Builder::new()
//!     .add_collector(FileCollector::new(Path::new("cluster.toml"))?)
//!     .add_collector(EnvCollector::new("CLUSTER"))
//!     .with_inheritance(["global", "groups", "replicasets", "instances"], [])
//!     .build()?;
//!
//! let instance = config.effective("groups/g1/replicasets/r1/instances/i1")?;
//! println!("{}", instance.to_value());
//! # Ok(())
//! # }
//! ```

mod error;

pub use error::Error;

pub use cfgtree_core::*;
pub use cfgtree_sources::{EnvCollector, FileCollector, Format, SourceError, DEFAULT_DELIMITER};
