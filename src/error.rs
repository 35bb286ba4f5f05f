//! Top-level error type for applications built on cfgtree.

use cfgtree_core::{BuildError, ConfigError, ValidatorError};
use cfgtree_sources::SourceError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("Build failed: {0}")]
    Build(#[from] BuildError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Invalid rules: {0}")]
    Rules(#[from] ValidatorError),
}
