//! Provenance metadata attached to tree nodes and streamed values.

use cfgtree_path::KeyPath;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of where a value came from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Unknown,
    /// Built-in or hierarchy defaults
    Default,
    File,
    Env,
    /// In-memory map
    Map,
    /// Remote key-value storage
    Storage,
    /// Written at runtime through a mutable config
    Modified,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown"),
            Self::Default => write!(f, "default"),
            Self::File => write!(f, "file"),
            Self::Env => write!(f, "env"),
            Self::Map => write!(f, "map"),
            Self::Storage => write!(f, "storage"),
            Self::Modified => write!(f, "modified"),
        }
    }
}

/// Named source of a value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceInfo {
    pub name: String,
    pub kind: SourceKind,
}

/// Metadata describing a single value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueMeta {
    /// Full path of the value
    pub key: KeyPath,

    /// Source that produced the value
    pub source: SourceInfo,

    /// Opaque revision token of the source
    pub revision: String,
}

/// Provenance stamped onto nodes touched by a merge
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Provenance {
    pub source: String,
    pub kind: SourceKind,
    pub revision: String,
}

/// Source name used for values written through `MutableConfig`
pub const MODIFIED_SOURCE: &str = "modified";

impl Provenance {
    pub fn new(source: impl Into<String>, kind: SourceKind, revision: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            kind,
            revision: revision.into(),
        }
    }

    /// Provenance for runtime modifications
    pub fn modified() -> Self {
        Self::new(MODIFIED_SOURCE, SourceKind::Modified, "")
    }

    /// Build value metadata for `key`
    pub fn meta(&self, key: KeyPath) -> ValueMeta {
        ValueMeta {
            key,
            source: SourceInfo {
                name: self.source.clone(),
                kind: self.kind,
            },
            revision: self.revision.clone(),
        }
    }
}
