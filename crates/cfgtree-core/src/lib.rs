//! Ordered merge engine and inheritance resolver for configuration trees.
//!
//! Values from prioritized collectors are folded into an ordered [`Node`]
//! tree by a [`Merger`]. The resulting [`Config`] answers point lookups and
//! traversals, and resolves the effective configuration of entities in a
//! declared ownership hierarchy (global → group → replica set → instance).

mod builder;
mod cancel;
mod collector;
mod config;
mod error;
mod inheritance;
mod merge;
mod meta;
mod mutable;
mod node;
mod validator;

pub use builder::Builder;
pub use cancel::CancelToken;
pub use collector::{
    flatten, stream_values, CollectedValue, Collector, FailedValue, MapCollector, SourceValue,
    ValueStream,
};
pub use config::{Config, Entry, Walk};
pub use error::{BuildError, CollectorError, ConfigError, MergeError, ValueError};
pub use inheritance::{
    with_defaults, with_inherit_merge, with_no_inherit, with_no_inherit_from, Hierarchy,
    InheritOption, Inheritance, MergeStrategy, DEFAULTS_LEVEL, GLOBAL_LEVEL,
};
pub use merge::{DefaultMerger, Merger, MergerContext};
pub use meta::{Provenance, SourceInfo, SourceKind, ValueMeta, MODIFIED_SOURCE};
pub use mutable::MutableConfig;
pub use node::Node;
pub use validator::{
    Rule, RuleValidator, SourceRange, ValidationError, ValidationErrors, Validator,
    ValidatorError, ValueType,
};

pub use cfgtree_path::KeyPath;
