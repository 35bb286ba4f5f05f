//! Collector contract and the in-memory map collector.
//!
//! A collector streams `(path, value)` items from one source. Collectors
//! added to the builder later have higher priority.

use cfgtree_path::KeyPath;
use serde_json::{Map, Value};

use crate::cancel::CancelToken;
use crate::error::ValueError;
use crate::meta::{Provenance, SourceKind, ValueMeta};

/// A single item produced by a collector
pub trait SourceValue {
    /// Extract the raw value
    fn get(&self) -> Result<Value, ValueError>;

    fn meta(&self) -> &ValueMeta;
}

/// Stream of values read from a collector
pub type ValueStream<'a> = Box<dyn Iterator<Item = Box<dyn SourceValue>> + 'a>;

/// A prioritized source of configuration values
pub trait Collector {
    /// Stable name, used as the source name of every value
    fn name(&self) -> &str;

    fn source(&self) -> SourceKind;

    /// Opaque revision token
    fn revision(&self) -> &str;

    /// Whether the order of keys at each nesting level must be preserved
    fn keep_order(&self) -> bool;

    /// Read all values. The stream ends early once `cancel` fires.
    fn read<'a>(&'a self, cancel: &'a CancelToken) -> ValueStream<'a>;
}

/// Plain value with metadata
#[derive(Debug, Clone)]
pub struct CollectedValue {
    meta: ValueMeta,
    value: Value,
}

impl CollectedValue {
    pub fn new(meta: ValueMeta, value: Value) -> Self {
        Self { meta, value }
    }
}

impl SourceValue for CollectedValue {
    fn get(&self) -> Result<Value, ValueError> {
        Ok(self.value.clone())
    }

    fn meta(&self) -> &ValueMeta {
        &self.meta
    }
}

/// Item whose raw value could not be decoded by its collector
#[derive(Debug, Clone)]
pub struct FailedValue {
    meta: ValueMeta,
    message: String,
}

impl FailedValue {
    pub fn new(meta: ValueMeta, message: impl Into<String>) -> Self {
        Self {
            meta,
            message: message.into(),
        }
    }
}

impl SourceValue for FailedValue {
    fn get(&self) -> Result<Value, ValueError> {
        Err(ValueError::Extract {
            key: self.meta.key.clone(),
            message: self.message.clone(),
        })
    }

    fn meta(&self) -> &ValueMeta {
        &self.meta
    }
}

/// Flatten a JSON value into leaf `(path, value)` pairs in map order.
///
/// Non-empty objects are descended into; everything else, including empty
/// objects, is emitted as a leaf.
pub fn flatten(value: Value) -> Vec<(KeyPath, Value)> {
    let mut out = Vec::new();
    flatten_into(KeyPath::root(), value, &mut out);
    out
}

fn flatten_into(path: KeyPath, value: Value, out: &mut Vec<(KeyPath, Value)>) {
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (key, child) in map {
                flatten_into(path.child(key), child, out);
            }
        }
        other => out.push((path, other)),
    }
}

/// Turn flattened pairs into a cancellable value stream
pub fn stream_values<'a>(
    values: Vec<(KeyPath, Value)>,
    provenance: Provenance,
    cancel: &'a CancelToken,
) -> ValueStream<'a> {
    Box::new(
        values
            .into_iter()
            .take_while(move |_| !cancel.is_cancelled())
            .map(move |(key, value)| {
                Box::new(CollectedValue::new(provenance.meta(key), value)) as Box<dyn SourceValue>
            }),
    )
}

/// Collector over an in-memory JSON object
#[derive(Debug, Clone)]
pub struct MapCollector {
    name: String,
    kind: SourceKind,
    revision: String,
    keep_order: bool,
    data: Value,
}

impl MapCollector {
    pub fn new(data: Value) -> Self {
        Self {
            name: "map".to_string(),
            kind: SourceKind::Map,
            revision: String::new(),
            keep_order: false,
            data,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_source_kind(mut self, kind: SourceKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_revision(mut self, revision: impl Into<String>) -> Self {
        self.revision = revision.into();
        self
    }

    pub fn with_keep_order(mut self, keep_order: bool) -> Self {
        self.keep_order = keep_order;
        self
    }
}

impl Default for MapCollector {
    fn default() -> Self {
        Self::new(Value::Object(Map::new()))
    }
}

impl Collector for MapCollector {
    fn name(&self) -> &str {
        &self.name
    }

    fn source(&self) -> SourceKind {
        self.kind
    }

    fn revision(&self) -> &str {
        &self.revision
    }

    fn keep_order(&self) -> bool {
        self.keep_order
    }

    fn read<'a>(&'a self, cancel: &'a CancelToken) -> ValueStream<'a> {
        let provenance = Provenance::new(self.name.clone(), self.kind, self.revision.clone());
        stream_values(flatten(self.data.clone()), provenance, cancel)
    }
}
