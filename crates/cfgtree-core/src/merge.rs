//! Merge engine: folds one collector's values into the tree.
//!
//! Ordering is tracked per collector and committed once, after the
//! collector's stream is drained. The first ordered collector to commit an
//! order for a parent freezes it; later collectors still overwrite values
//! but never resequence that parent again.

use std::collections::HashMap;

use cfgtree_path::KeyPath;
use serde_json::Value;
use tracing::{debug, trace};

use crate::collector::Collector;
use crate::error::MergeError;
use crate::meta::{Provenance, SourceKind};
use crate::node::Node;

/// Per-collector merge state
#[derive(Debug, Clone)]
pub struct MergerContext {
    collector: String,
    provenance: Provenance,
    keep_order: bool,
    /// Parents in first-seen order, each with its child keys in first-seen order
    ordering: Vec<(KeyPath, Vec<String>)>,
    index: HashMap<KeyPath, usize>,
}

impl MergerContext {
    pub fn new(
        collector: impl Into<String>,
        kind: SourceKind,
        revision: impl Into<String>,
        keep_order: bool,
    ) -> Self {
        let collector = collector.into();
        Self {
            provenance: Provenance::new(collector.clone(), kind, revision),
            collector,
            keep_order,
            ordering: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn for_collector(collector: &dyn Collector) -> Self {
        Self::new(
            collector.name(),
            collector.source(),
            collector.revision(),
            collector.keep_order(),
        )
    }

    pub fn collector(&self) -> &str {
        &self.collector
    }

    pub fn provenance(&self) -> &Provenance {
        &self.provenance
    }

    pub fn keeps_order(&self) -> bool {
        self.keep_order
    }

    /// Note that `key` was written under `parent`. No-op for unordered collectors.
    pub fn record_ordering(&mut self, parent: &KeyPath, key: &str) {
        if !self.keep_order {
            return;
        }
        let slot = match self.index.get(parent) {
            Some(&i) => i,
            None => {
                self.ordering.push((parent.clone(), Vec::new()));
                self.index.insert(parent.clone(), self.ordering.len() - 1);
                self.ordering.len() - 1
            }
        };
        let keys = &mut self.ordering[slot].1;
        if !keys.iter().any(|k| k == key) {
            keys.push(key.to_string());
        }
    }

    /// Recorded child order for `parent`
    pub fn recorded(&self, parent: &KeyPath) -> Option<&[String]> {
        self.index
            .get(parent)
            .map(|&i| self.ordering[i].1.as_slice())
    }

    /// Commit recorded orderings. Parents already fixed by an earlier
    /// ordered collector, or no longer internal, are left alone.
    pub fn apply_ordering(self, root: &mut Node) -> Result<(), MergeError> {
        for (parent, keys) in self.ordering {
            let Some(node) = root.get_mut(&parent) else {
                trace!(collector = %self.collector, parent = %parent, "ordered parent no longer exists");
                continue;
            };
            if node.is_leaf() {
                continue;
            }
            if node.is_order_set() {
                trace!(collector = %self.collector, parent = %parent, "order already fixed");
                continue;
            }
            node.reorder_children(&keys);
            node.set_order_set(true);
            debug!(collector = %self.collector, parent = %parent, keys = keys.len(), "committed child order");
        }
        Ok(())
    }
}

/// Strategy for folding collector values into the tree
pub trait Merger: Send + Sync {
    fn create_context(&self, collector: &dyn Collector) -> MergerContext {
        MergerContext::for_collector(collector)
    }

    fn merge_value(
        &self,
        ctx: &mut MergerContext,
        root: &mut Node,
        path: &KeyPath,
        value: Value,
    ) -> Result<(), MergeError>;

    fn apply_ordering(&self, ctx: MergerContext, root: &mut Node) -> Result<(), MergeError> {
        ctx.apply_ordering(root)
    }
}

/// Type-aware merge with the default node rules
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultMerger;

impl Merger for DefaultMerger {
    fn merge_value(
        &self,
        ctx: &mut MergerContext,
        root: &mut Node,
        path: &KeyPath,
        value: Value,
    ) -> Result<(), MergeError> {
        root.merge_at(path, value, ctx.provenance())?;

        // Every level on the way down, so intermediate parents are ordered too.
        for (depth, key) in path.iter().enumerate() {
            ctx.record_ordering(&path.truncate(depth), key);
        }
        Ok(())
    }
}
