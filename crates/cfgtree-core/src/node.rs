//! Ordered configuration tree.
//!
//! A [`Node`] holds either a value or an ordered set of named children,
//! never both. Merge semantics when a value lands on an existing node:
//! - map onto a leaf: the leaf value is dropped, the map becomes children
//! - map onto an internal node: merged key by key, other children kept
//! - non-map onto an internal node: children dropped, value set
//! - non-map onto a leaf: value replaced (arrays are never merged)

use cfgtree_path::KeyPath;
use serde_json::Value;

use crate::error::MergeError;
use crate::meta::{Provenance, SourceKind};

/// A tree vertex
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Node {
    value: Value,
    source: String,
    kind: SourceKind,
    revision: String,
    order_set: bool,
    children: Vec<(String, Node)>,
}

impl Node {
    /// An unset leaf
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from a JSON value using the default merge rules
    pub fn from_value(value: Value, provenance: &Provenance) -> Self {
        let mut node = Self::new();
        node.merge_value(value, provenance);
        node
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    pub fn revision(&self) -> &str {
        &self.revision
    }

    pub fn provenance(&self) -> Provenance {
        Provenance::new(self.source.clone(), self.kind, self.revision.clone())
    }

    /// Whether child order was fixed by an ordered collector
    pub fn is_order_set(&self) -> bool {
        self.order_set
    }

    pub fn set_order_set(&mut self, order_set: bool) {
        self.order_set = order_set;
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Children in order
    pub fn children(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.children.iter().map(|(k, n)| (k.as_str(), n))
    }

    pub fn keys(&self) -> Vec<String> {
        self.children.iter().map(|(k, _)| k.clone()).collect()
    }

    pub fn child(&self, key: &str) -> Option<&Node> {
        self.children.iter().find(|(k, _)| k == key).map(|(_, n)| n)
    }

    pub fn child_mut(&mut self, key: &str) -> Option<&mut Node> {
        self.children
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, n)| n)
    }

    /// Index of `key` among the children
    pub fn position(&self, key: &str) -> Option<usize> {
        self.children.iter().position(|(k, _)| k == key)
    }

    /// Get the child for `key`, creating an unset leaf at the end if missing.
    /// Any leaf value held by `self` is cleared.
    pub fn child_entry(&mut self, key: &str) -> &mut Node {
        self.value = Value::Null;
        let index = match self.position(key) {
            Some(i) => i,
            None => {
                self.children.push((key.to_string(), Node::new()));
                self.children.len() - 1
            }
        };
        &mut self.children[index].1
    }

    /// Insert or replace a child. Existing keys keep their position.
    pub fn set_child(&mut self, key: &str, node: Node) {
        *self.child_entry(key) = node;
    }

    /// Insert a child at `index`, or replace it in place if the key exists.
    pub fn insert_child_at(&mut self, index: usize, key: &str, node: Node) {
        if let Some(existing) = self.child_mut(key) {
            *existing = node;
            return;
        }
        self.value = Value::Null;
        let index = index.min(self.children.len());
        self.children.insert(index, (key.to_string(), node));
    }

    pub fn remove_child(&mut self, key: &str) -> Option<Node> {
        let index = self.position(key)?;
        let (_, node) = self.children.remove(index);
        if self.children.is_empty() {
            self.order_set = false;
        }
        Some(node)
    }

    /// Make this node a leaf holding `value`
    pub fn set_value(&mut self, value: Value) {
        self.children.clear();
        self.order_set = false;
        self.value = value;
    }

    /// Record `provenance` on this node only
    pub fn stamp(&mut self, provenance: &Provenance) {
        self.source.clone_from(&provenance.source);
        self.kind = provenance.kind;
        self.revision.clone_from(&provenance.revision);
    }

    pub fn get(&self, path: &KeyPath) -> Option<&Node> {
        let mut node = self;
        for segment in path {
            node = node.child(segment)?;
        }
        Some(node)
    }

    pub fn get_mut(&mut self, path: &KeyPath) -> Option<&mut Node> {
        let mut node = self;
        for segment in path {
            node = node.child_mut(segment)?;
        }
        Some(node)
    }

    /// Set the raw value at `path`, creating intermediate nodes.
    pub fn set(&mut self, path: &KeyPath, value: Value) {
        let mut node = self;
        for segment in path {
            node = node.child_entry(segment);
        }
        node.set_value(value);
    }

    /// Remove the node at `path`. The root itself cannot be removed.
    pub fn remove(&mut self, path: &KeyPath) -> Option<Node> {
        let leaf = path.leaf()?;
        match path.parent() {
            Some(parent) => self.get_mut(&parent)?.remove_child(leaf),
            None => self.remove_child(leaf),
        }
    }

    /// Merge `value` into this node with the default rules.
    pub fn merge_value(&mut self, value: Value, provenance: &Provenance) {
        self.stamp(provenance);
        match value {
            Value::Object(map) if map.is_empty() => {
                if self.is_leaf() {
                    self.value = Value::Object(map);
                }
            }
            Value::Object(map) => {
                if self.is_leaf() {
                    self.value = Value::Null;
                }
                for (key, child) in map {
                    self.child_entry(&key).merge_value(child, provenance);
                }
            }
            other => self.set_value(other),
        }
    }

    /// Merge `value` at `path`, stamping every node on the way below the root.
    pub fn merge_at(
        &mut self,
        path: &KeyPath,
        value: Value,
        provenance: &Provenance,
    ) -> Result<(), MergeError> {
        if path.is_empty() && !value.is_object() {
            return Err(MergeError::ScalarAtRoot);
        }
        let mut node = self;
        for segment in path {
            node = node.child_entry(segment);
            node.stamp(provenance);
        }
        node.merge_value(value, provenance);
        Ok(())
    }

    /// Resequence children: keys listed in `order` come first in that order
    /// (first occurrence wins), the rest keep their relative order after them.
    pub fn reorder_children(&mut self, order: &[String]) {
        let mut remaining = std::mem::take(&mut self.children);
        let mut ordered = Vec::with_capacity(remaining.len());
        for key in order {
            if let Some(pos) = remaining.iter().position(|(k, _)| k == key) {
                ordered.push(remaining.remove(pos));
            }
        }
        ordered.extend(remaining);
        self.children = ordered;
    }

    /// Materialize as a JSON value, keeping child order
    pub fn to_value(&self) -> Value {
        if self.is_leaf() {
            return self.value.clone();
        }
        Value::Object(
            self.children
                .iter()
                .map(|(k, n)| (k.clone(), n.to_value()))
                .collect(),
        )
    }

    /// All leaves below this node with their paths relative to it
    pub fn leaves(&self) -> Vec<(KeyPath, &Node)> {
        let mut out = Vec::new();
        self.collect_leaves(KeyPath::root(), &mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, path: KeyPath, out: &mut Vec<(KeyPath, &'a Node)>) {
        if self.is_leaf() {
            out.push((path, self));
            return;
        }
        for (key, child) in &self.children {
            child.collect_leaves(path.child(key.as_str()), out);
        }
    }
}
