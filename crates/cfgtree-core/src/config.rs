//! Read-only configuration façade.

use std::collections::BTreeMap;
use std::sync::Arc;

use cfgtree_path::KeyPath;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::cancel::CancelToken;
use crate::error::{ConfigError, ValueError};
use crate::inheritance::Inheritance;
use crate::meta::ValueMeta;
use crate::node::Node;

/// A value read from the tree together with its provenance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entry {
    pub meta: ValueMeta,
    pub value: Value,
}

impl Entry {
    pub(crate) fn from_node(path: KeyPath, node: &Node) -> Self {
        Self {
            meta: node.provenance().meta(path),
            value: node.to_value(),
        }
    }

    /// Decode the value into `T`
    pub fn get_as<T: DeserializeOwned>(&self) -> Result<T, ValueError> {
        serde_json::from_value(self.value.clone()).map_err(|source| ValueError::Decode {
            key: self.meta.key.clone(),
            source,
        })
    }
}

pub(crate) fn lookup_in(root: Option<&Node>, path: &KeyPath) -> Option<Entry> {
    root?.get(path).map(|node| Entry::from_node(path.clone(), node))
}

pub(crate) fn subtree(root: Option<&Node>, path: &KeyPath) -> Result<Node, ConfigError> {
    root.and_then(|r| r.get(path))
        .cloned()
        .ok_or_else(|| ConfigError::PathNotFound(path.clone()))
}

/// Immutable configuration tree.
///
/// Cloning is cheap; clones share the tree.
#[derive(Debug, Clone, Default)]
pub struct Config {
    root: Option<Arc<Node>>,
    inheritance: Arc<Inheritance>,
}

impl Config {
    pub fn new(root: Node, inheritance: Arc<Inheritance>) -> Self {
        Self {
            root: Some(Arc::new(root)),
            inheritance,
        }
    }

    /// A config without a tree. Every lookup reports not found.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Wrap a tree with no inheritance configured
    pub fn from_node(root: Node) -> Self {
        Self::new(root, Arc::default())
    }

    pub fn root(&self) -> Option<&Node> {
        self.root.as_deref()
    }

    pub fn inheritance(&self) -> &Inheritance {
        &self.inheritance
    }

    /// Value at `path`, or `KeyNotFound`
    pub fn get(&self, path: impl Into<KeyPath>) -> Result<Entry, ConfigError> {
        let path = path.into();
        lookup_in(self.root(), &path).ok_or(ConfigError::KeyNotFound(path))
    }

    /// Value at `path`, if present
    pub fn lookup(&self, path: impl Into<KeyPath>) -> Option<Entry> {
        lookup_in(self.root(), &path.into())
    }

    /// Provenance of the node at `path`
    pub fn stat(&self, path: impl Into<KeyPath>) -> Option<ValueMeta> {
        let path = path.into();
        self.root()?
            .get(&path)
            .map(|node| node.provenance().meta(path))
    }

    /// Lazily iterate leaves under `path`.
    ///
    /// `depth` 0 is unbounded. Otherwise each level down consumes one unit
    /// and a node reached with no depth left is skipped, so `depth == 1` on
    /// an internal node yields nothing.
    pub fn walk(
        &self,
        cancel: &CancelToken,
        path: impl Into<KeyPath>,
        depth: usize,
    ) -> Result<Walk<'_>, ConfigError> {
        let path = path.into();
        let node = self
            .root()
            .and_then(|r| r.get(&path))
            .ok_or_else(|| ConfigError::PathNotFound(path.clone()))?;
        Ok(Walk::new(cancel.clone(), path, node, depth))
    }

    /// New config rooted at `path`
    pub fn slice(&self, path: impl Into<KeyPath>) -> Result<Config, ConfigError> {
        let node = subtree(self.root(), &path.into())?;
        Ok(Config::from_node(node))
    }

    /// Effective config of the entity at `path`
    pub fn effective(&self, path: impl Into<KeyPath>) -> Result<Config, ConfigError> {
        let path = path.into();
        let root = self
            .root()
            .ok_or_else(|| ConfigError::PathNotFound(path.clone()))?;
        self.inheritance
            .effective(root, &path)
            .map(Config::from_node)
    }

    /// Effective config of every leaf entity, keyed by full path
    pub fn effective_all(&self) -> Result<BTreeMap<String, Config>, ConfigError> {
        if self.inheritance.is_empty() {
            return Err(ConfigError::NoInheritance);
        }
        let Some(root) = self.root() else {
            return Ok(BTreeMap::new());
        };
        Ok(self
            .inheritance
            .effective_all(root)?
            .into_iter()
            .map(|(path, node)| (path, Config::from_node(node)))
            .collect())
    }

    /// The whole tree as JSON (`null` when empty)
    pub fn to_value(&self) -> Value {
        self.root().map(Node::to_value).unwrap_or(Value::Null)
    }
}

/// Depth-bounded lazy traversal over leaves
pub struct Walk<'a> {
    cancel: CancelToken,
    /// (path, node, remaining depth; `None` = unbounded)
    stack: Vec<(KeyPath, &'a Node, Option<usize>)>,
}

impl<'a> Walk<'a> {
    pub(crate) fn new(cancel: CancelToken, path: KeyPath, node: &'a Node, depth: usize) -> Self {
        let remaining = if depth == 0 { None } else { Some(depth) };
        Self {
            cancel,
            stack: vec![(path, node, remaining)],
        }
    }
}

impl<'a> Iterator for Walk<'a> {
    type Item = Entry;

    fn next(&mut self) -> Option<Entry> {
        while let Some((path, node, remaining)) = self.stack.pop() {
            if remaining == Some(0) {
                continue;
            }
            if node.is_leaf() {
                return Some(Entry::from_node(path, node));
            }
            if self.cancel.is_cancelled() {
                self.stack.clear();
                return None;
            }
            let next = remaining.map(|d| d - 1);
            let children: Vec<_> = node.children().collect();
            for (key, child) in children.into_iter().rev() {
                self.stack.push((path.child(key), child, next));
            }
        }
        None
    }
}
