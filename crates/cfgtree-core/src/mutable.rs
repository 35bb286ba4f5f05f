//! Mutable configuration with validation and rollback.
//!
//! Every mutation holds the write lock across the change and the full-tree
//! validation pass. On validation failure the touched part of the tree is
//! restored from a snapshot taken before the change. Reads take the read
//! lock.

use std::collections::BTreeMap;
use std::sync::Arc;

use cfgtree_path::KeyPath;
use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, warn};

use crate::cancel::CancelToken;
use crate::config::{lookup_in, subtree, Config, Entry, Walk};
use crate::error::ConfigError;
use crate::inheritance::Inheritance;
use crate::meta::{Provenance, ValueMeta};
use crate::node::Node;
use crate::validator::{run_validator, Validator};

/// State needed to undo a mutation
enum Snapshot {
    Whole(Node),
    TopLevel {
        key: String,
        index: Option<usize>,
        previous: Option<Node>,
    },
}

impl Snapshot {
    /// Copy the smallest subtree a mutation at `path` can touch
    fn take(root: &Node, path: &KeyPath) -> Self {
        match path.segments().first() {
            None => Self::Whole(root.clone()),
            Some(key) => Self::TopLevel {
                key: key.clone(),
                index: root.position(key),
                previous: root.child(key).cloned(),
            },
        }
    }

    fn restore(self, root: &mut Node) {
        match self {
            Self::Whole(node) => *root = node,
            Self::TopLevel {
                key,
                index,
                previous,
            } => match (index, previous) {
                (Some(index), Some(node)) => root.insert_child_at(index, &key, node),
                _ => {
                    root.remove_child(&key);
                }
            },
        }
    }
}

/// Configuration that can be changed after build
pub struct MutableConfig {
    tree: RwLock<Node>,
    inheritance: Arc<Inheritance>,
    validator: Option<Arc<dyn Validator>>,
}

impl MutableConfig {
    pub fn new(
        root: Node,
        inheritance: Arc<Inheritance>,
        validator: Option<Arc<dyn Validator>>,
    ) -> Self {
        Self {
            tree: RwLock::new(root),
            inheritance,
            validator,
        }
    }

    /// Immutable copy of the current tree
    pub fn snapshot(&self) -> Config {
        Config::new(self.tree.read().clone(), Arc::clone(&self.inheritance))
    }

    pub fn get(&self, path: impl Into<KeyPath>) -> Result<Entry, ConfigError> {
        let path = path.into();
        let tree = self.tree.read();
        lookup_in(Some(&*tree), &path).ok_or(ConfigError::KeyNotFound(path))
    }

    pub fn lookup(&self, path: impl Into<KeyPath>) -> Option<Entry> {
        let tree = self.tree.read();
        lookup_in(Some(&*tree), &path.into())
    }

    pub fn stat(&self, path: impl Into<KeyPath>) -> Option<ValueMeta> {
        let path = path.into();
        let tree = self.tree.read();
        tree.get(&path).map(|node| node.provenance().meta(path))
    }

    /// Leaves under `path`, collected while holding the read lock
    pub fn walk(
        &self,
        cancel: &CancelToken,
        path: impl Into<KeyPath>,
        depth: usize,
    ) -> Result<Vec<Entry>, ConfigError> {
        let path = path.into();
        let tree = self.tree.read();
        let node = tree
            .get(&path)
            .ok_or_else(|| ConfigError::PathNotFound(path.clone()))?;
        Ok(Walk::new(cancel.clone(), path, node, depth).collect())
    }

    pub fn slice(&self, path: impl Into<KeyPath>) -> Result<Config, ConfigError> {
        let tree = self.tree.read();
        subtree(Some(&*tree), &path.into()).map(Config::from_node)
    }

    pub fn effective(&self, path: impl Into<KeyPath>) -> Result<Config, ConfigError> {
        let tree = self.tree.read();
        self.inheritance
            .effective(&tree, &path.into())
            .map(Config::from_node)
    }

    pub fn effective_all(&self) -> Result<BTreeMap<String, Config>, ConfigError> {
        let tree = self.tree.read();
        Ok(self
            .inheritance
            .effective_all(&tree)?
            .into_iter()
            .map(|(path, node)| (path, Config::from_node(node)))
            .collect())
    }

    pub fn to_value(&self) -> Value {
        self.tree.read().to_value()
    }

    /// Merge `value` at `path` and re-validate the whole tree
    pub fn set(&self, path: impl Into<KeyPath>, value: Value) -> Result<(), ConfigError> {
        let path = path.into();
        let mut tree = self.tree.write();
        let snapshot = Snapshot::take(&tree, &path);

        tree.merge_at(&path, value, &Provenance::modified())?;
        self.commit(&mut tree, snapshot, "set", &path)
    }

    /// Remove the node at `path`. Returns whether it existed.
    /// Deleting the root path clears the whole tree.
    pub fn delete(&self, path: impl Into<KeyPath>) -> Result<bool, ConfigError> {
        let path = path.into();
        let mut tree = self.tree.write();
        let snapshot = Snapshot::take(&tree, &path);

        let existed = if path.is_empty() {
            *tree = Node::new();
            true
        } else {
            tree.remove(&path).is_some()
        };
        if !existed {
            return Ok(false);
        }
        self.commit(&mut tree, snapshot, "delete", &path)?;
        Ok(true)
    }

    /// Apply every leaf of `other`, then validate once
    pub fn merge(&self, other: &Config) -> Result<(), ConfigError> {
        self.apply(other, false)
    }

    /// Like [`merge`](Self::merge), but only for keys that already exist
    pub fn update(&self, other: &Config) -> Result<(), ConfigError> {
        self.apply(other, true)
    }

    fn apply(&self, other: &Config, existing_only: bool) -> Result<(), ConfigError> {
        let Some(source) = other.root() else {
            return Ok(());
        };
        if source.is_leaf() {
            return Ok(());
        }
        let mut tree = self.tree.write();
        let snapshot = Snapshot::Whole(tree.clone());

        let mut applied = 0usize;
        for (path, node) in source.leaves() {
            if existing_only && tree.get(&path).is_none() {
                continue;
            }
            if let Err(e) = tree.merge_at(&path, node.value().clone(), &node.provenance()) {
                snapshot.restore(&mut tree);
                return Err(e.into());
            }
            applied += 1;
        }
        let op = if existing_only { "update" } else { "merge" };
        debug!(op, applied, "applied values from config");
        self.commit(&mut tree, snapshot, op, &KeyPath::root())
    }

    fn commit(
        &self,
        tree: &mut Node,
        snapshot: Snapshot,
        op: &str,
        path: &KeyPath,
    ) -> Result<(), ConfigError> {
        if let Err(errors) = run_validator(self.validator.as_deref(), tree) {
            warn!(op, path = %path, error = %errors, "validation failed, rolling back");
            snapshot.restore(tree);
            return Err(errors.into());
        }
        Ok(())
    }
}
