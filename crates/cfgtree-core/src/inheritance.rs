//! Hierarchical inheritance resolver.
//!
//! A hierarchy is an ordered list of levels, e.g.
//! `[global, groups, replicasets, instances]`. Entities live at paths that
//! alternate structural keys and names directly under the root:
//!
//! ```text
//! groups/storages/replicasets/s-001/instances/s-001-a
//! ```
//!
//! The effective configuration of an entity is built by overlaying, from
//! outermost to innermost: the hierarchy defaults, the global layer (root
//! keys minus every structural key), each named ancestor's own keys, and the
//! entity's own keys. How an inner layer overlays an outer one is chosen per
//! key path by [`MergeStrategy`].

use std::collections::BTreeMap;

use cfgtree_path::KeyPath;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::ConfigError;
use crate::meta::{Provenance, SourceKind};
use crate::node::Node;

/// Sentinel name of the root level. Every hierarchy starts with it.
pub const GLOBAL_LEVEL: &str = "global";

/// Level name of the defaults layer
pub const DEFAULTS_LEVEL: &str = "defaults";

/// How an inner layer's value overlays the accumulated value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeStrategy {
    /// Inner value wins outright
    #[default]
    Replace,
    /// Concatenate arrays, outer elements first
    Append,
    /// Recursively merge maps, inner wins on conflicting leaves
    Deep,
}

/// Option for [`Hierarchy::new`]
#[derive(Debug, Clone)]
pub enum InheritOption {
    Defaults(Value),
    NoInherit(Vec<KeyPath>),
    NoInheritFrom { level: String, key: KeyPath },
    InheritMerge { prefix: KeyPath, strategy: MergeStrategy },
}

/// Lowest-priority layer beneath global
pub fn with_defaults(defaults: Value) -> InheritOption {
    InheritOption::Defaults(defaults)
}

/// Keys that are never propagated to descendants
pub fn with_no_inherit<I, K>(keys: I) -> InheritOption
where
    I: IntoIterator<Item = K>,
    K: Into<KeyPath>,
{
    InheritOption::NoInherit(keys.into_iter().map(Into::into).collect())
}

/// Drop `key` from one level's contribution only
pub fn with_no_inherit_from(level: &str, key: impl Into<KeyPath>) -> InheritOption {
    InheritOption::NoInheritFrom {
        level: level.to_string(),
        key: key.into(),
    }
}

/// Use `strategy` for `prefix` and everything below it
pub fn with_inherit_merge(prefix: impl Into<KeyPath>, strategy: MergeStrategy) -> InheritOption {
    InheritOption::InheritMerge {
        prefix: prefix.into(),
        strategy,
    }
}

/// One level's contribution to an entity's effective config
#[derive(Debug, Clone)]
struct Layer {
    level: String,
    node: Node,
}

/// A registered ownership hierarchy
#[derive(Debug, Clone)]
pub struct Hierarchy {
    levels: Vec<String>,
    defaults: Option<Node>,
    no_inherit: Vec<KeyPath>,
    no_inherit_from: Vec<(String, KeyPath)>,
    strategies: Vec<(KeyPath, MergeStrategy)>,
}

impl Hierarchy {
    /// Register a hierarchy.
    ///
    /// # Panics
    ///
    /// If `levels` does not start with [`GLOBAL_LEVEL`], or an option names a
    /// level that is not in `levels`.
    pub fn new<I, S>(levels: I, options: impl IntoIterator<Item = InheritOption>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let levels: Vec<String> = levels.into_iter().map(Into::into).collect();
        assert!(
            levels.first().map(String::as_str) == Some(GLOBAL_LEVEL),
            "inheritance levels must start with '{}', got {:?}",
            GLOBAL_LEVEL,
            levels
        );

        let mut hierarchy = Self {
            levels,
            defaults: None,
            no_inherit: Vec::new(),
            no_inherit_from: Vec::new(),
            strategies: Vec::new(),
        };
        for option in options {
            match option {
                InheritOption::Defaults(value) => {
                    let provenance = Provenance::new(DEFAULTS_LEVEL, SourceKind::Default, "");
                    hierarchy.defaults = Some(Node::from_value(value, &provenance));
                }
                InheritOption::NoInherit(keys) => hierarchy.no_inherit.extend(keys),
                InheritOption::NoInheritFrom { level, key } => {
                    assert!(
                        hierarchy.levels.contains(&level),
                        "no-inherit-from level '{}' is not one of {:?}",
                        level,
                        hierarchy.levels
                    );
                    hierarchy.no_inherit_from.push((level, key));
                }
                InheritOption::InheritMerge { prefix, strategy } => {
                    hierarchy.strategies.push((prefix, strategy));
                }
            }
        }
        hierarchy
    }

    /// All levels, starting with the global sentinel
    pub fn levels(&self) -> &[String] {
        &self.levels
    }

    /// Levels that appear as keys in the tree
    pub fn structural_keys(&self) -> &[String] {
        &self.levels[1..]
    }

    /// Strategy of the longest registered prefix matching `path`
    pub fn strategy_for(&self, path: &KeyPath) -> MergeStrategy {
        self.strategies
            .iter()
            .filter(|(prefix, _)| path.matches(prefix))
            .fold(None::<&(KeyPath, MergeStrategy)>, |best, candidate| match best {
                Some(b) if b.0.len() > candidate.0.len() => Some(b),
                _ => Some(candidate),
            })
            .map(|(_, strategy)| *strategy)
            .unwrap_or_default()
    }

    /// Whether a strategy is registered strictly below `path`
    fn has_override_below(&self, path: &KeyPath) -> bool {
        self.strategies.iter().any(|(prefix, _)| {
            prefix.len() > path.len() && path.matches(&prefix.truncate(path.len()))
        })
    }

    /// Build the layers for `path`.
    ///
    /// `Ok(None)` means `path` does not have this hierarchy's shape.
    fn layers(
        &self,
        root: &Node,
        path: &KeyPath,
        global_excluded: &[String],
    ) -> Result<Option<Vec<Layer>>, ConfigError> {
        let keys = self.structural_keys();
        let segments = path.segments();
        if segments.is_empty() || segments.len() % 2 != 0 || segments.len() > keys.len() * 2 {
            return Ok(None);
        }
        let depth = segments.len() / 2;
        if (0..depth).any(|i| segments[i * 2] != keys[i]) {
            return Ok(None);
        }

        let mut layers = Vec::with_capacity(depth + 2);
        if let Some(defaults) = &self.defaults {
            layers.push(Layer {
                level: DEFAULTS_LEVEL.to_string(),
                node: defaults.clone(),
            });
        }

        layers.push(Layer {
            level: GLOBAL_LEVEL.to_string(),
            node: copy_without(root, global_excluded),
        });

        let mut node = root;
        for i in 0..depth {
            let entity = node
                .child(&keys[i])
                .and_then(|container| container.child(&segments[i * 2 + 1]))
                .ok_or_else(|| ConfigError::PathNotFound(path.truncate(i * 2 + 2)))?;

            let next = keys.get(i + 1..i + 2).unwrap_or(&[]);
            layers.push(Layer {
                level: keys[i].clone(),
                node: copy_without(entity, next),
            });
            node = entity;
        }
        Ok(Some(layers))
    }

    /// Drop excluded keys from every layer but the entity's own
    fn apply_exclusions(&self, layers: &mut [Layer]) {
        let Some((_, inherited)) = layers.split_last_mut() else {
            return;
        };
        for layer in inherited {
            for pattern in &self.no_inherit {
                remove_matching(&mut layer.node, &KeyPath::root(), pattern);
            }
            for (level, pattern) in &self.no_inherit_from {
                if *level == layer.level {
                    remove_matching(&mut layer.node, &KeyPath::root(), pattern);
                }
            }
        }
    }

    /// Overlay layers from outermost to innermost
    fn overlay_layers(&self, layers: Vec<Layer>) -> Node {
        let mut result = Node::new();
        for layer in layers {
            for (key, incoming) in layer.node.children() {
                let path = KeyPath::new([key]);
                let merged = self.overlay(result.child(key), incoming, &path);
                result.set_child(key, merged);
            }
        }
        result
    }

    fn overlay(&self, current: Option<&Node>, incoming: &Node, path: &KeyPath) -> Node {
        let Some(current) = current else {
            return incoming.clone();
        };
        let strategy = self.strategy_for(path);

        // A more specific strategy lives below: descend so it only governs
        // its own sub-path.
        if !incoming.is_leaf() && !current.is_leaf() && self.has_override_below(path) {
            let mut out = if strategy == MergeStrategy::Deep {
                current.clone()
            } else {
                Node::new()
            };
            out.stamp(&incoming.provenance());
            for (key, child) in incoming.children() {
                let merged = self.overlay(current.child(key), child, &path.child(key));
                out.set_child(key, merged);
            }
            return out;
        }

        match strategy {
            MergeStrategy::Replace => incoming.clone(),
            MergeStrategy::Append => match (current.value(), incoming.value()) {
                (Value::Array(outer), Value::Array(inner))
                    if current.is_leaf() && incoming.is_leaf() =>
                {
                    let mut merged = incoming.clone();
                    merged.set_value(Value::Array(
                        outer.iter().chain(inner.iter()).cloned().collect(),
                    ));
                    merged
                }
                _ => incoming.clone(),
            },
            MergeStrategy::Deep => {
                if !is_map_shaped(current) || !is_map_shaped(incoming) {
                    return incoming.clone();
                }
                if incoming.is_leaf() {
                    return current.clone();
                }
                if current.is_leaf() {
                    return incoming.clone();
                }
                let mut out = current.clone();
                out.stamp(&incoming.provenance());
                for (key, child) in incoming.children() {
                    let merged = self.overlay(current.child(key), child, &path.child(key));
                    out.set_child(key, merged);
                }
                out
            }
        }
    }

    /// Paths of every entity at the deepest level
    fn entities(&self, root: &Node) -> Vec<KeyPath> {
        let keys = self.structural_keys();
        if keys.is_empty() {
            return Vec::new();
        }
        let mut frontier = vec![(KeyPath::root(), root)];
        for key in keys {
            let mut next = Vec::new();
            for (path, node) in frontier {
                let Some(container) = node.child(key) else {
                    continue;
                };
                for (name, entity) in container.children() {
                    next.push((path.append([key.as_str(), name]), entity));
                }
            }
            frontier = next;
        }
        frontier.into_iter().map(|(path, _)| path).collect()
    }
}

/// Copy `node`, leaving out the top-level children named in `skip`.
/// Skipped subtrees are never cloned.
fn copy_without(node: &Node, skip: &[String]) -> Node {
    if node.is_leaf() {
        return node.clone();
    }
    let mut copy = Node::new();
    copy.stamp(&node.provenance());
    for (key, child) in node.children() {
        if !skip.iter().any(|s| s == key) {
            copy.set_child(key, child.clone());
        }
    }
    copy.set_order_set(node.is_order_set());
    copy
}

/// Internal node, or a leaf holding an empty object
fn is_map_shaped(node: &Node) -> bool {
    !node.is_leaf() || matches!(node.value(), Value::Object(map) if map.is_empty())
}

/// Remove every node whose path (relative to `node`) matches `pattern`.
/// Parents emptied by the removal are removed as well.
fn remove_matching(node: &mut Node, prefix: &KeyPath, pattern: &KeyPath) {
    for key in node.keys() {
        let path = prefix.child(key.as_str());
        if path.matches(pattern) {
            node.remove_child(&key);
            continue;
        }
        let Some(child) = node.child_mut(&key) else {
            continue;
        };
        if child.is_leaf() {
            continue;
        }
        remove_matching(child, &path, pattern);
        if child.is_leaf() {
            node.remove_child(&key);
        }
    }
}

/// All registered hierarchies
#[derive(Debug, Clone, Default)]
pub struct Inheritance {
    hierarchies: Vec<Hierarchy>,
}

impl Inheritance {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, hierarchy: Hierarchy) {
        self.hierarchies.push(hierarchy);
    }

    pub fn hierarchies(&self) -> &[Hierarchy] {
        &self.hierarchies
    }

    pub fn is_empty(&self) -> bool {
        self.hierarchies.is_empty()
    }

    fn structural_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = Vec::new();
        for hierarchy in &self.hierarchies {
            for key in hierarchy.structural_keys() {
                if !keys.contains(key) {
                    keys.push(key.clone());
                }
            }
        }
        keys
    }

    /// Effective subtree for `path`.
    ///
    /// Paths that fit no hierarchy get their raw subtree without inheritance.
    pub fn effective(&self, root: &Node, path: &KeyPath) -> Result<Node, ConfigError> {
        let excluded = self.structural_keys();
        for hierarchy in &self.hierarchies {
            if let Some(layers) = hierarchy.layers(root, path, &excluded)? {
                return Ok(Self::resolve(hierarchy, layers));
            }
        }
        root.get(path)
            .cloned()
            .ok_or_else(|| ConfigError::PathNotFound(path.clone()))
    }

    /// Effective subtree of every deepest-level entity, keyed by path
    pub fn effective_all(&self, root: &Node) -> Result<BTreeMap<String, Node>, ConfigError> {
        if self.is_empty() {
            return Err(ConfigError::NoInheritance);
        }
        let excluded = self.structural_keys();
        let mut out = BTreeMap::new();
        for hierarchy in &self.hierarchies {
            for path in hierarchy.entities(root) {
                let key = path.to_string();
                if out.contains_key(&key) {
                    continue;
                }
                if let Some(layers) = hierarchy.layers(root, &path, &excluded)? {
                    out.insert(key, Self::resolve(hierarchy, layers));
                }
            }
        }
        debug!(entities = out.len(), "resolved effective configs");
        Ok(out)
    }

    fn resolve(hierarchy: &Hierarchy, mut layers: Vec<Layer>) -> Node {
        hierarchy.apply_exclusions(&mut layers);
        hierarchy.overlay_layers(layers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const LEVELS: [&str; 4] = [GLOBAL_LEVEL, "groups", "replicasets", "instances"];
    const LEAF: &str = "groups/storages/replicasets/s-001/instances/s-001-a";

    fn tree(value: Value) -> Node {
        Node::from_value(value, &Provenance::new("test", SourceKind::Map, ""))
    }

    fn resolve(hierarchy: Hierarchy, root: &Node, path: &str) -> Value {
        let mut inheritance = Inheritance::new();
        inheritance.register(hierarchy);
        inheritance
            .effective(root, &KeyPath::from(path))
            .unwrap()
            .to_value()
    }

    #[test]
    #[should_panic(expected = "must start with 'global'")]
    fn test_levels_must_start_with_global() {
        Hierarchy::new(["groups", "instances"], []);
    }

    #[test]
    #[should_panic(expected = "not one of")]
    fn test_no_inherit_from_unknown_level() {
        Hierarchy::new(LEVELS, [with_no_inherit_from("zones", "x")]);
    }

    #[test]
    fn test_strategy_longest_prefix() {
        let hierarchy = Hierarchy::new(
            LEVELS,
            [
                with_inherit_merge("credentials", MergeStrategy::Deep),
                with_inherit_merge("credentials/users", MergeStrategy::Append),
            ],
        );

        assert_eq!(hierarchy.strategy_for(&KeyPath::from("credentials")), MergeStrategy::Deep);
        assert_eq!(
            hierarchy.strategy_for(&KeyPath::from("credentials/users/admin")),
            MergeStrategy::Append
        );
        assert_eq!(
            hierarchy.strategy_for(&KeyPath::from("credentials/roles")),
            MergeStrategy::Deep
        );
        assert_eq!(hierarchy.strategy_for(&KeyPath::from("other")), MergeStrategy::Replace);
    }

    #[test]
    fn test_layers_order_and_structural_keys_removed() {
        let root = tree(json!({
            "log": "global",
            "groups": {
                "storages": {
                    "log": "group",
                    "replicasets": {
                        "s-001": {
                            "instances": {"s-001-a": {"port": 3301}}
                        }
                    }
                }
            }
        }));

        let result = resolve(Hierarchy::new(LEVELS, []), &root, LEAF);
        assert_eq!(result, json!({"log": "group", "port": 3301}));
    }

    #[test]
    fn test_copy_without_skips_structural_subtrees() {
        let root = tree(json!({
            "b": 1,
            "groups": {"g": {"port": 1}},
            "a": {"x": 2}
        }));
        let copy = copy_without(&root, &["groups".to_string()]);

        assert_eq!(copy.keys(), vec!["b", "a"]);
        assert_eq!(copy.source(), "test");
        assert_eq!(copy_without(&root, &[]).to_value(), root.to_value());

        let leaf = tree(json!(5));
        assert_eq!(copy_without(&leaf, &["groups".to_string()]).to_value(), json!(5));
    }

    #[test]
    fn test_append_concatenates_outer_first() {
        let root = tree(json!({
            "groups": {
                "g": {
                    "roles": ["storage"],
                    "replicasets": {
                        "r": {
                            "roles": ["metrics"],
                            "instances": {"i": {"roles": ["cache"]}}
                        }
                    }
                }
            }
        }));
        let hierarchy = Hierarchy::new(LEVELS, [with_inherit_merge("roles", MergeStrategy::Append)]);

        let result = resolve(hierarchy, &root, "groups/g/replicasets/r/instances/i");
        assert_eq!(result["roles"], json!(["storage", "metrics", "cache"]));
    }

    #[test]
    fn test_append_falls_back_to_replace() {
        let root = tree(json!({
            "roles": "not-a-list",
            "groups": {"g": {"roles": ["storage"]}}
        }));
        let hierarchy = Hierarchy::new(LEVELS, [with_inherit_merge("roles", MergeStrategy::Append)]);

        assert_eq!(resolve(hierarchy, &root, "groups/g")["roles"], json!(["storage"]));
    }

    #[test]
    fn test_deep_merges_maps() {
        let root = tree(json!({
            "credentials": {"users": {"admin": {"password": "a"}}, "mode": "strict"},
            "groups": {"g": {"credentials": {"users": {"guest": {"password": "g"}}}}}
        }));

        let replace = resolve(Hierarchy::new(LEVELS, []), &root, "groups/g");
        assert_eq!(replace["credentials"], json!({"users": {"guest": {"password": "g"}}}));

        let deep = Hierarchy::new(LEVELS, [with_inherit_merge("credentials", MergeStrategy::Deep)]);
        let merged = resolve(deep, &root, "groups/g");
        assert_eq!(
            merged["credentials"],
            json!({
                "users": {"admin": {"password": "a"}, "guest": {"password": "g"}},
                "mode": "strict"
            })
        );
    }

    #[test]
    fn test_deep_keeps_inherited_keys_under_empty_map() {
        let root = tree(json!({
            "credentials": {"users": {"admin": "a"}},
            "groups": {
                "g": {"credentials": {}},
                "h": {"credentials": {"users": {"guest": "g"}}}
            }
        }));
        let hierarchy = Hierarchy::new(LEVELS, [with_inherit_merge("credentials", MergeStrategy::Deep)]);
        let mut inheritance = Inheritance::new();
        inheritance.register(hierarchy);

        let g = inheritance.effective(&root, &KeyPath::from("groups/g")).unwrap();
        assert_eq!(g.to_value()["credentials"], json!({"users": {"admin": "a"}}));

        let empty_global = tree(json!({
            "credentials": {},
            "groups": {"g": {"credentials": {"users": {"guest": "g"}}}}
        }));
        let g = inheritance.effective(&empty_global, &KeyPath::from("groups/g")).unwrap();
        assert_eq!(g.to_value()["credentials"], json!({"users": {"guest": "g"}}));

        let replace = resolve(Hierarchy::new(LEVELS, []), &root, "groups/g");
        assert_eq!(replace["credentials"], json!({}));
    }

    #[test]
    fn test_nested_strategy_scoped_to_sub_path() {
        let root = tree(json!({
            "credentials": {"users": {"admin": 1}, "roles": {"r1": 1}},
            "groups": {"g": {"credentials": {"users": {"guest": 2}, "roles": {"r2": 2}}}}
        }));
        let hierarchy = Hierarchy::new(
            LEVELS,
            [with_inherit_merge("credentials/users", MergeStrategy::Deep)],
        );

        let result = resolve(hierarchy, &root, "groups/g");
        assert_eq!(result["credentials"]["users"], json!({"admin": 1, "guest": 2}));
        assert_eq!(result["credentials"]["roles"], json!({"r2": 2}));
    }

    #[test]
    fn test_no_inherit_keeps_only_own_value() {
        let root = tree(json!({
            "leader": "x",
            "groups": {"g": {"replicasets": {"r": {"leader": "r-leader", "instances": {"i": {}}}}}}
        }));
        let hierarchy = Hierarchy::new(LEVELS, [with_no_inherit(["leader"])]);

        let leaf = resolve(hierarchy.clone(), &root, "groups/g/replicasets/r/instances/i");
        assert!(leaf.get("leader").is_none());

        let replicaset = resolve(hierarchy, &root, "groups/g/replicasets/r");
        assert_eq!(replicaset["leader"], json!("r-leader"));
    }

    #[test]
    fn test_no_inherit_from_single_level() {
        let root = tree(json!({
            "snapshot": {"dir": "/global", "count": 2},
            "groups": {"g": {"replicasets": {"r": {"instances": {"i": {"port": 1}}}}}}
        }));
        let hierarchy = Hierarchy::new(LEVELS, [with_no_inherit_from(GLOBAL_LEVEL, "snapshot/dir")]);

        let leaf = resolve(hierarchy, &root, "groups/g/replicasets/r/instances/i");
        assert_eq!(leaf["snapshot"], json!({"count": 2}));
    }

    #[test]
    fn test_exclusion_prunes_emptied_parents() {
        let root = tree(json!({
            "snapshot": {"dir": "/global"},
            "groups": {"g": {}}
        }));
        let hierarchy = Hierarchy::new(LEVELS, [with_no_inherit(["snapshot/dir"])]);

        let group = resolve(hierarchy, &root, "groups/g");
        assert!(group.get("snapshot").is_none());
    }

    #[test]
    fn test_defaults_are_lowest_priority() {
        let root = tree(json!({
            "log": "global",
            "groups": {"g": {}}
        }));
        let hierarchy = Hierarchy::new(
            LEVELS,
            [with_defaults(json!({"log": "default", "memtx": {"memory": 256}}))],
        );

        let mut inheritance = Inheritance::new();
        inheritance.register(hierarchy);
        let node = inheritance.effective(&root, &KeyPath::from("groups/g")).unwrap();

        assert_eq!(node.to_value(), json!({"log": "global", "memtx": {"memory": 256}}));
        assert_eq!(node.child("memtx").unwrap().kind(), SourceKind::Default);
    }

    #[test]
    fn test_non_matching_path_falls_back_to_raw_subtree() {
        let root = tree(json!({"server": {"port": 1}, "groups": {"g": {}}}));
        let mut inheritance = Inheritance::new();
        inheritance.register(Hierarchy::new(LEVELS, []));

        let raw = inheritance.effective(&root, &KeyPath::from("server")).unwrap();
        assert_eq!(raw.to_value(), json!({"port": 1}));

        let err = inheritance
            .effective(&root, &KeyPath::from("missing"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::PathNotFound(_)));

        let err = inheritance
            .effective(&root, &KeyPath::from("groups/nope"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::PathNotFound(_)));
    }

    #[test]
    fn test_effective_all_enumerates_leaves() {
        let root = tree(json!({
            "log": "info",
            "groups": {
                "g1": {"replicasets": {"r1": {"instances": {"a": {}, "b": {"log": "debug"}}}}},
                "g2": {"replicasets": {"r2": {"instances": {"c": {}}}}}
            }
        }));
        let mut inheritance = Inheritance::new();
        inheritance.register(Hierarchy::new(LEVELS, []));

        let all = inheritance.effective_all(&root).unwrap();
        let keys: Vec<&str> = all.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec![
                "groups/g1/replicasets/r1/instances/a",
                "groups/g1/replicasets/r1/instances/b",
                "groups/g2/replicasets/r2/instances/c",
            ]
        );
        assert_eq!(all["groups/g1/replicasets/r1/instances/b"].to_value()["log"], json!("debug"));
        assert_eq!(all["groups/g2/replicasets/r2/instances/c"].to_value()["log"], json!("info"));
    }

    #[test]
    fn test_effective_all_requires_hierarchy() {
        let err = Inheritance::new().effective_all(&Node::new()).unwrap_err();
        assert!(matches!(err, ConfigError::NoInheritance));
    }
}
