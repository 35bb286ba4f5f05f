//! Key paths for configuration trees.
//!
//! A [`KeyPath`] addresses a location in a configuration tree as an ordered
//! list of string segments. Paths are immutable: every operation that
//! "changes" a path returns a new one.

mod matching;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Default separator used by `Display` and `From<&str>`.
pub const SEPARATOR: char = '/';

/// Pattern segment matching exactly one path segment.
pub const WILDCARD_ONE: &str = "*";

/// Pattern segment matching zero or more path segments.
pub const WILDCARD_ANY: &str = "**";

/// An ordered sequence of key segments.
///
/// Empty segments are valid literal keys. Equality, hashing and ordering
/// compare segments positionally.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyPath(Vec<String>);

impl KeyPath {
    /// Create a path from any sequence of segments.
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// The empty path, addressing the tree root.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Split `s` on `sep`. An empty string yields the root path; empty
    /// pieces between separators are kept as empty segments.
    pub fn parse(s: &str, sep: char) -> Self {
        if s.is_empty() {
            return Self::root();
        }
        Self(s.split(sep).map(str::to_string).collect())
    }

    /// Return a new path with `segments` appended.
    pub fn append<I, S>(&self, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut next = self.0.clone();
        next.extend(segments.into_iter().map(Into::into));
        Self(next)
    }

    /// Return a new path with a single segment appended.
    pub fn child(&self, segment: impl Into<String>) -> Self {
        self.append([segment])
    }

    /// The path without its last segment, or `None` for paths of length <= 1.
    pub fn parent(&self) -> Option<KeyPath> {
        if self.0.len() <= 1 {
            return None;
        }
        Some(Self(self.0[..self.0.len() - 1].to_vec()))
    }

    /// The last segment, or `None` for the root path.
    pub fn leaf(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// Whether any segment is the empty string.
    pub fn has_empty_segment(&self) -> bool {
        self.0.iter().any(String::is_empty)
    }

    /// Whether `self` begins with every segment of `prefix`.
    pub fn starts_with(&self, prefix: &KeyPath) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// Take the first `n` segments (or the whole path if shorter).
    pub fn truncate(&self, n: usize) -> KeyPath {
        Self(self.0.iter().take(n).cloned().collect())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether this path contains `*` or `**` segments.
    pub fn is_pattern(&self) -> bool {
        self.0
            .iter()
            .any(|s| s == WILDCARD_ONE || s == WILDCARD_ANY)
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", SEPARATOR)?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

impl From<&str> for KeyPath {
    fn from(s: &str) -> Self {
        Self::parse(s, SEPARATOR)
    }
}

impl From<String> for KeyPath {
    fn from(s: String) -> Self {
        Self::parse(&s, SEPARATOR)
    }
}

impl From<&KeyPath> for KeyPath {
    fn from(path: &KeyPath) -> Self {
        path.clone()
    }
}

impl From<Vec<String>> for KeyPath {
    fn from(segments: Vec<String>) -> Self {
        Self(segments)
    }
}

impl<const N: usize> From<[&str; N]> for KeyPath {
    fn from(segments: [&str; N]) -> Self {
        Self::new(segments)
    }
}

impl<'a> IntoIterator for &'a KeyPath {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Serialize for KeyPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for KeyPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from(s))
    }
}
