//! Environment variable collector.
//!
//! `APP_SERVER__PORT=8080` with prefix `APP` becomes `server/port = 8080`.

use std::collections::BTreeMap;

use cfgtree_core::{stream_values, CancelToken, Collector, Provenance, SourceKind, ValueStream};
use cfgtree_path::KeyPath;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::{debug, trace};

/// Separator between path segments inside a variable name
pub const DEFAULT_DELIMITER: &str = "__";

/// Collector over prefixed environment variables
#[derive(Debug, Clone)]
pub struct EnvCollector {
    prefix: String,
    delimiter: String,
    vars: BTreeMap<String, String>,
    revision: String,
}

impl EnvCollector {
    /// Snapshot the process environment
    pub fn new(prefix: impl Into<String>) -> Self {
        Self::from_vars(prefix, std::env::vars())
    }

    /// Build from an explicit variable set
    pub fn from_vars<I, K, V>(prefix: impl Into<String>, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut collector = Self {
            prefix: prefix.into(),
            delimiter: DEFAULT_DELIMITER.to_string(),
            vars: vars
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            revision: String::new(),
        };
        collector.revision = digest(&collector.values());
        collector
    }

    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self.revision = digest(&self.values());
        self
    }

    /// Map a variable name to a config path, if it carries the prefix
    fn key_for(&self, name: &str) -> Option<KeyPath> {
        let rest = if self.prefix.is_empty() {
            name
        } else {
            name.strip_prefix(&self.prefix)?.strip_prefix('_')?
        };
        if rest.is_empty() || self.delimiter.is_empty() {
            return None;
        }
        let key = KeyPath::new(rest.split(self.delimiter.as_str()).map(str::to_lowercase));
        if key.has_empty_segment() {
            trace!(var = name, "skipping variable with empty path segment");
            return None;
        }
        Some(key)
    }

    fn values(&self) -> Vec<(KeyPath, Value)> {
        self.vars
            .iter()
            .filter_map(|(name, raw)| self.key_for(name).map(|key| (key, parse_scalar(raw))))
            .collect()
    }
}

impl Collector for EnvCollector {
    fn name(&self) -> &str {
        "env"
    }

    fn source(&self) -> SourceKind {
        SourceKind::Env
    }

    /// Digest of the matching variables
    fn revision(&self) -> &str {
        &self.revision
    }

    fn keep_order(&self) -> bool {
        false
    }

    fn read<'a>(&'a self, cancel: &'a CancelToken) -> ValueStream<'a> {
        let values = self.values();
        debug!(prefix = %self.prefix, count = values.len(), "collected environment variables");
        let provenance = Provenance::new("env", SourceKind::Env, self.revision.clone());
        stream_values(values, provenance, cancel)
    }
}

/// Interpret a raw variable value: JSON scalars when they parse, else a string
fn parse_scalar(raw: &str) -> Value {
    match serde_json::from_str::<Value>(raw) {
        Ok(value @ (Value::Bool(_) | Value::Number(_) | Value::Null | Value::String(_))) => value,
        _ => Value::String(raw.to_string()),
    }
}

fn digest(values: &[(KeyPath, Value)]) -> String {
    let mut hasher = Sha256::new();
    for (key, value) in values {
        hasher.update(key.to_string().as_bytes());
        hasher.update(b"=");
        hasher.update(value.to_string().as_bytes());
        hasher.update(b"\n");
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn collect(collector: &EnvCollector) -> Vec<(String, Value)> {
        let cancel = CancelToken::new();
        collector
            .read(&cancel)
            .map(|v| (v.meta().key.to_string(), v.get().unwrap()))
            .collect()
    }

    #[test]
    fn test_prefix_and_delimiter() {
        let collector = EnvCollector::from_vars(
            "APP",
            [
                ("APP_SERVER__PORT", "8080"),
                ("APP_LOG", "debug"),
                ("OTHER_X", "1"),
                ("APPX_Y", "2"),
            ],
        );

        assert_eq!(
            collect(&collector),
            vec![
                ("log".to_string(), json!("debug")),
                ("server/port".to_string(), json!(8080)),
            ]
        );
    }

    #[test]
    fn test_scalar_parsing() {
        assert_eq!(parse_scalar("8080"), json!(8080));
        assert_eq!(parse_scalar("1.5"), json!(1.5));
        assert_eq!(parse_scalar("true"), json!(true));
        assert_eq!(parse_scalar("null"), Value::Null);
        assert_eq!(parse_scalar("hello"), json!("hello"));
        assert_eq!(parse_scalar("[1,2]"), json!("[1,2]"));
        assert_eq!(parse_scalar(""), json!(""));
    }

    #[test]
    fn test_custom_delimiter_and_empty_segments() {
        let collector = EnvCollector::from_vars(
            "APP",
            [("APP_A.B", "1"), ("APP_C..D", "2"), ("APP_", "3")],
        )
        .with_delimiter(".");

        assert_eq!(collect(&collector), vec![("a/b".to_string(), json!(1))]);
    }

    #[test]
    fn test_provenance() {
        let collector = EnvCollector::from_vars("APP", [("APP_A", "x")]);
        let cancel = CancelToken::new();
        let item = collector.read(&cancel).next().unwrap();

        assert_eq!(item.meta().source.kind, SourceKind::Env);
        assert_eq!(item.meta().source.name, "env");
        assert_eq!(item.meta().revision, collector.revision());
        assert_eq!(collector.revision().len(), 64);
        assert!(!collector.keep_order());
    }
}
