//! File collector for TOML and JSON documents.
//!
//! The document is read and parsed once, at construction. The collector's
//! revision is the SHA-256 digest of the raw file bytes, so any change to
//! the file produces a new revision.

use std::fs;
use std::path::{Path, PathBuf};

use cfgtree_core::{flatten, stream_values, CancelToken, Collector, Provenance, SourceKind, ValueStream};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::SourceError;

/// Document format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Toml,
    Json,
}

impl Format {
    /// Infer the format from the file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Collector over a single configuration file
#[derive(Debug, Clone)]
pub struct FileCollector {
    name: String,
    revision: String,
    keep_order: bool,
    data: Value,
}

impl FileCollector {
    /// Load `path`, inferring its format from the extension
    pub fn new(path: &Path) -> Result<Self, SourceError> {
        let format =
            Format::from_path(path).ok_or_else(|| SourceError::UnknownFormat(path.to_path_buf()))?;
        Self::with_format(path, format)
    }

    /// Load `path` as `format`
    pub fn with_format(path: &Path, format: Format) -> Result<Self, SourceError> {
        let bytes = fs::read(path).map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(path, &bytes, format)
    }

    /// Parse already-loaded file contents. `path` is used as the collector name.
    pub fn from_bytes(path: &Path, bytes: &[u8], format: Format) -> Result<Self, SourceError> {
        let parse_error = |message: String| SourceError::Parse {
            path: path.to_path_buf(),
            message,
        };

        let mut hasher = Sha256::new();
        hasher.update(bytes);
        let revision = hex::encode(hasher.finalize());

        let contents = std::str::from_utf8(bytes)
            .map_err(|e| parse_error(format!("Invalid UTF-8: {}", e)))?;

        let data = match format {
            Format::Toml => {
                let table: toml::Table = toml::from_str(contents)
                    .map_err(|e| parse_error(format!("TOML parse error: {}", e)))?;
                toml_to_json(toml::Value::Table(table))
            }
            Format::Json => serde_json::from_str(contents)
                .map_err(|e| parse_error(format!("JSON parse error: {}", e)))?,
        };

        let name = path.display().to_string();
        debug!(file = %name, revision = %revision, "loaded config file");
        Ok(Self {
            name,
            revision,
            keep_order: true,
            data,
        })
    }

    /// Override whether key order from the file is preserved (default: true)
    pub fn with_keep_order(mut self, keep_order: bool) -> Self {
        self.keep_order = keep_order;
        self
    }

    pub fn path(&self) -> PathBuf {
        PathBuf::from(&self.name)
    }
}

impl Collector for FileCollector {
    fn name(&self) -> &str {
        &self.name
    }

    fn source(&self) -> SourceKind {
        SourceKind::File
    }

    fn revision(&self) -> &str {
        &self.revision
    }

    fn keep_order(&self) -> bool {
        self.keep_order
    }

    fn read<'a>(&'a self, cancel: &'a CancelToken) -> ValueStream<'a> {
        let provenance = Provenance::new(self.name.clone(), SourceKind::File, self.revision.clone());
        stream_values(flatten(self.data.clone()), provenance, cancel)
    }
}

/// Convert a TOML value to JSON. Datetimes become strings; non-finite
/// floats become null.
fn toml_to_json(toml: toml::Value) -> Value {
    match toml {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::Number(i.into()),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(arr) => Value::Array(arr.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn toml_file(contents: &str) -> NamedTempFile {
        let mut temp = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        temp.write_all(contents.as_bytes()).unwrap();
        temp
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(Format::from_path(Path::new("a/b.toml")), Some(Format::Toml));
        assert_eq!(Format::from_path(Path::new("b.JSON")), Some(Format::Json));
        assert_eq!(Format::from_path(Path::new("b.yaml")), None);
        assert_eq!(Format::from_path(Path::new("noext")), None);
    }

    #[test]
    fn test_load_toml_preserves_order() {
        let temp = toml_file("zeta = 1\nalpha = 2\n[server]\nport = 8080\nhost = \"h\"\n");
        let collector = FileCollector::new(temp.path()).unwrap();
        let cancel = CancelToken::new();

        let keys: Vec<String> = collector
            .read(&cancel)
            .map(|v| v.meta().key.to_string())
            .collect();
        assert_eq!(keys, vec!["zeta", "alpha", "server/port", "server/host"]);
        assert!(collector.keep_order());
        assert_eq!(collector.source(), SourceKind::File);
    }

    #[test]
    fn test_revision_is_content_digest() {
        let a = FileCollector::from_bytes(Path::new("a.toml"), b"x = 1\n", Format::Toml).unwrap();
        let b = FileCollector::from_bytes(Path::new("b.toml"), b"x = 1\n", Format::Toml).unwrap();
        let c = FileCollector::from_bytes(Path::new("a.toml"), b"x = 2\n", Format::Toml).unwrap();

        assert_eq!(a.revision(), b.revision());
        assert_ne!(a.revision(), c.revision());
        assert_eq!(a.revision().len(), 64);
    }

    #[test]
    fn test_json_file() {
        let collector = FileCollector::from_bytes(
            Path::new("c.json"),
            br#"{"b": {"x": [1, 2]}, "a": null}"#,
            Format::Json,
        )
        .unwrap();
        let cancel = CancelToken::new();

        let values: Vec<(String, Value)> = collector
            .read(&cancel)
            .map(|v| (v.meta().key.to_string(), v.get().unwrap()))
            .collect();
        assert_eq!(
            values,
            vec![("b/x".to_string(), json!([1, 2])), ("a".to_string(), Value::Null)]
        );
    }

    #[test]
    fn test_parse_errors() {
        let err = FileCollector::from_bytes(Path::new("bad.toml"), b"= nope", Format::Toml).unwrap_err();
        assert!(matches!(err, SourceError::Parse { .. }));

        let err = FileCollector::new(Path::new("config.ini")).unwrap_err();
        assert!(matches!(err, SourceError::UnknownFormat(_)));

        let err = FileCollector::new(Path::new("/definitely/missing.toml")).unwrap_err();
        assert!(matches!(err, SourceError::Io { .. }));
    }

    #[test]
    fn test_toml_datetime_to_string() {
        let value = toml_to_json(toml::Value::Datetime("1979-05-27T07:32:00Z".parse().unwrap()));
        assert_eq!(value, json!("1979-05-27T07:32:00Z"));
    }
}
