//! Error types for building and querying configuration trees.

use cfgtree_path::KeyPath;

use crate::validator::ValidationErrors;

/// Failure to extract a raw value from a collector item
#[derive(Debug, thiserror::Error)]
pub enum ValueError {
    #[error("failed to extract value at '{key}': {message}")]
    Extract { key: KeyPath, message: String },

    #[error("failed to decode value at '{key}': {source}")]
    Decode {
        key: KeyPath,
        #[source]
        source: serde_json::Error,
    },
}

/// Failure to fold a single value into the tree
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    #[error("cannot assign a non-map value to the tree root")]
    ScalarAtRoot,

    #[error(transparent)]
    Value(#[from] ValueError),
}

/// All errors produced while draining one collector
#[derive(Debug, thiserror::Error)]
#[error("collector '{collector}': {}", join_errors(.errors))]
pub struct CollectorError {
    pub collector: String,
    pub errors: Vec<MergeError>,
}

fn join_errors(errors: &[MergeError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors returned by `Builder::build`
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Collector(#[from] CollectorError),

    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("build cancelled while reading collector '{collector}'")]
    Cancelled { collector: String },
}

/// Errors returned by config queries and mutations
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("key not found: '{0}'")]
    KeyNotFound(KeyPath),

    #[error("path not found: '{0}'")]
    PathNotFound(KeyPath),

    #[error("no inheritance hierarchy registered")]
    NoInheritance,

    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Merge(#[from] MergeError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collector_error_joins_inner_errors() {
        let err = CollectorError {
            collector: "file.toml".to_string(),
            errors: vec![
                MergeError::ScalarAtRoot,
                MergeError::Value(ValueError::Extract {
                    key: KeyPath::from("a/b"),
                    message: "bad".to_string(),
                }),
            ],
        };

        let msg = err.to_string();
        assert!(msg.starts_with("collector 'file.toml': "));
        assert!(msg.contains("non-map value"));
        assert!(msg.contains("'a/b': bad"));
    }
}
