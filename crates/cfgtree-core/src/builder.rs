//! Config builder.
//!
//! Collectors are drained strictly in the order they were added; later
//! collectors override earlier ones. Building stops at the first collector
//! that reports errors, and validation only ever sees a fully merged tree.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::cancel::CancelToken;
use crate::collector::Collector;
use crate::config::Config;
use crate::error::{BuildError, CollectorError, MergeError};
use crate::inheritance::{Hierarchy, InheritOption, Inheritance};
use crate::merge::{DefaultMerger, Merger};
use crate::mutable::MutableConfig;
use crate::node::Node;
use crate::validator::{run_validator, RuleValidator, Validator, ValidatorError};

/// Assembles a configuration tree from prioritized collectors
pub struct Builder {
    collectors: Vec<Box<dyn Collector>>,
    validator: Option<Arc<dyn Validator>>,
    merger: Arc<dyn Merger>,
    inheritance: Inheritance,
    cancel: CancelToken,
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl Builder {
    pub fn new() -> Self {
        Self {
            collectors: Vec::new(),
            validator: None,
            merger: Arc::new(DefaultMerger),
            inheritance: Inheritance::new(),
            cancel: CancelToken::new(),
        }
    }

    /// Add a collector with higher priority than every collector added before
    pub fn add_collector(mut self, collector: impl Collector + 'static) -> Self {
        self.collectors.push(Box::new(collector));
        self
    }

    pub fn with_validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validator = Some(Arc::new(validator));
        self
    }

    /// Compile a TOML rule file into the validator
    pub fn with_schema_file(self, path: &Path) -> Result<Self, ValidatorError> {
        let validator = RuleValidator::from_file(path)?;
        Ok(self.with_validator(validator))
    }

    pub fn with_merger(mut self, merger: impl Merger + 'static) -> Self {
        self.merger = Arc::new(merger);
        self
    }

    /// Register an inheritance hierarchy.
    ///
    /// # Panics
    ///
    /// See [`Hierarchy::new`].
    pub fn with_inheritance<I, S>(
        mut self,
        levels: I,
        options: impl IntoIterator<Item = InheritOption>,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inheritance.register(Hierarchy::new(levels, options));
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn build(self) -> Result<Config, BuildError> {
        let root = self.merge_and_validate()?;
        Ok(Config::new(root, Arc::new(self.inheritance)))
    }

    pub fn build_mutable(self) -> Result<MutableConfig, BuildError> {
        let root = self.merge_and_validate()?;
        Ok(MutableConfig::new(
            root,
            Arc::new(self.inheritance),
            self.validator,
        ))
    }

    fn merge_and_validate(&self) -> Result<Node, BuildError> {
        let mut root = Node::new();
        for collector in &self.collectors {
            self.merge_collector(collector.as_ref(), &mut root)?;
        }

        if let Err(errors) = run_validator(self.validator.as_deref(), &root) {
            warn!(errors = errors.0.len(), "configuration failed validation");
            return Err(BuildError::Validation(errors));
        }
        info!(collectors = self.collectors.len(), "configuration built");
        Ok(root)
    }

    fn merge_collector(&self, collector: &dyn Collector, root: &mut Node) -> Result<(), BuildError> {
        let mut ctx = self.merger.create_context(collector);
        let mut errors: Vec<MergeError> = Vec::new();
        let mut merged = 0usize;
        let mut cancelled = false;

        for item in collector.read(&self.cancel) {
            // Keep draining after cancellation so the stream is exhausted.
            if cancelled || self.cancel.is_cancelled() {
                cancelled = true;
                continue;
            }
            let key = item.meta().key.clone();
            let result = item
                .get()
                .map_err(MergeError::from)
                .and_then(|value| self.merger.merge_value(&mut ctx, root, &key, value));
            match result {
                Ok(()) => merged += 1,
                Err(e) => errors.push(e),
            }
        }

        if cancelled || self.cancel.is_cancelled() {
            return Err(BuildError::Cancelled {
                collector: collector.name().to_string(),
            });
        }

        if let Err(e) = self.merger.apply_ordering(ctx, root) {
            errors.push(e);
        }

        if !errors.is_empty() {
            warn!(collector = collector.name(), errors = errors.len(), "collector failed");
            return Err(CollectorError {
                collector: collector.name().to_string(),
                errors,
            }
            .into());
        }
        debug!(
            collector = collector.name(),
            source = %collector.source(),
            keep_order = collector.keep_order(),
            merged,
            "merged collector"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::{FailedValue, MapCollector, SourceValue, ValueStream};
    use crate::meta::{Provenance, SourceKind};
    use crate::validator::ValidationError;
    use cfgtree_path::KeyPath;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct RequirePort;

    impl Validator for RequirePort {
        fn validate(&self, root: &Node) -> Vec<ValidationError> {
            if root.get(&KeyPath::from("server/port")).is_some() {
                Vec::new()
            } else {
                vec![ValidationError::new(KeyPath::from("server/port"), "required", "missing")]
            }
        }

        fn schema_type(&self) -> &str {
            "test"
        }
    }

    /// Emits one good value and one undecodable value
    struct BrokenCollector;

    impl Collector for BrokenCollector {
        fn name(&self) -> &str {
            "broken"
        }

        fn source(&self) -> SourceKind {
            SourceKind::Storage
        }

        fn revision(&self) -> &str {
            "1"
        }

        fn keep_order(&self) -> bool {
            false
        }

        fn read<'a>(&'a self, _cancel: &'a CancelToken) -> ValueStream<'a> {
            let provenance = Provenance::new("broken", SourceKind::Storage, "1");
            let items: Vec<Box<dyn SourceValue>> = vec![
                Box::new(crate::collector::CollectedValue::new(
                    provenance.meta(KeyPath::from("ok")),
                    json!(1),
                )),
                Box::new(FailedValue::new(provenance.meta(KeyPath::from("bad")), "corrupt")),
            ];
            Box::new(items.into_iter())
        }
    }

    /// Emits `total` items, cancelling the token after `cancel_after` of them.
    /// Items are produced regardless of the token, like an already-filled buffer.
    struct BufferedCollector {
        name: &'static str,
        total: usize,
        cancel_after: Option<usize>,
        cancel: CancelToken,
        pulled: Arc<AtomicUsize>,
    }

    impl Collector for BufferedCollector {
        fn name(&self) -> &str {
            self.name
        }

        fn source(&self) -> SourceKind {
            SourceKind::Storage
        }

        fn revision(&self) -> &str {
            ""
        }

        fn keep_order(&self) -> bool {
            false
        }

        fn read<'a>(&'a self, _cancel: &'a CancelToken) -> ValueStream<'a> {
            let provenance = Provenance::new(self.name, SourceKind::Storage, "");
            Box::new((0..self.total).map(move |i| {
                self.pulled.fetch_add(1, Ordering::SeqCst);
                if Some(i + 1) == self.cancel_after {
                    self.cancel.cancel();
                }
                Box::new(crate::collector::CollectedValue::new(
                    provenance.meta(KeyPath::new([format!("k{}", i)])),
                    json!(i),
                )) as Box<dyn SourceValue>
            }))
        }
    }

    #[test]
    fn test_cancel_mid_stream_drains_and_stops() {
        let cancel = CancelToken::new();
        let first_pulled = Arc::new(AtomicUsize::new(0));
        let second_pulled = Arc::new(AtomicUsize::new(0));

        let err = Builder::new()
            .add_collector(BufferedCollector {
                name: "buffered",
                total: 5,
                cancel_after: Some(2),
                cancel: cancel.clone(),
                pulled: Arc::clone(&first_pulled),
            })
            .add_collector(BufferedCollector {
                name: "later",
                total: 3,
                cancel_after: None,
                cancel: cancel.clone(),
                pulled: Arc::clone(&second_pulled),
            })
            .with_cancel_token(cancel.clone())
            .build()
            .unwrap_err();

        assert!(matches!(err, BuildError::Cancelled { ref collector } if collector == "buffered"));
        assert!(cancel.is_cancelled());
        assert_eq!(first_pulled.load(Ordering::SeqCst), 5);
        assert_eq!(second_pulled.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_later_collector_wins() {
        let config = Builder::new()
            .add_collector(MapCollector::new(json!({"a": 1, "b": 1})).with_name("first"))
            .add_collector(MapCollector::new(json!({"b": 2})).with_name("second"))
            .build()
            .unwrap();

        assert_eq!(config.to_value(), json!({"a": 1, "b": 2}));
        assert_eq!(config.stat("b").unwrap().source.name, "second");
    }

    #[test]
    fn test_empty_builder() {
        let config = Builder::new().build().unwrap();
        assert!(config.lookup("anything").is_none());
    }

    #[test]
    fn test_collector_errors_stop_build() {
        let err = Builder::new()
            .add_collector(BrokenCollector)
            .add_collector(MapCollector::new(json!({"never": true})))
            .build()
            .unwrap_err();

        match err {
            BuildError::Collector(e) => {
                assert_eq!(e.collector, "broken");
                assert_eq!(e.errors.len(), 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_scalar_at_root_is_collector_error() {
        let err = Builder::new()
            .add_collector(MapCollector::new(Value::from(5)))
            .build()
            .unwrap_err();
        assert!(matches!(err, BuildError::Collector(_)));
    }

    #[test]
    fn test_validation_failure() {
        let err = Builder::new()
            .add_collector(MapCollector::new(json!({"server": {"host": "h"}})))
            .with_validator(RequirePort)
            .build()
            .unwrap_err();
        assert!(matches!(err, BuildError::Validation(_)));

        let ok = Builder::new()
            .add_collector(MapCollector::new(json!({"server": {"port": 1}})))
            .with_validator(RequirePort)
            .build();
        assert!(ok.is_ok());
    }

    #[test]
    fn test_cancelled_build() {
        let cancel = CancelToken::new();
        cancel.cancel();

        let err = Builder::new()
            .add_collector(MapCollector::new(json!({"a": 1})).with_name("m"))
            .with_cancel_token(cancel)
            .build()
            .unwrap_err();
        assert!(matches!(err, BuildError::Cancelled { ref collector } if collector == "m"));
    }

    #[test]
    fn test_build_mutable_keeps_validator() {
        let cfg = Builder::new()
            .add_collector(MapCollector::new(json!({"server": {"port": 1}})))
            .with_validator(RequirePort)
            .build_mutable()
            .unwrap();

        assert!(cfg.delete("server/port").is_err());
        assert_eq!(cfg.get("server/port").unwrap().value, json!(1));
    }
}
