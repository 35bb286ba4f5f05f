//! Validation of merged trees.
//!
//! Validators run against the complete tree after all collectors are merged
//! and after every `MutableConfig` mutation. [`RuleValidator`] is a small
//! declarative validator loadable from a TOML rule file:
//!
//! ```toml
//! [[rule]]
//! path = "server/port"
//! required = true
//! type = "integer"
//! min = 1
//! max = 65535
//! ```

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use cfgtree_path::KeyPath;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::node::Node;

/// Position range in the source document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRange {
    pub start: usize,
    pub end: usize,
}

/// A single validation failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    pub path: KeyPath,

    /// Machine-readable code
    pub code: String,

    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<SourceRange>,
}

impl ValidationError {
    pub fn new(path: KeyPath, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path,
            code: code.into(),
            message: message.into(),
            range: None,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.path, self.message, self.code)
    }
}

/// Non-empty list of validation failures
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationErrors(pub Vec<ValidationError>);

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", err)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Validates a whole configuration tree
pub trait Validator: Send + Sync {
    fn validate(&self, root: &Node) -> Vec<ValidationError>;

    fn schema_type(&self) -> &str;
}

/// Run `validator` and wrap any failures
pub(crate) fn run_validator(
    validator: Option<&dyn Validator>,
    root: &Node,
) -> Result<(), ValidationErrors> {
    let Some(validator) = validator else {
        return Ok(());
    };
    let errors = validator.validate(root);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors(errors))
    }
}

/// Error loading a rule file
#[derive(Debug, thiserror::Error)]
pub enum ValidatorError {
    #[error("Failed to read rule file: {0}")]
    IoError(#[from] io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid rule for '{path}': {message}")]
    InvalidRule { path: KeyPath, message: String },
}

/// Expected JSON type of a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
}

impl ValueType {
    fn accepts(self, node: &Node) -> bool {
        if !node.is_leaf() {
            return self == Self::Object;
        }
        match (self, node.value()) {
            (Self::String, Value::String(_)) => true,
            (Self::Integer, Value::Number(n)) => n.is_i64() || n.is_u64(),
            (Self::Number, Value::Number(_)) => true,
            (Self::Boolean, Value::Bool(_)) => true,
            (Self::Array, Value::Array(_)) => true,
            (Self::Object, Value::Object(_)) => true,
            _ => false,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
        };
        write!(f, "{}", name)
    }
}

/// Constraint on the node(s) at a path or path pattern
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Rule {
    /// Literal path or wildcard pattern
    pub path: KeyPath,

    /// Literal paths only: the node must exist
    #[serde(default)]
    pub required: bool,

    #[serde(default, rename = "type")]
    pub value_type: Option<ValueType>,

    pub min: Option<f64>,

    pub max: Option<f64>,

    /// Allowed values (empty = any)
    #[serde(default)]
    pub one_of: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct RuleFile {
    #[serde(default, rename = "rule")]
    rules: Vec<Rule>,
}

/// Declarative rule-based validator
#[derive(Debug, Clone, Default)]
pub struct RuleValidator {
    rules: Vec<Rule>,
}

impl RuleValidator {
    pub fn new(rules: Vec<Rule>) -> Result<Self, ValidatorError> {
        for rule in &rules {
            if let (Some(min), Some(max)) = (rule.min, rule.max) {
                if min > max {
                    return Err(ValidatorError::InvalidRule {
                        path: rule.path.clone(),
                        message: format!("min {} is greater than max {}", min, max),
                    });
                }
            }
        }
        Ok(Self { rules })
    }

    /// Load and compile a TOML rule file
    pub fn from_file(path: &Path) -> Result<Self, ValidatorError> {
        let contents = fs::read_to_string(path)?;
        Self::from_str(&contents)
    }

    /// Parse rules from a TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self, ValidatorError> {
        let file: RuleFile = toml::from_str(s)?;
        Self::new(file.rules)
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    fn check(rule: &Rule, path: &KeyPath, node: &Node, errors: &mut Vec<ValidationError>) {
        if let Some(expected) = rule.value_type {
            if !expected.accepts(node) {
                errors.push(ValidationError::new(
                    path.clone(),
                    "type",
                    format!("expected {}", expected),
                ));
                return;
            }
        }

        if let Some(n) = node.value().as_f64() {
            if let Some(min) = rule.min {
                if n < min {
                    errors.push(ValidationError::new(
                        path.clone(),
                        "minimum",
                        format!("{} is less than {}", n, min),
                    ));
                }
            }
            if let Some(max) = rule.max {
                if n > max {
                    errors.push(ValidationError::new(
                        path.clone(),
                        "maximum",
                        format!("{} is greater than {}", n, max),
                    ));
                }
            }
        }

        if !rule.one_of.is_empty() && !rule.one_of.contains(&node.to_value()) {
            errors.push(ValidationError::new(
                path.clone(),
                "enum",
                format!("value {} is not one of the allowed values", node.to_value()),
            ));
        }
    }
}

impl Validator for RuleValidator {
    fn validate(&self, root: &Node) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        for rule in &self.rules {
            if !rule.path.is_pattern() {
                match root.get(&rule.path) {
                    Some(node) => Self::check(rule, &rule.path, node, &mut errors),
                    None if rule.required => errors.push(ValidationError::new(
                        rule.path.clone(),
                        "required",
                        "required key is missing",
                    )),
                    None => {}
                }
                continue;
            }
            for (path, node) in topmost_matches(root, &rule.path) {
                Self::check(rule, &path, node, &mut errors);
            }
        }
        errors
    }

    fn schema_type(&self) -> &str {
        "rules"
    }
}

/// Nodes matching `pattern` whose parent does not match it
fn topmost_matches<'a>(root: &'a Node, pattern: &KeyPath) -> Vec<(KeyPath, &'a Node)> {
    let mut out = Vec::new();
    let mut stack = vec![(KeyPath::root(), root)];
    while let Some((path, node)) = stack.pop() {
        for (key, child) in node.children() {
            let child_path = path.child(key);
            if child_path.matches(pattern) {
                out.push((child_path, child));
            } else {
                stack.push((child_path, child));
            }
        }
    }
    out
}
