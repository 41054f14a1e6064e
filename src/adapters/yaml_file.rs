// SPDX-License-Identifier: MIT OR Apache-2.0

//! YAML file adapters.
//!
//! This module provides two adapters reading YAML: a parameter store answering batch requests
//! from a local file, and a parser for configuration shape declarations.

use crate::domain::{
    ConfigError, ConfigurationShape, ParameterKey, Result, ScalarKind, ScalarSpec, ScalarValue,
    SourceSpec,
};
use crate::domain::scalar::{coerce_bool, coerce_number};
use crate::ports::{Parameter, ParameterStore, ShapeParser};
use async_trait::async_trait;
use directories::ProjectDirs;
use serde::Deserialize;
use serde_yaml::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Maximum allowed file size for YAML files (10MB)
/// This prevents denial of service attacks via extremely large files
const MAX_YAML_FILE_SIZE: u64 = 10 * 1024 * 1024;

const SOURCE_NAME: &str = "yaml-file";

fn display_name(path: &Path) -> &str {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("<unknown>")
}

/// Reads a YAML file after canonicalizing its path and checking its size.
fn read_limited(path: &Path) -> Result<(PathBuf, String)> {
    // Canonicalize path to prevent directory traversal attacks
    let canonical_path = path.canonicalize().map_err(|e| {
        ConfigError::source_error(
            SOURCE_NAME,
            format!("Invalid or inaccessible path: {}", display_name(path)),
            e,
        )
    })?;

    // Check file size before reading to prevent DoS via large files
    let metadata = fs::metadata(&canonical_path).map_err(|e| {
        ConfigError::source_error(
            SOURCE_NAME,
            format!("Failed to read file metadata: {}", display_name(&canonical_path)),
            e,
        )
    })?;

    if metadata.len() > MAX_YAML_FILE_SIZE {
        return Err(ConfigError::SourceError {
            source_name: SOURCE_NAME.to_string(),
            message: format!(
                "File too large: {} bytes (max {} bytes)",
                metadata.len(),
                MAX_YAML_FILE_SIZE
            ),
            source: None,
        });
    }

    let content = fs::read_to_string(&canonical_path).map_err(|e| {
        ConfigError::source_error(
            SOURCE_NAME,
            format!("Failed to read file: {}", display_name(&canonical_path)),
            e,
        )
    })?;

    Ok((canonical_path, content))
}

fn parse_yaml(content: &str) -> Result<Value> {
    serde_yaml::from_str(content).map_err(|e| ConfigError::ParseError {
        message: format!("Failed to parse YAML: {}", e),
        source: Some(Arc::new(e)),
    })
}

fn parse_error(message: String) -> ConfigError {
    ConfigError::ParseError {
        message,
        source: None,
    }
}

/// Parameter store backed by a YAML file.
///
/// Nested mappings are flattened into `/`-separated names, so
///
/// ```yaml
/// sys:
///   dev:
///     DB_PASSWORD: s3cr3t
/// ```
///
/// answers the name `/sys/dev/DB_PASSWORD`. Keys may also be written already flattened
/// (`/sys/dev/DB_PASSWORD: s3cr3t`). Sequence items are addressed by index. A `null` value is
/// reported as a known name without a value.
///
/// # Examples
///
/// ```rust
/// use lazycfg::adapters::YamlParameterStore;
/// use lazycfg::ports::ParameterStore;
///
/// # tokio_test::block_on(async {
/// let store = YamlParameterStore::from_str("sys:\n  dev:\n    PORT: 5432\n").unwrap();
/// let found = store.get_parameters(&["/sys/dev/PORT".to_string()]).await.unwrap();
/// assert_eq!(found[0].value.as_deref(), Some("5432"));
/// # });
/// ```
#[derive(Debug, Clone, Default)]
pub struct YamlParameterStore {
    /// Path to the YAML file, if loaded from disk
    file_path: Option<PathBuf>,
    /// Flattened parameters; `None` for explicit nulls
    values: HashMap<String, Option<String>>,
}

impl YamlParameterStore {
    /// Parses parameters from YAML text.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self> {
        let value = parse_yaml(content)?;
        let mut values = HashMap::new();
        match &value {
            Value::Mapping(_) => Self::flatten_yaml(&value, "", &mut values),
            Value::Null => {}
            _ => {
                return Err(parse_error(
                    "parameter file must contain a mapping at the top level".to_string(),
                ))
            }
        }
        Ok(Self {
            file_path: None,
            values,
        })
    }

    /// Loads parameters from a YAML file.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use lazycfg::adapters::YamlParameterStore;
    ///
    /// let store = YamlParameterStore::from_file("/etc/myapp/parameters.yaml").unwrap();
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let (canonical_path, content) = read_limited(path.as_ref())?;
        let mut store = Self::from_str(&content)?;
        store.file_path = Some(canonical_path);
        Ok(store)
    }

    /// Loads `parameters.yaml` from the OS-appropriate configuration directory.
    ///
    /// # Arguments
    ///
    /// * `app_name` - The application name (e.g., "myapp")
    /// * `qualifier` - The organization/qualifier (e.g., "com.example")
    pub fn from_default_location(app_name: &str, qualifier: &str) -> Result<Self> {
        let proj_dirs =
            ProjectDirs::from(qualifier, "", app_name).ok_or_else(|| ConfigError::SourceError {
                source_name: SOURCE_NAME.to_string(),
                message: "Failed to determine project directories".to_string(),
                source: None,
            })?;

        Self::from_file(proj_dirs.config_dir().join("parameters.yaml"))
    }

    /// Returns the path of the file the parameters were loaded from.
    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    /// Returns the number of known names.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the file held no parameter.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Flattens a YAML value into `/`-separated names.
    fn flatten_yaml(value: &Value, prefix: &str, result: &mut HashMap<String, Option<String>>) {
        match value {
            Value::Mapping(map) => {
                for (key, val) in map {
                    let segment = match key {
                        Value::String(s) => s.trim_matches('/').to_string(),
                        Value::Number(n) => n.to_string(),
                        Value::Bool(b) => b.to_string(),
                        _ => continue,
                    };
                    Self::flatten_yaml(val, &format!("{}/{}", prefix, segment), result);
                }
            }
            Value::Sequence(seq) => {
                for (i, val) in seq.iter().enumerate() {
                    Self::flatten_yaml(val, &format!("{}/{}", prefix, i), result);
                }
            }
            Value::String(s) => {
                result.insert(prefix.to_string(), Some(s.clone()));
            }
            Value::Number(n) => {
                result.insert(prefix.to_string(), Some(n.to_string()));
            }
            Value::Bool(b) => {
                result.insert(prefix.to_string(), Some(b.to_string()));
            }
            Value::Null => {
                result.insert(prefix.to_string(), None);
            }
            Value::Tagged(tagged) => Self::flatten_yaml(&tagged.value, prefix, result),
        }
    }
}

#[async_trait]
impl ParameterStore for YamlParameterStore {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    async fn get_parameters(&self, names: &[String]) -> Result<Vec<Parameter>> {
        Ok(names
            .iter()
            .filter_map(|name| {
                self.values.get(name).map(|value| Parameter {
                    name: name.clone(),
                    value: value.clone(),
                })
            })
            .collect())
    }
}

/// One leaf as written in a shape declaration.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LeafDeclaration {
    env: Option<String>,
    remote: Option<String>,
    fixed: Option<Value>,
    #[serde(rename = "type")]
    kind: Option<ScalarKind>,
    default: Option<Value>,
}

/// Shape parser for YAML declarations.
///
/// A mapping containing one of `env`, `remote` or `fixed` declares a leaf; any other mapping
/// declares a nested object. Leaves accept an optional `type` (`string`, `number` or
/// `boolean`, default `string`) and an optional `default`. A fixed leaf without a `type`
/// takes the type of its value. Fields keep their declaration order.
///
/// # Examples
///
/// ```rust
/// use lazycfg::adapters::YamlShapeParser;
/// use lazycfg::ports::ShapeParser;
///
/// let yaml = r#"
/// db:
///   url: { env: DB_URL }
///   password: { remote: DB_PASSWORD }
///   port: { env: DB_PORT, type: number, default: 5432 }
/// debug: { fixed: false }
/// "#;
/// let shape = YamlShapeParser::new().parse(yaml).unwrap();
/// assert_eq!(shape.len(), 2);
/// assert_eq!(shape.remote_keys().len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct YamlShapeParser;

impl YamlShapeParser {
    /// Creates a new YAML shape parser.
    pub fn new() -> Self {
        YamlShapeParser
    }

    /// Reads and parses a declaration file.
    pub fn parse_file<P: AsRef<Path>>(&self, path: P) -> Result<ConfigurationShape> {
        let (_, content) = read_limited(path.as_ref())?;
        self.parse(&content)
    }

    fn parse_object(value: &Value, path: &str) -> Result<ConfigurationShape> {
        let map = match value {
            Value::Mapping(map) => map,
            Value::Null if path.is_empty() => return Ok(ConfigurationShape::new()),
            _ => {
                return Err(parse_error(format!(
                    "'{}' must be a mapping",
                    if path.is_empty() { "<root>" } else { path }
                )))
            }
        };

        let mut shape = ConfigurationShape::new();
        for (key, val) in map {
            let name = key
                .as_str()
                .ok_or_else(|| parse_error(format!("non-string field name under '{}'", path)))?;
            let field_path = if path.is_empty() {
                name.to_string()
            } else {
                format!("{}.{}", path, name)
            };

            shape = if Self::is_leaf(val) {
                shape.scalar(name, Self::parse_leaf(val, &field_path)?)
            } else {
                shape.nested(name, Self::parse_object(val, &field_path)?)
            };
        }
        Ok(shape)
    }

    fn is_leaf(value: &Value) -> bool {
        match value {
            Value::Mapping(map) => ["env", "remote", "fixed"]
                .iter()
                .any(|k| map.contains_key(*k)),
            _ => false,
        }
    }

    fn parse_leaf(value: &Value, path: &str) -> Result<ScalarSpec> {
        let decl: LeafDeclaration =
            serde_yaml::from_value(value.clone()).map_err(|e| ConfigError::ParseError {
                message: format!("invalid leaf '{}': {}", path, e),
                source: Some(Arc::new(e)),
            })?;

        let (source, kind) = match (decl.env, decl.remote, decl.fixed) {
            (Some(name), None, None) => (
                SourceSpec::Env(name),
                decl.kind.unwrap_or(ScalarKind::String),
            ),
            (None, Some(key), None) => (
                SourceSpec::Remote(ParameterKey::from(key)),
                decl.kind.unwrap_or(ScalarKind::String),
            ),
            (None, None, Some(fixed)) => {
                let kind = match decl.kind {
                    Some(kind) => kind,
                    None => Self::kind_of(&fixed, path)?,
                };
                (SourceSpec::Fixed(Self::scalar(&fixed, kind, path)?), kind)
            }
            _ => {
                return Err(parse_error(format!(
                    "leaf '{}' must name exactly one of env, remote or fixed",
                    path
                )))
            }
        };

        let default = decl
            .default
            .map(|d| Self::scalar(&d, kind, path))
            .transpose()?;
        ScalarSpec::new(source, kind, default)
    }

    fn kind_of(value: &Value, path: &str) -> Result<ScalarKind> {
        match value {
            Value::String(_) => Ok(ScalarKind::String),
            Value::Number(_) => Ok(ScalarKind::Number),
            Value::Bool(_) => Ok(ScalarKind::Boolean),
            _ => Err(parse_error(format!("fixed value of '{}' is not a scalar", path))),
        }
    }

    /// Converts a YAML scalar to a value of `kind`, coercing strings like raw values.
    fn scalar(value: &Value, kind: ScalarKind, path: &str) -> Result<ScalarValue> {
        let converted = match (kind, value) {
            (ScalarKind::String, Value::String(s)) => Some(ScalarValue::String(s.clone())),
            (ScalarKind::String, Value::Number(n)) => Some(ScalarValue::String(n.to_string())),
            (ScalarKind::String, Value::Bool(b)) => Some(ScalarValue::String(b.to_string())),
            (ScalarKind::Number, Value::Number(n)) => n.as_f64().map(ScalarValue::Number),
            (ScalarKind::Number, Value::String(s)) => coerce_number(s).map(ScalarValue::Number),
            (ScalarKind::Boolean, Value::Bool(b)) => Some(ScalarValue::Bool(*b)),
            (ScalarKind::Boolean, Value::String(s)) => coerce_bool(s).map(ScalarValue::Bool),
            _ => None,
        };
        converted.ok_or_else(|| parse_error(format!("value of '{}' is not a valid {}", path, kind)))
    }
}

impl ShapeParser for YamlShapeParser {
    fn parse(&self, content: &str) -> Result<ConfigurationShape> {
        Self::parse_object(&parse_yaml(content)?, "")
    }

    fn supported_extensions(&self) -> &[&str] {
        &["yaml", "yml"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FieldSpec;
    use std::io::Write;
    use tempfile::NamedTempFile;

    async fn lookup(store: &YamlParameterStore, name: &str) -> Option<Parameter> {
        store
            .get_parameters(&[name.to_string()])
            .await
            .unwrap()
            .into_iter()
            .next()
    }

    #[tokio::test]
    async fn test_yaml_store_nested() {
        let yaml = r#"
sys:
  dev:
    DB_HOST: localhost
    DB_PORT: 5432
    FLAG: true
"#;
        let store = YamlParameterStore::from_str(yaml).unwrap();
        assert_eq!(store.len(), 3);
        let port = lookup(&store, "/sys/dev/DB_PORT").await.unwrap();
        assert_eq!(port.value.as_deref(), Some("5432"));
        let flag = lookup(&store, "/sys/dev/FLAG").await.unwrap();
        assert_eq!(flag.value.as_deref(), Some("true"));
    }

    #[tokio::test]
    async fn test_yaml_store_flat_names() {
        let store = YamlParameterStore::from_str("/sys/dev/A: one\n").unwrap();
        let found = lookup(&store, "/sys/dev/A").await.unwrap();
        assert_eq!(found.value.as_deref(), Some("one"));
    }

    #[tokio::test]
    async fn test_yaml_store_sequence_and_null() {
        let yaml = "hosts:\n  - a\n  - b\nempty: null\n";
        let store = YamlParameterStore::from_str(yaml).unwrap();
        let second = lookup(&store, "/hosts/1").await.unwrap();
        assert_eq!(second.value.as_deref(), Some("b"));
        let empty = lookup(&store, "/empty").await.unwrap();
        assert_eq!(empty.value, None);
        assert!(lookup(&store, "/missing").await.is_none());
    }

    #[test]
    fn test_yaml_store_invalid() {
        assert!(matches!(
            YamlParameterStore::from_str("invalid: yaml: content:"),
            Err(ConfigError::ParseError { .. })
        ));
        assert!(YamlParameterStore::from_str("- a\n- b\n").is_err());
        assert!(YamlParameterStore::from_str("").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_yaml_store_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "app:\n  prod:\n    TOKEN: abc").unwrap();

        let store = YamlParameterStore::from_file(temp_file.path()).unwrap();
        assert_eq!(store.name(), "yaml-file");
        assert!(store.file_path().is_some());
        let token = lookup(&store, "/app/prod/TOKEN").await.unwrap();
        assert_eq!(token.value.as_deref(), Some("abc"));
    }

    #[test]
    fn test_yaml_store_nonexistent_file() {
        let result = YamlParameterStore::from_file("/nonexistent/path/to/parameters.yaml");
        assert!(matches!(result, Err(ConfigError::SourceError { .. })));
    }

    #[test]
    fn test_shape_parser_leaves_and_nesting() {
        let yaml = r#"
name: { fixed: api }
db:
  url: { env: DB_URL }
  password: { remote: /DB_PASSWORD }
  port: { env: DB_PORT, type: number, default: 5432 }
"#;
        let shape = YamlShapeParser::new().parse(yaml).unwrap();
        let names: Vec<&str> = shape.fields().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["name", "db"]);

        let db = match shape.fields().nth(1) {
            Some((_, FieldSpec::Nested(db))) => db,
            other => panic!("expected nested db, got {:?}", other),
        };
        assert_eq!(db.len(), 3);
        match db.fields().nth(2) {
            Some((_, FieldSpec::Scalar(spec))) => {
                assert_eq!(spec.kind(), ScalarKind::Number);
                assert_eq!(spec.default_value(), Some(&ScalarValue::Number(5432.0)));
            }
            other => panic!("expected scalar port, got {:?}", other),
        }
        assert_eq!(shape.remote_keys(), vec![ParameterKey::from("/DB_PASSWORD")]);
    }

    #[test]
    fn test_shape_parser_fixed_infers_kind() {
        let shape = YamlShapeParser::new()
            .parse("debug: { fixed: true }\nretries: { fixed: 3 }\n")
            .unwrap();
        let kinds: Vec<ScalarKind> = shape
            .fields()
            .filter_map(|(_, field)| match field {
                FieldSpec::Scalar(spec) => Some(spec.kind()),
                FieldSpec::Nested(_) => None,
            })
            .collect();
        assert_eq!(kinds, vec![ScalarKind::Boolean, ScalarKind::Number]);
    }

    #[test]
    fn test_shape_parser_string_default_coerced() {
        let shape = YamlShapeParser::new()
            .parse("enabled: { env: ENABLED, type: boolean, default: \"1\" }\n")
            .unwrap();
        match shape.fields().next() {
            Some((_, FieldSpec::Scalar(spec))) => {
                assert_eq!(spec.default_value(), Some(&ScalarValue::Bool(true)));
            }
            other => panic!("expected scalar, got {:?}", other),
        };
    }

    #[test]
    fn test_shape_parser_rejects_bad_declarations() {
        let parser = YamlShapeParser::new();
        // two sources
        assert!(parser.parse("a: { env: A, remote: A }").is_err());
        // unknown leaf key
        assert!(parser.parse("a: { env: A, required: true }").is_err());
        // bare scalar
        assert!(parser.parse("a: 5").is_err());
        // default of the wrong type
        assert!(parser.parse("a: { env: A, type: number, default: abc }").is_err());
        // unknown type
        assert!(parser.parse("a: { env: A, type: date }").is_err());
    }

    #[test]
    fn test_shape_parser_empty() {
        assert!(YamlShapeParser::new().parse("").unwrap().is_empty());
        assert_eq!(YamlShapeParser::new().supported_extensions(), &["yaml", "yml"]);
    }

    #[test]
    fn test_shape_parser_parse_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "url: {{ env: DB_URL }}").unwrap();
        let shape = YamlShapeParser::new().parse_file(temp_file.path()).unwrap();
        assert_eq!(shape.len(), 1);
    }
}
