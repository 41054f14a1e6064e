// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fully materialized configuration data.

use crate::domain::errors::{ConfigError, Result};
use crate::domain::scalar::ScalarValue;
use serde::de::DeserializeOwned;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::sync::Arc;

/// A resolved node: a scalar leaf or a nested object.
#[derive(Clone, Debug, PartialEq)]
pub enum ResolvedValue {
    /// A resolved leaf
    Scalar(ScalarValue),
    /// A resolved nested object
    Object(ResolvedConfig),
}

impl Serialize for ResolvedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            ResolvedValue::Scalar(value) => value.serialize(serializer),
            ResolvedValue::Object(object) => object.serialize(serializer),
        }
    }
}

/// A plain configuration object whose nesting mirrors the declared shape.
///
/// Field order follows the declaration order of the shape.
///
/// # Examples
///
/// ```
/// use lazycfg::domain::{ResolvedConfig, ResolvedValue, ScalarValue};
///
/// let mut db = ResolvedConfig::new();
/// db.insert("port", ResolvedValue::Scalar(ScalarValue::from(5432.0)));
/// let mut root = ResolvedConfig::new();
/// root.insert("db", ResolvedValue::Object(db));
///
/// assert_eq!(root.get("db.port"), Some(&ScalarValue::from(5432.0)));
/// assert_eq!(root.to_json().unwrap(), r#"{"db":{"port":5432}}"#);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResolvedConfig {
    entries: Vec<(String, ResolvedValue)>,
}

impl ResolvedConfig {
    /// Creates an empty object.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry.
    pub fn insert(&mut self, name: impl Into<String>, value: ResolvedValue) {
        self.entries.push((name.into(), value));
    }

    /// Looks up a direct entry by name.
    pub fn entry(&self, name: &str) -> Option<&ResolvedValue> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value)
    }

    /// Looks up a scalar by dotted path, e.g. `db.port`.
    pub fn get(&self, path: &str) -> Option<&ScalarValue> {
        let mut node = self;
        let mut segments = path.split('.').peekable();
        while let Some(segment) = segments.next() {
            match (node.entry(segment)?, segments.peek()) {
                (ResolvedValue::Scalar(value), None) => return Some(value),
                (ResolvedValue::Object(object), Some(_)) => node = object,
                _ => return None,
            }
        }
        None
    }

    /// Looks up a nested object by dotted path.
    pub fn object(&self, path: &str) -> Option<&ResolvedConfig> {
        path.split('.')
            .try_fold(self, |node, segment| match node.entry(segment)? {
                ResolvedValue::Object(object) => Some(object),
                ResolvedValue::Scalar(_) => None,
            })
    }

    /// Iterates over the direct entries in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ResolvedValue)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Returns the number of direct entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serializes the object as compact JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| ConfigError::ParseError {
            message: format!("Failed to serialize configuration: {}", e),
            source: Some(Arc::new(e)),
        })
    }

    /// Serializes the object as indented JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::ParseError {
            message: format!("Failed to serialize configuration: {}", e),
            source: Some(Arc::new(e)),
        })
    }

    /// Converts the object into a user-defined type.
    ///
    /// Numbers are `f64`; target fields may be any numeric type that accepts the value.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        let value = serde_json::to_value(self).map_err(|e| ConfigError::ParseError {
            message: format!("Failed to serialize configuration: {}", e),
            source: Some(Arc::new(e)),
        })?;
        serde_json::from_value(value).map_err(|e| ConfigError::ParseError {
            message: format!("Configuration does not match the target type: {}", e),
            source: Some(Arc::new(e)),
        })
    }
}

impl Serialize for ResolvedConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    fn sample() -> ResolvedConfig {
        let mut db = ResolvedConfig::new();
        db.insert("url", ResolvedValue::Scalar(ScalarValue::from("postgres://db")));
        db.insert("port", ResolvedValue::Scalar(ScalarValue::from(5432.0)));
        let mut root = ResolvedConfig::new();
        root.insert("debug", ResolvedValue::Scalar(ScalarValue::from(false)));
        root.insert("db", ResolvedValue::Object(db));
        root
    }

    #[test]
    fn test_get_scalar_by_path() {
        let config = sample();
        assert_eq!(config.get("debug"), Some(&ScalarValue::from(false)));
        assert_eq!(config.get("db.url"), Some(&ScalarValue::from("postgres://db")));
    }

    #[test]
    fn test_get_rejects_object_and_missing_paths() {
        let config = sample();
        assert_eq!(config.get("db"), None);
        assert_eq!(config.get("db.url.extra"), None);
        assert_eq!(config.get("missing"), None);
    }

    #[test]
    fn test_object_by_path() {
        let config = sample();
        assert_eq!(config.object("db").map(ResolvedConfig::len), Some(2));
        assert!(config.object("debug").is_none());
    }

    #[test]
    fn test_json_preserves_order() {
        let json = sample().to_json().unwrap();
        assert_eq!(
            json,
            r#"{"debug":false,"db":{"url":"postgres://db","port":5432}}"#
        );
    }

    #[test]
    fn test_deserialize_into_struct() {
        #[derive(Deserialize)]
        struct Db {
            url: String,
            port: u16,
        }
        #[derive(Deserialize)]
        struct App {
            debug: bool,
            db: Db,
        }

        let app: App = sample().deserialize().unwrap();
        assert!(!app.debug);
        assert_eq!(app.db.url, "postgres://db");
        assert_eq!(app.db.port, 5432);
    }

    #[test]
    fn test_deserialize_mismatch_is_parse_error() {
        #[derive(Debug, Deserialize)]
        struct Wrong {
            #[allow(dead_code)]
            debug: String,
        }
        let result: Result<Wrong> = sample().deserialize();
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn test_empty_object() {
        let config = ResolvedConfig::new();
        assert!(config.is_empty());
        assert_eq!(config.to_json().unwrap(), "{}");
    }
}
