// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory environment adapter.

use crate::ports::EnvironmentSource;
use std::collections::HashMap;

/// Environment source backed by a map.
///
/// Useful in tests and when embedding, where the process environment should not be touched.
///
/// # Examples
///
/// ```rust
/// use lazycfg::adapters::MapEnvironment;
/// use lazycfg::ports::EnvironmentSource;
///
/// let env = MapEnvironment::new()
///     .with_var("DB_URL", "postgres://localhost")
///     .with_var("DB_USER", "app");
///
/// assert_eq!(env.var("DB_USER").as_deref(), Some("app"));
/// assert!(env.var("DB_PASSWORD").is_none());
/// ```
#[derive(Clone, Debug, Default)]
pub struct MapEnvironment {
    values: HashMap<String, String>,
}

impl MapEnvironment {
    /// Creates an empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a variable.
    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// Returns the number of variables.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if no variable is set.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<HashMap<String, String>> for MapEnvironment {
    fn from(values: HashMap<String, String>) -> Self {
        Self { values }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapEnvironment {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl EnvironmentSource for MapEnvironment {
    fn name(&self) -> &str {
        "map"
    }

    fn var(&self, name: &str) -> Option<String> {
        self.values.get(name).cloned()
    }
}
