// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory parameter store adapter.
//!
//! `StaticParameterStore` answers batch requests from a fixed map. It records every request it
//! receives, which makes it the store of choice for tests and offline runs.

use crate::domain::{ConfigError, Result};
use crate::ports::{Parameter, ParameterStore};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Parameter store backed by a map of fully-qualified names to values.
///
/// Clones share the request log.
///
/// # Examples
///
/// ```rust
/// use lazycfg::adapters::StaticParameterStore;
/// use lazycfg::ports::ParameterStore;
///
/// # tokio_test::block_on(async {
/// let store = StaticParameterStore::new().with_parameter("/app/dev/DB_PASSWORD", "s3cr3t");
/// let found = store
///     .get_parameters(&["/app/dev/DB_PASSWORD".to_string(), "/app/dev/OTHER".to_string()])
///     .await
///     .unwrap();
///
/// assert_eq!(found.len(), 1);
/// assert_eq!(store.calls(), 1);
/// # });
/// ```
#[derive(Clone, Debug, Default)]
pub struct StaticParameterStore {
    parameters: HashMap<String, String>,
    failure: Option<String>,
    delay: Option<Duration>,
    requests: Arc<Mutex<Vec<Vec<String>>>>,
}

impl StaticParameterStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a parameter.
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    /// Makes every request fail with `message`.
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Delays every answer by `delay`.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Returns the number of requests received so far.
    pub fn calls(&self) -> usize {
        self.lock_requests().len()
    }

    /// Returns the names of every request received so far, in order.
    pub fn requests(&self) -> Vec<Vec<String>> {
        self.lock_requests().clone()
    }

    /// Returns the number of stored parameters.
    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    /// Returns true if the store holds no parameter.
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    fn lock_requests(&self) -> std::sync::MutexGuard<'_, Vec<Vec<String>>> {
        // A panic while holding the lock cannot leave the log half-written
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl From<HashMap<String, String>> for StaticParameterStore {
    fn from(parameters: HashMap<String, String>) -> Self {
        Self {
            parameters,
            ..Self::default()
        }
    }
}

#[async_trait]
impl ParameterStore for StaticParameterStore {
    fn name(&self) -> &str {
        "static"
    }

    async fn get_parameters(&self, names: &[String]) -> Result<Vec<Parameter>> {
        self.lock_requests().push(names.to_vec());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(message) = &self.failure {
            return Err(ConfigError::SourceError {
                source_name: self.name().to_string(),
                message: message.clone(),
                source: None,
            });
        }

        Ok(names
            .iter()
            .filter_map(|name| {
                self.parameters
                    .get(name)
                    .map(|value| Parameter::new(name.clone(), value.clone()))
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_store_answers_known_names() {
        let store = StaticParameterStore::new()
            .with_parameter("/a", "1")
            .with_parameter("/b", "");
        let names = vec!["/a".to_string(), "/b".to_string(), "/c".to_string()];

        let found = store.get_parameters(&names).await.unwrap();
        assert_eq!(found, vec![Parameter::new("/a", "1"), Parameter::new("/b", "")]);
        assert_eq!(store.requests(), vec![names]);
    }

    #[tokio::test]
    async fn test_static_store_failing() {
        let store = StaticParameterStore::new().with_parameter("/a", "1").failing("denied");
        let err = store.get_parameters(&["/a".to_string()]).await.unwrap_err();
        assert!(err.to_string().contains("denied"));
        assert_eq!(store.calls(), 1);
    }

    #[tokio::test]
    async fn test_static_store_clones_share_log() {
        let store = StaticParameterStore::new();
        let clone = store.clone();
        clone.get_parameters(&[]).await.unwrap();
        assert_eq!(store.calls(), 1);
    }

    #[test]
    fn test_static_store_from_map() {
        let mut map = HashMap::new();
        map.insert("/a".to_string(), "1".to_string());
        let store = StaticParameterStore::from(map);
        assert_eq!(store.len(), 1);
        assert_eq!(store.name(), "static");
    }
}
