// SPDX-License-Identifier: MIT OR Apache-2.0

//! The shared remote batch.
//!
//! A [`BatchContext`] collects the remote keys of a configuration tree while the tree is
//! declared, then fetches all of them in one [`ParameterStore`] call the first time any remote
//! leaf is resolved. The fetch goes through a [`SingleFlight`], so concurrent leaves wait for
//! the same call and a settled fetch is never repeated.

use crate::domain::{ConfigError, ParameterKey, ParameterNamespace, Result};
use crate::ports::{format_structured, LogLevel, Logger, Parameter, ParameterStore};
use crate::service::single_flight::{FailurePolicy, FlightState, SingleFlight};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// How the shared batch fetch behaves.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FetchOptions {
    /// Abort the store call after this long; the timeout becomes a batch failure
    pub timeout: Option<Duration>,
    /// Whether a failed fetch is cached or retried by the next remote leaf
    pub failure_policy: FailurePolicy,
}

impl FetchOptions {
    /// Sets the timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the failure policy.
    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }
}

/// The outcome of a batch fetch, keyed by the keys as declared.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchValues {
    values: HashMap<ParameterKey, String>,
}

impl BatchValues {
    /// Returns the value fetched for `key`, or `None` if the store did not return it.
    pub fn get(&self, key: &ParameterKey) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Returns the number of keys that received a value.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if no key received a value.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Maps store results back to declared keys.
    ///
    /// `qualified` holds the qualified form of each key in `keys`. A result whose name equals
    /// a qualified form belongs to every key with that form. Otherwise it belongs to the first
    /// key it ends with, and to the keys sharing that key's qualified form. Results without a
    /// value are ignored.
    pub fn from_parameters(
        keys: &[ParameterKey],
        qualified: &[String],
        parameters: Vec<Parameter>,
    ) -> Self {
        let mut values = HashMap::new();
        for parameter in parameters {
            let Some(value) = parameter.value else {
                continue;
            };
            let exact: Vec<&ParameterKey> = keys
                .iter()
                .zip(qualified)
                .filter(|(_, name)| **name == parameter.name)
                .map(|(key, _)| key)
                .collect();
            if !exact.is_empty() {
                for key in exact {
                    values.insert(key.clone(), value.clone());
                }
                continue;
            }
            let Some(target) = keys
                .iter()
                .position(|k| k.is_suffix_of(&parameter.name))
                .and_then(|i| qualified.get(i))
            else {
                continue;
            };
            for (key, _) in keys.iter().zip(qualified).filter(|(_, name)| *name == target) {
                values.entry(key.clone()).or_insert_with(|| value.clone());
            }
        }
        Self { values }
    }
}

/// Drops repeated names, keeping the first occurrence of each.
fn distinct(names: &[String]) -> Vec<String> {
    let mut seen = Vec::with_capacity(names.len());
    for name in names {
        if !seen.contains(name) {
            seen.push(name.clone());
        }
    }
    seen
}

/// Remote keys of one configuration tree and their shared, lazily fetched values.
///
/// # Examples
///
/// ```rust
/// use lazycfg::adapters::StaticParameterStore;
/// use lazycfg::domain::{ParameterKey, ParameterNamespace};
/// use lazycfg::service::{BatchContext, FetchOptions};
/// use std::sync::Arc;
///
/// # #[tokio::main]
/// # async fn main() {
/// let store = Arc::new(StaticParameterStore::new().with_parameter("/sys/dev/A", "1"));
/// let namespace = ParameterNamespace::new().system("sys").env_type("dev");
/// let batch = BatchContext::new(store.clone(), namespace, FetchOptions::default());
/// batch.register(ParameterKey::from("A"));
/// batch.register(ParameterKey::from("B"));
///
/// let values = batch.values().await.unwrap();
/// assert_eq!(values.get(&ParameterKey::from("A")), Some("1"));
/// assert_eq!(values.get(&ParameterKey::from("B")), None);
/// assert_eq!(store.calls(), 1);
/// # }
/// ```
pub struct BatchContext {
    keys: Arc<Mutex<Vec<ParameterKey>>>,
    flight: SingleFlight<Arc<BatchValues>>,
    namespace: ParameterNamespace,
    store_name: String,
}

impl BatchContext {
    /// Creates an empty context fetching from `store`.
    pub fn new(
        store: Arc<dyn ParameterStore>,
        namespace: ParameterNamespace,
        options: FetchOptions,
    ) -> Self {
        Self::with_logger(store, namespace, options, None)
    }

    /// Creates an empty context that reports each fetch to `logger`.
    pub fn with_logger(
        store: Arc<dyn ParameterStore>,
        namespace: ParameterNamespace,
        options: FetchOptions,
        logger: Option<Arc<dyn Logger>>,
    ) -> Self {
        let keys: Arc<Mutex<Vec<ParameterKey>>> = Arc::default();
        let store_name = store.name().to_string();
        let fetch = Fetch {
            store,
            namespace: namespace.clone(),
            keys: Arc::clone(&keys),
            timeout: options.timeout,
            logger,
        };
        let flight = SingleFlight::with_policy(
            move || {
                let fetch = fetch.clone();
                async move { fetch.run().await }
            },
            options.failure_policy,
        );
        Self {
            keys,
            flight,
            namespace,
            store_name,
        }
    }

    /// Adds a key to the batch. Registering the same key twice has no effect.
    ///
    /// Keys registered after the fetch has started are not part of it.
    pub fn register(&self, key: ParameterKey) {
        if self.flight.state() != FlightState::Idle {
            tracing::warn!(
                "remote key '{}' registered after the batch fetch started; it will not be fetched",
                key
            );
        }
        let mut keys = self.keys.lock().unwrap_or_else(PoisonError::into_inner);
        if !keys.contains(&key) {
            keys.push(key);
        }
    }

    /// Returns the registered keys in registration order.
    pub fn registered(&self) -> Vec<ParameterKey> {
        self.keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the registered keys as sent to the store.
    ///
    /// Keys that qualify to the same name, such as `A` and `/A`, are sent once.
    pub fn qualified_keys(&self) -> Vec<String> {
        let qualified: Vec<String> = self
            .registered()
            .iter()
            .map(|key| key.qualify(&self.namespace))
            .collect();
        distinct(&qualified)
    }

    /// Returns the fetched values, performing the fetch if it has not happened yet.
    pub async fn values(&self) -> Result<Arc<BatchValues>> {
        self.flight.get().await
    }

    /// Returns the state of the shared fetch.
    pub fn state(&self) -> FlightState {
        self.flight.state()
    }

    /// Returns how many fetches have been started.
    pub fn fetches(&self) -> usize {
        self.flight.runs()
    }
}

impl fmt::Debug for BatchContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchContext")
            .field("store", &self.store_name)
            .field("namespace", &self.namespace)
            .field("keys", &self.registered())
            .field("flight", &self.flight)
            .finish()
    }
}

#[derive(Clone)]
struct Fetch {
    store: Arc<dyn ParameterStore>,
    namespace: ParameterNamespace,
    keys: Arc<Mutex<Vec<ParameterKey>>>,
    timeout: Option<Duration>,
    logger: Option<Arc<dyn Logger>>,
}

impl Fetch {
    async fn run(self) -> Result<Arc<BatchValues>> {
        let keys = self
            .keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if keys.is_empty() {
            tracing::debug!("no remote keys registered, skipping batch fetch");
            return Ok(Arc::new(BatchValues::default()));
        }

        let qualified: Vec<String> = keys.iter().map(|k| k.qualify(&self.namespace)).collect();
        let requested = distinct(&qualified);
        let started = Instant::now();
        let call = self.store.get_parameters(&requested);
        let outcome = match self.timeout {
            Some(after) => match tokio::time::timeout(after, call).await {
                Ok(outcome) => outcome,
                Err(_) => Err(ConfigError::FetchTimeout { after }),
            },
            None => call.await,
        };
        let parameters = match outcome {
            Ok(parameters) => parameters,
            Err(e) => {
                tracing::warn!("batch fetch from '{}' failed: {}", self.store.name(), e);
                if let Some(logger) = &self.logger {
                    logger.error(&format!("parameter store batch fetch failed: {}", e));
                }
                return Err(e.into_batch_failure());
            }
        };

        let found: Vec<&str> = parameters
            .iter()
            .filter(|p| p.value.is_some())
            .map(|p| p.name.as_str())
            .collect();
        let message = format!(
            "queried parameter keys {}, found {}, duration: {}ms",
            format_structured(&requested),
            format_structured(&found),
            started.elapsed().as_millis()
        );
        tracing::debug!("{}", message);
        if let Some(logger) = &self.logger {
            if logger.enabled(LogLevel::Debug) {
                logger.debug(&message);
            }
        }

        Ok(Arc::new(BatchValues::from_parameters(&keys, &qualified, parameters)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::StaticParameterStore;

    fn key(name: &str) -> ParameterKey {
        ParameterKey::from(name)
    }

    #[test]
    fn test_from_parameters_exact_then_suffix() {
        let keys = vec![key("A"), key("DB/A")];
        let qualified = vec!["/sys/A".to_string(), "/sys/DB/A".to_string()];
        let parameters = vec![
            Parameter::new("/sys/DB/A", "nested"),
            Parameter::new("/sys/A", "top"),
        ];
        let values = BatchValues::from_parameters(&keys, &qualified, parameters);
        assert_eq!(values.get(&key("A")), Some("top"));
        assert_eq!(values.get(&key("DB/A")), Some("nested"));
    }

    #[test]
    fn test_from_parameters_suffix_fallback() {
        let keys = vec![key("/PASSWORD")];
        let qualified = vec!["/sys/PASSWORD".to_string()];
        let parameters = vec![Parameter::new("arn:store:/sys/PASSWORD", "s3cr3t")];
        let values = BatchValues::from_parameters(&keys, &qualified, parameters);
        assert_eq!(values.get(&key("/PASSWORD")), Some("s3cr3t"));
    }

    #[test]
    fn test_from_parameters_ignores_unknown_and_empty() {
        let keys = vec![key("A")];
        let qualified = vec!["/A".to_string()];
        let parameters = vec![
            Parameter {
                name: "/A".to_string(),
                value: None,
            },
            Parameter::new("/Z", "other"),
        ];
        let values = BatchValues::from_parameters(&keys, &qualified, parameters);
        assert!(values.is_empty());
    }

    #[tokio::test]
    async fn test_sends_qualified_keys_once() {
        let store = Arc::new(StaticParameterStore::new().with_parameter("/sys/dev/A", "1"));
        let namespace = ParameterNamespace::new().system("sys").env_type("dev");
        let batch = BatchContext::new(store.clone(), namespace, FetchOptions::default());
        batch.register(key("A"));
        batch.register(key("/B"));
        batch.register(key("A"));

        assert_eq!(batch.qualified_keys(), vec!["/sys/dev/A", "/sys/dev/B"]);
        let values = batch.values().await.unwrap();
        assert_eq!(values.get(&key("A")), Some("1"));
        assert_eq!(values.get(&key("/B")), None);

        let _ = batch.values().await.unwrap();
        assert_eq!(store.calls(), 1);
        assert_eq!(
            store.requests(),
            vec![vec!["/sys/dev/A".to_string(), "/sys/dev/B".to_string()]]
        );
    }

    #[test]
    fn test_from_parameters_fills_keys_sharing_a_qualified_name() {
        let keys = vec![key("A"), key("/A")];
        let qualified = vec!["/sys/A".to_string(), "/sys/A".to_string()];
        let values =
            BatchValues::from_parameters(&keys, &qualified, vec![Parameter::new("/sys/A", "v")]);
        assert_eq!(values.get(&key("A")), Some("v"));
        assert_eq!(values.get(&key("/A")), Some("v"));

        let suffixed = vec![Parameter::new("arn:store:/sys/A", "w")];
        let values = BatchValues::from_parameters(&keys, &qualified, suffixed);
        assert_eq!(values.get(&key("A")), Some("w"));
        assert_eq!(values.get(&key("/A")), Some("w"));
    }

    #[tokio::test]
    async fn test_keys_with_same_qualified_name_are_requested_once() {
        let store = Arc::new(StaticParameterStore::new().with_parameter("/sys/A", "v"));
        let namespace = ParameterNamespace::new().system("sys");
        let batch = BatchContext::new(store.clone(), namespace, FetchOptions::default());
        batch.register(key("A"));
        batch.register(key("/A"));

        assert_eq!(batch.registered(), vec![key("A"), key("/A")]);
        assert_eq!(batch.qualified_keys(), vec!["/sys/A"]);
        let values = batch.values().await.unwrap();
        assert_eq!(values.get(&key("A")), Some("v"));
        assert_eq!(values.get(&key("/A")), Some("v"));
        assert_eq!(store.requests(), vec![vec!["/sys/A".to_string()]]);
    }

    #[tokio::test]
    async fn test_empty_registration_skips_store() {
        let store = Arc::new(StaticParameterStore::new());
        let batch = BatchContext::new(
            store.clone(),
            ParameterNamespace::new(),
            FetchOptions::default(),
        );
        assert!(batch.values().await.unwrap().is_empty());
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_failure_is_sticky_by_default() {
        let store = Arc::new(StaticParameterStore::new().failing("throttled"));
        let batch = BatchContext::new(
            store.clone(),
            ParameterNamespace::new(),
            FetchOptions::default(),
        );
        batch.register(key("A"));

        let first = batch.values().await.unwrap_err();
        let second = batch.values().await.unwrap_err();
        assert!(first.is_batch_failure());
        assert!(second.is_batch_failure());
        assert_eq!(store.calls(), 1);
        assert_eq!(batch.state(), FlightState::Failed);
    }

    #[tokio::test]
    async fn test_failure_retried_with_retry_policy() {
        let store = Arc::new(StaticParameterStore::new().failing("throttled"));
        let options = FetchOptions::default().failure_policy(FailurePolicy::Retry);
        let batch = BatchContext::new(store.clone(), ParameterNamespace::new(), options);
        batch.register(key("A"));

        assert!(batch.values().await.is_err());
        assert!(batch.values().await.is_err());
        assert_eq!(store.calls(), 2);
        assert_eq!(batch.state(), FlightState::Idle);
    }

    #[tokio::test]
    async fn test_timeout_becomes_batch_failure() {
        let store = Arc::new(
            StaticParameterStore::new()
                .with_parameter("/A", "1")
                .with_delay(Duration::from_secs(10)),
        );
        let options = FetchOptions::default().timeout(Duration::from_millis(20));
        let batch = BatchContext::new(store, ParameterNamespace::new(), options);
        batch.register(key("A"));

        let err = batch.values().await.unwrap_err();
        assert!(err.is_batch_failure());
        assert!(err.to_string().contains("timed out"));
    }
}
