// SPDX-License-Identifier: MIT OR Apache-2.0

//! Leaf value resolvers.
//!
//! Each resolver knows where one leaf's raw value lives and turns it into a
//! [`ValueProducer`]. The fallback policy is the same for every source: the default is used
//! only when the value is absent or cannot be coerced, never because of what the default is.
//! An empty string, zero and `false` are valid defaults.

use crate::domain::{ConfigError, ParameterKey, Result, ScalarType};
use crate::ports::{EnvironmentSource, Logger};
use crate::service::batch::BatchContext;
use crate::service::producer::ValueProducer;
use std::sync::Arc;

/// Reads one named environment variable.
#[derive(Clone)]
pub struct EnvResolver {
    environment: Arc<dyn EnvironmentSource>,
    name: String,
    logger: Option<Arc<dyn Logger>>,
}

impl EnvResolver {
    /// Creates a resolver for the variable `name`.
    pub fn new(environment: Arc<dyn EnvironmentSource>, name: impl Into<String>) -> Self {
        Self {
            environment,
            name: name.into(),
            logger: None,
        }
    }

    /// Reports reads and fallbacks to `logger`.
    pub fn with_logger(mut self, logger: Option<Arc<dyn Logger>>) -> Self {
        self.logger = logger;
        self
    }

    /// Returns a producer for the variable coerced to `T`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use lazycfg::adapters::MapEnvironment;
    /// use lazycfg::service::EnvResolver;
    /// use std::sync::Arc;
    ///
    /// # #[tokio::main]
    /// # async fn main() {
    /// let env = Arc::new(MapEnvironment::new().with_var("PORT", "8080"));
    /// let port = EnvResolver::new(env, "PORT").resolve::<f64>(None);
    /// assert_eq!(port.get().await.unwrap(), 8080.0);
    /// # }
    /// ```
    pub fn resolve<T: ScalarType>(&self, default: Option<T>) -> ValueProducer<T> {
        let resolver = self.clone();
        ValueProducer::new(move || futures::future::ready(resolver.read(default.clone())))
    }

    fn read<T: ScalarType>(&self, default: Option<T>) -> Result<T> {
        let origin = format!("process.env.{}", self.name);
        let raw = self.environment.var(&self.name);
        match &raw {
            // Environment values are not considered sensitive
            Some(value) => {
                tracing::debug!("getting {} from {}", origin, self.environment.name());
                log_debug(&self.logger, || format!("getting {}: {}", origin, value));
            }
            None if default.is_some() => log_debug(&self.logger, || {
                format!("couldn't find {}, using default value", origin)
            }),
            None => {}
        }
        let found = raw.clone();
        settle(raw, default, &origin, found, || ConfigError::MissingEnvValue {
            name: self.name.clone(),
        })
    }
}

/// Yields a constant supplied at declaration time.
#[derive(Clone, Debug)]
pub struct FixedResolver<T> {
    value: T,
}

impl<T: ScalarType> FixedResolver<T> {
    /// Creates a resolver for `value`.
    pub fn new(value: T) -> Self {
        Self { value }
    }

    /// Returns a producer that always yields the constant.
    pub fn resolve(&self, logger: Option<Arc<dyn Logger>>) -> ValueProducer<T> {
        let value = self.value.clone();
        ValueProducer::new(move || {
            log_debug(&logger, || {
                format!("getting fixed value: {}", value.clone().into_scalar())
            });
            futures::future::ready(Ok(value.clone()))
        })
    }
}

/// Reads one key out of the shared remote batch.
///
/// Creating the resolver registers its key with the batch; the batch itself is fetched the
/// first time any remote leaf of the same context is resolved.
#[derive(Clone)]
pub struct RemoteResolver {
    batch: Arc<BatchContext>,
    key: ParameterKey,
    logger: Option<Arc<dyn Logger>>,
}

impl RemoteResolver {
    /// Registers `key` with `batch` and creates a resolver for it.
    pub fn new(batch: Arc<BatchContext>, key: ParameterKey) -> Self {
        batch.register(key.clone());
        Self {
            batch,
            key,
            logger: None,
        }
    }

    /// Reports reads and fallbacks to `logger`.
    pub fn with_logger(mut self, logger: Option<Arc<dyn Logger>>) -> Self {
        self.logger = logger;
        self
    }

    /// Returns a producer for the key coerced to `T`.
    pub fn resolve<T: ScalarType>(&self, default: Option<T>) -> ValueProducer<T> {
        let resolver = self.clone();
        ValueProducer::new(move || {
            let resolver = resolver.clone();
            let default = default.clone();
            async move { resolver.read(default).await }
        })
    }

    async fn read<T: ScalarType>(&self, default: Option<T>) -> Result<T> {
        let values = self.batch.values().await?;
        let raw = values.get(&self.key).map(str::to_string);
        let origin = format!("parameter store value {}", self.key);
        // Remote values may be secrets: only their length is reported
        match &raw {
            Some(value) => log_debug(&self.logger, || {
                format!("got {}: {} characters", origin, value.chars().count())
            }),
            None if default.is_some() => log_debug(&self.logger, || {
                format!("couldn't find {}, using default value", origin)
            }),
            None => {}
        }
        settle(raw, default, &origin, None, || ConfigError::MissingRemoteValue {
            key: self.key.to_string(),
        })
    }
}

/// Applies coercion and the default fallback to a raw value.
fn settle<T: ScalarType>(
    raw: Option<String>,
    default: Option<T>,
    origin: &str,
    found: Option<String>,
    missing: impl FnOnce() -> ConfigError,
) -> Result<T> {
    let Some(raw) = raw else {
        return default.ok_or_else(missing);
    };
    match (T::coerce(&raw), default) {
        (Some(value), _) => Ok(value),
        (None, Some(default)) => {
            tracing::debug!("could not convert {} to a {}, using default", origin, T::KIND);
            Ok(default)
        }
        (None, None) => Err(ConfigError::CoercionFailure {
            origin: origin.to_string(),
            target: T::KIND,
            found,
        }),
    }
}

fn log_debug(logger: &Option<Arc<dyn Logger>>, message: impl FnOnce() -> String) {
    if let Some(logger) = logger {
        if logger.enabled(crate::ports::LogLevel::Debug) {
            logger.debug(&message());
        }
    }
}
