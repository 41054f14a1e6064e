// SPDX-License-Identifier: MIT OR Apache-2.0

//! The configuration factory.
//!
//! A [`ConfigurationFactory`] owns one provider tree and the remote batch behind it. Building
//! the factory declares everything and reads nothing; values are read the first time they are
//! requested and then kept for the lifetime of the factory. Two factories never share caches.

use crate::domain::{ConfigError, ConfigurationShape, ParameterNamespace, ResolvedConfig, Result};
use crate::ports::{EnvironmentSource, Logger, ParameterStore};
use crate::service::batch::{BatchContext, FetchOptions};
use crate::service::materializer::materialize;
use crate::service::settings::FactorySettings;
use crate::service::single_flight::{FailurePolicy, FlightState};
use crate::service::tree::{ConfigurationProviderTree, TreeBuilder};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

/// Lazily resolved configuration built from a shape.
///
/// # Examples
///
/// ```rust
/// use lazycfg::adapters::{MapEnvironment, StaticParameterStore};
/// use lazycfg::domain::{ConfigurationShape, Field, ParameterNamespace};
/// use lazycfg::service::ConfigurationFactory;
///
/// # #[tokio::main]
/// # async fn main() -> lazycfg::domain::Result<()> {
/// let shape = ConfigurationShape::new().nested(
///     "db",
///     ConfigurationShape::new()
///         .field("url", Field::<String>::env("DB_URL"))
///         .field("password", Field::<String>::remote("DB_PASSWORD")),
/// );
///
/// let factory = ConfigurationFactory::builder()
///     .shape(shape)
///     .environment(MapEnvironment::new().with_var("DB_URL", "postgres://db"))
///     .store(StaticParameterStore::new().with_parameter("/app/dev/DB_PASSWORD", "s3cr3t"))
///     .namespace(ParameterNamespace::new().system("app").env_type("dev"))
///     .build()?;
///
/// // Read one value...
/// let password = factory.provider().producer::<String>("db.password")?;
/// assert_eq!(password.get().await?, "s3cr3t");
///
/// // ...or everything at once
/// let config = factory.get_configuration().await?;
/// assert_eq!(config.to_json()?, r#"{"db":{"url":"postgres://db","password":"s3cr3t"}}"#);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigurationFactory {
    shape: ConfigurationShape,
    tree: ConfigurationProviderTree,
    batch: Arc<BatchContext>,
}

impl ConfigurationFactory {
    /// Creates a new factory builder.
    pub fn builder() -> ConfigurationFactoryBuilder {
        ConfigurationFactoryBuilder::new()
    }

    /// Returns the provider tree, for reading individual values on demand.
    pub fn provider(&self) -> &ConfigurationProviderTree {
        &self.tree
    }

    /// Returns the shape the factory was built from.
    pub fn shape(&self) -> &ConfigurationShape {
        &self.shape
    }

    /// Resolves every value and returns the whole configuration.
    pub async fn get_configuration(&self) -> Result<ResolvedConfig> {
        materialize(&self.tree).await
    }

    /// Resolves every value into a user-defined type.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use lazycfg::domain::{ConfigurationShape, Field};
    /// use lazycfg::service::ConfigurationFactory;
    /// use serde::Deserialize;
    ///
    /// #[derive(Deserialize)]
    /// struct Http {
    ///     port: u16,
    ///     tls: bool,
    /// }
    ///
    /// # #[tokio::main]
    /// # async fn main() -> lazycfg::domain::Result<()> {
    /// let factory = ConfigurationFactory::builder()
    ///     .shape(
    ///         ConfigurationShape::new()
    ///             .field("port", Field::<f64>::fixed(8443.0))
    ///             .field("tls", Field::<bool>::fixed(true)),
    ///     )
    ///     .build()?;
    ///
    /// let http: Http = factory.get_configuration_as().await?;
    /// assert_eq!(http.port, 8443);
    /// assert!(http.tls);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn get_configuration_as<T: DeserializeOwned>(&self) -> Result<T> {
        self.get_configuration().await?.deserialize()
    }

    /// Performs the remote batch fetch now instead of on first use.
    pub async fn prefetch(&self) -> Result<()> {
        self.batch.values().await.map(|_| ())
    }

    /// Returns the state of the remote batch fetch.
    pub fn batch_state(&self) -> FlightState {
        self.batch.state()
    }

    /// Returns the fully-qualified keys the batch fetch requests.
    pub fn remote_keys(&self) -> Vec<String> {
        self.batch.qualified_keys()
    }
}

/// Builder for constructing a `ConfigurationFactory`.
///
/// Without an explicit environment the process environment is used (feature `env`). A
/// parameter store is required only when the shape declares remote values.
pub struct ConfigurationFactoryBuilder {
    shape: ConfigurationShape,
    environment: Option<Arc<dyn EnvironmentSource>>,
    store: Option<Arc<dyn ParameterStore>>,
    namespace: ParameterNamespace,
    options: FetchOptions,
    logger: Option<Arc<dyn Logger>>,
}

impl ConfigurationFactoryBuilder {
    /// Creates a new builder with an empty shape.
    pub fn new() -> Self {
        Self {
            shape: ConfigurationShape::new(),
            environment: None,
            store: None,
            namespace: ParameterNamespace::new(),
            options: FetchOptions::default(),
            logger: None,
        }
    }

    /// Sets the configuration shape.
    pub fn shape(mut self, shape: ConfigurationShape) -> Self {
        self.shape = shape;
        self
    }

    /// Sets the environment that `env` leaves read from.
    pub fn environment(mut self, environment: impl EnvironmentSource + 'static) -> Self {
        self.environment = Some(Arc::new(environment));
        self
    }

    /// Sets a shared environment.
    pub fn environment_arc(mut self, environment: Arc<dyn EnvironmentSource>) -> Self {
        self.environment = Some(environment);
        self
    }

    /// Sets the parameter store that `remote` leaves read from.
    pub fn store(mut self, store: impl ParameterStore + 'static) -> Self {
        self.store = Some(Arc::new(store));
        self
    }

    /// Sets a shared parameter store.
    pub fn store_arc(mut self, store: Arc<dyn ParameterStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Sets the prefix segments for remote keys.
    pub fn namespace(mut self, namespace: ParameterNamespace) -> Self {
        self.namespace = namespace;
        self
    }

    /// Sets all batch fetch options.
    pub fn fetch_options(mut self, options: FetchOptions) -> Self {
        self.options = options;
        self
    }

    /// Aborts the batch fetch after `timeout`.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = Some(timeout);
        self
    }

    /// Sets whether a failed batch fetch is cached or retried.
    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.options.failure_policy = policy;
        self
    }

    /// Reports resolution to `logger`.
    pub fn logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Applies namespace and fetch options from `settings`.
    pub fn settings(self, settings: &FactorySettings) -> Self {
        self.namespace(settings.namespace.clone())
            .fetch_options(settings.fetch_options())
    }

    /// Builds the factory. No value is read.
    ///
    /// # Errors
    ///
    /// Fails with `SourceError` if the shape declares remote values but no store was set, or
    /// if no environment was set and the `env` feature is disabled.
    pub fn build(self) -> Result<ConfigurationFactory> {
        let environment = match self.environment {
            Some(environment) => environment,
            None => default_environment()?,
        };
        let store: Arc<dyn ParameterStore> = match self.store {
            Some(store) => store,
            None if self.shape.remote_keys().is_empty() => {
                Arc::new(crate::adapters::StaticParameterStore::new())
            }
            None => {
                return Err(ConfigError::SourceError {
                    source_name: "parameter store".to_string(),
                    message: "the shape declares remote values but no parameter store was set"
                        .to_string(),
                    source: None,
                })
            }
        };

        let batch = Arc::new(BatchContext::with_logger(
            store,
            self.namespace,
            self.options,
            self.logger.clone(),
        ));
        let tree = TreeBuilder::new(environment, Arc::clone(&batch))
            .with_logger(self.logger)
            .build(&self.shape);
        tracing::debug!(
            "built configuration tree with {} fields and {} remote keys",
            tree.len(),
            tree.remote_keys().len()
        );

        Ok(ConfigurationFactory {
            shape: self.shape,
            tree,
            batch,
        })
    }
}

impl Default for ConfigurationFactoryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "env")]
fn default_environment() -> Result<Arc<dyn EnvironmentSource>> {
    Ok(Arc::new(crate::adapters::ProcessEnvironment::new()))
}

#[cfg(not(feature = "env"))]
fn default_environment() -> Result<Arc<dyn EnvironmentSource>> {
    Err(ConfigError::SourceError {
        source_name: "environment".to_string(),
        message: "no environment was set and the process environment is disabled".to_string(),
        source: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{MapEnvironment, StaticParameterStore};
    use crate::domain::{Field, ScalarValue};
    use serde::Deserialize;

    fn shape() -> ConfigurationShape {
        ConfigurationShape::new().nested(
            "db",
            ConfigurationShape::new()
                .field("url", Field::<String>::env("DB_URL"))
                .field("user", Field::<String>::env("DB_USER").or_default("admin"))
                .field("password", Field::<String>::remote("DB_PASSWORD")),
        )
    }

    fn password_store() -> Arc<StaticParameterStore> {
        Arc::new(StaticParameterStore::new().with_parameter("/sys/dev/DB_PASSWORD", "pw"))
    }

    fn factory(store: Arc<StaticParameterStore>) -> ConfigurationFactory {
        ConfigurationFactory::builder()
            .shape(shape())
            .environment(MapEnvironment::new().with_var("DB_URL", "postgres://db"))
            .store_arc(store)
            .namespace(ParameterNamespace::new().system("sys").env_type("dev"))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_get_configuration() {
        let store = password_store();
        let factory = factory(store.clone());

        assert_eq!(factory.batch_state(), FlightState::Idle);
        let config = factory.get_configuration().await.unwrap();
        assert_eq!(
            config.get("db.url"),
            Some(&ScalarValue::from("postgres://db"))
        );
        assert_eq!(config.get("db.user"), Some(&ScalarValue::from("admin")));
        assert_eq!(config.get("db.password"), Some(&ScalarValue::from("pw")));
        assert_eq!(factory.batch_state(), FlightState::Resolved);
        assert_eq!(store.calls(), 1);
    }

    #[tokio::test]
    async fn test_get_configuration_as() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Db {
            url: String,
            user: String,
            password: String,
        }

        #[derive(Debug, Deserialize, PartialEq)]
        struct App {
            db: Db,
        }

        let store = password_store();
        let app: App = factory(store).get_configuration_as().await.unwrap();
        assert_eq!(
            app,
            App {
                db: Db {
                    url: "postgres://db".to_string(),
                    user: "admin".to_string(),
                    password: "pw".to_string(),
                }
            }
        );
    }

    #[tokio::test]
    async fn test_prefetch_warms_the_batch() {
        let store = password_store();
        let factory = factory(store.clone());

        factory.prefetch().await.unwrap();
        assert_eq!(factory.batch_state(), FlightState::Resolved);
        let password = factory.provider().producer::<String>("db.password").unwrap();
        assert_eq!(password.get().await.unwrap(), "pw");
        assert_eq!(store.calls(), 1);
    }

    #[test]
    fn test_remote_keys_are_qualified() {
        let factory = factory(Arc::new(StaticParameterStore::new()));
        assert_eq!(factory.remote_keys(), vec!["/sys/dev/DB_PASSWORD"]);
    }

    #[test]
    fn test_build_requires_store_for_remote_values() {
        let result = ConfigurationFactory::builder()
            .shape(shape())
            .environment(MapEnvironment::new())
            .build();
        assert!(matches!(result, Err(ConfigError::SourceError { .. })));
    }

    #[tokio::test]
    async fn test_factories_do_not_share_caches() {
        let store = password_store();
        let first = factory(store.clone());
        let second = factory(store.clone());

        first.get_configuration().await.unwrap();
        second.get_configuration().await.unwrap();
        assert_eq!(store.calls(), 2);
    }

    #[test]
    fn test_settings_apply_namespace_and_options() {
        let settings = FactorySettings {
            namespace: ParameterNamespace::new().service_name("api"),
            fetch_timeout_ms: Some(10),
            sticky_failures: false,
            log_level: None,
        };
        let factory = ConfigurationFactory::builder()
            .shape(shape())
            .environment(MapEnvironment::new())
            .store(StaticParameterStore::new())
            .settings(&settings)
            .build()
            .unwrap();
        assert_eq!(factory.remote_keys(), vec!["/api/DB_PASSWORD"]);
    }
}
