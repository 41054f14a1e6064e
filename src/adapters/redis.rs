// SPDX-License-Identifier: MIT OR Apache-2.0

//! Redis parameter store adapter.
//!
//! This module provides a `ParameterStore` that answers a batch with a single Redis round
//! trip: `MGET` over prefixed string keys, or `HMGET` against one hash.

use crate::domain::{ConfigError, Result};
use crate::ports::{Parameter, ParameterStore};
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::Client;
use std::sync::Arc;

/// Storage mode for parameters in Redis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedisStorageMode {
    /// Store each parameter as a separate Redis key with a prefix.
    /// Example: `params:/sys/dev/DB_PASSWORD`
    StringKeys,
    /// Store all parameters as fields of a single Redis hash.
    /// Example: `HGET params /sys/dev/DB_PASSWORD`
    Hash,
}

/// Parameter store reading from Redis.
///
/// The client is created eagerly but no connection is made until the first batch, so building
/// a configuration tree never touches the network.
///
/// # Examples
///
/// ```rust,no_run
/// use lazycfg::adapters::{RedisParameterStore, RedisStorageMode};
///
/// // Parameters stored as `params:/sys/dev/DB_PASSWORD`, ...
/// let store = RedisParameterStore::new(
///     "redis://localhost:6379",
///     "params:",
///     RedisStorageMode::StringKeys,
/// ).unwrap();
///
/// // Or as fields of the hash `params`
/// let store = RedisParameterStore::new(
///     "redis://localhost:6379",
///     "params",
///     RedisStorageMode::Hash,
/// ).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct RedisParameterStore {
    /// Redis client
    client: Arc<Client>,
    /// Key prefix or hash key name
    namespace: String,
    /// Storage mode (string keys or hash)
    storage_mode: RedisStorageMode,
}

impl RedisParameterStore {
    /// Validates namespace to prevent injection attacks
    fn validate_namespace(namespace: &str) -> Result<()> {
        // Disallow wildcard characters and other special Redis pattern characters
        if namespace.contains(['*', '?', '[', ']', '\\']) {
            return Err(ConfigError::SourceError {
                source_name: "redis".to_string(),
                message: "Namespace contains invalid characters (* ? [ ] \\)".to_string(),
                source: None,
            });
        }
        Ok(())
    }

    /// Creates a store for the given connection URL.
    ///
    /// # Arguments
    ///
    /// * `url` - Redis connection URL (e.g., `"redis://localhost:6379"`)
    /// * `namespace` - Key prefix (for StringKeys mode) or hash key name (for Hash mode)
    /// * `storage_mode` - Whether parameters are string keys or hash fields
    pub fn new(url: &str, namespace: &str, storage_mode: RedisStorageMode) -> Result<Self> {
        Self::validate_namespace(namespace)?;

        let client = Client::open(url).map_err(|e| {
            ConfigError::source_error("redis", format!("Failed to create Redis client: {}", e), e)
        })?;

        Ok(Self {
            client: Arc::new(client),
            namespace: namespace.to_string(),
            storage_mode,
        })
    }

    /// Returns the key prefix or hash name.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns the storage mode.
    pub fn storage_mode(&self) -> RedisStorageMode {
        self.storage_mode
    }

    /// Gets a multiplexed connection to Redis.
    async fn get_connection(&self) -> Result<MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| {
                ConfigError::source_error("redis", format!("Failed to connect to Redis: {}", e), e)
            })
    }

    /// Builds the single command answering the whole batch.
    fn batch_command(&self, names: &[String]) -> redis::Cmd {
        match self.storage_mode {
            RedisStorageMode::StringKeys => {
                let keys: Vec<String> = names
                    .iter()
                    .map(|name| format!("{}{}", self.namespace, name))
                    .collect();
                let mut cmd = redis::cmd("MGET");
                cmd.arg(keys);
                cmd
            }
            RedisStorageMode::Hash => {
                let mut cmd = redis::cmd("HMGET");
                cmd.arg(&self.namespace).arg(names);
                cmd
            }
        }
    }
}

#[async_trait]
impl ParameterStore for RedisParameterStore {
    fn name(&self) -> &str {
        "redis"
    }

    async fn get_parameters(&self, names: &[String]) -> Result<Vec<Parameter>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.get_connection().await?;
        let values: Vec<Option<String>> = self
            .batch_command(names)
            .query_async(&mut conn)
            .await
            .map_err(|e| {
                ConfigError::source_error(
                    "redis",
                    format!("Failed to fetch parameters from Redis: {}", e),
                    e,
                )
            })?;

        // Both commands answer positionally, nil for missing entries
        Ok(names
            .iter()
            .zip(values)
            .filter_map(|(name, value)| value.map(|v| Parameter::new(name.clone(), v)))
            .collect())
    }
}
