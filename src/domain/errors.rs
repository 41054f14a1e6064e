// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the configuration crate.
//!
//! This module defines the error types that can occur while declaring and resolving a
//! configuration tree. All errors use `thiserror` for proper error handling and conversion.
//!
//! `ConfigError` is `Clone`: a single failure of the shared remote batch fetch is replayed to
//! every leaf waiting on it, so underlying causes are held behind an `Arc`.

use crate::domain::scalar::ScalarKind;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Shared, cloneable error cause.
pub type SharedSource = Arc<dyn std::error::Error + Send + Sync>;

/// The main error type for configuration operations.
///
/// This enum represents all possible errors that can occur when resolving configuration
/// values. It is marked as `#[non_exhaustive]` to allow for future additions without
/// breaking backwards compatibility.
///
/// # Examples
///
/// ```
/// use lazycfg::domain::errors::ConfigError;
///
/// fn get_config_value() -> Result<String, ConfigError> {
///     Err(ConfigError::MissingEnvValue {
///         name: "DATABASE_URL".to_string(),
///     })
/// }
/// ```
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// An environment variable was absent and no default value was given.
    #[error("Could not get process.env.{name}, and no default value was provided")]
    MissingEnvValue {
        /// The environment variable name
        name: String,
    },

    /// A remote parameter was absent from the batch result and no default value was given.
    #[error("Could not get parameter store value {key}, and no default value was provided")]
    MissingRemoteValue {
        /// The un-prefixed parameter key as declared
        key: String,
    },

    /// A raw value could not be coerced to the requested type and no default value was given.
    #[error(
        "Could not convert {origin} to a {target}{}, and no default value was provided",
        describe_found(.found)
    )]
    CoercionFailure {
        /// Where the raw value came from, e.g. `process.env.PORT`
        origin: String,
        /// The requested type
        target: ScalarKind,
        /// The raw value, when it is safe to report
        found: Option<String>,
    },

    /// The remote batch fetch itself failed.
    #[error("Parameter store batch fetch failed: {message}")]
    BatchFetchFailure {
        /// The error message
        message: String,
        /// The underlying error, if any
        #[source]
        source: Option<SharedSource>,
    },

    /// The remote batch fetch did not complete in time.
    #[error("Parameter store batch fetch timed out after {after:?}")]
    FetchTimeout {
        /// The configured timeout
        after: Duration,
    },

    /// The requested path does not exist in the configuration tree.
    #[error("Configuration key not found: {key}")]
    ConfigKeyNotFound {
        /// The key that was not found
        key: String,
    },

    /// A node in the configuration tree has a different type than requested.
    #[error("Configuration value at '{path}' is a {actual}, not a {expected}")]
    TypeMismatch {
        /// The dotted path of the node
        path: String,
        /// The requested type
        expected: String,
        /// The declared type
        actual: String,
    },

    /// An error occurred in a configuration source adapter.
    #[error("Configuration source '{source_name}' error: {message}")]
    SourceError {
        /// The name of the source that encountered the error
        source_name: String,
        /// The error message
        message: String,
        /// The underlying error, if any
        #[source]
        source: Option<SharedSource>,
    },

    /// Failed to parse a configuration file or declaration.
    #[error("Failed to parse configuration: {message}")]
    ParseError {
        /// The error message
        message: String,
        /// The underlying parsing error
        #[source]
        source: Option<SharedSource>,
    },

    /// An I/O error occurred while reading configuration.
    #[error("I/O error: {0}")]
    IoError(#[source] Arc<std::io::Error>),
}

fn describe_found(found: &Option<String>) -> String {
    match found {
        Some(raw) => format!(" (found \"{}\")", raw),
        None => String::new(),
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::IoError(Arc::new(err))
    }
}

impl ConfigError {
    /// Wraps any failure of the remote store call as a `BatchFetchFailure`.
    ///
    /// Errors that already are batch failures are passed through unchanged.
    pub fn into_batch_failure(self) -> Self {
        match self {
            ConfigError::BatchFetchFailure { .. } => self,
            other => ConfigError::BatchFetchFailure {
                message: other.to_string(),
                source: Some(Arc::new(other)),
            },
        }
    }

    /// Creates a `SourceError` for an adapter with an underlying cause.
    pub fn source_error<E>(source_name: &str, message: impl Into<String>, err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        ConfigError::SourceError {
            source_name: source_name.to_string(),
            message: message.into(),
            source: Some(Arc::new(err)),
        }
    }

    /// Returns true if this error came out of the shared remote batch fetch.
    pub fn is_batch_failure(&self) -> bool {
        matches!(self, ConfigError::BatchFetchFailure { .. })
    }
}

/// A specialized Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
