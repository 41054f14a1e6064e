// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lazy, batched, hierarchical configuration resolution.
//!
//! This crate resolves a declared configuration shape from environment variables, constants
//! and a remote parameter store. Nothing is read while the configuration is declared; every
//! value is read the first time it is needed and then kept. All remote keys of one
//! configuration tree are fetched together in a single store request, however many leaves
//! ask for them and however concurrently they ask.
//!
//! # Architecture
//!
//! The crate follows hexagonal architecture principles:
//!
//! - **Domain Layer**: Core types (`ConfigurationShape`, `ScalarValue`, `ParameterKey`,
//!   `ResolvedConfig`, errors)
//! - **Ports**: Trait definitions for collaborators (`EnvironmentSource`, `ParameterStore`,
//!   `ShapeParser`, `Logger`)
//! - **Adapters**: Implementations for specific sources (process env, YAML, Redis, etcd, ...)
//! - **Service**: The resolution engine (single-flight, batch context, provider tree,
//!   materializer, `ConfigurationFactory`)
//!
//! # Features
//!
//! - **Lazy**: Building a factory performs no I/O
//! - **Batched**: One parameter store request per configuration tree
//! - **Typed**: Leaves resolve to strings, numbers or booleans with defaults
//! - **Hierarchical**: Nested shapes materialize into nested objects
//! - **Extensible**: New stores and environments plug in through the ports
//!
//! # Feature Flags
//!
//! - `yaml`: YAML parameter files and shape declarations (default)
//! - `env`: Process environment support (default)
//! - `cli`: Command-line overrides and the `lazycfg` binary (default)
//! - `etcd`: etcd parameter store
//! - `redis`: Redis parameter store
//! - `remote`: All remote stores (etcd + redis)
//! - `full`: Enable all features
//!
//! # Quick Start
//!
//! ```rust
//! use lazycfg::prelude::*;
//!
//! # #[tokio::main]
//! # async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//! let shape = ConfigurationShape::new()
//!     .field("url", Field::<String>::env("DB_URL"))
//!     .field("port", Field::<f64>::env("DB_PORT").or_default(5432.0))
//!     .field("password", Field::<String>::remote("DB_PASSWORD"));
//!
//! let factory = ConfigurationFactory::builder()
//!     .shape(shape)
//!     .environment(MapEnvironment::new().with_var("DB_URL", "postgres://db"))
//!     .store(StaticParameterStore::new().with_parameter("/shop/prod/DB_PASSWORD", "s3cr3t"))
//!     .namespace(ParameterNamespace::new().system("shop").env_type("prod"))
//!     .build()?;
//!
//! let config = factory.get_configuration().await?;
//! assert_eq!(
//!     config.to_json()?,
//!     r#"{"url":"postgres://db","port":5432,"password":"s3cr3t"}"#
//! );
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

/// Commonly used types and traits.
///
/// This module re-exports the most commonly used types and traits for convenient access.
pub mod prelude {
    pub use crate::domain::{
        ConfigError, ConfigurationShape, Field, ParameterKey, ParameterNamespace,
        ResolvedConfig, ResolvedValue, Result, ScalarKind, ScalarValue,
    };
    pub use crate::ports::{EnvironmentSource, LogLevel, Logger, ParameterStore, ShapeParser};
    pub use crate::service::{
        ConfigurationFactory, ConfigurationProviderTree, FactorySettings, FailurePolicy,
        FetchOptions, ValueProducer,
    };

    pub use crate::adapters::{MapEnvironment, StaticParameterStore, TracingLogger};

    // Re-export adapters based on feature flags
    #[cfg(feature = "cli")]
    pub use crate::adapters::CommandLineEnvironment;
    #[cfg(feature = "env")]
    pub use crate::adapters::ProcessEnvironment;
    #[cfg(feature = "yaml")]
    pub use crate::adapters::{YamlParameterStore, YamlShapeParser};
}
