// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapters layer containing implementations of the ports.
//!
//! This module contains concrete environment sources, parameter stores, shape parsers and
//! loggers. In-memory adapters are always available; the others are behind feature flags.

#[cfg(feature = "cli")]
pub mod cli;
#[cfg(feature = "env")]
pub mod env_var;
#[cfg(feature = "etcd")]
pub mod etcd;
pub mod map_env;
#[cfg(feature = "redis")]
pub mod redis;
pub mod static_store;
pub mod tracing_logger;
#[cfg(feature = "yaml")]
pub mod yaml_file;

// Re-export adapters based on feature flags
#[cfg(feature = "cli")]
pub use cli::CommandLineEnvironment;
#[cfg(feature = "env")]
pub use env_var::ProcessEnvironment;
#[cfg(feature = "etcd")]
pub use etcd::EtcdParameterStore;
pub use map_env::MapEnvironment;
#[cfg(feature = "redis")]
pub use redis::{RedisParameterStore, RedisStorageMode};
pub use static_store::StaticParameterStore;
pub use tracing_logger::TracingLogger;
#[cfg(feature = "yaml")]
pub use yaml_file::{YamlParameterStore, YamlShapeParser};
