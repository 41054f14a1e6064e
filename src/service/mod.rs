// SPDX-License-Identifier: MIT OR Apache-2.0

//! Service layer containing the resolution engine.
//!
//! This module turns a declared shape into lazily resolved values: the single-flight
//! primitive, leaf resolvers, the shared remote batch, provider trees, the materializer and
//! the `ConfigurationFactory` that ties them together.

pub mod batch;
pub mod factory;
pub mod materializer;
pub mod producer;
pub mod resolvers;
pub mod settings;
pub mod single_flight;
pub mod tree;

// Re-export commonly used types
pub use batch::{BatchContext, BatchValues, FetchOptions};
pub use factory::{ConfigurationFactory, ConfigurationFactoryBuilder};
pub use materializer::materialize;
pub use producer::{AnyProducer, ValueProducer};
pub use resolvers::{EnvResolver, FixedResolver, RemoteResolver};
pub use settings::FactorySettings;
pub use single_flight::{FailurePolicy, FlightState, SingleFlight};
pub use tree::{ConfigurationProviderTree, ProviderNode, TreeBuilder};
