// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain layer containing core business logic and types.
//!
//! This module contains the core domain types for the configuration crate: the declared
//! shape of a configuration object, scalar values and their coercion rules, remote parameter
//! keys, the materialized result, and errors. It is independent of any external concerns.

pub mod errors;
pub mod parameter_key;
pub mod resolved;
pub mod scalar;
pub mod shape;

// Re-export commonly used types
pub use errors::{ConfigError, Result};
pub use parameter_key::{ParameterKey, ParameterNamespace};
pub use resolved::{ResolvedConfig, ResolvedValue};
pub use scalar::{ScalarKind, ScalarType, ScalarValue};
pub use shape::{ConfigurationShape, Field, FieldSpec, ScalarSpec, SourceSpec};
