// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ports layer containing trait definitions.
//!
//! This module contains the trait definitions (ports) for the collaborators of the
//! resolution engine: the process environment, the remote parameter store, the logger and
//! shape declaration parsers. They are implemented by adapters in the adapters layer.

pub mod environment;
pub mod logger;
pub mod parameter_store;
pub mod parser;

// Re-export commonly used types
pub use environment::EnvironmentSource;
pub use logger::{format_structured, LogLevel, Logger, MAX_STRUCTURED_LEN};
pub use parameter_store::{Parameter, ParameterStore};
pub use parser::ShapeParser;
