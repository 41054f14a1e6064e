// SPDX-License-Identifier: MIT OR Apache-2.0

//! Remote parameter store trait definition.
//!
//! This module defines the `ParameterStore` trait, the port used by the shared batch fetch.
//! A store receives every fully-qualified key registered by a configuration tree in a single
//! call and answers with the parameters it found.

use crate::domain::Result;
use async_trait::async_trait;

/// One entry of a batch answer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Parameter {
    /// The fully-qualified name as reported by the store
    pub name: String,
    /// The value, absent if the store knows the name but holds no value
    pub value: Option<String>,
}

impl Parameter {
    /// Creates a parameter with a value.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }
}

/// A remote store answering batched key lookups.
///
/// Names missing from the answer are treated as absent. Returning `Err` fails the whole batch,
/// and the failure is delivered to every remote leaf waiting on it.
///
/// # Examples
///
/// ```rust
/// use async_trait::async_trait;
/// use lazycfg::domain::Result;
/// use lazycfg::ports::{Parameter, ParameterStore};
///
/// struct Echo;
///
/// #[async_trait]
/// impl ParameterStore for Echo {
///     fn name(&self) -> &str {
///         "echo"
///     }
///
///     async fn get_parameters(&self, names: &[String]) -> Result<Vec<Parameter>> {
///         Ok(names.iter().map(|n| Parameter::new(n.clone(), n.clone())).collect())
///     }
/// }
/// ```
#[async_trait]
pub trait ParameterStore: Send + Sync {
    /// Returns a short name for logging and errors, e.g. `"redis"`.
    fn name(&self) -> &str;

    /// Fetches all `names` in one request.
    async fn get_parameters(&self, names: &[String]) -> Result<Vec<Parameter>>;
}
