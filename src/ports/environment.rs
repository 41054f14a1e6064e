// SPDX-License-Identifier: MIT OR Apache-2.0

//! Environment source trait definition.
//!
//! This module defines the `EnvironmentSource` trait, the port through which environment
//! leaves read their raw values. Lookups are synchronous and never suspend.

/// A keyed lookup of string values by name.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; one source is shared by every environment leaf of
/// a configuration tree.
///
/// # Examples
///
/// ```rust
/// use lazycfg::ports::EnvironmentSource;
///
/// struct Fixed;
///
/// impl EnvironmentSource for Fixed {
///     fn name(&self) -> &str {
///         "fixed"
///     }
///
///     fn var(&self, name: &str) -> Option<String> {
///         (name == "APP_NAME").then(|| "orders".to_string())
///     }
/// }
///
/// assert_eq!(Fixed.var("APP_NAME").as_deref(), Some("orders"));
/// assert!(Fixed.var("OTHER").is_none());
/// ```
pub trait EnvironmentSource: Send + Sync {
    /// Returns a short name for logging, e.g. `"env"`.
    fn name(&self) -> &str;

    /// Returns the value of the named variable, or `None` if it is not set.
    fn var(&self, name: &str) -> Option<String>;
}
