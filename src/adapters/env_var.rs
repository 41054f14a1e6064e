// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process environment adapter.
//!
//! This module provides an `EnvironmentSource` that reads variables from the process
//! environment at the moment a leaf asks for them.

use crate::ports::EnvironmentSource;
use std::env;

/// Maximum length for environment variable names (prevents DoS)
const MAX_ENV_KEY_LEN: usize = 512;

/// Maximum length for environment variable values (prevents DoS)
const MAX_ENV_VALUE_LEN: usize = 1048576; // 1MB

/// Environment source backed by `std::env`.
///
/// Variables are read on every lookup, so a leaf that failed because a variable was missing
/// sees it once it is set. Names and values that are not valid Unicode, or are larger than
/// the adapter limits, are treated as unset.
///
/// An optional prefix is prepended to every looked-up name, so a shape declaring `DB_URL`
/// reads `MYAPP_DB_URL`.
///
/// # Examples
///
/// ```rust
/// use lazycfg::adapters::ProcessEnvironment;
/// use lazycfg::ports::EnvironmentSource;
///
/// let env = ProcessEnvironment::new();
/// assert_eq!(env.name(), "env");
///
/// let prefixed = ProcessEnvironment::with_prefix("MYAPP_");
/// assert_eq!(prefixed.prefix(), Some("MYAPP_"));
/// ```
#[derive(Clone, Debug, Default)]
pub struct ProcessEnvironment {
    /// Optional prefix added to every variable name
    prefix: Option<String>,
}

impl ProcessEnvironment {
    /// Creates an adapter reading variables by their declared names.
    pub fn new() -> Self {
        Self { prefix: None }
    }

    /// Creates an adapter that prepends `prefix` to every variable name.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }

    /// Returns the configured prefix.
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    fn full_name(&self, name: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}{}", prefix, name),
            None => name.to_string(),
        }
    }
}

impl EnvironmentSource for ProcessEnvironment {
    fn name(&self) -> &str {
        "env"
    }

    fn var(&self, name: &str) -> Option<String> {
        let name = self.full_name(name);
        if name.is_empty() || name.len() > MAX_ENV_KEY_LEN || name.contains(['=', '\0']) {
            tracing::debug!("Skipping invalid environment variable name (len={})", name.len());
            return None;
        }
        let value = env::var(&name).ok()?;
        if value.len() > MAX_ENV_VALUE_LEN {
            tracing::debug!(
                "Skipping oversized environment variable {}: value_len={} (max value={})",
                name,
                value.len(),
                MAX_ENV_VALUE_LEN
            );
            return None;
        }
        Some(value)
    }
}
