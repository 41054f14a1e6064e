// SPDX-License-Identifier: MIT OR Apache-2.0

//! Remote parameter keys and their namespace.
//!
//! Keys are declared un-prefixed (e.g. `DB_PASSWORD`) and qualified at fetch time with the
//! configured system, environment type and service name segments.

use serde::Deserialize;
use std::fmt;

/// Environment variable holding the system segment of the namespace.
pub const SYSTEM_ENV_VAR: &str = "LAZYCFG_SYSTEM";
/// Environment variable holding the environment type segment of the namespace.
pub const ENV_TYPE_ENV_VAR: &str = "LAZYCFG_ENV_TYPE";
/// Environment variable holding the service name segment of the namespace.
pub const SERVICE_NAME_ENV_VAR: &str = "LAZYCFG_SERVICE_NAME";

/// Prefix segments applied to every remote parameter key.
///
/// # Examples
///
/// ```
/// use lazycfg::domain::{ParameterKey, ParameterNamespace};
///
/// let namespace = ParameterNamespace::new().system("sys").env_type("dev");
/// let key = ParameterKey::from("/DB_PASSWORD");
/// assert_eq!(key.qualify(&namespace), "/sys/dev/DB_PASSWORD");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParameterNamespace {
    /// System name, the first segment
    pub system: Option<String>,
    /// Environment type (dev, test, prod, ...), the second segment
    pub env_type: Option<String>,
    /// Service name, the third segment
    pub service_name: Option<String>,
}

impl ParameterNamespace {
    /// Creates an empty namespace; keys are used as declared.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the system segment.
    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Sets the environment type segment.
    pub fn env_type(mut self, env_type: impl Into<String>) -> Self {
        self.env_type = Some(env_type.into());
        self
    }

    /// Sets the service name segment.
    pub fn service_name(mut self, service_name: impl Into<String>) -> Self {
        self.service_name = Some(service_name.into());
        self
    }

    /// Reads the namespace segments from `LAZYCFG_SYSTEM`, `LAZYCFG_ENV_TYPE` and
    /// `LAZYCFG_SERVICE_NAME`. Unset variables leave the segment empty.
    pub fn from_env() -> Self {
        Self {
            system: std::env::var(SYSTEM_ENV_VAR).ok(),
            env_type: std::env::var(ENV_TYPE_ENV_VAR).ok(),
            service_name: std::env::var(SERVICE_NAME_ENV_VAR).ok(),
        }
    }

    /// Returns the configured segments in order, skipping unset and empty ones.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        [&self.system, &self.env_type, &self.service_name]
            .into_iter()
            .filter_map(|s| s.as_deref())
            .filter(|s| !s.is_empty())
    }
}

/// A remote parameter key as declared in a configuration shape.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParameterKey(String);

impl ParameterKey {
    /// Creates a new `ParameterKey` from a `String`.
    pub fn new(key: String) -> Self {
        ParameterKey(key)
    }

    /// Returns the key as declared.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Builds the fully-qualified key sent to the parameter store.
    ///
    /// One leading `/` on the declared key is stripped, then the namespace segments and the
    /// key are joined with `/` behind a leading `/`.
    pub fn qualify(&self, namespace: &ParameterNamespace) -> String {
        let key = self.0.strip_prefix('/').unwrap_or(&self.0);
        let segments: Vec<&str> = namespace
            .segments()
            .chain(std::iter::once(key).filter(|k| !k.is_empty()))
            .collect();
        format!("/{}", segments.join("/"))
    }

    /// Returns true if a name returned by the store refers to this key.
    ///
    /// Used when the store reports names that do not match the qualified form exactly.
    pub fn is_suffix_of(&self, name: &str) -> bool {
        let key = self.0.strip_prefix('/').unwrap_or(&self.0);
        !key.is_empty() && name.ends_with(key)
    }
}

impl From<String> for ParameterKey {
    fn from(s: String) -> Self {
        ParameterKey(s)
    }
}

impl From<&str> for ParameterKey {
    fn from(s: &str) -> Self {
        ParameterKey(s.to_string())
    }
}

impl AsRef<str> for ParameterKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParameterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
