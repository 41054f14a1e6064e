// SPDX-License-Identifier: MIT OR Apache-2.0

//! Factory settings loaded from YAML or the process environment.
//!
//! Every field is optional. A YAML settings document looks like:
//!
//! ```yaml
//! namespace:
//!   system: billing
//!   envType: prod
//!   serviceName: invoices
//! fetchTimeoutMs: 2000
//! stickyFailures: true
//! logLevel: debug
//! ```

use crate::domain::parameter_key::{
    ParameterNamespace, ENV_TYPE_ENV_VAR, SERVICE_NAME_ENV_VAR, SYSTEM_ENV_VAR,
};
use crate::domain::{ConfigError, Result};
use crate::ports::LogLevel;
use crate::service::batch::FetchOptions;
use crate::service::single_flight::FailurePolicy;
use serde::Deserialize;
use std::time::Duration;

/// Environment variable holding the batch fetch timeout in milliseconds.
pub const FETCH_TIMEOUT_ENV_VAR: &str = "LAZYCFG_FETCH_TIMEOUT_MS";
/// Environment variable selecting sticky (`true`) or retried (`false`) batch failures.
pub const STICKY_FAILURES_ENV_VAR: &str = "LAZYCFG_STICKY_FAILURES";
/// Environment variable holding the log level.
pub const LOG_LEVEL_ENV_VAR: &str = "LAZYCFG_LOG_LEVEL";

/// Tunables of a [`ConfigurationFactory`](super::ConfigurationFactory).
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FactorySettings {
    /// Prefix segments for remote keys
    pub namespace: ParameterNamespace,
    /// Batch fetch timeout; `None` waits for the store indefinitely
    pub fetch_timeout_ms: Option<u64>,
    /// Cache a failed batch fetch instead of retrying it
    pub sticky_failures: bool,
    /// Minimum level for the resolution logger
    pub log_level: Option<String>,
}

impl Default for FactorySettings {
    fn default() -> Self {
        Self {
            namespace: ParameterNamespace::default(),
            fetch_timeout_ms: None,
            sticky_failures: true,
            log_level: None,
        }
    }
}

impl FactorySettings {
    /// Parses settings from a YAML document.
    #[cfg(feature = "yaml")]
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| ConfigError::ParseError {
            message: format!("Invalid factory settings: {}", e),
            source: Some(std::sync::Arc::new(e)),
        })
    }

    /// Reads settings from `LAZYCFG_*` environment variables.
    ///
    /// Unset variables keep their defaults; malformed values are errors.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut settings = Self {
            namespace: ParameterNamespace {
                system: lookup(SYSTEM_ENV_VAR),
                env_type: lookup(ENV_TYPE_ENV_VAR),
                service_name: lookup(SERVICE_NAME_ENV_VAR),
            },
            ..Self::default()
        };
        if let Some(raw) = lookup(FETCH_TIMEOUT_ENV_VAR) {
            let millis = raw.trim().parse::<u64>().map_err(|e| ConfigError::ParseError {
                message: format!(
                    "{} must be a whole number of milliseconds: {}",
                    FETCH_TIMEOUT_ENV_VAR, e
                ),
                source: Some(std::sync::Arc::new(e)),
            })?;
            settings.fetch_timeout_ms = Some(millis);
        }
        if let Some(raw) = lookup(STICKY_FAILURES_ENV_VAR) {
            settings.sticky_failures =
                crate::domain::scalar::coerce_bool(&raw).ok_or_else(|| ConfigError::ParseError {
                    message: format!("{} must be true, false, 1 or 0", STICKY_FAILURES_ENV_VAR),
                    source: None,
                })?;
        }
        settings.log_level = lookup(LOG_LEVEL_ENV_VAR);
        Ok(settings)
    }

    /// Returns the batch fetch options these settings describe.
    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            timeout: self.fetch_timeout_ms.map(Duration::from_millis),
            failure_policy: if self.sticky_failures {
                FailurePolicy::Sticky
            } else {
                FailurePolicy::Retry
            },
        }
    }

    /// Returns the log level, `Info` when unset or unknown.
    pub fn log_level(&self) -> LogLevel {
        self.log_level
            .as_deref()
            .map(LogLevel::parse_or_info)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = FactorySettings::default();
        assert!(settings.sticky_failures);
        assert_eq!(settings.fetch_options(), FetchOptions::default());
        assert_eq!(settings.log_level(), LogLevel::Info);
    }

    #[cfg(feature = "yaml")]
    #[test]
    fn test_from_yaml_str() {
        let yaml = r#"
namespace:
  system: billing
  envType: prod
fetchTimeoutMs: 1500
stickyFailures: false
logLevel: debug
"#;
        let settings = FactorySettings::from_yaml_str(yaml).unwrap();
        assert_eq!(settings.namespace.system.as_deref(), Some("billing"));
        assert_eq!(settings.namespace.env_type.as_deref(), Some("prod"));
        assert_eq!(settings.namespace.service_name, None);
        assert_eq!(
            settings.fetch_options(),
            FetchOptions {
                timeout: Some(Duration::from_millis(1500)),
                failure_policy: FailurePolicy::Retry,
            }
        );
        assert_eq!(settings.log_level(), LogLevel::Debug);
    }

    #[cfg(feature = "yaml")]
    #[test]
    fn test_from_yaml_str_partial_keeps_defaults() {
        let settings = FactorySettings::from_yaml_str("logLevel: warn\n").unwrap();
        assert!(settings.sticky_failures);
        assert_eq!(settings.log_level(), LogLevel::Warn);
    }

    #[cfg(feature = "yaml")]
    #[test]
    fn test_from_yaml_str_invalid() {
        let result = FactorySettings::from_yaml_str("fetchTimeoutMs: soon\n");
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn test_from_lookup() {
        let settings = FactorySettings::from_lookup(lookup(&[
            (SYSTEM_ENV_VAR, "sys"),
            (SERVICE_NAME_ENV_VAR, "api"),
            (FETCH_TIMEOUT_ENV_VAR, " 250 "),
            (STICKY_FAILURES_ENV_VAR, "0"),
            (LOG_LEVEL_ENV_VAR, "error"),
        ]))
        .unwrap();
        assert_eq!(
            settings.namespace,
            ParameterNamespace::new().system("sys").service_name("api")
        );
        assert_eq!(settings.fetch_timeout_ms, Some(250));
        assert!(!settings.sticky_failures);
        assert_eq!(settings.log_level(), LogLevel::Error);
    }

    #[test]
    fn test_from_lookup_rejects_bad_values() {
        assert!(
            FactorySettings::from_lookup(lookup(&[(FETCH_TIMEOUT_ENV_VAR, "fast")])).is_err()
        );
        assert!(
            FactorySettings::from_lookup(lookup(&[(STICKY_FAILURES_ENV_VAR, "maybe")])).is_err()
        );
    }

    #[test]
    fn test_unknown_log_level_is_info() {
        let settings = FactorySettings {
            log_level: Some("chatty".to_string()),
            ..FactorySettings::default()
        };
        assert_eq!(settings.log_level(), LogLevel::Info);
    }
}
