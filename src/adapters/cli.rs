// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command-line override adapter.
//!
//! This module provides an `EnvironmentSource` that takes variable values from command-line
//! arguments and falls back to another source for everything else.

use crate::ports::EnvironmentSource;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Environment source layering command-line overrides over another source.
///
/// Supported argument formats:
/// - `--NAME=value`: long form with equals sign
/// - `--NAME value`: long form with space-separated value
/// - `-e NAME=value`: explicit override, as accepted by container runtimes
///
/// Anything else is ignored. When a name is given more than once, the last value wins.
///
/// # Examples
///
/// ```rust
/// use lazycfg::adapters::{CommandLineEnvironment, MapEnvironment};
/// use lazycfg::ports::EnvironmentSource;
///
/// let base = MapEnvironment::new()
///     .with_var("DB_URL", "postgres://prod")
///     .with_var("DB_USER", "app");
/// let env = CommandLineEnvironment::from_args(vec!["--DB_URL=postgres://local"]).over(base);
///
/// assert_eq!(env.var("DB_URL").as_deref(), Some("postgres://local"));
/// assert_eq!(env.var("DB_USER").as_deref(), Some("app"));
/// ```
#[derive(Clone, Default)]
pub struct CommandLineEnvironment {
    /// Parsed overrides
    values: HashMap<String, String>,
    /// Source consulted for names without an override
    fallback: Option<Arc<dyn EnvironmentSource>>,
}

impl CommandLineEnvironment {
    /// Creates an adapter with no overrides and no fallback.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses overrides from a list of arguments.
    pub fn from_args<S: AsRef<str>>(args: Vec<S>) -> Self {
        let mut adapter = Self::new();
        adapter.parse_args(&args);
        adapter
    }

    /// Parses overrides from the process arguments, skipping the program name.
    pub fn from_env_args() -> Self {
        let args: Vec<String> = std::env::args().skip(1).collect();
        Self::from_args(args)
    }

    /// Adds `NAME=value` pairs. Entries without `=` are ignored.
    pub fn with_pairs<S: AsRef<str>>(mut self, pairs: &[S]) -> Self {
        for pair in pairs {
            self.insert_pair(pair.as_ref());
        }
        self
    }

    /// Consults `fallback` for names without an override.
    pub fn over(self, fallback: impl EnvironmentSource + 'static) -> Self {
        self.over_arc(Arc::new(fallback))
    }

    /// Like [`over`](Self::over), with a shared source.
    pub fn over_arc(mut self, fallback: Arc<dyn EnvironmentSource>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Returns the number of overrides.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if there are no overrides.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn insert_pair(&mut self, pair: &str) {
        match pair.split_once('=') {
            Some((name, value)) if !name.is_empty() => {
                self.values.insert(name.to_string(), value.to_string());
            }
            _ => tracing::debug!("Ignoring malformed override '{}'", pair),
        }
    }

    fn parse_args<S: AsRef<str>>(&mut self, args: &[S]) {
        let mut i = 0;
        while i < args.len() {
            let arg = args[i].as_ref();
            let next: Option<&str> = args.get(i + 1).map(|s| s.as_ref());

            if let Some(long) = arg.strip_prefix("--") {
                if long.contains('=') {
                    // --NAME=value
                    self.insert_pair(long);
                    i += 1;
                } else {
                    // --NAME value, unless the next argument is another flag
                    match next {
                        Some(value) if !value.starts_with('-') && !long.is_empty() => {
                            self.values.insert(long.to_string(), value.to_string());
                            i += 2;
                        }
                        _ => i += 1,
                    }
                }
            } else if arg == "-e" {
                // -e NAME=value
                match next {
                    Some(pair) => {
                        self.insert_pair(pair);
                        i += 2;
                    }
                    None => i += 1,
                }
            } else {
                i += 1;
            }
        }
    }
}

impl fmt::Debug for CommandLineEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.values.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("CommandLineEnvironment")
            .field("overrides", &names)
            .field("fallback", &self.fallback.as_ref().map(|f| f.name()))
            .finish()
    }
}

impl EnvironmentSource for CommandLineEnvironment {
    fn name(&self) -> &str {
        "cli"
    }

    fn var(&self, name: &str) -> Option<String> {
        match self.values.get(name) {
            Some(value) => Some(value.clone()),
            None => self.fallback.as_ref().and_then(|f| f.var(name)),
        }
    }
}
