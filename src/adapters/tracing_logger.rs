// SPDX-License-Identifier: MIT OR Apache-2.0

//! `Logger` adapter writing to `tracing`.

use crate::ports::{LogLevel, Logger};

/// Logger forwarding messages to the `tracing` macros under the `lazycfg` target.
///
/// Messages below the minimum level are dropped before they reach `tracing`. An optional
/// debug id is prefixed to every message, which helps tell apart several factories in one
/// process.
///
/// # Examples
///
/// ```rust
/// use lazycfg::adapters::TracingLogger;
/// use lazycfg::ports::{LogLevel, Logger};
///
/// let logger = TracingLogger::new(LogLevel::Warn).with_debug_id("billing");
/// assert!(!logger.enabled(LogLevel::Info));
/// assert!(logger.enabled(LogLevel::Error));
/// ```
#[derive(Clone, Debug, Default)]
pub struct TracingLogger {
    min_level: LogLevel,
    debug_id: Option<String>,
}

impl TracingLogger {
    /// Creates a logger writing messages at `min_level` and above.
    pub fn new(min_level: LogLevel) -> Self {
        Self {
            min_level,
            debug_id: None,
        }
    }

    /// Prefixes every message with `[debug_id]`.
    pub fn with_debug_id(mut self, debug_id: impl Into<String>) -> Self {
        self.debug_id = Some(debug_id.into());
        self
    }

    /// Returns the minimum level.
    pub fn min_level(&self) -> LogLevel {
        self.min_level
    }

    fn format(&self, message: &str) -> String {
        match &self.debug_id {
            Some(id) => format!("[{}] {}", id, message),
            None => message.to_string(),
        }
    }
}

impl Logger for TracingLogger {
    fn enabled(&self, level: LogLevel) -> bool {
        level >= self.min_level
    }

    fn log(&self, level: LogLevel, message: &str) {
        if !self.enabled(level) {
            return;
        }
        let message = self.format(message);
        match level {
            LogLevel::Debug => tracing::debug!(target: "lazycfg", "{}", message),
            LogLevel::Info => tracing::info!(target: "lazycfg", "{}", message),
            LogLevel::Warn => tracing::warn!(target: "lazycfg", "{}", message),
            LogLevel::Error => tracing::error!(target: "lazycfg", "{}", message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracing_logger_levels() {
        let logger = TracingLogger::new(LogLevel::Info);
        assert!(!logger.enabled(LogLevel::Debug));
        assert!(logger.enabled(LogLevel::Info));
        assert!(logger.enabled(LogLevel::Warn));
        assert_eq!(logger.min_level(), LogLevel::Info);
    }

    #[test]
    fn test_tracing_logger_default_is_info() {
        assert_eq!(TracingLogger::default().min_level(), LogLevel::Info);
    }

    #[test]
    fn test_tracing_logger_debug_id_prefix() {
        let logger = TracingLogger::new(LogLevel::Debug).with_debug_id("svc");
        assert_eq!(logger.format("hello"), "[svc] hello");
        assert_eq!(TracingLogger::default().format("hello"), "hello");
    }

    #[test]
    fn test_tracing_logger_log_does_not_panic_without_subscriber() {
        let logger = TracingLogger::new(LogLevel::Debug);
        logger.debug("debug");
        logger.error("error");
    }
}
