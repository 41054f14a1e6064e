// SPDX-License-Identifier: MIT OR Apache-2.0

//! Logger trait definition.
//!
//! Resolution can report what it does through an optional `Logger`. The logger receives
//! already-formatted messages at a level; a missing logger never changes resolution results.
//! The minimum level is part of each logger instance rather than process-wide state.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Largest serialized structured argument written verbatim.
pub const MAX_STRUCTURED_LEN: usize = 4096;

/// Severity of a log message, ordered from most to least verbose.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    /// Diagnostic detail
    Debug,
    /// Normal operation
    #[default]
    Info,
    /// Something unexpected that does not fail the caller
    Warn,
    /// A failure
    Error,
}

impl LogLevel {
    /// Parses a level name case-insensitively, falling back to `Info` for unknown names.
    ///
    /// # Examples
    ///
    /// ```
    /// use lazycfg::ports::LogLevel;
    ///
    /// assert_eq!(LogLevel::parse_or_info("debug"), LogLevel::Debug);
    /// assert_eq!(LogLevel::parse_or_info("verbose"), LogLevel::Info);
    /// ```
    pub fn parse_or_info(name: &str) -> Self {
        name.parse().unwrap_or_default()
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARN" | "WARNING" => Ok(LogLevel::Warn),
            "ERROR" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level: {}", other)),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        };
        f.write_str(name)
    }
}

/// A leveled logger.
///
/// Implementations must not panic.
pub trait Logger: Send + Sync {
    /// Returns true if messages at `level` are written.
    fn enabled(&self, level: LogLevel) -> bool;

    /// Writes a message at `level`. Messages below the enabled level are dropped.
    fn log(&self, level: LogLevel, message: &str);

    /// Writes a debug message.
    fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    /// Writes an info message.
    fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    /// Writes a warning.
    fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message);
    }

    /// Writes an error.
    fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }
}

/// Serializes a structured log argument as JSON, truncating large output.
///
/// Output longer than [`MAX_STRUCTURED_LEN`] bytes is replaced by `<truncated: N bytes>`.
///
/// # Examples
///
/// ```
/// use lazycfg::ports::format_structured;
///
/// assert_eq!(format_structured(&vec!["/sys/A"]), r#"["/sys/A"]"#);
/// let big = "x".repeat(5000);
/// assert_eq!(format_structured(&big), "<truncated: 5002 bytes>");
/// ```
pub fn format_structured<T: Serialize + ?Sized>(value: &T) -> String {
    match serde_json::to_string(value) {
        Ok(json) if json.len() > MAX_STRUCTURED_LEN => {
            format!("<truncated: {} bytes>", json.len())
        }
        Ok(json) => json,
        Err(e) => format!("<unserializable: {}>", e),
    }
}
