// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shape parser trait definition.
//!
//! This module defines the `ShapeParser` trait, which provides an interface for reading a
//! configuration shape declaration from a text format (YAML, ...).

use crate::domain::{ConfigurationShape, Result};

/// A trait for parsing configuration shape declarations.
///
/// # Declaration Format
///
/// Parsers map nested structures onto nested shapes. Leaves name their source and,
/// optionally, a type and a default. For example, a YAML declaration like:
///
/// ```yaml
/// db:
///   url: { env: DB_URL }
///   port: { remote: DB_PORT, type: number, default: 5432 }
/// ```
///
/// describes a shape with one nested object `db` holding two leaves.
///
/// # Examples
///
/// ```rust
/// use lazycfg::domain::{ConfigurationShape, Field, Result};
/// use lazycfg::ports::ShapeParser;
///
/// struct OneLeaf;
///
/// impl ShapeParser for OneLeaf {
///     fn parse(&self, content: &str) -> Result<ConfigurationShape> {
///         Ok(ConfigurationShape::new().field("value", Field::<String>::fixed(content)))
///     }
///
///     fn supported_extensions(&self) -> &[&str] {
///         &["txt"]
///     }
/// }
///
/// let shape = OneLeaf.parse("hello").unwrap();
/// assert_eq!(shape.len(), 1);
/// ```
pub trait ShapeParser {
    /// Parses a declaration into a shape.
    ///
    /// # Returns
    ///
    /// * `Ok(ConfigurationShape)` - The declared shape
    /// * `Err(ConfigError::ParseError)` - The content is not a valid declaration
    fn parse(&self, content: &str) -> Result<ConfigurationShape>;

    /// Returns the file extensions supported by this parser, without the leading dot.
    fn supported_extensions(&self) -> &[&str];
}
