// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scalar configuration values and string coercion.
//!
//! Every leaf of a configuration tree resolves to a string, a number or a boolean. Raw values
//! from the environment or a parameter store are always strings; this module defines how
//! they are coerced into the requested type.

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// The type a configuration leaf resolves to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    /// Raw string, no coercion
    String,
    /// Floating point number
    Number,
    /// Boolean
    Boolean,
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScalarKind::String => "string",
            ScalarKind::Number => "number",
            ScalarKind::Boolean => "boolean",
        };
        f.write_str(name)
    }
}

/// A resolved scalar configuration value.
///
/// # Examples
///
/// ```
/// use lazycfg::domain::{ScalarKind, ScalarValue};
///
/// let value = ScalarValue::from(8080.0);
/// assert_eq!(value.kind(), ScalarKind::Number);
/// assert_eq!(value.to_string(), "8080");
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum ScalarValue {
    /// A string value
    String(String),
    /// A numeric value
    Number(f64),
    /// A boolean value
    Bool(bool),
}

impl ScalarValue {
    /// Returns the kind of this value.
    pub fn kind(&self) -> ScalarKind {
        match self {
            ScalarValue::String(_) => ScalarKind::String,
            ScalarValue::Number(_) => ScalarKind::Number,
            ScalarValue::Bool(_) => ScalarKind::Boolean,
        }
    }

    /// Returns the string value, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScalarValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the numeric value, if this is a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ScalarValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the boolean value, if this is a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ScalarValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::String(s) => write!(f, "{}", s),
            ScalarValue::Number(n) => write!(f, "{}", n),
            ScalarValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

// Integral numbers serialize as integers so they deserialize into integer fields.
impl Serialize for ScalarValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ScalarValue::String(s) => serializer.serialize_str(s),
            ScalarValue::Number(n) if n.fract() == 0.0 && n.abs() < 9.0e15 => {
                serializer.serialize_i64(*n as i64)
            }
            ScalarValue::Number(n) => serializer.serialize_f64(*n),
            ScalarValue::Bool(b) => serializer.serialize_bool(*b),
        }
    }
}

impl From<String> for ScalarValue {
    fn from(s: String) -> Self {
        ScalarValue::String(s)
    }
}

impl From<&str> for ScalarValue {
    fn from(s: &str) -> Self {
        ScalarValue::String(s.to_string())
    }
}

impl From<f64> for ScalarValue {
    fn from(n: f64) -> Self {
        ScalarValue::Number(n)
    }
}

impl From<bool> for ScalarValue {
    fn from(b: bool) -> Self {
        ScalarValue::Bool(b)
    }
}

/// Parses a raw string as a floating point number.
///
/// Surrounding whitespace is ignored. `NaN` and infinities are rejected, since JSON has no
/// representation for them.
pub fn coerce_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Parses a raw string as a boolean.
///
/// Only `true`, `false`, `1` and `0` are valid, compared case-insensitively.
pub fn coerce_bool(raw: &str) -> Option<bool> {
    match raw.to_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

/// A Rust type a configuration leaf can resolve to.
///
/// Implemented for `String`, `f64` and `bool`.
pub trait ScalarType: Clone + Send + Sync + fmt::Debug + 'static {
    /// The kind this type maps to.
    const KIND: ScalarKind;

    /// Coerces a raw string into this type, returning `None` if it is not valid.
    fn coerce(raw: &str) -> Option<Self>;

    /// Wraps this value as a `ScalarValue`.
    fn into_scalar(self) -> ScalarValue;

    /// Extracts this type from a `ScalarValue` of the matching kind.
    fn from_scalar(value: ScalarValue) -> Option<Self>;
}

impl ScalarType for String {
    const KIND: ScalarKind = ScalarKind::String;

    fn coerce(raw: &str) -> Option<Self> {
        Some(raw.to_string())
    }

    fn into_scalar(self) -> ScalarValue {
        ScalarValue::String(self)
    }

    fn from_scalar(value: ScalarValue) -> Option<Self> {
        match value {
            ScalarValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl ScalarType for f64 {
    const KIND: ScalarKind = ScalarKind::Number;

    fn coerce(raw: &str) -> Option<Self> {
        coerce_number(raw)
    }

    fn into_scalar(self) -> ScalarValue {
        ScalarValue::Number(self)
    }

    fn from_scalar(value: ScalarValue) -> Option<Self> {
        value.as_f64()
    }
}

impl ScalarType for bool {
    const KIND: ScalarKind = ScalarKind::Boolean;

    fn coerce(raw: &str) -> Option<Self> {
        coerce_bool(raw)
    }

    fn into_scalar(self) -> ScalarValue {
        ScalarValue::Bool(self)
    }

    fn from_scalar(value: ScalarValue) -> Option<Self> {
        value.as_bool()
    }
}
