// SPDX-License-Identifier: MIT OR Apache-2.0

//! Declarative description of a configuration object's shape.
//!
//! A [`ConfigurationShape`] is an ordered list of named fields. Each field is either a scalar
//! leaf, describing where its value comes from and what type it resolves to, or a nested
//! shape. Shapes are plain data: declaring one performs no I/O.

use crate::domain::errors::{ConfigError, Result};
use crate::domain::parameter_key::ParameterKey;
use crate::domain::scalar::{ScalarKind, ScalarType, ScalarValue};
use std::marker::PhantomData;

/// Where a scalar leaf gets its raw value from.
#[derive(Clone, Debug, PartialEq)]
pub enum SourceSpec {
    /// A named process environment variable
    Env(String),
    /// A key in the remote parameter store, resolved through the shared batch fetch
    Remote(ParameterKey),
    /// A constant supplied at declaration time
    Fixed(ScalarValue),
}

/// Type-erased declaration of a scalar leaf.
#[derive(Clone, Debug, PartialEq)]
pub struct ScalarSpec {
    source: SourceSpec,
    kind: ScalarKind,
    default: Option<ScalarValue>,
}

impl ScalarSpec {
    /// Creates a leaf declaration, checking that the default and any fixed value match `kind`.
    pub fn new(source: SourceSpec, kind: ScalarKind, default: Option<ScalarValue>) -> Result<Self> {
        if let SourceSpec::Fixed(value) = &source {
            if value.kind() != kind {
                return Err(ConfigError::ParseError {
                    message: format!("fixed value '{}' is not a {}", value, kind),
                    source: None,
                });
            }
        }
        if let Some(value) = &default {
            if value.kind() != kind {
                return Err(ConfigError::ParseError {
                    message: format!("default value '{}' is not a {}", value, kind),
                    source: None,
                });
            }
        }
        Ok(Self {
            source,
            kind,
            default,
        })
    }

    /// Returns the value source.
    pub fn source(&self) -> &SourceSpec {
        &self.source
    }

    /// Returns the type this leaf resolves to.
    pub fn kind(&self) -> ScalarKind {
        self.kind
    }

    /// Returns the default value, if one was declared.
    pub fn default_value(&self) -> Option<&ScalarValue> {
        self.default.as_ref()
    }
}

/// Typed builder for a scalar leaf.
///
/// # Examples
///
/// ```
/// use lazycfg::domain::Field;
///
/// let url = Field::<String>::env("DB_URL").or_default("postgres://localhost");
/// let port = Field::<f64>::remote("DB_PORT").or_default(5432.0);
/// let debug = Field::<bool>::fixed(false);
/// # let _ = (url, port, debug);
/// ```
#[derive(Clone, Debug)]
pub struct Field<T: ScalarType> {
    source: SourceSpec,
    default: Option<T>,
    _type: PhantomData<T>,
}

impl<T: ScalarType> Field<T> {
    /// A leaf read from the named environment variable.
    pub fn env(name: impl Into<String>) -> Self {
        Self {
            source: SourceSpec::Env(name.into()),
            default: None,
            _type: PhantomData,
        }
    }

    /// A leaf read from the remote parameter store.
    pub fn remote(key: impl Into<ParameterKey>) -> Self {
        Self {
            source: SourceSpec::Remote(key.into()),
            default: None,
            _type: PhantomData,
        }
    }

    /// A leaf that always resolves to `value`.
    pub fn fixed(value: impl Into<T>) -> Self {
        Self {
            source: SourceSpec::Fixed(value.into().into_scalar()),
            default: None,
            _type: PhantomData,
        }
    }

    /// Sets the value used when retrieval or coercion fails.
    ///
    /// Empty strings, zero and `false` are valid defaults.
    pub fn or_default(mut self, default: impl Into<T>) -> Self {
        self.default = Some(default.into());
        self
    }

    fn into_spec(self) -> ScalarSpec {
        ScalarSpec {
            source: self.source,
            kind: T::KIND,
            default: self.default.map(ScalarType::into_scalar),
        }
    }
}

/// A field of a configuration shape.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldSpec {
    /// A scalar leaf
    Scalar(ScalarSpec),
    /// A nested object
    Nested(ConfigurationShape),
}

/// The declared shape of a configuration object.
///
/// Field order is preserved. Declaring a field name twice replaces the earlier declaration.
///
/// # Examples
///
/// ```
/// use lazycfg::domain::{ConfigurationShape, Field};
///
/// let shape = ConfigurationShape::new()
///     .field("name", Field::<String>::fixed("orders"))
///     .nested(
///         "db",
///         ConfigurationShape::new()
///             .field("url", Field::<String>::env("DB_URL"))
///             .field("password", Field::<String>::remote("DB_PASSWORD")),
///     );
/// assert_eq!(shape.len(), 2);
/// assert_eq!(shape.remote_keys().len(), 1);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConfigurationShape {
    fields: Vec<(String, FieldSpec)>,
}

impl ConfigurationShape {
    /// Creates an empty shape.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a typed scalar leaf.
    pub fn field<T: ScalarType>(self, name: impl Into<String>, field: Field<T>) -> Self {
        self.with(name.into(), FieldSpec::Scalar(field.into_spec()))
    }

    /// Adds an already-validated scalar leaf.
    pub fn scalar(self, name: impl Into<String>, spec: ScalarSpec) -> Self {
        self.with(name.into(), FieldSpec::Scalar(spec))
    }

    /// Adds a nested shape.
    pub fn nested(self, name: impl Into<String>, shape: ConfigurationShape) -> Self {
        self.with(name.into(), FieldSpec::Nested(shape))
    }

    fn with(mut self, name: String, spec: FieldSpec) -> Self {
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(existing) => existing.1 = spec,
            None => self.fields.push((name, spec)),
        }
        self
    }

    /// Iterates over the fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
        self.fields.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    /// Returns the number of direct fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the shape has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Collects every remote key declared anywhere in the shape, depth first.
    pub fn remote_keys(&self) -> Vec<ParameterKey> {
        let mut keys = Vec::new();
        self.collect_remote_keys(&mut keys);
        keys
    }

    fn collect_remote_keys(&self, keys: &mut Vec<ParameterKey>) {
        for (_, spec) in &self.fields {
            match spec {
                FieldSpec::Scalar(scalar) => {
                    if let SourceSpec::Remote(key) = scalar.source() {
                        keys.push(key.clone());
                    }
                }
                FieldSpec::Nested(shape) => shape.collect_remote_keys(keys),
            }
        }
    }
}
