// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider trees.
//!
//! [`TreeBuilder::build`] turns a [`ConfigurationShape`] into a [`ConfigurationProviderTree`]
//! with the same structure: each scalar field becomes a deferred producer and each nested
//! shape a nested tree. Building performs no I/O. It only creates producers and registers
//! remote keys with the shared batch.

use crate::domain::{
    ConfigError, ConfigurationShape, FieldSpec, ParameterKey, Result, ScalarKind, ScalarSpec,
    ScalarType, SourceSpec,
};
use crate::ports::{EnvironmentSource, Logger};
use crate::service::batch::BatchContext;
use crate::service::producer::{AnyProducer, ValueProducer};
use crate::service::resolvers::{EnvResolver, FixedResolver, RemoteResolver};
use std::sync::Arc;

/// A node of a provider tree.
#[derive(Clone, Debug)]
pub enum ProviderNode {
    /// A deferred leaf
    Scalar(AnyProducer),
    /// A nested tree
    Object(ConfigurationProviderTree),
}

/// Deferred producers arranged like the shape they were built from.
///
/// The tree is immutable once built; only the caches inside its producers change.
#[derive(Clone, Debug, Default)]
pub struct ConfigurationProviderTree {
    nodes: Vec<(String, ProviderNode)>,
    remote_keys: Vec<ParameterKey>,
}

impl ConfigurationProviderTree {
    /// Looks up a direct child by name.
    pub fn get(&self, name: &str) -> Option<&ProviderNode> {
        self.nodes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, node)| node)
    }

    /// Looks up a node by dotted path, e.g. `db.password`.
    pub fn node(&self, path: &str) -> Result<&ProviderNode> {
        let mut tree = self;
        let mut walked = String::new();
        let mut segments = path.split('.').peekable();
        while let Some(segment) = segments.next() {
            if !walked.is_empty() {
                walked.push('.');
            }
            walked.push_str(segment);
            let node = tree.get(segment).ok_or_else(|| ConfigError::ConfigKeyNotFound {
                key: walked.clone(),
            })?;
            match (node, segments.peek()) {
                (_, None) => return Ok(node),
                (ProviderNode::Object(child), Some(_)) => tree = child,
                (ProviderNode::Scalar(producer), Some(_)) => {
                    return Err(ConfigError::TypeMismatch {
                        path: walked,
                        expected: "object".to_string(),
                        actual: producer.kind().to_string(),
                    })
                }
            }
        }
        Err(ConfigError::ConfigKeyNotFound {
            key: path.to_string(),
        })
    }

    /// Returns the typed producer of the leaf at `path`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use lazycfg::domain::{ConfigurationShape, Field};
    /// use lazycfg::service::ConfigurationFactory;
    ///
    /// # #[tokio::main]
    /// # async fn main() -> lazycfg::domain::Result<()> {
    /// let shape = ConfigurationShape::new().nested(
    ///     "http",
    ///     ConfigurationShape::new().field("port", Field::<f64>::fixed(8080.0)),
    /// );
    /// let factory = ConfigurationFactory::builder().shape(shape).build()?;
    ///
    /// let port = factory.provider().producer::<f64>("http.port")?;
    /// assert_eq!(port.get().await?, 8080.0);
    /// # Ok(())
    /// # }
    /// ```
    pub fn producer<T: ScalarType>(&self, path: &str) -> Result<ValueProducer<T>> {
        match self.node(path)? {
            ProviderNode::Scalar(producer) => producer.typed(path),
            ProviderNode::Object(_) => Err(ConfigError::TypeMismatch {
                path: path.to_string(),
                expected: T::KIND.to_string(),
                actual: "object".to_string(),
            }),
        }
    }

    /// Returns the nested tree at `path`.
    pub fn subtree(&self, path: &str) -> Result<&ConfigurationProviderTree> {
        match self.node(path)? {
            ProviderNode::Object(tree) => Ok(tree),
            ProviderNode::Scalar(producer) => Err(ConfigError::TypeMismatch {
                path: path.to_string(),
                expected: "object".to_string(),
                actual: producer.kind().to_string(),
            }),
        }
    }

    /// Iterates over the direct children in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ProviderNode)> {
        self.nodes.iter().map(|(name, node)| (name.as_str(), node))
    }

    /// Returns the number of direct children.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the tree has no children.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the remote keys declared in this tree and its subtrees.
    pub fn remote_keys(&self) -> &[ParameterKey] {
        &self.remote_keys
    }
}

/// Builds provider trees that share one environment and one remote batch.
#[derive(Clone)]
pub struct TreeBuilder {
    environment: Arc<dyn EnvironmentSource>,
    batch: Arc<BatchContext>,
    logger: Option<Arc<dyn Logger>>,
}

impl TreeBuilder {
    /// Creates a builder.
    pub fn new(environment: Arc<dyn EnvironmentSource>, batch: Arc<BatchContext>) -> Self {
        Self {
            environment,
            batch,
            logger: None,
        }
    }

    /// Passes `logger` to every leaf.
    pub fn with_logger(mut self, logger: Option<Arc<dyn Logger>>) -> Self {
        self.logger = logger;
        self
    }

    /// Builds the provider tree for `shape`, registering its remote keys with the batch.
    pub fn build(&self, shape: &ConfigurationShape) -> ConfigurationProviderTree {
        let mut tree = ConfigurationProviderTree::default();
        for (name, field) in shape.fields() {
            let node = match field {
                FieldSpec::Scalar(spec) => {
                    if let SourceSpec::Remote(key) = spec.source() {
                        tree.remote_keys.push(key.clone());
                    }
                    ProviderNode::Scalar(self.leaf(spec))
                }
                FieldSpec::Nested(nested) => {
                    let child = self.build(nested);
                    tree.remote_keys.extend(child.remote_keys.iter().cloned());
                    ProviderNode::Object(child)
                }
            };
            tree.nodes.push((name.to_string(), node));
        }
        tree
    }

    fn leaf(&self, spec: &ScalarSpec) -> AnyProducer {
        match spec.kind() {
            ScalarKind::String => AnyProducer::new(self.typed_leaf::<String>(spec)),
            ScalarKind::Number => AnyProducer::new(self.typed_leaf::<f64>(spec)),
            ScalarKind::Boolean => AnyProducer::new(self.typed_leaf::<bool>(spec)),
        }
    }

    fn typed_leaf<T: ScalarType>(&self, spec: &ScalarSpec) -> ValueProducer<T> {
        let default = spec.default_value().cloned().and_then(T::from_scalar);
        match spec.source() {
            SourceSpec::Env(name) => EnvResolver::new(Arc::clone(&self.environment), name.clone())
                .with_logger(self.logger.clone())
                .resolve(default),
            SourceSpec::Remote(key) => RemoteResolver::new(Arc::clone(&self.batch), key.clone())
                .with_logger(self.logger.clone())
                .resolve(default),
            SourceSpec::Fixed(value) => match T::from_scalar(value.clone()) {
                Some(value) => FixedResolver::new(value).resolve(self.logger.clone()),
                None => {
                    let error = ConfigError::TypeMismatch {
                        path: format!("fixed value '{}'", value),
                        expected: T::KIND.to_string(),
                        actual: value.kind().to_string(),
                    };
                    ValueProducer::new(move || futures::future::ready(Err(error.clone())))
                }
            },
        }
    }
}
