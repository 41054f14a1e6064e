// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turns a provider tree into plain data.

use crate::domain::{ResolvedConfig, ResolvedValue, Result};
use crate::service::tree::{ConfigurationProviderTree, ProviderNode};
use futures::future::{try_join_all, BoxFuture, FutureExt};

/// Resolves every leaf of `tree` and assembles the result.
///
/// Siblings are resolved concurrently; remote leaves all wait on the one shared batch fetch.
/// The first failing leaf fails the whole call. The output keeps the tree's field order.
pub fn materialize(tree: &ConfigurationProviderTree) -> BoxFuture<'_, Result<ResolvedConfig>> {
    async move {
        let entries = try_join_all(tree.iter().map(|(name, node)| async move {
            let value = match node {
                ProviderNode::Scalar(producer) => ResolvedValue::Scalar(producer.get().await?),
                ProviderNode::Object(child) => ResolvedValue::Object(materialize(child).await?),
            };
            Ok::<_, crate::domain::ConfigError>((name, value))
        }))
        .await?;

        let mut resolved = ResolvedConfig::new();
        for (name, value) in entries {
            resolved.insert(name, value);
        }
        Ok(resolved)
    }
    .boxed()
}
