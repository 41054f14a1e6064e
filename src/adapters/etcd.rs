// SPDX-License-Identifier: MIT OR Apache-2.0

//! etcd parameter store adapter.
//!
//! This module provides a `ParameterStore` that answers a batch with etcd transactions of
//! plain gets, one key per operation.

use crate::domain::{ConfigError, Result};
use crate::ports::{Parameter, ParameterStore};
use async_trait::async_trait;
use etcd_client::{Client, Txn, TxnOp, TxnOpResponse};

/// Default etcd limit on operations per transaction (`--max-txn-ops`).
pub const DEFAULT_MAX_TXN_OPS: usize = 128;

/// Parameter store reading from an etcd cluster.
///
/// Parameter names are appended to an optional key prefix. Batches larger than the
/// per-transaction operation limit are split into several transactions.
///
/// # Examples
///
/// ```rust,no_run
/// use lazycfg::adapters::EtcdParameterStore;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// // Parameters stored as `params/sys/dev/DB_PASSWORD`, ...
/// let store = EtcdParameterStore::new(vec!["localhost:2379"], Some("params")).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct EtcdParameterStore {
    /// etcd client
    client: Client,
    /// Key prefix for namespacing
    prefix: Option<String>,
    /// Operations per transaction
    max_txn_ops: usize,
}

impl EtcdParameterStore {
    /// Connects to the given endpoints.
    ///
    /// # Arguments
    ///
    /// * `endpoints` - List of etcd endpoints (e.g., `["localhost:2379"]`)
    /// * `prefix` - Optional key prefix for namespacing (e.g., `"params"`)
    pub async fn new<S: AsRef<str>>(endpoints: Vec<S>, prefix: Option<&str>) -> Result<Self> {
        let endpoints: Vec<String> = endpoints.iter().map(|s| s.as_ref().to_string()).collect();

        let client = Client::connect(&endpoints, None).await.map_err(|e| {
            ConfigError::source_error("etcd", format!("Failed to connect to etcd: {}", e), e)
        })?;

        Ok(Self {
            client,
            prefix: prefix.map(|s| s.to_string()),
            max_txn_ops: DEFAULT_MAX_TXN_OPS,
        })
    }

    /// Sets the number of gets sent per transaction, for clusters with a non-default limit.
    pub fn with_max_txn_ops(mut self, max_txn_ops: usize) -> Self {
        self.max_txn_ops = max_txn_ops.max(1);
        self
    }

    /// Returns the key prefix.
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    fn full_key(&self, name: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}{}", prefix, name),
            None => name.to_string(),
        }
    }
}

impl std::fmt::Debug for EtcdParameterStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EtcdParameterStore")
            .field("prefix", &self.prefix)
            .field("max_txn_ops", &self.max_txn_ops)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ParameterStore for EtcdParameterStore {
    fn name(&self) -> &str {
        "etcd"
    }

    async fn get_parameters(&self, names: &[String]) -> Result<Vec<Parameter>> {
        let mut client = self.client.clone();
        let mut found = Vec::new();

        for chunk in names.chunks(self.max_txn_ops) {
            let ops: Vec<TxnOp> = chunk
                .iter()
                .map(|name| TxnOp::get(self.full_key(name), None))
                .collect();

            let response = client.txn(Txn::new().and_then(ops)).await.map_err(|e| {
                ConfigError::source_error(
                    "etcd",
                    format!("Failed to fetch parameters from etcd: {}", e),
                    e,
                )
            })?;

            // One response per get, in request order
            for (name, op) in chunk.iter().zip(response.op_responses()) {
                if let TxnOpResponse::Get(get) = op {
                    if let Some(value) = get.kvs().first().and_then(|kv| kv.value_str().ok()) {
                        found.push(Parameter::new(name.clone(), value));
                    }
                }
            }
        }

        Ok(found)
    }
}
