//! Graph client handle and its error taxonomy.

use std::future::Future;
use std::sync::Arc;

use docgraph_chain::{
    AbiEncoder, ChainError, ChainRpc, CleosExecutor, TableReader, TransactionExecutor,
};
use docgraph_core::config::ChainConfig;
use docgraph_core::{AccountName, CallContext, Checksum256, Interrupt};

/// Errors from graph operations.
///
/// Every variant names the operation's inputs (file, contract, table,
/// hash) so failures can be traced back to the call that produced them.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Failed to read {file}: {source}")]
    FileRead {
        file: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode {file}: {source}")]
    Decode {
        file: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode {action} for {contract} ({context}): {source}")]
    Encoding {
        contract: AccountName,
        action: String,
        context: String,
        #[source]
        source: ChainError,
    },

    #[error("Failed to submit {action} to {contract} ({context}): {source}")]
    Submission {
        contract: AccountName,
        action: String,
        context: String,
        #[source]
        source: ChainError,
    },

    #[error("Query on {table} in {contract} failed ({context}): {source}")]
    Query {
        contract: AccountName,
        table: String,
        context: String,
        #[source]
        source: ChainError,
    },

    /// Creation succeeded but the created document could not be read back.
    #[error("Created document from {file} in transaction {transaction_id}, but lookup failed: {source}")]
    Lookup {
        file: String,
        transaction_id: String,
        #[source]
        source: Box<GraphError>,
    },

    #[error("Not found: {what} in {contract}")]
    NotFound { contract: AccountName, what: String },

    /// The latest document is not the one this client just created.
    #[error("Latest document {hash} in {contract} was created by {found}, expected {expected}")]
    LatestMismatch {
        contract: AccountName,
        hash: Checksum256,
        expected: AccountName,
        found: AccountName,
    },

    #[error("{operation} aborted: {reason}")]
    Cancelled { operation: String, reason: Interrupt },
}

impl GraphError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, GraphError::NotFound { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        match self {
            GraphError::Cancelled { .. } => true,
            GraphError::Lookup { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }
}

/// Stateless client for the document graph contract.
///
/// Holds only handles to the chain collaborators; the contract account is
/// passed to each call. Clone is cheap (inner Arcs).
#[derive(Clone)]
pub struct GraphClient {
    pub(crate) encoder: Arc<dyn AbiEncoder>,
    pub(crate) executor: Arc<dyn TransactionExecutor>,
    pub(crate) reader: Arc<dyn TableReader>,
}

impl GraphClient {
    pub fn new(
        encoder: Arc<dyn AbiEncoder>,
        executor: Arc<dyn TransactionExecutor>,
        reader: Arc<dyn TableReader>,
    ) -> Self {
        Self {
            encoder,
            executor,
            reader,
        }
    }

    /// Use one backend for all three collaborators.
    pub fn from_chain<C>(chain: Arc<C>) -> Self
    where
        C: AbiEncoder + TransactionExecutor + TableReader,
    {
        Self {
            encoder: chain.clone(),
            executor: chain.clone(),
            reader: chain,
        }
    }

    /// Connect to a chain node over HTTP, pushing transactions with `cleos`.
    pub fn connect(config: &ChainConfig) -> Result<Self, GraphError> {
        let rpc = Arc::new(ChainRpc::new(config).map_err(|e| GraphError::Connection(e.to_string()))?);
        let executor = Arc::new(CleosExecutor::from_config(config));

        tracing::info!(rpc_url = %config.rpc_url, "Chain client ready");
        Ok(Self {
            encoder: rpc.clone(),
            executor,
            reader: rpc,
        })
    }
}

/// Run a remote call under `ctx`, turning cancellation into
/// [`GraphError::Cancelled`] and leaving the call's own result for the
/// caller to classify.
pub(crate) async fn guarded<T, F>(
    ctx: &CallContext,
    operation: &str,
    fut: F,
) -> Result<Result<T, ChainError>, GraphError>
where
    F: Future<Output = Result<T, ChainError>>,
{
    ctx.run(fut).await.map_err(|reason| {
        tracing::warn!(operation, %reason, "Remote call abandoned");
        GraphError::Cancelled {
            operation: operation.to_string(),
            reason,
        }
    })
}
