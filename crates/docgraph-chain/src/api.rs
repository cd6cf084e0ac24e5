//! The three collaborator contracts.
//!
//! Implementations must be `Send + Sync + 'static` so the graph client can
//! hold them behind `Arc<dyn _>`.

use async_trait::async_trait;
use docgraph_core::{AccountName, Action, Name};
use serde::{Deserialize, Serialize};

use crate::error::ChainError;
use crate::table::{TableRows, TableRowsRequest};

/// Encodes JSON action arguments into the contract's binary format.
#[async_trait]
pub trait AbiEncoder: Send + Sync + 'static {
    /// Returns the hex-encoded binary payload for `action` on `contract`.
    async fn abi_json_to_bin(
        &self,
        contract: &AccountName,
        action: &Name,
        args: &serde_json::Value,
    ) -> Result<String, ChainError>;
}

/// Signs and pushes transactions.
#[async_trait]
pub trait TransactionExecutor: Send + Sync + 'static {
    /// Submit `actions` as one transaction and wait for the result.
    async fn execute(&self, actions: &[Action]) -> Result<TransactionReceipt, ChainError>;
}

/// Reads rows from contract tables.
#[async_trait]
pub trait TableReader: Send + Sync + 'static {
    async fn get_table_rows(&self, request: &TableRowsRequest) -> Result<TableRows, ChainError>;
}

/// Outcome of a pushed transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    pub transaction_id: String,
    /// The executor's full processing trace, when it reports one.
    #[serde(default)]
    pub processed: serde_json::Value,
}
