//! docgraph-chain: the remote collaborators a document graph client needs.
//!
//! The graph client never talks to the chain directly. It goes through
//! three seams, each an async trait:
//!
//! | Trait | Production impl | In-memory impl |
//! |-------|-----------------|----------------|
//! | [`AbiEncoder`] | [`ChainRpc`] | [`MemoryChain`] |
//! | [`TableReader`] | [`ChainRpc`] | [`MemoryChain`] |
//! | [`TransactionExecutor`] | [`CleosExecutor`] | [`MemoryChain`] |

pub mod api;
pub mod cleos;
pub mod error;
pub mod memory;
pub mod rpc;
pub mod table;

pub use api::{AbiEncoder, TableReader, TransactionExecutor, TransactionReceipt};
pub use cleos::CleosExecutor;
pub use error::ChainError;
pub use memory::MemoryChain;
pub use rpc::ChainRpc;
pub use table::{KeyType, TableRows, TableRowsRequest};
