//! docgraph-client: client for the on-chain document graph.
//!
//! Documents and edges live in a deployed contract. This crate builds and
//! submits the contract's `create` and `newedge` actions and reads its
//! `documents` and `edges` tables. No graph state is held locally: every
//! read goes back to the chain.

pub mod client;
pub mod mutations;
pub mod queries;

pub use client::{GraphClient, GraphError};
pub use mutations::{CreateDocumentArgs, CreatedDocument, NewEdgeArgs};
pub use queries::EdgeIndex;
