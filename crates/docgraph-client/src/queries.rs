//! Read operations against the contract's `documents` and `edges` tables.

use docgraph_chain::{ChainError, KeyType, TableRowsRequest};
use docgraph_core::{AccountName, CallContext, Checksum256, Document, Edge, Name};
use serde::de::DeserializeOwned;

use crate::client::{guarded, GraphClient, GraphError};

pub const DOCUMENTS_TABLE: &str = "documents";
pub const EDGES_TABLE: &str = "edges";

/// Maximum edges returned by a single edge query.
pub const EDGE_QUERY_LIMIT: u32 = 1000;

/// Index position of the document hash on the `documents` table.
const DOCUMENT_HASH_INDEX: &str = "2";

/// Which end of an edge a query is keyed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeIndex {
    /// Edges leaving the node.
    FromNode,
    /// Edges arriving at the node.
    ToNode,
}

impl EdgeIndex {
    /// Index position on the `edges` table.
    pub fn position(self) -> &'static str {
        match self {
            EdgeIndex::FromNode => "2",
            EdgeIndex::ToNode => "3",
        }
    }

    fn describe(self) -> &'static str {
        match self {
            EdgeIndex::FromNode => "from",
            EdgeIndex::ToNode => "to",
        }
    }
}

impl GraphClient {
    // ── Edge Queries ─────────────────────────────────────────────

    /// All edges leaving `document`.
    pub async fn edges_from(
        &self,
        ctx: &CallContext,
        contract: &AccountName,
        document: &Document,
    ) -> Result<Vec<Edge>, GraphError> {
        self.edges(ctx, contract, &document.hash, EdgeIndex::FromNode)
            .await
    }

    /// All edges arriving at `document`.
    pub async fn edges_to(
        &self,
        ctx: &CallContext,
        contract: &AccountName,
        document: &Document,
    ) -> Result<Vec<Edge>, GraphError> {
        self.edges(ctx, contract, &document.hash, EdgeIndex::ToNode)
            .await
    }

    /// Edges leaving `document` whose name is exactly `edge_name`.
    pub async fn edges_from_named(
        &self,
        ctx: &CallContext,
        contract: &AccountName,
        document: &Document,
        edge_name: &Name,
    ) -> Result<Vec<Edge>, GraphError> {
        self.edges_named(ctx, contract, &document.hash, EdgeIndex::FromNode, edge_name)
            .await
    }

    /// Edges arriving at `document` whose name is exactly `edge_name`.
    pub async fn edges_to_named(
        &self,
        ctx: &CallContext,
        contract: &AccountName,
        document: &Document,
        edge_name: &Name,
    ) -> Result<Vec<Edge>, GraphError> {
        self.edges_named(ctx, contract, &document.hash, EdgeIndex::ToNode, edge_name)
            .await
    }

    /// Edges touching `node` on the given end, in the order the chain
    /// returns them. No match is an empty list, not an error.
    pub async fn edges(
        &self,
        ctx: &CallContext,
        contract: &AccountName,
        node: &Checksum256,
        index: EdgeIndex,
    ) -> Result<Vec<Edge>, GraphError> {
        let request = TableRowsRequest::new(contract.as_str(), contract.as_str(), EDGES_TABLE)
            .index(index.position(), KeyType::Sha256)
            .exact(node.to_hex())
            .limit(EDGE_QUERY_LIMIT);

        let context = format!("edges {} {node}", index.describe());
        let edges: Vec<Edge> = self.query(ctx, contract, &request, &context).await?;

        tracing::debug!(
            contract = %contract,
            node = %node,
            direction = index.describe(),
            count = edges.len(),
            "Fetched edges"
        );
        Ok(edges)
    }

    /// [`GraphClient::edges`] filtered to `edge_name`.
    pub async fn edges_named(
        &self,
        ctx: &CallContext,
        contract: &AccountName,
        node: &Checksum256,
        index: EdgeIndex,
        edge_name: &Name,
    ) -> Result<Vec<Edge>, GraphError> {
        let edges = self.edges(ctx, contract, node, index).await?;
        Ok(edges
            .into_iter()
            .filter(|e| &e.edge_name == edge_name)
            .collect())
    }

    // ── Document Lookups ─────────────────────────────────────────

    /// The most recently created document in `contract`.
    pub async fn last_document(
        &self,
        ctx: &CallContext,
        contract: &AccountName,
    ) -> Result<Document, GraphError> {
        let request = TableRowsRequest::new(contract.as_str(), contract.as_str(), DOCUMENTS_TABLE)
            .limit(1)
            .reverse();

        let docs: Vec<Document> = self
            .query(ctx, contract, &request, "latest document")
            .await?;

        docs.into_iter().next().ok_or_else(|| GraphError::NotFound {
            contract: contract.clone(),
            what: "latest document".to_string(),
        })
    }

    /// The document whose hash is `hash`.
    pub async fn document(
        &self,
        ctx: &CallContext,
        contract: &AccountName,
        hash: &Checksum256,
    ) -> Result<Document, GraphError> {
        let request = TableRowsRequest::new(contract.as_str(), contract.as_str(), DOCUMENTS_TABLE)
            .index(DOCUMENT_HASH_INDEX, KeyType::Sha256)
            .exact(hash.to_hex())
            .limit(1);

        let context = format!("document {hash}");
        let docs: Vec<Document> = self.query(ctx, contract, &request, &context).await?;

        // The index is a range; guard against a neighbouring row.
        docs.into_iter()
            .find(|d| &d.hash == hash)
            .ok_or_else(|| GraphError::NotFound {
                contract: contract.clone(),
                what: context,
            })
    }

    pub async fn document_exists(
        &self,
        ctx: &CallContext,
        contract: &AccountName,
        hash: &Checksum256,
    ) -> Result<bool, GraphError> {
        match self.document(ctx, contract, hash).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Run a table query and decode every row as `T`.
    async fn query<T: DeserializeOwned>(
        &self,
        ctx: &CallContext,
        contract: &AccountName,
        request: &TableRowsRequest,
        context: &str,
    ) -> Result<Vec<T>, GraphError> {
        let query_failed = |source: ChainError| GraphError::Query {
            contract: contract.clone(),
            table: request.table.clone(),
            context: context.to_string(),
            source,
        };

        let rows = guarded(ctx, "get_table_rows", self.reader.get_table_rows(request))
            .await?
            .map_err(query_failed)?;

        rows.decode().map_err(|e| query_failed(e.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_index_positions() {
        assert_eq!(EdgeIndex::FromNode.position(), "2");
        assert_eq!(EdgeIndex::ToNode.position(), "3");
    }
}
