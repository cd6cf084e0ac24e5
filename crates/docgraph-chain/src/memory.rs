//! In-memory simulation of the document graph contract.
//!
//! Implements all three collaborator traits over a `documents` and an
//! `edges` table held in process memory. Suitable for tests and offline
//! experimentation; behaviour follows the deployed contract closely enough
//! for client code to be exercised end to end:
//!
//! - `create` assigns sequential ids and a content hash, and rejects
//!   content that already exists.
//! - `newedge` rejects edges whose endpoints are unknown, and duplicates.
//! - Every action must be authorized by its creator.
//! - A transaction is applied all-or-nothing.
//!
//! Binary payloads are the hex of the JSON arguments; they are only
//! meaningful to this simulator.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use docgraph_core::{AccountName, Action, Checksum256, ContentGroup, Document, Edge, Name};
use serde::Deserialize;

use crate::api::{AbiEncoder, TableReader, TransactionExecutor, TransactionReceipt};
use crate::error::ChainError;
use crate::table::{TableRows, TableRowsRequest};

pub const DOCUMENTS_TABLE: &str = "documents";
pub const EDGES_TABLE: &str = "edges";

#[derive(Debug, Clone, Default)]
struct Tables {
    documents: Vec<Document>,
    edges: Vec<Edge>,
    next_document_id: u64,
    next_edge_id: u64,
}

#[derive(Deserialize)]
struct CreateArgs {
    creator: AccountName,
    content_groups: Vec<ContentGroup>,
}

#[derive(Deserialize)]
struct NewEdgeArgs {
    from_node: Checksum256,
    to_node: Checksum256,
    edge_name: Name,
}

/// Ordering key of a row under a given index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum RowKey {
    Id(u64),
    Hash(Checksum256),
}

/// Which column a table index is keyed on.
#[derive(Debug, Clone, Copy)]
enum IndexColumn {
    Id,
    DocumentHash,
    FromNode,
    ToNode,
}

/// An in-memory document graph contract deployed at `contract`.
#[derive(Debug)]
pub struct MemoryChain {
    contract: AccountName,
    tables: Mutex<Tables>,
    encodes: AtomicUsize,
    submissions: AtomicUsize,
}

impl MemoryChain {
    pub fn new(contract: impl Into<AccountName>) -> Self {
        Self {
            contract: contract.into(),
            tables: Mutex::new(Tables::default()),
            encodes: AtomicUsize::new(0),
            submissions: AtomicUsize::new(0),
        }
    }

    pub fn contract(&self) -> &AccountName {
        &self.contract
    }

    /// Number of `abi_json_to_bin` calls received.
    pub fn encode_count(&self) -> usize {
        self.encodes.load(Ordering::SeqCst)
    }

    /// Number of transactions submitted, accepted or not.
    pub fn submission_count(&self) -> usize {
        self.submissions.load(Ordering::SeqCst)
    }

    pub fn documents(&self) -> Vec<Document> {
        self.lock().documents.clone()
    }

    pub fn edges(&self) -> Vec<Edge> {
        self.lock().edges.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn apply(&self, tables: &mut Tables, action: &Action) -> Result<(), ChainError> {
        if action.account != self.contract {
            return Err(ChainError::Rejected(format!(
                "no contract deployed at {}",
                action.account
            )));
        }

        let bytes = hex::decode(&action.data)
            .map_err(|e| ChainError::Rejected(format!("action data is not hex: {e}")))?;

        match action.name.as_str() {
            "create" => {
                let args: CreateArgs = serde_json::from_slice(&bytes)?;
                require_auth(action, &args.creator)?;

                let hash = content_hash(&args.content_groups)?;
                if tables.documents.iter().any(|d| d.hash == hash) {
                    return Err(ChainError::Rejected(format!(
                        "document exists already: {hash}"
                    )));
                }

                let id = tables.next_document_id;
                tables.next_document_id += 1;
                tables.documents.push(Document {
                    id,
                    hash,
                    creator: args.creator,
                    content_groups: args.content_groups,
                    certificates: Vec::new(),
                    created_date: Some(Utc::now().naive_utc()),
                });
                Ok(())
            }
            "newedge" => {
                let args: NewEdgeArgs = serde_json::from_slice(&bytes)?;
                let creator = action
                    .authorization
                    .first()
                    .map(|p| p.actor.clone())
                    .ok_or_else(|| ChainError::Rejected("missing authorization".to_string()))?;

                for node in [&args.from_node, &args.to_node] {
                    if !tables.documents.iter().any(|d| &d.hash == node) {
                        return Err(ChainError::Rejected(format!("document not found: {node}")));
                    }
                }
                if tables.edges.iter().any(|e| {
                    e.from_node == args.from_node
                        && e.to_node == args.to_node
                        && e.edge_name == args.edge_name
                }) {
                    return Err(ChainError::Rejected(format!(
                        "edge from {} to {} with name {} already exists",
                        args.from_node, args.to_node, args.edge_name
                    )));
                }

                let id = tables.next_edge_id;
                tables.next_edge_id += 1;
                tables.edges.push(Edge {
                    id,
                    creator: Some(creator),
                    from_node: args.from_node,
                    to_node: args.to_node,
                    edge_name: args.edge_name,
                    created_date: Some(Utc::now().naive_utc()),
                });
                Ok(())
            }
            other => Err(ChainError::Rejected(format!("unknown action {other}"))),
        }
    }
}

fn require_auth(action: &Action, account: &AccountName) -> Result<(), ChainError> {
    if action.authorization.iter().any(|p| &p.actor == account) {
        Ok(())
    } else {
        Err(ChainError::Rejected(format!("missing authority of {account}")))
    }
}

/// BLAKE3 over the canonical JSON of the content groups.
fn content_hash(groups: &[ContentGroup]) -> Result<Checksum256, ChainError> {
    let json = serde_json::to_vec(groups)?;
    Ok(Checksum256::from_bytes(*blake3::hash(&json).as_bytes()))
}

fn index_column(table: &str, position: Option<&str>) -> Result<IndexColumn, ChainError> {
    match (table, position.unwrap_or("1")) {
        (_, "1" | "primary") => Ok(IndexColumn::Id),
        (DOCUMENTS_TABLE, "2" | "secondary") => Ok(IndexColumn::DocumentHash),
        (EDGES_TABLE, "2" | "secondary") => Ok(IndexColumn::FromNode),
        (EDGES_TABLE, "3" | "tertiary") => Ok(IndexColumn::ToNode),
        (_, other) => Err(ChainError::Rejected(format!(
            "invalid index position {other} for table {table}"
        ))),
    }
}

fn parse_bound(column: IndexColumn, raw: &str) -> Result<RowKey, ChainError> {
    match column {
        IndexColumn::Id => raw
            .parse()
            .map(RowKey::Id)
            .map_err(|e| ChainError::Rejected(format!("invalid i64 bound {raw:?}: {e}"))),
        _ => raw
            .parse()
            .map(RowKey::Hash)
            .map_err(|e| ChainError::Rejected(format!("invalid sha256 bound: {e}"))),
    }
}

/// Apply bounds, ordering, reverse, and limit to keyed rows.
fn select_rows(
    mut keyed: Vec<(RowKey, u64, serde_json::Value)>,
    column: IndexColumn,
    request: &TableRowsRequest,
) -> Result<TableRows, ChainError> {
    let lower = request
        .lower_bound
        .as_deref()
        .map(|b| parse_bound(column, b))
        .transpose()?;
    let upper = request
        .upper_bound
        .as_deref()
        .map(|b| parse_bound(column, b))
        .transpose()?;

    keyed.retain(|(key, _, _)| {
        lower.map_or(true, |l| *key >= l) && upper.map_or(true, |u| *key <= u)
    });
    keyed.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
    if request.reverse {
        keyed.reverse();
    }

    let limit = request.limit as usize;
    let more = keyed.len() > limit;
    let rows = keyed.into_iter().take(limit).map(|(_, _, row)| row).collect();
    Ok(TableRows {
        rows,
        more,
        next_key: None,
    })
}

#[async_trait]
impl AbiEncoder for MemoryChain {
    async fn abi_json_to_bin(
        &self,
        contract: &AccountName,
        action: &Name,
        args: &serde_json::Value,
    ) -> Result<String, ChainError> {
        self.encodes.fetch_add(1, Ordering::SeqCst);

        if contract != &self.contract {
            return Err(ChainError::Rejected(format!("no ABI for account {contract}")));
        }
        // Validate against the action's argument shape, as the real encoder would.
        match action.as_str() {
            "create" => {
                CreateArgs::deserialize(args)?;
            }
            "newedge" => {
                NewEdgeArgs::deserialize(args)?;
            }
            other => {
                return Err(ChainError::Rejected(format!(
                    "action {other} is not specified in the ABI"
                )))
            }
        }
        Ok(hex::encode(serde_json::to_vec(args)?))
    }
}

#[async_trait]
impl TransactionExecutor for MemoryChain {
    async fn execute(&self, actions: &[Action]) -> Result<TransactionReceipt, ChainError> {
        let sequence = self.submissions.fetch_add(1, Ordering::SeqCst);

        let mut tables = self.lock();
        let mut staged = tables.clone();
        for action in actions {
            self.apply(&mut staged, action)?;
        }
        *tables = staged;

        let mut hasher = blake3::Hasher::new();
        hasher.update(&sequence.to_le_bytes());
        hasher.update(&serde_json::to_vec(actions)?);
        Ok(TransactionReceipt {
            transaction_id: hasher.finalize().to_hex().to_string(),
            processed: serde_json::Value::Null,
        })
    }
}

#[async_trait]
impl TableReader for MemoryChain {
    async fn get_table_rows(&self, request: &TableRowsRequest) -> Result<TableRows, ChainError> {
        if request.code != self.contract.as_str() || request.scope != self.contract.as_str() {
            return Ok(TableRows::default());
        }

        let column = index_column(&request.table, request.index_position.as_deref())?;
        let tables = self.lock();

        let keyed = match request.table.as_str() {
            DOCUMENTS_TABLE => tables
                .documents
                .iter()
                .map(|d| {
                    let key = match column {
                        IndexColumn::DocumentHash => RowKey::Hash(d.hash),
                        _ => RowKey::Id(d.id),
                    };
                    Ok::<_, serde_json::Error>((key, d.id, serde_json::to_value(d)?))
                })
                .collect::<Result<Vec<_>, serde_json::Error>>()?,
            EDGES_TABLE => tables
                .edges
                .iter()
                .map(|e| {
                    let key = match column {
                        IndexColumn::FromNode => RowKey::Hash(e.from_node),
                        IndexColumn::ToNode => RowKey::Hash(e.to_node),
                        _ => RowKey::Id(e.id),
                    };
                    Ok::<_, serde_json::Error>((key, e.id, serde_json::to_value(e)?))
                })
                .collect::<Result<Vec<_>, serde_json::Error>>()?,
            other => {
                return Err(ChainError::Rejected(format!(
                    "table {other} is not specified in the ABI"
                )))
            }
        };
        drop(tables);

        select_rows(keyed, column, request)
    }
}

#[cfg(test)]
mod tests {
    use docgraph_core::{Content, FlexValue};

    use super::*;
    use crate::table::KeyType;

    const CONTRACT: &str = "docs.hypha";

    fn groups(title: &str) -> Vec<ContentGroup> {
        vec![vec![Content::new("title", FlexValue::String(title.to_string()))]]
    }

    async fn create(chain: &MemoryChain, creator: &str, title: &str) -> Result<(), ChainError> {
        let args = serde_json::json!({ "creator": creator, "content_groups": groups(title) });
        let data = chain
            .abi_json_to_bin(&CONTRACT.into(), &"create".into(), &args)
            .await?;
        let action = Action::single_signer(CONTRACT.into(), "create".into(), creator.into(), data);
        chain.execute(&[action]).await.map(|_| ())
    }

    #[tokio::test]
    async fn create_assigns_ids_and_rejects_duplicates() {
        let chain = MemoryChain::new(CONTRACT);
        create(&chain, "alice", "one").await.unwrap();
        create(&chain, "alice", "two").await.unwrap();

        let err = create(&chain, "bob", "one").await.unwrap_err();
        assert!(err.to_string().contains("document exists already"));

        let docs = chain.documents();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[1].id, 1);
        assert_eq!(chain.submission_count(), 3);
    }

    #[tokio::test]
    async fn create_requires_creator_authority() {
        let chain = MemoryChain::new(CONTRACT);
        let args = serde_json::json!({ "creator": "alice", "content_groups": groups("x") });
        let data = chain
            .abi_json_to_bin(&CONTRACT.into(), &"create".into(), &args)
            .await
            .unwrap();
        let action = Action::single_signer(CONTRACT.into(), "create".into(), "mallory".into(), data);

        let err = chain.execute(&[action]).await.unwrap_err();
        assert!(err.to_string().contains("missing authority of alice"));
        assert!(chain.documents().is_empty());
    }

    #[tokio::test]
    async fn encoder_rejects_malformed_arguments() {
        let chain = MemoryChain::new(CONTRACT);
        let args = serde_json::json!({ "from_node": "nothex", "to_node": "00", "edge_name": "x" });
        let result = chain
            .abi_json_to_bin(&CONTRACT.into(), &"newedge".into(), &args)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn reverse_limit_one_returns_latest_document() {
        let chain = MemoryChain::new(CONTRACT);
        create(&chain, "alice", "first").await.unwrap();
        create(&chain, "alice", "second").await.unwrap();

        let req = TableRowsRequest::new(CONTRACT, CONTRACT, DOCUMENTS_TABLE)
            .limit(1)
            .reverse();
        let rows = chain.get_table_rows(&req).await.unwrap();
        assert!(rows.more);
        let docs: Vec<Document> = rows.decode().unwrap();
        assert_eq!(docs[0].id, 1);
    }

    #[tokio::test]
    async fn hash_index_finds_exact_document() {
        let chain = MemoryChain::new(CONTRACT);
        create(&chain, "alice", "first").await.unwrap();
        create(&chain, "alice", "second").await.unwrap();
        let target = chain.documents()[0].hash;

        let req = TableRowsRequest::new(CONTRACT, CONTRACT, DOCUMENTS_TABLE)
            .index("2", KeyType::Sha256)
            .exact(target.to_hex())
            .limit(1);
        let docs: Vec<Document> = chain.get_table_rows(&req).await.unwrap().decode().unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].hash, target);
    }

    #[tokio::test]
    async fn unknown_table_is_an_error() {
        let chain = MemoryChain::new(CONTRACT);
        let req = TableRowsRequest::new(CONTRACT, CONTRACT, "certs");
        assert!(chain.get_table_rows(&req).await.is_err());
    }
}
