//! Write operations: document and edge creation.
//!
//! Each write is a single-action transaction authorized by the creator's
//! `active` permission. The contract does not return the created
//! document's hash, so document creation reads it back afterwards.

use std::path::Path;

use docgraph_chain::TransactionReceipt;
use docgraph_core::{AccountName, Action, CallContext, Checksum256, ContentGroup, Document, Name};
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};

use crate::client::{guarded, GraphClient, GraphError};

pub const CREATE_ACTION: &str = "create";
pub const NEW_EDGE_ACTION: &str = "newedge";

/// Arguments of the contract's `create` action.
///
/// Fields the input carried beyond `content_groups` are passed through in
/// `extra` untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateDocumentArgs {
    pub creator: AccountName,
    pub content_groups: Vec<ContentGroup>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Shape of a document input file. Any `creator` it carries is discarded.
#[derive(Deserialize)]
struct DocumentFile {
    #[serde(default, rename = "creator")]
    _creator: Option<IgnoredAny>,
    content_groups: Vec<ContentGroup>,
    #[serde(flatten)]
    extra: serde_json::Map<String, serde_json::Value>,
}

impl CreateDocumentArgs {
    pub fn new(creator: AccountName, content_groups: Vec<ContentGroup>) -> Self {
        Self {
            creator,
            content_groups,
            extra: serde_json::Map::new(),
        }
    }

    /// Parse a JSON object and set its creator. `source` names the input
    /// in error messages.
    pub fn from_json(bytes: &[u8], creator: AccountName, source: &str) -> Result<Self, GraphError> {
        let file: DocumentFile =
            serde_json::from_slice(bytes).map_err(|e| GraphError::Decode {
                file: source.to_string(),
                source: e,
            })?;
        Ok(Self {
            creator,
            content_groups: file.content_groups,
            extra: file.extra,
        })
    }

    pub async fn from_file(path: &Path, creator: AccountName) -> Result<Self, GraphError> {
        let file = path.display().to_string();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| GraphError::FileRead {
                file: file.clone(),
                source,
            })?;
        Self::from_json(&bytes, creator, &file)
    }
}

/// Arguments of the contract's `newedge` action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEdgeArgs {
    pub from_node: Checksum256,
    pub to_node: Checksum256,
    pub edge_name: Name,
}

/// A document created by this client, with the transaction that created it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreatedDocument {
    pub document: Document,
    pub transaction_id: String,
}

impl GraphClient {
    /// Create a document from a JSON file of content groups.
    ///
    /// The file's `creator` field, if any, is replaced by `creator`. Once
    /// the transaction succeeds the newest document in `contract` is read
    /// back; if that fails the error carries the transaction id.
    pub async fn create_document(
        &self,
        ctx: &CallContext,
        contract: &AccountName,
        creator: &AccountName,
        path: &Path,
    ) -> Result<CreatedDocument, GraphError> {
        let file = path.display().to_string();
        ctx.check().map_err(|reason| GraphError::Cancelled {
            operation: format!("create document from {file}"),
            reason,
        })?;

        let args = CreateDocumentArgs::from_file(path, creator.clone()).await?;
        self.create_document_from_args(ctx, contract, &args, &file)
            .await
    }

    /// Create a document from already-parsed arguments. `source` names the
    /// input in errors and logs.
    pub async fn create_document_from_args(
        &self,
        ctx: &CallContext,
        contract: &AccountName,
        args: &CreateDocumentArgs,
        source: &str,
    ) -> Result<CreatedDocument, GraphError> {
        let json = serde_json::to_value(args).map_err(|e| GraphError::Decode {
            file: source.to_string(),
            source: e,
        })?;

        let receipt = self
            .submit(ctx, contract, &args.creator, CREATE_ACTION, &json, source)
            .await?;

        tracing::info!(
            contract = %contract,
            creator = %args.creator,
            source,
            transaction_id = %receipt.transaction_id,
            "Document created"
        );

        let lookup_failed = |e: GraphError| GraphError::Lookup {
            file: source.to_string(),
            transaction_id: receipt.transaction_id.clone(),
            source: Box::new(e),
        };

        let document = self
            .last_document(ctx, contract)
            .await
            .map_err(lookup_failed)?;

        if document.creator != args.creator {
            return Err(lookup_failed(GraphError::LatestMismatch {
                contract: contract.clone(),
                hash: document.hash,
                expected: args.creator.clone(),
                found: document.creator,
            }));
        }
        if document.content_groups != args.content_groups {
            tracing::warn!(
                contract = %contract,
                hash = %document.hash,
                source,
                "Latest document content differs from submitted content"
            );
        }

        Ok(CreatedDocument {
            document,
            transaction_id: receipt.transaction_id,
        })
    }

    /// Create a directed edge named `edge_name` from `from_node` to `to_node`.
    ///
    /// Returns the transaction id. Hash and name validity are decided by
    /// the contract.
    pub async fn create_edge(
        &self,
        ctx: &CallContext,
        contract: &AccountName,
        creator: &AccountName,
        from_node: &Checksum256,
        to_node: &Checksum256,
        edge_name: &Name,
    ) -> Result<String, GraphError> {
        let args = NewEdgeArgs {
            from_node: *from_node,
            to_node: *to_node,
            edge_name: edge_name.clone(),
        };
        let context = format!("{from_node} -[{edge_name}]-> {to_node}");
        let json = serde_json::to_value(&args).map_err(|e| GraphError::Decode {
            file: context.clone(),
            source: e,
        })?;

        let receipt = self
            .submit(ctx, contract, creator, NEW_EDGE_ACTION, &json, &context)
            .await?;

        tracing::info!(
            contract = %contract,
            edge = %context,
            transaction_id = %receipt.transaction_id,
            "Edge created"
        );
        Ok(receipt.transaction_id)
    }

    /// Encode `args` for `action` and push it as a single-action
    /// transaction signed by `creator@active`.
    async fn submit(
        &self,
        ctx: &CallContext,
        contract: &AccountName,
        creator: &AccountName,
        action: &str,
        args: &serde_json::Value,
        context: &str,
    ) -> Result<TransactionReceipt, GraphError> {
        let action_name = Name::from(action);

        let data = guarded(
            ctx,
            "abi_json_to_bin",
            self.encoder.abi_json_to_bin(contract, &action_name, args),
        )
        .await?
        .map_err(|source| GraphError::Encoding {
            contract: contract.clone(),
            action: action.to_string(),
            context: context.to_string(),
            source,
        })?;

        let actions = [Action::single_signer(
            contract.clone(),
            action_name,
            creator.clone(),
            data,
        )];

        guarded(ctx, "push transaction", self.executor.execute(&actions))
            .await?
            .map_err(|source| GraphError::Submission {
                contract: contract.clone(),
                action: action.to_string(),
                context: context.to_string(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creator_is_overwritten_and_extras_kept() {
        let input = br#"{
            "creator": "someoneelse",
            "content_groups": [[{"label": "title", "value": ["string", "Hi"]}]],
            "notes": {"keep": true}
        }"#;

        let args = CreateDocumentArgs::from_json(input, "alice".into(), "doc.json").unwrap();
        assert_eq!(args.creator.as_str(), "alice");
        assert_eq!(args.content_groups.len(), 1);
        assert!(args.extra.contains_key("notes"));
        assert!(!args.extra.contains_key("creator"));

        let json = serde_json::to_value(&args).unwrap();
        assert_eq!(json["creator"], "alice");
        assert_eq!(json["notes"]["keep"], true);
    }

    #[test]
    fn non_object_input_is_a_decode_error() {
        let err = CreateDocumentArgs::from_json(b"[1, 2, 3]", "alice".into(), "list.json")
            .unwrap_err();
        match err {
            GraphError::Decode { file, .. } => assert_eq!(file, "list.json"),
            other => panic!("expected Decode, got {other:?}"),
        }
    }

    #[test]
    fn missing_content_groups_is_a_decode_error() {
        let err = CreateDocumentArgs::from_json(br#"{"title": "x"}"#, "alice".into(), "x.json")
            .unwrap_err();
        assert!(matches!(err, GraphError::Decode { .. }));
    }

    #[tokio::test]
    async fn missing_file_is_a_file_read_error() {
        let err = CreateDocumentArgs::from_file(Path::new("/no/such/doc.json"), "alice".into())
            .await
            .unwrap_err();
        match err {
            GraphError::FileRead { file, .. } => assert!(file.contains("doc.json")),
            other => panic!("expected FileRead, got {other:?}"),
        }
    }

    #[test]
    fn new_edge_args_shape() {
        let hash: Checksum256 = "11".repeat(32).parse().unwrap();
        let args = NewEdgeArgs {
            from_node: hash,
            to_node: hash,
            edge_name: "owns".into(),
        };
        let json = serde_json::to_value(&args).unwrap();
        assert_eq!(json["from_node"], "11".repeat(32));
        assert_eq!(json["edge_name"], "owns");
    }
}
