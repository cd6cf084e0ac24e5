//! HTTP client for the chain node's `/v1/chain` API.
//!
//! Provides ABI encoding (`abi_json_to_bin`) and table reads
//! (`get_table_rows`). Transaction signing is not handled here; see
//! [`crate::CleosExecutor`].

use std::time::Duration;

use async_trait::async_trait;
use docgraph_core::config::ChainConfig;
use docgraph_core::{AccountName, Name};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::api::{AbiEncoder, TableReader};
use crate::error::ChainError;
use crate::table::{TableRows, TableRowsRequest};

/// Chain node API client. Clone is cheap (inner connection pool).
#[derive(Debug, Clone)]
pub struct ChainRpc {
    base_url: String,
    client: Client,
}

#[derive(Serialize)]
struct AbiJsonToBinRequest<'a> {
    code: &'a AccountName,
    action: &'a Name,
    args: &'a serde_json::Value,
}

#[derive(Deserialize)]
struct AbiJsonToBinResponse {
    binargs: String,
}

/// Error body returned by the node on failure.
#[derive(Deserialize)]
struct RpcErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    error: Option<RpcErrorDetail>,
}

#[derive(Deserialize)]
struct RpcErrorDetail {
    #[serde(default)]
    what: String,
    #[serde(default)]
    details: Vec<RpcErrorLine>,
}

#[derive(Deserialize)]
struct RpcErrorLine {
    #[serde(default)]
    message: String,
}

impl ChainRpc {
    /// Build a client from configuration, applying the request timeout.
    pub fn new(config: &ChainConfig) -> Result<Self, ChainError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self::with_client(&config.rpc_url, client))
    }

    /// Use a pre-configured `reqwest::Client`.
    pub fn with_client(base_url: &str, client: Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<B, R>(&self, endpoint: &str, body: &B) -> Result<R, ChainError>
    where
        B: Serialize + ?Sized,
        R: serde::de::DeserializeOwned,
    {
        let url = format!("{}/v1/chain/{endpoint}", self.base_url);
        let response = self.client.post(&url).json(body).send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            return Err(ChainError::Rpc {
                status: status.as_u16(),
                message: rpc_error_message(&bytes),
            });
        }

        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Pull the most specific message out of a node error body.
fn rpc_error_message(bytes: &[u8]) -> String {
    match serde_json::from_slice::<RpcErrorBody>(bytes) {
        Ok(body) => match body.error {
            Some(detail) => detail
                .details
                .into_iter()
                .map(|l| l.message)
                .find(|m| !m.is_empty())
                .or_else(|| (!detail.what.is_empty()).then_some(detail.what))
                .unwrap_or(body.message),
            None => body.message,
        },
        Err(_) => String::from_utf8_lossy(bytes).into_owned(),
    }
}

#[async_trait]
impl AbiEncoder for ChainRpc {
    async fn abi_json_to_bin(
        &self,
        contract: &AccountName,
        action: &Name,
        args: &serde_json::Value,
    ) -> Result<String, ChainError> {
        let request = AbiJsonToBinRequest {
            code: contract,
            action,
            args,
        };
        let response: AbiJsonToBinResponse = self.post("abi_json_to_bin", &request).await?;
        Ok(response.binargs)
    }
}

#[async_trait]
impl TableReader for ChainRpc {
    async fn get_table_rows(&self, request: &TableRowsRequest) -> Result<TableRows, ChainError> {
        tracing::debug!(
            code = %request.code,
            table = %request.table,
            index = ?request.index_position,
            limit = request.limit,
            "get_table_rows"
        );
        self.post("get_table_rows", request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_prefers_detail_lines() {
        let body = br#"{
            "code": 500,
            "message": "Internal Service Error",
            "error": {
                "code": 3015014,
                "name": "pack_exception",
                "what": "Pack data exception",
                "details": [{"message": "Unexpected input encountered while processing struct 'newedge'"}]
            }
        }"#;
        assert_eq!(
            rpc_error_message(body),
            "Unexpected input encountered while processing struct 'newedge'"
        );
    }

    #[test]
    fn error_message_falls_back_to_what_then_raw() {
        let body = br#"{"message":"oops","error":{"what":"Pack data exception","details":[]}}"#;
        assert_eq!(rpc_error_message(body), "Pack data exception");
        assert_eq!(rpc_error_message(b"bad gateway"), "bad gateway");
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let rpc = ChainRpc::with_client("http://localhost:8888/", Client::new());
        assert_eq!(rpc.base_url(), "http://localhost:8888");
    }
}
