//! `cleos` process wrapper.
//!
//! Signing and broadcast are delegated to `cleos`, which talks to the
//! wallet daemon for keys and fills in the transaction header. The
//! process runs under `tokio::process::Command` with `kill_on_drop`, so an
//! abandoned call does not leave it running.

use async_trait::async_trait;
use docgraph_core::config::ChainConfig;
use docgraph_core::Action;
use serde::Serialize;
use tokio::process::Command;

use crate::api::{TransactionExecutor, TransactionReceipt};
use crate::error::ChainError;

/// Transaction executor backed by the `cleos` binary.
#[derive(Debug, Clone)]
pub struct CleosExecutor {
    cleos_path: String,
    rpc_url: String,
    wallet_url: Option<String>,
}

#[derive(Serialize)]
struct UnsignedTransaction<'a> {
    actions: &'a [Action],
}

impl CleosExecutor {
    pub fn new(cleos_path: &str, rpc_url: &str) -> Self {
        Self {
            cleos_path: cleos_path.to_string(),
            rpc_url: rpc_url.to_string(),
            wallet_url: None,
        }
    }

    pub fn from_config(config: &ChainConfig) -> Self {
        Self {
            cleos_path: config.cleos_path.clone(),
            rpc_url: config.rpc_url.clone(),
            wallet_url: config.wallet_url.clone(),
        }
    }

    pub fn with_wallet_url(mut self, wallet_url: &str) -> Self {
        self.wallet_url = Some(wallet_url.to_string());
        self
    }

    /// Arguments passed to `cleos` for pushing `actions`.
    fn push_args(&self, actions: &[Action]) -> Result<Vec<String>, ChainError> {
        let trx = serde_json::to_string(&UnsignedTransaction { actions })?;

        let mut args = vec!["-u".to_string(), self.rpc_url.clone()];
        if let Some(ref wallet) = self.wallet_url {
            args.push("--wallet-url".to_string());
            args.push(wallet.clone());
        }
        args.extend([
            "push".to_string(),
            "transaction".to_string(),
            trx,
            "--json".to_string(),
        ]);
        Ok(args)
    }
}

#[async_trait]
impl TransactionExecutor for CleosExecutor {
    async fn execute(&self, actions: &[Action]) -> Result<TransactionReceipt, ChainError> {
        let args = self.push_args(actions)?;

        tracing::info!(
            actions = actions.len(),
            rpc_url = %self.rpc_url,
            "Pushing transaction via cleos"
        );

        let output = Command::new(&self.cleos_path)
            .args(&args)
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            return Err(ChainError::Executor {
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let receipt: TransactionReceipt = serde_json::from_slice(&output.stdout)?;
        tracing::info!(transaction_id = %receipt.transaction_id, "Transaction executed");
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_action() -> Action {
        Action::single_signer(
            "docs.hypha".into(),
            "newedge".into(),
            "alice".into(),
            "0a0b".to_string(),
        )
    }

    #[test]
    fn push_args_embed_transaction_json() {
        let exec = CleosExecutor::new("cleos", "http://localhost:8888");
        let args = exec.push_args(&[sample_action()]).unwrap();

        assert_eq!(&args[..2], &["-u", "http://localhost:8888"]);
        assert_eq!(&args[2..4], &["push", "transaction"]);
        assert_eq!(args.last().map(String::as_str), Some("--json"));

        let trx: serde_json::Value = serde_json::from_str(&args[4]).unwrap();
        assert_eq!(trx["actions"][0]["name"], "newedge");
        assert_eq!(trx["actions"][0]["authorization"][0]["permission"], "active");
        assert_eq!(trx["actions"][0]["data"], "0a0b");
    }

    #[test]
    fn push_args_include_wallet_url() {
        let exec = CleosExecutor::new("cleos", "http://localhost:8888")
            .with_wallet_url("http://localhost:8900");
        let args = exec.push_args(&[sample_action()]).unwrap();
        assert_eq!(&args[2..4], &["--wallet-url", "http://localhost:8900"]);
    }

    #[tokio::test]
    async fn missing_binary_is_a_spawn_error() {
        let exec = CleosExecutor::new("/nonexistent/cleos", "http://localhost:8888");
        let err = exec.execute(&[sample_action()]).await.unwrap_err();
        assert!(matches!(err, ChainError::Spawn(_)));
    }
}
