//! Configuration for talking to the chain.
//!
//! Configuration is loaded from (in priority order):
//! 1. Environment variables (`DOCGRAPH__CHAIN__RPC_URL`, ...)
//! 2. Config file (`docgraph.toml`, `[chain]` section)
//! 3. Defaults

use serde::Deserialize;

use crate::error::CoreError;

/// Connection settings for the chain node and the transaction executor.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ChainConfig {
    /// Base URL of the chain node's HTTP API.
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,

    /// Account hosting the document graph contract.
    #[serde(default = "default_contract")]
    pub contract: String,

    /// Path to the `cleos` binary used to sign and push transactions.
    #[serde(default = "default_cleos_path")]
    pub cleos_path: String,

    /// Wallet daemon URL passed to `cleos`, if not the default.
    #[serde(default)]
    pub wallet_url: Option<String>,

    /// Per-request HTTP timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_rpc_url() -> String {
    "http://127.0.0.1:8888".to_string()
}

fn default_contract() -> String {
    "docs.hypha".to_string()
}

fn default_cleos_path() -> String {
    "cleos".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            contract: default_contract(),
            cleos_path: default_cleos_path(),
            wallet_url: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ChainConfig {
    /// Load the `[chain]` section from `<file_prefix>.toml` (optional) and
    /// `DOCGRAPH__` environment variables. A missing section yields defaults.
    pub fn load(file_prefix: &str) -> Result<Self, CoreError> {
        let cfg = config::Config::builder()
            .add_source(config::File::with_name(file_prefix).required(false))
            .add_source(
                config::Environment::with_prefix("DOCGRAPH")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        match cfg.get::<ChainConfig>("chain") {
            Ok(c) => Ok(c),
            Err(config::ConfigError::NotFound(_)) => {
                tracing::debug!(file_prefix, "No [chain] config found, using defaults");
                Ok(ChainConfig::default())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ChainConfig::default();
        assert_eq!(config.rpc_url, "http://127.0.0.1:8888");
        assert_eq!(config.contract, "docs.hypha");
        assert_eq!(config.cleos_path, "cleos");
        assert_eq!(config.timeout_secs, 30);
        assert!(config.wallet_url.is_none());
    }

    #[test]
    fn test_partial_section_fills_defaults() {
        let cfg = config::Config::builder()
            .add_source(config::File::from_str(
                "[chain]\nrpc_url = \"https://testnet.telos.caleos.io\"\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap();

        let chain: ChainConfig = cfg.get("chain").unwrap();
        assert_eq!(chain.rpc_url, "https://testnet.telos.caleos.io");
        assert_eq!(chain.contract, "docs.hypha");
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = ChainConfig::load("definitely-not-a-docgraph-config").unwrap();
        assert_eq!(config.contract, default_contract());
    }
}
