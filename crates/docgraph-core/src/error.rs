use thiserror::Error;

/// Errors raised by the shared document graph types and configuration.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid checksum256 {input:?}: {reason}")]
    InvalidChecksum { input: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}
