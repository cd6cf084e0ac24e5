//! Errors from the chain collaborators.

/// Failures reported by an encoder, executor, or table reader.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The node answered with a non-2xx status.
    #[error("chain node returned status {status}: {message}")]
    Rpc { status: u16, message: String },

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("executor failed to start: {0}")]
    Spawn(#[from] std::io::Error),

    /// The executor process ran but the transaction was rejected.
    #[error("executor exited with code {code}: {stderr}")]
    Executor { code: i32, stderr: String },

    /// The contract (or its simulator) rejected the action.
    #[error("action rejected: {0}")]
    Rejected(String),
}
