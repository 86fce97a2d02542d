use thiserror::Error;

/// Input errors: rejected before any ledger call is made.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParserError {
    #[error("Invalid wallet address: {0}")]
    InvalidAddress(String),

    #[error("Invalid signature: value cannot be empty.")]
    EmptySignature,

    #[error("Invalid transaction count: {0}. Count must be a positive integer.")]
    InvalidCount(i64),

    #[error("Missing {0}. Define it in the root .env or process environment.")]
    MissingConfig(String),

    #[error("Invalid {key}: {value}")]
    InvalidConfig { key: String, value: String },
}

/// Failures raised by the ledger collaborator.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("RPC request failed: {0}")]
    Rpc(String),

    #[error("Failed to subscribe to logs for {address}: {reason}")]
    Subscribe { address: String, reason: String },

    #[error("Unknown subscription id: {0}")]
    UnknownSubscription(u64),

    #[error("Failed to decode ledger payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Input(#[from] ParserError),
}
