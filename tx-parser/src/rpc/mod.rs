//! Ledger collaborator: signature lookup, parsed transactions, log subscriptions.

pub mod mock;
mod solana;

pub use solana::SolanaLedgerClient;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::LedgerError;
use crate::types::RawTransaction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(pub u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One `logsNotification` for a watched address.
#[derive(Debug, Clone, PartialEq)]
pub struct LogNotification {
    pub address: String,
    pub signature: String,
    /// Non-null when the transaction failed on chain.
    pub err: Option<Value>,
}

impl LogNotification {
    pub fn failed(&self) -> bool {
        matches!(self.err, Some(ref err) if !err.is_null())
    }
}

pub type LogSink = mpsc::UnboundedSender<LogNotification>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureInfo {
    pub signature: String,
    #[serde(default)]
    pub slot: u64,
    #[serde(default)]
    pub err: Option<Value>,
    #[serde(default)]
    pub block_time: Option<i64>,
}

#[async_trait]
pub trait LedgerClient: Send + Sync {
    async fn get_signatures_for_address(
        &self,
        address: &str,
        limit: usize,
    ) -> Result<Vec<SignatureInfo>, LedgerError>;

    /// `Ok(None)` when the ledger has no such transaction (yet).
    async fn get_parsed_transaction(&self, signature: &str) -> Result<Option<RawTransaction>, LedgerError>;

    async fn on_logs(&self, address: &str, sink: LogSink) -> Result<SubscriptionId, LedgerError>;

    async fn remove_on_logs_listener(&self, id: SubscriptionId) -> Result<(), LedgerError>;
}
