//! In-memory ledger for tests and offline runs.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;

use super::{LedgerClient, LogNotification, LogSink, SignatureInfo, SubscriptionId};
use crate::error::LedgerError;
use crate::types::RawTransaction;

#[derive(Default)]
struct MockState {
    transactions: HashMap<String, RawTransaction>,
    history: HashMap<String, Vec<String>>,
    failing_fetches: HashSet<String>,
    fetches: HashMap<String, usize>,
    subscriptions: HashMap<u64, (String, LogSink)>,
    failing_subscribes: HashSet<String>,
    fail_unsubscribe: bool,
    removed: Vec<SubscriptionId>,
    next_id: u64,
}

#[derive(Default)]
pub struct MockLedger {
    state: Mutex<MockState>,
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a transaction under its first signature.
    pub fn insert_transaction(&self, transaction: RawTransaction) {
        let signature = transaction.first_signature().unwrap_or_default().to_string();
        self.state.lock().transactions.insert(signature, transaction);
    }

    /// Registers transactions as the wallet's history, newest first.
    pub fn insert_history(&self, wallet: &str, transactions: Vec<RawTransaction>) {
        let mut state = self.state.lock();
        let signatures = transactions
            .into_iter()
            .map(|transaction| {
                let signature = transaction.first_signature().unwrap_or_default().to_string();
                state.transactions.insert(signature.clone(), transaction);
                signature
            })
            .collect();
        state.history.insert(wallet.to_string(), signatures);
    }

    pub fn fail_fetch(&self, signature: &str) {
        self.state.lock().failing_fetches.insert(signature.to_string());
    }

    pub fn fail_subscribe(&self, address: &str) {
        self.state.lock().failing_subscribes.insert(address.to_string());
    }

    pub fn fail_unsubscribe(&self, fail: bool) {
        self.state.lock().fail_unsubscribe = fail;
    }

    /// Delivers a notification to every listener on `address`. Returns the
    /// number of listeners reached.
    pub fn emit(&self, address: &str, signature: &str) -> usize {
        self.deliver(address, signature, None)
    }

    pub fn emit_failed(&self, address: &str, signature: &str) -> usize {
        self.deliver(
            address,
            signature,
            Some(json!({ "InstructionError": [0, "Custom"] })),
        )
    }

    fn deliver(&self, address: &str, signature: &str, err: Option<serde_json::Value>) -> usize {
        let state = self.state.lock();
        state
            .subscriptions
            .values()
            .filter(|(subscribed, _)| subscribed == address)
            .filter(|(_, sink)| {
                sink.send(LogNotification {
                    address: address.to_string(),
                    signature: signature.to_string(),
                    err: err.clone(),
                })
                .is_ok()
            })
            .count()
    }

    pub fn active_subscriptions(&self) -> usize {
        self.state.lock().subscriptions.len()
    }

    pub fn removed_subscriptions(&self) -> Vec<SubscriptionId> {
        self.state.lock().removed.clone()
    }

    pub fn fetch_count(&self, signature: &str) -> usize {
        self.state.lock().fetches.get(signature).copied().unwrap_or(0)
    }
}

#[async_trait]
impl LedgerClient for MockLedger {
    async fn get_signatures_for_address(
        &self,
        address: &str,
        limit: usize,
    ) -> Result<Vec<SignatureInfo>, LedgerError> {
        let state = self.state.lock();
        let signatures = state.history.get(address).cloned().unwrap_or_default();

        Ok(signatures
            .into_iter()
            .take(limit)
            .map(|signature| {
                let block_time = state.transactions.get(&signature).and_then(|tx| tx.block_time);
                SignatureInfo {
                    signature,
                    slot: 0,
                    err: None,
                    block_time,
                }
            })
            .collect())
    }

    async fn get_parsed_transaction(&self, signature: &str) -> Result<Option<RawTransaction>, LedgerError> {
        let mut state = self.state.lock();
        *state.fetches.entry(signature.to_string()).or_insert(0) += 1;

        if state.failing_fetches.contains(signature) {
            return Err(LedgerError::Rpc(format!("mock fetch failure for {}", signature)));
        }
        Ok(state.transactions.get(signature).cloned())
    }

    async fn on_logs(&self, address: &str, sink: LogSink) -> Result<SubscriptionId, LedgerError> {
        let mut state = self.state.lock();
        if state.failing_subscribes.contains(address) {
            return Err(LedgerError::Subscribe {
                address: address.to_string(),
                reason: "mock subscribe failure".to_string(),
            });
        }

        state.next_id += 1;
        let id = state.next_id;
        state.subscriptions.insert(id, (address.to_string(), sink));
        Ok(SubscriptionId(id))
    }

    async fn remove_on_logs_listener(&self, id: SubscriptionId) -> Result<(), LedgerError> {
        let mut state = self.state.lock();
        if state.subscriptions.remove(&id.0).is_none() {
            return Err(LedgerError::UnknownSubscription(id.0));
        }
        state.removed.push(id);

        if state.fail_unsubscribe {
            return Err(LedgerError::Rpc(format!("mock unsubscribe failure for {}", id)));
        }
        Ok(())
    }
}
