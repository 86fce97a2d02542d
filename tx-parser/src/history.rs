//! Wallet history helpers on top of the ledger collaborator.

use std::collections::BTreeMap;
use std::str::FromStr;

use anyhow::{Context, Result};
use futures::future::join_all;
use serde::Serialize;
use solana_sdk::pubkey::Pubkey;
use tracing::{debug, info};

use crate::error::ParserError;
use crate::parser::{parse_transaction, parse_transactions};
use crate::rpc::LedgerClient;
use crate::types::{ParsedTransaction, RawTransaction, TransactionType};

pub const DEFAULT_TX_COUNT: usize = 50;

pub fn validate_wallet(wallet: &str) -> Result<Pubkey, ParserError> {
    Pubkey::from_str(wallet.trim()).map_err(|_| ParserError::InvalidAddress(wallet.to_string()))
}

pub fn normalize_count(count: Option<i64>, fallback: usize) -> Result<usize, ParserError> {
    match count {
        None => Ok(fallback),
        Some(count) if count <= 0 => Err(ParserError::InvalidCount(count)),
        Some(count) => Ok(count as usize),
    }
}

pub fn normalize_signature(signature: &str) -> Result<&str, ParserError> {
    let trimmed = signature.trim();
    if trimmed.is_empty() {
        return Err(ParserError::EmptySignature);
    }
    Ok(trimmed)
}

/// Most recent transactions for a wallet, newest first. Individual fetch
/// failures are dropped rather than failing the whole call.
pub async fn fetch_wallet_transactions(
    ledger: &dyn LedgerClient,
    wallet: &str,
    count: Option<i64>,
) -> Result<Vec<RawTransaction>> {
    let count = normalize_count(count, DEFAULT_TX_COUNT)?;
    let wallet = validate_wallet(wallet)?.to_string();

    let signatures = ledger
        .get_signatures_for_address(&wallet, count)
        .await
        .with_context(|| format!("Failed to fetch signatures for wallet {}", wallet))?;

    let fetches = signatures.iter().map(|info| async move {
        match ledger.get_parsed_transaction(&info.signature).await {
            Ok(transaction) => transaction,
            Err(e) => {
                debug!("Skipping {}: {}", info.signature, e);
                None
            }
        }
    });

    let transactions: Vec<RawTransaction> = join_all(fetches).await.into_iter().flatten().collect();
    debug!(
        "Fetched {}/{} transactions for {}",
        transactions.len(),
        signatures.len(),
        wallet
    );
    Ok(transactions)
}

pub async fn fetch_transaction_by_signature(
    ledger: &dyn LedgerClient,
    signature: &str,
) -> Result<Option<RawTransaction>> {
    let signature = normalize_signature(signature)?;
    ledger
        .get_parsed_transaction(signature)
        .await
        .with_context(|| format!("Failed to fetch transaction for signature {}", signature))
}

pub async fn parse_wallet_history(
    ledger: &dyn LedgerClient,
    wallet: &str,
    count: Option<i64>,
) -> Result<Vec<ParsedTransaction>> {
    let transactions = fetch_wallet_transactions(ledger, wallet, count).await?;
    Ok(parse_transactions(transactions.iter().map(Some)))
}

pub async fn parse_transaction_by_signature(
    ledger: &dyn LedgerClient,
    signature: &str,
) -> Result<Option<ParsedTransaction>> {
    let transaction = fetch_transaction_by_signature(ledger, signature).await?;
    Ok(transaction.map(|tx| parse_transaction(&tx, Some(signature.trim()))))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletAnalysis {
    pub wallet: String,
    pub total: usize,
    pub parsed: usize,
    pub unparsed: usize,
    pub breakdown: BTreeMap<String, usize>,
    pub unparsed_signatures: Vec<String>,
}

impl WalletAnalysis {
    pub fn parsed_percent(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        ((self.parsed as f64 / self.total as f64) * 100.0).round() as u32
    }
}

pub fn summarize_history(wallet: &str, transactions: &[ParsedTransaction]) -> WalletAnalysis {
    let mut analysis = WalletAnalysis {
        wallet: wallet.to_string(),
        total: transactions.len(),
        ..WalletAnalysis::default()
    };

    for transaction in transactions {
        if transaction.tx_type == TransactionType::Unknown {
            analysis.unparsed += 1;
            analysis.unparsed_signatures.push(transaction.signature.clone());
        } else {
            analysis.parsed += 1;
            *analysis
                .breakdown
                .entry(transaction.tx_type.as_str().to_string())
                .or_insert(0) += 1;
        }
    }

    analysis
}

pub async fn analyze_wallet(ledger: &dyn LedgerClient, wallet: &str, count: Option<i64>) -> Result<WalletAnalysis> {
    let parsed = parse_wallet_history(ledger, wallet, count).await?;
    let analysis = summarize_history(wallet, &parsed);
    info!(
        "📊 {}: {} transactions, {} parsed ({}%)",
        wallet,
        analysis.total,
        analysis.parsed,
        analysis.parsed_percent()
    );
    Ok(analysis)
}
