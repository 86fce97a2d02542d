//! One-line summaries: the only representation the brain ever sees.

use chrono::{DateTime, SecondsFormat};

use crate::constants::funding_symbol;
use crate::types::{BuySellDetails, ParsedTransaction, TradeDirection};
use crate::wallet_registry::wallet_label;

pub const NEEDS_RESEARCH_MARKER: &str = "(needsResearch)";

fn format_timestamp(timestamp: Option<i64>) -> String {
    timestamp
        .and_then(|seconds| DateTime::from_timestamp(seconds, 0))
        .map(|time| time.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_else(|| "unknown-time".to_string())
}

fn short(value: &str) -> String {
    value.chars().take(8).collect()
}

fn format_trade(timestamp: &str, label: &str, details: &BuySellDetails, sig_short: &str) -> String {
    let action = match details.direction {
        TradeDirection::Buy => "bought",
        TradeDirection::Sell => "sold",
    };
    let target = &details.target_token;
    let research_flag = if target.needs_research { NEEDS_RESEARCH_MARKER } else { "" };

    format!(
        "[{}] Wallet:{} {} {} {}{} (mint:{}) for {} {} via Jupiter | sig:{}",
        timestamp,
        label,
        action,
        details.target_amount,
        short(&target.mint),
        research_flag,
        target.mint,
        details.funding_amount,
        funding_symbol(&details.funding_token.mint),
        sig_short
    )
}

pub fn format_transaction_for_llm(transaction: &ParsedTransaction, wallet_address: &str) -> String {
    let timestamp = format_timestamp(transaction.timestamp);
    let label = wallet_label(wallet_address);
    let sig_short = short(&transaction.signature);

    if let Some(details) = transaction.trade() {
        return format_trade(&timestamp, &label, details, &sig_short);
    }

    format!(
        "[{}] Wallet:{} {} on {} | sig:{}",
        timestamp,
        label,
        transaction.tx_type.as_str(),
        transaction.protocol.as_str(),
        sig_short
    )
}
