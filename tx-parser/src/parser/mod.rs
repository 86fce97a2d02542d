//! Transaction classification: program-id pass, then per-(type, protocol) details.

mod details;
mod jupiter;
pub mod transfers;

pub use details::{generic_details, resolve_details, DetailResolver};
pub use transfers::{format_amount, token_transfers, TokenTransfer};

use tracing::trace;

use crate::constants::PROGRAM_PRECEDENCE;
use crate::types::{
    Classification, ParsedTransaction, Protocol, RawTransaction, TransactionDetails,
    TransactionType,
};

const UNKNOWN_SIGNATURE: &str = "unknown-signature";

fn transaction_type_for(protocol: Protocol) -> TransactionType {
    match protocol {
        Protocol::Jupiter => TransactionType::Swap,
        Protocol::MeteoraDlmm => TransactionType::Lp,
        Protocol::SplToken | Protocol::AssociatedToken | Protocol::System => TransactionType::Transfer,
        Protocol::Unknown => TransactionType::Unknown,
    }
}

/// Pure and total: unmatched programs yield `{unknown, unknown}`.
pub fn classify(transaction: &RawTransaction) -> Classification {
    let program_ids = transaction.program_ids();

    PROGRAM_PRECEDENCE
        .iter()
        .find(|(program_id, _)| program_ids.iter().any(|id| id == program_id))
        .map(|(_, protocol)| Classification {
            tx_type: transaction_type_for(*protocol),
            protocol: *protocol,
        })
        .unwrap_or(Classification::UNKNOWN)
}

pub fn parse_transaction(transaction: &RawTransaction, signature: Option<&str>) -> ParsedTransaction {
    let classification = classify(transaction);
    let details = resolve_details(transaction, classification);

    let signature = signature
        .or_else(|| transaction.first_signature())
        .unwrap_or(UNKNOWN_SIGNATURE)
        .to_string();

    // Jupiter routes are re-typed by the resolved direction.
    let tx_type = match (&details, classification.tx_type) {
        (TransactionDetails::Buy(_), TransactionType::Swap) => TransactionType::Buy,
        (TransactionDetails::Sell(_), TransactionType::Swap) => TransactionType::Sell,
        (_, tx_type) => tx_type,
    };

    trace!(
        "Parsed {} as {}:{} ({})",
        signature,
        tx_type.as_str(),
        classification.protocol.as_str(),
        details.kind()
    );

    ParsedTransaction {
        signature,
        timestamp: transaction.block_time,
        tx_type,
        protocol: classification.protocol,
        details,
    }
}

/// Absent transactions are skipped; order is preserved.
pub fn parse_transactions<'a>(
    transactions: impl IntoIterator<Item = Option<&'a RawTransaction>>,
) -> Vec<ParsedTransaction> {
    transactions
        .into_iter()
        .flatten()
        .map(|transaction| parse_transaction(transaction, None))
        .collect()
}
