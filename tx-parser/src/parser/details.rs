use super::jupiter;
use crate::types::{
    Classification, GenericDetails, Protocol, RawTransaction, TransactionDetails, TransactionType,
};

/// Detail resolvers, keyed by (type, protocol).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailResolver {
    JupiterRoute,
    Transfer,
    Generic,
}

impl DetailResolver {
    pub fn for_classification(classification: Classification) -> Self {
        match (classification.tx_type, classification.protocol) {
            (TransactionType::Swap, Protocol::Jupiter) => DetailResolver::JupiterRoute,
            (
                TransactionType::Transfer,
                Protocol::SplToken | Protocol::AssociatedToken | Protocol::System,
            ) => DetailResolver::Transfer,
            _ => DetailResolver::Generic,
        }
    }

    /// `None` means the resolver does not apply to this transaction.
    fn try_resolve(&self, transaction: &RawTransaction) -> Option<TransactionDetails> {
        match self {
            DetailResolver::JupiterRoute => jupiter::resolve(transaction),
            // Lamport-level transfer details are not modelled; transfers are summarized generically.
            DetailResolver::Transfer => transaction.meta.as_ref().map(|_| generic_details(transaction)),
            DetailResolver::Generic => Some(generic_details(transaction)),
        }
    }
}

pub fn generic_details(transaction: &RawTransaction) -> TransactionDetails {
    TransactionDetails::Generic(GenericDetails {
        instruction_count: transaction.instruction_count(),
        fee: transaction.fee(),
        has_error: transaction.has_error(),
        pre_token_balance_count: transaction.pre_token_balances().len(),
        post_token_balance_count: transaction.post_token_balances().len(),
    })
}

/// Always populated: any resolver miss falls back to the generic shape.
pub fn resolve_details(transaction: &RawTransaction, classification: Classification) -> TransactionDetails {
    DetailResolver::for_classification(classification)
        .try_resolve(transaction)
        .unwrap_or_else(|| generic_details(transaction))
}
