use crate::types::{ParsedTransaction, TransactionType};

/// Types that survive the relevance filter. Swaps, transfers and unknowns are
/// dropped before any downstream LLM call.
pub const RELEVANT_TYPES: [TransactionType; 4] = [
    TransactionType::Buy,
    TransactionType::Sell,
    TransactionType::Lp,
    TransactionType::Perp,
];

pub fn is_relevant_transaction(transaction: &ParsedTransaction) -> bool {
    RELEVANT_TYPES.contains(&transaction.tx_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{
        jupiter_buy, jupiter_known_swap, jupiter_sell, meteora_lp, system_transfer, TEST_MEME_MINT,
        TEST_WALLET,
    };
    use crate::parser::parse_transaction;

    #[test]
    fn test_relevant_types_pass() {
        for tx in [
            jupiter_buy("a", TEST_WALLET, TEST_MEME_MINT),
            jupiter_sell("b", TEST_WALLET, TEST_MEME_MINT),
            meteora_lp("c", TEST_WALLET),
        ] {
            assert!(is_relevant_transaction(&parse_transaction(&tx, None)));
        }
    }

    #[test]
    fn test_noise_is_dropped() {
        for tx in [jupiter_known_swap("a", TEST_WALLET), system_transfer("b", TEST_WALLET)] {
            assert!(!is_relevant_transaction(&parse_transaction(&tx, None)));
        }
    }
}
