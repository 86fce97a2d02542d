//! Jupiter v6 route resolver: fee-payer balance deltas to buy/sell/swap details.
//!
//! The input/output pick is a best-effort heuristic. Each side takes the single
//! largest raw delta; on equal magnitudes the first balance seen wins.

use tracing::debug;

use super::transfers::{token_transfers, TokenTransfer};
use crate::constants::{is_known_funding_token, JUPITER_V6};
use crate::types::{
    BuySellDetails, RawTransaction, SwapDetails, TokenInfo, TradeDirection, TransactionDetails,
};

const DEX: &str = "jupiter";

fn largest_by_abs_change<'a>(transfers: impl Iterator<Item = &'a TokenTransfer>) -> Option<&'a TokenTransfer> {
    transfers.fold(None, |largest: Option<&TokenTransfer>, candidate| match largest {
        Some(current) if candidate.change.unsigned_abs() <= current.change.unsigned_abs() => Some(current),
        _ => Some(candidate),
    })
}

fn touches_wallet(transfer: &TokenTransfer, wallet: &str) -> bool {
    transfer.from.as_deref() == Some(wallet) || transfer.to.as_deref() == Some(wallet)
}

/// Returns `None` when the transaction does not look like a wallet swap
/// (no Jupiter instruction, fewer than two wallet legs, or a missing side).
pub fn resolve(transaction: &RawTransaction) -> Option<TransactionDetails> {
    if !transaction.program_ids().iter().any(|id| id == JUPITER_V6) {
        return None;
    }

    let wallet = transaction.fee_payer()?;
    let transfers = token_transfers(transaction);
    let wallet_transfers: Vec<&TokenTransfer> = transfers
        .iter()
        .filter(|transfer| touches_wallet(transfer, wallet))
        .collect();

    if wallet_transfers.len() < 2 {
        debug!(
            "Jupiter route has {} wallet legs, falling back to generic",
            wallet_transfers.len()
        );
        return None;
    }

    let input = largest_by_abs_change(wallet_transfers.iter().copied().filter(|t| t.change < 0))?;
    let output = largest_by_abs_change(wallet_transfers.iter().copied().filter(|t| t.change > 0))?;

    Some(classify_direction(input, output, transaction.fee().to_string()))
}

fn classify_direction(input: &TokenTransfer, output: &TokenTransfer, fee_amount: String) -> TransactionDetails {
    let input_known = is_known_funding_token(&input.mint);
    let output_known = is_known_funding_token(&output.mint);

    match (input_known, output_known) {
        (true, false) => TransactionDetails::Buy(BuySellDetails {
            dex: DEX.to_string(),
            funding_token: TokenInfo::known(&input.mint),
            target_token: TokenInfo::unverified(&output.mint),
            funding_amount: input.amount.clone(),
            target_amount: output.amount.clone(),
            direction: TradeDirection::Buy,
            fee_amount,
        }),
        (false, true) => TransactionDetails::Sell(BuySellDetails {
            dex: DEX.to_string(),
            funding_token: TokenInfo::known(&output.mint),
            target_token: TokenInfo::unverified(&input.mint),
            funding_amount: output.amount.clone(),
            target_amount: input.amount.clone(),
            direction: TradeDirection::Sell,
            fee_amount,
        }),
        _ => TransactionDetails::Swap(SwapDetails {
            dex: DEX.to_string(),
            input_mint: input.mint.clone(),
            output_mint: output.mint.clone(),
            input_amount: input.amount.clone(),
            output_amount: output.amount.clone(),
            fee_amount,
            fee_mint: None,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{SOL_MINT, USDC_MINT};
    use crate::fixtures::{
        balance, jupiter_buy, jupiter_known_swap, jupiter_sell, TxBuilder, TEST_COUNTERPARTY,
        TEST_MEME_MINT, TEST_WALLET,
    };

    #[test]
    fn test_buy_marks_target_for_research() {
        let details = resolve(&jupiter_buy("sig", TEST_WALLET, TEST_MEME_MINT)).unwrap();

        let TransactionDetails::Buy(buy) = details else {
            panic!("expected buy, got {:?}", details);
        };
        assert_eq!(buy.funding_token, TokenInfo::known(SOL_MINT));
        assert_eq!(buy.target_token.mint, TEST_MEME_MINT);
        assert!(buy.target_token.needs_research);
        assert_eq!(buy.funding_amount, "1.5");
        assert_eq!(buy.target_amount, "1000000");
        assert_eq!(buy.fee_amount, "5000");
        assert_eq!(buy.direction, TradeDirection::Buy);
    }

    #[test]
    fn test_sell_swaps_funding_and_target_legs() {
        let details = resolve(&jupiter_sell("sig", TEST_WALLET, TEST_MEME_MINT)).unwrap();

        let TransactionDetails::Sell(sell) = details else {
            panic!("expected sell, got {:?}", details);
        };
        assert_eq!(sell.funding_token.mint, USDC_MINT);
        assert_eq!(sell.target_token.mint, TEST_MEME_MINT);
        assert_eq!(sell.funding_amount, "12.25");
        assert_eq!(sell.target_amount, "250.5");
    }

    #[test]
    fn test_both_funding_legs_is_plain_swap() {
        let details = resolve(&jupiter_known_swap("sig", TEST_WALLET)).unwrap();

        let TransactionDetails::Swap(swap) = details else {
            panic!("expected swap, got {:?}", details);
        };
        assert_eq!(swap.input_mint, SOL_MINT);
        assert_eq!(swap.output_mint, USDC_MINT);
        assert_eq!(swap.input_amount, "1");
        assert_eq!(swap.output_amount, "150");
        assert_eq!(swap.fee_mint, None);
    }

    #[test]
    fn test_ignores_legs_not_owned_by_fee_payer() {
        let tx = TxBuilder::new("sig")
            .program(JUPITER_V6)
            .pre(balance(1, SOL_MINT, TEST_WALLET, "1000", 9))
            .post(balance(1, SOL_MINT, TEST_WALLET, "0", 9))
            .post(balance(2, TEST_MEME_MINT, TEST_COUNTERPARTY, "5000", 6))
            .build();

        assert_eq!(resolve(&tx), None);
    }

    #[test]
    fn test_largest_leg_wins_and_first_wins_ties() {
        let tx = TxBuilder::new("sig")
            .program(JUPITER_V6)
            .pre(balance(1, SOL_MINT, TEST_WALLET, "100", 9))
            .post(balance(1, SOL_MINT, TEST_WALLET, "0", 9))
            .pre(balance(2, USDC_MINT, TEST_WALLET, "100", 6))
            .post(balance(2, USDC_MINT, TEST_WALLET, "0", 6))
            .post(balance(3, TEST_MEME_MINT, TEST_WALLET, "10", 6))
            .post(balance(4, TEST_COUNTERPARTY, TEST_WALLET, "70", 6))
            .build();

        let TransactionDetails::Buy(buy) = resolve(&tx).unwrap() else {
            panic!("expected buy");
        };
        assert_eq!(buy.funding_token.mint, SOL_MINT);
        assert_eq!(buy.target_token.mint, TEST_COUNTERPARTY);
    }

    #[test]
    fn test_requires_jupiter_instruction() {
        let tx = TxBuilder::new("sig")
            .pre(balance(1, SOL_MINT, TEST_WALLET, "1000", 9))
            .post(balance(1, SOL_MINT, TEST_WALLET, "0", 9))
            .post(balance(2, TEST_MEME_MINT, TEST_WALLET, "5000", 6))
            .build();

        assert_eq!(resolve(&tx), None);
    }
}
