use std::collections::HashMap;

use crate::types::{RawTransaction, TokenBalance};

/// Net token balance change of one token account within a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenTransfer {
    pub mint: String,
    pub from: Option<String>,
    pub to: Option<String>,
    /// Absolute change rendered as an exact decimal string.
    pub amount: String,
    pub decimals: u8,
    /// Signed raw change (post - pre) in base units.
    pub change: i128,
}

/// Render `raw / 10^decimals` exactly, trimming trailing fraction zeros.
pub fn format_amount(raw: u128, decimals: u8) -> String {
    if decimals == 0 {
        return raw.to_string();
    }

    let width = decimals as usize;
    let (whole, padded) = match 10u128.checked_pow(decimals as u32) {
        Some(base) => ((raw / base).to_string(), format!("{:0width$}", raw % base, width = width)),
        None => {
            // 10^decimals exceeds u128, so split the padded digit string instead.
            let digits = format!("{:0width$}", raw, width = width + 1);
            let (whole, fraction) = digits.split_at(digits.len() - width);
            (whole.to_string(), fraction.to_string())
        }
    };
    let trimmed = padded.trim_end_matches('0');

    if trimmed.is_empty() {
        whole.to_string()
    } else {
        format!("{}.{}", whole, trimmed)
    }
}

fn balance_key(balance: &TokenBalance) -> String {
    format!("{}:{}", balance.account_index, balance.mint)
}

fn raw_amount(balance: Option<&TokenBalance>) -> i128 {
    balance
        .and_then(|b| b.ui_token_amount.amount.parse::<i128>().ok())
        .unwrap_or(0)
}

/// Per-account token deltas from the pre/post balance snapshots.
///
/// Keys are `accountIndex:mint`, iterated in pre-then-post first-seen order so
/// that tie-breaks downstream are deterministic.
pub fn token_transfers(transaction: &RawTransaction) -> Vec<TokenTransfer> {
    if transaction.meta.is_none() {
        return Vec::new();
    }

    let pre = transaction.pre_token_balances();
    let post = transaction.post_token_balances();

    let pre_map: HashMap<String, &TokenBalance> = pre.iter().map(|b| (balance_key(b), b)).collect();
    let post_map: HashMap<String, &TokenBalance> = post.iter().map(|b| (balance_key(b), b)).collect();

    let mut keys: Vec<String> = Vec::new();
    for balance in pre.iter().chain(post.iter()) {
        let key = balance_key(balance);
        if !keys.contains(&key) {
            keys.push(key);
        }
    }

    let mut transfers = Vec::new();
    for key in keys {
        let pre_balance = pre_map.get(&key).copied();
        let post_balance = post_map.get(&key).copied();
        let Some(balance) = post_balance.or(pre_balance) else {
            continue;
        };

        let change = raw_amount(post_balance) - raw_amount(pre_balance);
        if change == 0 {
            continue;
        }

        let owner = post_balance
            .and_then(|b| b.owner.clone())
            .or_else(|| pre_balance.and_then(|b| b.owner.clone()));
        let decimals = post_balance
            .or(pre_balance)
            .map(|b| b.ui_token_amount.decimals)
            .unwrap_or(0);

        transfers.push(TokenTransfer {
            mint: balance.mint.clone(),
            from: if change < 0 { owner.clone() } else { None },
            to: if change > 0 { owner } else { None },
            amount: format_amount(change.unsigned_abs(), decimals),
            decimals,
            change,
        });
    }

    transfers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{balance, TxBuilder};

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(1_500_000_000, 9), "1.5");
        assert_eq!(format_amount(1_000_000, 6), "1");
        assert_eq!(format_amount(1, 6), "0.000001");
        assert_eq!(format_amount(123, 0), "123");
        assert_eq!(format_amount(0, 9), "0");
        assert_eq!(format_amount(100_000_000_000_000_000_001, 9), "100000000000.000000001");
    }

    #[test]
    fn test_format_amount_large_decimals() {
        assert_eq!(format_amount(1, 40), format!("0.{}1", "0".repeat(39)));
        assert_eq!(format_amount(0, 40), "0");
        assert_eq!(format_amount(10u128.pow(38), 39), "0.1");

        let max = u128::MAX.to_string();
        let rendered = format_amount(u128::MAX, 255);
        assert_eq!(rendered, format!("0.{}{}", "0".repeat(255 - max.len()), max));
    }

    #[test]
    fn test_format_amount_never_trims_whole_part() {
        assert_eq!(format_amount(10_000_000, 6), "10");
        assert_eq!(format_amount(1_000_000_000_000, 6), "1000000");
    }

    #[test]
    fn test_token_transfers_direction_and_owner() {
        let tx = TxBuilder::new("sig")
            .pre(balance(1, "MintA", "wallet", "2000000", 6))
            .post(balance(1, "MintA", "wallet", "500000", 6))
            .post(balance(2, "MintB", "wallet", "42", 0))
            .build();

        let transfers = token_transfers(&tx);
        assert_eq!(transfers.len(), 2);

        assert_eq!(transfers[0].mint, "MintA");
        assert_eq!(transfers[0].from.as_deref(), Some("wallet"));
        assert_eq!(transfers[0].to, None);
        assert_eq!(transfers[0].amount, "1.5");
        assert_eq!(transfers[0].change, -1_500_000);

        assert_eq!(transfers[1].mint, "MintB");
        assert_eq!(transfers[1].to.as_deref(), Some("wallet"));
        assert_eq!(transfers[1].amount, "42");
    }

    #[test]
    fn test_unchanged_balances_are_skipped() {
        let tx = TxBuilder::new("sig")
            .pre(balance(1, "MintA", "wallet", "100", 2))
            .post(balance(1, "MintA", "wallet", "100", 2))
            .build();

        assert!(token_transfers(&tx).is_empty());
    }
}
