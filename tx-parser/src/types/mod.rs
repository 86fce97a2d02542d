mod raw;

pub use raw::{AccountKey, LoadedAddresses, RawInstruction, RawMessage, RawMeta, RawTransaction, RawTransactionBody, TokenBalance, UiTokenAmount};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Buy,
    Sell,
    Swap,
    Perp,
    Lp,
    Nft,
    Transfer,
    Unknown,
}

impl TransactionType {
    pub fn as_str(&self) -> &str {
        match self {
            TransactionType::Buy => "buy",
            TransactionType::Sell => "sell",
            TransactionType::Swap => "swap",
            TransactionType::Perp => "perp",
            TransactionType::Lp => "lp",
            TransactionType::Nft => "nft",
            TransactionType::Transfer => "transfer",
            TransactionType::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Protocol {
    Jupiter,
    MeteoraDlmm,
    SplToken,
    AssociatedToken,
    System,
    Unknown,
}

impl Protocol {
    pub fn as_str(&self) -> &str {
        match self {
            Protocol::Jupiter => "jupiter",
            Protocol::MeteoraDlmm => "meteora-dlmm",
            Protocol::SplToken => "spl-token",
            Protocol::AssociatedToken => "associated-token",
            Protocol::System => "system",
            Protocol::Unknown => "unknown",
        }
    }
}

/// Result of the program-id pass, before any detail resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Classification {
    #[serde(rename = "type")]
    pub tx_type: TransactionType,
    pub protocol: Protocol,
}

impl Classification {
    pub const UNKNOWN: Classification = Classification {
        tx_type: TransactionType::Unknown,
        protocol: Protocol::Unknown,
    };
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TradeDirection {
    Buy,
    Sell,
}

impl TradeDirection {
    pub fn as_str(&self) -> &str {
        match self {
            TradeDirection::Buy => "buy",
            TradeDirection::Sell => "sell",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TokenInfo {
    pub mint: String,
    pub is_known: bool,
    #[serde(default)]
    pub needs_research: bool,
}

impl TokenInfo {
    pub fn known(mint: &str) -> Self {
        Self {
            mint: mint.to_string(),
            is_known: true,
            needs_research: false,
        }
    }

    pub fn unverified(mint: &str) -> Self {
        Self {
            mint: mint.to_string(),
            is_known: false,
            needs_research: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GenericDetails {
    pub instruction_count: usize,
    pub fee: u64,
    pub has_error: bool,
    pub pre_token_balance_count: usize,
    pub post_token_balance_count: usize,
}

/// Directional trade where exactly one leg is a funding token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BuySellDetails {
    pub dex: String,
    pub funding_token: TokenInfo,
    pub target_token: TokenInfo,
    pub funding_amount: String,
    pub target_amount: String,
    pub direction: TradeDirection,
    pub fee_amount: String,
}

/// Non-directional swap: both or neither leg is a funding token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SwapDetails {
    pub dex: String,
    pub input_mint: String,
    pub output_mint: String,
    pub input_amount: String,
    pub output_amount: String,
    pub fee_amount: String,
    pub fee_mint: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TransactionDetails {
    Generic(GenericDetails),
    Buy(BuySellDetails),
    Sell(BuySellDetails),
    Swap(SwapDetails),
}

impl TransactionDetails {
    pub fn kind(&self) -> &str {
        match self {
            TransactionDetails::Generic(_) => "generic",
            TransactionDetails::Buy(_) => "buy",
            TransactionDetails::Sell(_) => "sell",
            TransactionDetails::Swap(_) => "swap",
        }
    }
}

/// Immutable classification result for one ledger transaction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParsedTransaction {
    pub signature: String,
    pub timestamp: Option<i64>,
    #[serde(rename = "type")]
    pub tx_type: TransactionType,
    pub protocol: Protocol,
    pub details: TransactionDetails,
}

impl ParsedTransaction {
    pub fn trade(&self) -> Option<&BuySellDetails> {
        match &self.details {
            TransactionDetails::Buy(details) | TransactionDetails::Sell(details) => Some(details),
            _ => None,
        }
    }
}
