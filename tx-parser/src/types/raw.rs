//! Serde model of the ledger's `jsonParsed` transaction payload.
//!
//! Only the fields the classifier and resolvers read are modelled; unknown
//! fields are ignored so newer RPC responses keep decoding.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawTransaction {
    #[serde(default)]
    pub slot: u64,
    #[serde(default)]
    pub block_time: Option<i64>,
    pub transaction: RawTransactionBody,
    #[serde(default)]
    pub meta: Option<RawMeta>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawTransactionBody {
    #[serde(default)]
    pub signatures: Vec<String>,
    pub message: RawMessage,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawMessage {
    #[serde(default)]
    pub account_keys: Vec<AccountKey>,
    #[serde(default)]
    pub instructions: Vec<RawInstruction>,
}

/// `jsonParsed` returns key objects, plain `json` encoding returns strings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum AccountKey {
    Parsed {
        pubkey: String,
        #[serde(default)]
        signer: bool,
        #[serde(default)]
        writable: bool,
    },
    Plain(String),
}

impl AccountKey {
    pub fn pubkey(&self) -> &str {
        match self {
            AccountKey::Parsed { pubkey, .. } => pubkey,
            AccountKey::Plain(pubkey) => pubkey,
        }
    }
}

/// Parsed, partially decoded, or compiled instruction.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawInstruction {
    #[serde(default)]
    pub program_id: Option<String>,
    #[serde(default)]
    pub program_id_index: Option<usize>,
    #[serde(default)]
    pub program: Option<String>,
    #[serde(default)]
    pub parsed: Option<Value>,
    #[serde(default)]
    pub accounts: Vec<Value>,
    #[serde(default)]
    pub data: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawMeta {
    #[serde(default)]
    pub err: Option<Value>,
    #[serde(default)]
    pub fee: u64,
    #[serde(default)]
    pub pre_balances: Vec<u64>,
    #[serde(default)]
    pub post_balances: Vec<u64>,
    #[serde(default)]
    pub pre_token_balances: Option<Vec<TokenBalance>>,
    #[serde(default)]
    pub post_token_balances: Option<Vec<TokenBalance>>,
    #[serde(default)]
    pub loaded_addresses: Option<LoadedAddresses>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LoadedAddresses {
    #[serde(default)]
    pub writable: Vec<String>,
    #[serde(default)]
    pub readonly: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalance {
    pub account_index: usize,
    pub mint: String,
    #[serde(default)]
    pub owner: Option<String>,
    pub ui_token_amount: UiTokenAmount,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UiTokenAmount {
    /// Raw integer amount as a decimal string.
    pub amount: String,
    pub decimals: u8,
    #[serde(default)]
    pub ui_amount: Option<f64>,
    #[serde(default)]
    pub ui_amount_string: Option<String>,
}

impl RawTransaction {
    /// Static account keys followed by lookup-table loaded addresses.
    pub fn account_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .transaction
            .message
            .account_keys
            .iter()
            .map(|key| key.pubkey().to_string())
            .collect();

        if let Some(loaded) = self.meta.as_ref().and_then(|meta| meta.loaded_addresses.as_ref()) {
            keys.extend(loaded.writable.iter().cloned());
            keys.extend(loaded.readonly.iter().cloned());
        }

        keys
    }

    pub fn fee_payer(&self) -> Option<&str> {
        self.transaction.message.account_keys.first().map(AccountKey::pubkey)
    }

    pub fn first_signature(&self) -> Option<&str> {
        self.transaction.signatures.first().map(String::as_str)
    }

    /// Distinct program IDs invoked by top-level instructions, in first-seen order.
    pub fn program_ids(&self) -> Vec<String> {
        let keys = self.account_keys();
        let mut ids: Vec<String> = Vec::new();

        for instruction in &self.transaction.message.instructions {
            let program_id = match (&instruction.program_id, instruction.program_id_index) {
                (Some(id), _) => Some(id.clone()),
                (None, Some(index)) => keys.get(index).cloned(),
                (None, None) => None,
            };

            if let Some(id) = program_id {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
        }

        ids
    }

    pub fn instruction_count(&self) -> usize {
        self.transaction.message.instructions.len()
    }

    pub fn fee(&self) -> u64 {
        self.meta.as_ref().map(|meta| meta.fee).unwrap_or(0)
    }

    pub fn has_error(&self) -> bool {
        self.meta
            .as_ref()
            .map(|meta| matches!(meta.err, Some(ref err) if !err.is_null()))
            .unwrap_or(false)
    }

    pub fn pre_token_balances(&self) -> &[TokenBalance] {
        self.meta
            .as_ref()
            .and_then(|meta| meta.pre_token_balances.as_deref())
            .unwrap_or(&[])
    }

    pub fn post_token_balances(&self) -> &[TokenBalance] {
        self.meta
            .as_ref()
            .and_then(|meta| meta.post_token_balances.as_deref())
            .unwrap_or(&[])
    }
}
