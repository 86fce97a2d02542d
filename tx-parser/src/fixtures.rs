//! Raw transaction builders shared by unit tests, integration tests and the
//! downstream crates' scenario tests.

use crate::constants::{JUPITER_V6, METEORA_DLMM, SOL_MINT, SYSTEM_PROGRAM, USDC_MINT};
use crate::types::{
    AccountKey, RawInstruction, RawMessage, RawMeta, RawTransaction, RawTransactionBody,
    TokenBalance, UiTokenAmount,
};

pub const TEST_WALLET: &str = "AVAZvHLR2PcWpDf8BXY4rVxNHYRBytycHkcB5z5QNXYm";
pub const TEST_MEME_MINT: &str = "7GCihgDB8fe6KNjn2MYtkzZcRjQy3t9GHdC8uHYmW2hr";
pub const TEST_COUNTERPARTY: &str = "5ZPczDuywV5GFwG6KnHjbj2eap9BBQZeyUUDwaFhRRmn";

pub fn balance(account_index: usize, mint: &str, owner: &str, amount: &str, decimals: u8) -> TokenBalance {
    TokenBalance {
        account_index,
        mint: mint.to_string(),
        owner: Some(owner.to_string()),
        ui_token_amount: UiTokenAmount {
            amount: amount.to_string(),
            decimals,
            ui_amount: None,
            ui_amount_string: None,
        },
    }
}

pub struct TxBuilder {
    signature: String,
    fee_payer: String,
    block_time: Option<i64>,
    programs: Vec<String>,
    pre: Vec<TokenBalance>,
    post: Vec<TokenBalance>,
    fee: u64,
    failed: bool,
}

impl TxBuilder {
    pub fn new(signature: &str) -> Self {
        Self {
            signature: signature.to_string(),
            fee_payer: TEST_WALLET.to_string(),
            block_time: Some(1_700_000_000),
            programs: Vec::new(),
            pre: Vec::new(),
            post: Vec::new(),
            fee: 5000,
            failed: false,
        }
    }

    pub fn fee_payer(mut self, wallet: &str) -> Self {
        self.fee_payer = wallet.to_string();
        self
    }

    pub fn block_time(mut self, block_time: Option<i64>) -> Self {
        self.block_time = block_time;
        self
    }

    pub fn program(mut self, program_id: &str) -> Self {
        self.programs.push(program_id.to_string());
        self
    }

    pub fn pre(mut self, balance: TokenBalance) -> Self {
        self.pre.push(balance);
        self
    }

    pub fn post(mut self, balance: TokenBalance) -> Self {
        self.post.push(balance);
        self
    }

    pub fn fee(mut self, fee: u64) -> Self {
        self.fee = fee;
        self
    }

    pub fn failed(mut self) -> Self {
        self.failed = true;
        self
    }

    pub fn build(self) -> RawTransaction {
        let mut account_keys = vec![AccountKey::Parsed {
            pubkey: self.fee_payer.clone(),
            signer: true,
            writable: true,
        }];
        account_keys.extend(self.programs.iter().map(|program| AccountKey::Parsed {
            pubkey: program.clone(),
            signer: false,
            writable: false,
        }));

        let instructions = self
            .programs
            .iter()
            .map(|program| RawInstruction {
                program_id: Some(program.clone()),
                ..RawInstruction::default()
            })
            .collect();

        RawTransaction {
            slot: 1,
            block_time: self.block_time,
            transaction: RawTransactionBody {
                signatures: vec![self.signature],
                message: RawMessage {
                    account_keys,
                    instructions,
                },
            },
            meta: Some(RawMeta {
                err: if self.failed {
                    Some(serde_json::json!({ "InstructionError": [0, "Custom"] }))
                } else {
                    None
                },
                fee: self.fee,
                pre_token_balances: Some(self.pre),
                post_token_balances: Some(self.post),
                ..RawMeta::default()
            }),
        }
    }
}

/// Jupiter route where `wallet` spends 1.5 SOL for 1,000,000 units of `mint`.
pub fn jupiter_buy(signature: &str, wallet: &str, mint: &str) -> RawTransaction {
    TxBuilder::new(signature)
        .fee_payer(wallet)
        .program(JUPITER_V6)
        .pre(balance(1, SOL_MINT, wallet, "2000000000", 9))
        .post(balance(1, SOL_MINT, wallet, "500000000", 9))
        .pre(balance(2, mint, wallet, "0", 6))
        .post(balance(2, mint, wallet, "1000000000000", 6))
        .build()
}

/// Jupiter route where `wallet` sells 250.5 units of `mint` for 12.25 USDC.
pub fn jupiter_sell(signature: &str, wallet: &str, mint: &str) -> RawTransaction {
    TxBuilder::new(signature)
        .fee_payer(wallet)
        .program(JUPITER_V6)
        .pre(balance(1, mint, wallet, "250500000", 6))
        .post(balance(1, mint, wallet, "0", 6))
        .pre(balance(2, USDC_MINT, wallet, "0", 6))
        .post(balance(2, USDC_MINT, wallet, "12250000", 6))
        .build()
}

/// Jupiter route between two funding tokens (SOL -> USDC).
pub fn jupiter_known_swap(signature: &str, wallet: &str) -> RawTransaction {
    TxBuilder::new(signature)
        .fee_payer(wallet)
        .program(JUPITER_V6)
        .pre(balance(1, SOL_MINT, wallet, "1000000000", 9))
        .post(balance(1, SOL_MINT, wallet, "0", 9))
        .pre(balance(2, USDC_MINT, wallet, "0", 6))
        .post(balance(2, USDC_MINT, wallet, "150000000", 6))
        .build()
}

pub fn system_transfer(signature: &str, wallet: &str) -> RawTransaction {
    TxBuilder::new(signature)
        .fee_payer(wallet)
        .program(SYSTEM_PROGRAM)
        .build()
}

pub fn meteora_lp(signature: &str, wallet: &str) -> RawTransaction {
    TxBuilder::new(signature)
        .fee_payer(wallet)
        .program(METEORA_DLMM)
        .build()
}
