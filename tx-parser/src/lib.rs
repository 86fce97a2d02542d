// Transaction parser - classification, streaming ingestion and wallet history
// for watched Solana wallets

pub mod config;
pub mod constants;
pub mod error;
#[cfg(any(test, feature = "test-util"))]
pub mod fixtures;
pub mod history;
pub mod parser;
pub mod rpc;
pub mod stream;
pub mod types;
pub mod wallet_registry;

pub use config::AppConfig;
pub use error::{LedgerError, ParserError};
pub use parser::{classify, parse_transaction, parse_transactions};
pub use rpc::{LedgerClient, SolanaLedgerClient};
pub use stream::{StreamPipeline, PipelineConfig};
pub use types::{Classification, ParsedTransaction, Protocol, RawTransaction, TransactionDetails, TransactionType};
pub use wallet_registry::{wallet_label, WalletCategory, WalletSelection};
