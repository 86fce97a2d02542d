//! Configuration for the ingestion side
//!
//! Loaded from environment variables (optionally via a `.env` file). The
//! `get_env_*` helpers take a lookup function so tests can supply a map
//! instead of mutating the process environment.

use std::collections::HashMap;
use std::env;
use std::str::FromStr;

use anyhow::{bail, Result};
use tokio::time::Duration;

use crate::error::ParserError;
use crate::history::{validate_wallet, DEFAULT_TX_COUNT};
use crate::stream::{BatcherConfig, PipelineConfig};
use crate::wallet_registry::{wallets_by_category, WalletSelection};

pub const DEFAULT_COMMITMENT: &str = "confirmed";
const COMMITMENT_LEVELS: [&str; 3] = ["processed", "confirmed", "finalized"];

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub rpc: RpcConfig,
    pub stream: StreamConfig,
    pub default_tx_count: usize,
    pub example_wallet: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RpcConfig {
    pub rpc_url: String,
    pub ws_url: String,
    pub commitment: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StreamConfig {
    pub wallets: Vec<String>,
    pub selection: Option<WalletSelection>,
    pub batch_size: usize,
    pub flush_interval_ms: u64,
    pub max_tracked_signatures: usize,
}

impl StreamConfig {
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            wallets: self.wallets.clone(),
            batcher: BatcherConfig {
                batch_size: self.batch_size,
                flush_interval: Duration::from_millis(self.flush_interval_ms),
            },
            max_tracked_signatures: self.max_tracked_signatures,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_map(values: &HashMap<String, String>) -> Result<Self> {
        Self::from_lookup(|key| values.get(key).cloned())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let rpc_url = get_env_required(&lookup, "HELIUS_RPC_URL")?;
        let ws_url = get_env_optional(&lookup, "HELIUS_WS_URL").unwrap_or_else(|| derive_ws_url(&rpc_url));

        let explicit_wallets: Vec<String> = get_env_optional(&lookup, "WATCHED_WALLETS")
            .map(|list| {
                list.split(',')
                    .map(str::trim)
                    .filter(|wallet| !wallet.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        let (wallets, selection) = if explicit_wallets.is_empty() {
            let selection: WalletSelection = get_env_parsed(&lookup, "WATCHED_WALLET_CATEGORY", WalletSelection::All)?;
            (wallets_by_category(selection), Some(selection))
        } else {
            (explicit_wallets, None)
        };

        let config = AppConfig {
            rpc: RpcConfig {
                rpc_url,
                ws_url,
                commitment: get_env_string(&lookup, "DEFAULT_COMMITMENT", DEFAULT_COMMITMENT),
            },
            stream: StreamConfig {
                wallets,
                selection,
                batch_size: get_env_parsed(&lookup, "STREAM_SUMMARY_BATCH_SIZE", 10usize)?,
                flush_interval_ms: get_env_parsed(&lookup, "STREAM_FLUSH_INTERVAL_MS", 60_000u64)?,
                max_tracked_signatures: get_env_parsed(&lookup, "STREAM_MAX_TRACKED_SIGNATURES", 1000usize)?,
            },
            default_tx_count: get_env_parsed(&lookup, "DEFAULT_TX_COUNT", DEFAULT_TX_COUNT)?,
            example_wallet: get_env_optional(&lookup, "EXAMPLE_WALLET"),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !COMMITMENT_LEVELS.contains(&self.rpc.commitment.as_str()) {
            bail!(
                "DEFAULT_COMMITMENT must be one of {:?}, got {}",
                COMMITMENT_LEVELS,
                self.rpc.commitment
            );
        }
        if self.stream.batch_size == 0 {
            bail!("STREAM_SUMMARY_BATCH_SIZE must be > 0");
        }
        if self.stream.flush_interval_ms == 0 {
            bail!("STREAM_FLUSH_INTERVAL_MS must be > 0");
        }
        if self.stream.max_tracked_signatures == 0 {
            bail!("STREAM_MAX_TRACKED_SIGNATURES must be > 0");
        }
        if self.default_tx_count == 0 {
            bail!("DEFAULT_TX_COUNT must be > 0");
        }
        for wallet in &self.stream.wallets {
            validate_wallet(wallet)?;
        }
        Ok(())
    }
}

/// `https://host` → `wss://host`, `http://host` → `ws://host`.
pub fn derive_ws_url(rpc_url: &str) -> String {
    if let Some(rest) = rpc_url.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = rpc_url.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        rpc_url.to_string()
    }
}

pub fn get_env_optional<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn get_env_required<F>(lookup: &F, key: &str) -> Result<String, ParserError>
where
    F: Fn(&str) -> Option<String>,
{
    get_env_optional(lookup, key).ok_or_else(|| ParserError::MissingConfig(key.to_string()))
}

pub fn get_env_string<F>(lookup: &F, key: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    get_env_optional(lookup, key).unwrap_or_else(|| default.to_string())
}

/// Unset means default; set but unparsable is an error.
pub fn get_env_parsed<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ParserError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match get_env_optional(lookup, key) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|_| ParserError::InvalidConfig {
            key: key.to_string(),
            value: raw,
        }),
    }
}

pub fn get_env_bool<F>(lookup: &F, key: &str, default: bool) -> Result<bool, ParserError>
where
    F: Fn(&str) -> Option<String>,
{
    match get_env_optional(lookup, key) {
        None => Ok(default),
        Some(raw) => match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ParserError::InvalidConfig {
                key: key.to_string(),
                value: raw,
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet_registry::WalletCategory;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_missing_rpc_url() {
        let err = AppConfig::from_map(&env(&[])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing HELIUS_RPC_URL. Define it in the root .env or process environment."
        );
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_map(&env(&[("HELIUS_RPC_URL", "https://rpc.example.com/?api-key=k")])).unwrap();

        assert_eq!(config.rpc.ws_url, "wss://rpc.example.com/?api-key=k");
        assert_eq!(config.rpc.commitment, "confirmed");
        assert_eq!(config.default_tx_count, 50);
        assert_eq!(config.stream.batch_size, 10);
        assert_eq!(config.stream.flush_interval_ms, 60_000);
        assert_eq!(config.stream.max_tracked_signatures, 1000);
        assert_eq!(config.stream.selection, Some(WalletSelection::All));
        assert!(!config.stream.wallets.is_empty());
        assert_eq!(config.example_wallet, None);
    }

    #[test]
    fn test_explicit_wallets_override_category() {
        let config = AppConfig::from_map(&env(&[
            ("HELIUS_RPC_URL", "http://localhost:8899"),
            (
                "WATCHED_WALLETS",
                " AVAZvHLR2PcWpDf8BXY4rVxNHYRBytycHkcB5z5QNXYm, ,5ZPczDuywV5GFwG6KnHjbj2eap9BBQZeyUUDwaFhRRmn",
            ),
            ("WATCHED_WALLET_CATEGORY", "whale"),
        ]))
        .unwrap();

        assert_eq!(config.rpc.ws_url, "ws://localhost:8899");
        assert_eq!(config.stream.wallets.len(), 2);
        assert_eq!(config.stream.selection, None);
    }

    #[test]
    fn test_category_selection() {
        let config = AppConfig::from_map(&env(&[
            ("HELIUS_RPC_URL", "http://localhost:8899"),
            ("WATCHED_WALLET_CATEGORY", "dlmm"),
        ]))
        .unwrap();

        assert_eq!(
            config.stream.selection,
            Some(WalletSelection::Category(WalletCategory::Dlmm))
        );
        assert_eq!(config.stream.wallets.len(), 2);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let bad_number = AppConfig::from_map(&env(&[
            ("HELIUS_RPC_URL", "http://localhost:8899"),
            ("STREAM_SUMMARY_BATCH_SIZE", "ten"),
        ]));
        assert_eq!(
            bad_number.unwrap_err().to_string(),
            "Invalid STREAM_SUMMARY_BATCH_SIZE: ten"
        );

        let zero = AppConfig::from_map(&env(&[
            ("HELIUS_RPC_URL", "http://localhost:8899"),
            ("STREAM_FLUSH_INTERVAL_MS", "0"),
        ]));
        assert!(zero.is_err());

        let commitment = AppConfig::from_map(&env(&[
            ("HELIUS_RPC_URL", "http://localhost:8899"),
            ("DEFAULT_COMMITMENT", "recent"),
        ]));
        assert!(commitment.is_err());

        let wallet = AppConfig::from_map(&env(&[
            ("HELIUS_RPC_URL", "http://localhost:8899"),
            ("WATCHED_WALLETS", "not-a-wallet"),
        ]));
        assert_eq!(wallet.unwrap_err().to_string(), "Invalid wallet address: not-a-wallet");
    }

    #[test]
    fn test_bool_helper() {
        let values = env(&[("A", "TRUE"), ("B", "off"), ("C", "maybe")]);
        let lookup = |key: &str| values.get(key).cloned();

        assert!(get_env_bool(&lookup, "A", false).unwrap());
        assert!(!get_env_bool(&lookup, "B", true).unwrap());
        assert!(get_env_bool(&lookup, "C", true).is_err());
        assert!(get_env_bool(&lookup, "D", true).unwrap());
    }

    #[test]
    fn test_pipeline_config_conversion() {
        let config = AppConfig::from_map(&env(&[
            ("HELIUS_RPC_URL", "http://localhost:8899"),
            ("STREAM_SUMMARY_BATCH_SIZE", "3"),
            ("STREAM_FLUSH_INTERVAL_MS", "1500"),
        ]))
        .unwrap();

        let pipeline = config.stream.pipeline_config();
        assert_eq!(pipeline.batcher.batch_size, 3);
        assert_eq!(pipeline.batcher.flush_interval, Duration::from_millis(1500));
        assert_eq!(pipeline.max_tracked_signatures, 1000);
    }
}
