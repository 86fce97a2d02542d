//! Token metadata source (Jupiter Tokens API V2).

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use parking_lot::Mutex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::MetadataError;

pub const JUPITER_TOKENS_SEARCH_URL: &str = "https://api.jup.ag/tokens/v2/search";
pub const JUPITER_TOKENS_SOURCE: &str = "jupiter-tokens-v2";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenMetadata {
    pub mint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimals: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub holder_count: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organic_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_verified: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usd_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liquidity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fdv: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    pub source: String,
}

impl TokenMetadata {
    pub fn new(mint: impl Into<String>) -> Self {
        Self {
            mint: mint.into(),
            name: None,
            symbol: None,
            icon: None,
            decimals: None,
            holder_count: None,
            organic_score: None,
            is_verified: None,
            tags: None,
            usd_price: None,
            liquidity: None,
            market_cap: None,
            fdv: None,
            updated_at: None,
            source: JUPITER_TOKENS_SOURCE.to_string(),
        }
    }

    /// `None` when the item has no usable `id`.
    pub fn from_jupiter(raw: &Value) -> Option<Self> {
        let mint = as_string(raw.get("id"))?;
        Some(Self {
            name: as_string(raw.get("name")),
            symbol: as_string(raw.get("symbol")),
            icon: as_string(raw.get("icon")),
            decimals: as_number(raw.get("decimals")),
            holder_count: as_number(raw.get("holderCount")),
            organic_score: as_number(raw.get("organicScore")),
            is_verified: raw.get("isVerified").and_then(Value::as_bool),
            tags: as_string_list(raw.get("tags")),
            usd_price: as_number(raw.get("usdPrice")),
            liquidity: as_number(raw.get("liquidity")),
            market_cap: as_number(raw.get("mcap")),
            fdv: as_number(raw.get("fdv")),
            updated_at: as_string(raw.get("updatedAt")),
            ..Self::new(mint)
        })
    }
}

fn as_string(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

fn as_number(value: Option<&Value>) -> Option<f64> {
    value.and_then(Value::as_f64).filter(|n| n.is_finite())
}

fn as_string_list(value: Option<&Value>) -> Option<Vec<String>> {
    let items: Vec<String> = value?
        .as_array()?
        .iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();
    (!items.is_empty()).then_some(items)
}

/// Base58 that decodes to a 32-byte key.
pub fn is_valid_mint(mint: &str) -> bool {
    entity_memory::ids::is_mint_shaped(mint)
        && bs58::decode(mint)
            .into_vec()
            .map(|bytes| bytes.len() == 32)
            .unwrap_or(false)
}

/// Candidate list from any of the response shapes the API has used.
fn extract_items(payload: Value) -> Vec<Value> {
    match payload {
        Value::Array(items) => items,
        Value::Object(mut object) => ["data", "tokens"]
            .iter()
            .find_map(|key| match object.remove(*key) {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            })
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

/// Exact `id` match wins, otherwise the first candidate.
pub fn select_token(payload: Value, mint: &str) -> Option<TokenMetadata> {
    let items = extract_items(payload);
    let chosen = items
        .iter()
        .find(|item| as_string(item.get("id")).as_deref() == Some(mint))
        .or_else(|| items.first())?;
    TokenMetadata::from_jupiter(chosen)
}

#[async_trait]
pub trait TokenMetadataSource: Send + Sync {
    async fn get_token_by_mint(&self, mint: &str) -> Result<Option<TokenMetadata>, MetadataError>;
}

pub struct JupiterTokensClient {
    client: Client,
    api_key: Option<String>,
    url: String,
}

impl JupiterTokensClient {
    pub fn new(api_key: Option<String>, timeout: Duration) -> Result<Self, MetadataError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            api_key,
            url: JUPITER_TOKENS_SEARCH_URL.to_string(),
        })
    }
}

#[async_trait]
impl TokenMetadataSource for JupiterTokensClient {
    async fn get_token_by_mint(&self, mint: &str) -> Result<Option<TokenMetadata>, MetadataError> {
        let mint = mint.trim();
        if !is_valid_mint(mint) {
            return Err(MetadataError::InvalidMint(mint.to_string()));
        }

        let mut request = self
            .client
            .get(&self.url)
            .query(&[("query", mint)])
            .header("Accept", "application/json");
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MetadataError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let payload: Value = response.json().await?;
        let token = select_token(payload, mint);
        debug!("🔎 Jupiter lookup {}: {}", mint, if token.is_some() { "found" } else { "not found" });
        Ok(token)
    }
}

/// Fixed in-memory catalogue for tests and offline replays. Unknown mints
/// resolve to `None`; mints marked failing return a request error.
#[derive(Default)]
pub struct StaticTokenMetadata {
    tokens: Mutex<HashMap<String, TokenMetadata>>,
    failing: Mutex<Vec<String>>,
    lookups: Mutex<Vec<String>>,
}

impl StaticTokenMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, token: TokenMetadata) -> &Self {
        self.tokens.lock().insert(token.mint.clone(), token);
        self
    }

    pub fn fail(&self, mint: &str) -> &Self {
        self.failing.lock().push(mint.to_string());
        self
    }

    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().clone()
    }
}

#[async_trait]
impl TokenMetadataSource for StaticTokenMetadata {
    async fn get_token_by_mint(&self, mint: &str) -> Result<Option<TokenMetadata>, MetadataError> {
        let mint = mint.trim();
        self.lookups.lock().push(mint.to_string());
        if !is_valid_mint(mint) {
            return Err(MetadataError::InvalidMint(mint.to_string()));
        }
        if self.failing.lock().iter().any(|failing| failing == mint) {
            return Err(MetadataError::Request(format!("lookup failed for {}", mint)));
        }
        Ok(self.tokens.lock().get(mint).cloned())
    }
}
