//! Persisted entity-memory records.
//!
//! Every record serializes camelCase with kebab-case enum tags so the JSON
//! handed to tools and audit logs matches the wire shape consumers expect.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityType {
    CryptoToken,
    MacroAsset,
    Protocol,
    Person,
    Concept,
    Meme,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::CryptoToken => "crypto-token",
            EntityType::MacroAsset => "macro-asset",
            EntityType::Protocol => "protocol",
            EntityType::Person => "person",
            EntityType::Concept => "concept",
            EntityType::Meme => "meme",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RepresentationType {
    SpotToken,
    PerpContract,
    LpPair,
    Lending,
    Staking,
    Futures,
    Option,
}

impl RepresentationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RepresentationType::SpotToken => "spot-token",
            RepresentationType::PerpContract => "perp-contract",
            RepresentationType::LpPair => "lp-pair",
            RepresentationType::Lending => "lending",
            RepresentationType::Staking => "staking",
            RepresentationType::Futures => "futures",
            RepresentationType::Option => "option",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventType {
    Trade,
    LpActivity,
    PerpTrade,
    News,
    Social,
    ProtocolEvent,
    PriceMovement,
    VolumeSpike,
    FeeSpike,
    WhaleActivity,
    Listing,
    Partnership,
    ResearchCompleted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Bullish,
    Bearish,
    Neutral,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verifier {
    Team,
    Community,
    Auto,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelationshipType {
    ListedOn,
    IntegratedWith,
    CompetesWith,
    Founder,
    Partner,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRelationship {
    #[serde(rename = "type")]
    pub kind: RelationshipType,
    pub target_entity_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub since: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Socials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discord: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telegram: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

/// Known metadata fields plus arbitrary extra keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub socials: Option<Socials>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationships: Option<Vec<EntityRelationship>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EntityMetadata {
    pub fn with_category<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            category: categories.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Shallow merge: set fields in `other` win, extra keys are overlaid.
    pub fn merge(&mut self, other: EntityMetadata) {
        if other.description.is_some() {
            self.description = other.description;
        }
        if !other.category.is_empty() {
            self.category = other.category;
        }
        if other.tags.is_some() {
            self.tags = other.tags;
        }
        if other.socials.is_some() {
            self.socials = other.socials;
        }
        if other.relationships.is_some() {
            self.relationships = other.relationships;
        }
        self.extra.extend(other.extra);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub id: String,
    pub slug: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified_by: Option<Verifier>,
    pub metadata: EntityMetadata,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepresentationContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pair: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pool_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl RepresentationContext {
    pub fn mint(mint: impl Into<String>) -> Self {
        Self {
            mint: Some(mint.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Representation {
    pub id: String,
    pub entity_id: String,
    #[serde(rename = "type")]
    pub representation_type: RepresentationType,
    pub protocol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain: Option<String>,
    pub context: RepresentationContext,
    pub active: bool,
    pub discovered_at: i64,
    pub last_seen_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventSourceType {
    Transaction,
    News,
    Social,
    Protocol,
    Price,
    Manual,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSource {
    #[serde(rename = "type")]
    pub source_type: EventSourceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityEvent {
    pub id: String,
    pub entity_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_entity_ids: Option<Vec<String>>,
    pub timestamp: i64,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub representation_id: Option<String>,
    pub data: Map<String, Value>,
    pub source: EventSource,
    /// 0 to 10.
    pub importance: u8,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchSource {
    pub tool: String,
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_freshness: Option<i64>,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResearchSource {
    pub fn succeeded(tool: impl Into<String>, timestamp: i64) -> Self {
        Self {
            tool: tool.into(),
            timestamp,
            data_freshness: None,
            success: true,
            error: None,
        }
    }

    pub fn failed(tool: impl Into<String>, timestamp: i64, error: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            timestamp,
            data_freshness: None,
            success: false,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchFindings {
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<Sentiment>,
    /// 0 to 100.
    pub confidence: u8,
    #[serde(default)]
    pub risks: Vec<String>,
    #[serde(default)]
    pub opportunities: Vec<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityResearch {
    pub id: String,
    pub entity_id: String,
    pub timestamp: i64,
    /// Seconds.
    pub ttl: u64,
    pub expires_at: i64,
    pub findings: ResearchFindings,
    pub sources: Vec<ResearchSource>,
    pub created_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Immediate,
    High,
    Medium,
    Low,
}

/// Read model handed to downstream consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchResult {
    pub entity_id: String,
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    pub summary: String,
    pub sentiment: Sentiment,
    pub confidence: u8,
    pub risk_score: u8,
    pub risks: Vec<String>,
    pub opportunities: Vec<String>,
    pub urgency: Urgency,
    pub tradeable: bool,
    pub data_completeness: u8,
    pub sources: Vec<ResearchSource>,
    pub representations: Vec<Representation>,
    pub recent_events: Vec<EntityEvent>,
    pub timestamp: i64,
    pub expires_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEntityInput {
    /// Used verbatim when set; derived from `name` and made unique otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    #[serde(default)]
    pub verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified_by: Option<Verifier>,
    #[serde(default)]
    pub metadata: EntityMetadata,
}

impl CreateEntityInput {
    pub fn new(name: impl Into<String>, entity_type: EntityType) -> Self {
        Self {
            slug: None,
            name: name.into(),
            symbol: None,
            entity_type,
            verified: false,
            verified_by: None,
            metadata: EntityMetadata::default(),
        }
    }
}

/// Partial update; `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityUpdate {
    pub slug: Option<String>,
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub entity_type: Option<EntityType>,
    pub verified: Option<bool>,
    pub verified_by: Option<Verifier>,
    pub metadata: Option<EntityMetadata>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRepresentationInput {
    pub entity_id: String,
    #[serde(rename = "type")]
    pub representation_type: RepresentationType,
    pub protocol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain: Option<String>,
    #[serde(default)]
    pub context: RepresentationContext,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateEntityEventInput {
    pub entity_id: String,
    pub related_entity_ids: Option<Vec<String>>,
    pub timestamp: i64,
    pub event_type: EventType,
    pub summary: String,
    pub representation_id: Option<String>,
    pub data: Map<String, Value>,
    pub source: EventSource,
    /// Defaults to 5.
    pub importance: Option<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateResearchInput {
    pub entity_id: String,
    pub findings: ResearchFindings,
    pub sources: Vec<ResearchSource>,
    pub ttl: u64,
    pub timestamp: Option<i64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreshnessResult {
    pub exists: bool,
    pub fresh: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entity_wire_shape() {
        let entity = Entity {
            id: "id-1".to_string(),
            slug: "solana".to_string(),
            name: "Solana".to_string(),
            symbol: Some("SOL".to_string()),
            entity_type: EntityType::CryptoToken,
            verified: true,
            verified_by: Some(Verifier::Community),
            metadata: EntityMetadata::with_category(["layer1"]),
            created_at: 1,
            updated_at: 2,
        };

        let value = serde_json::to_value(&entity).unwrap();
        assert_eq!(value["type"], "crypto-token");
        assert_eq!(value["verifiedBy"], "community");
        assert_eq!(value["metadata"]["category"], json!(["layer1"]));
        assert_eq!(value["createdAt"], 1);
    }

    #[test]
    fn test_metadata_keeps_extra_keys() {
        let metadata: EntityMetadata = serde_json::from_value(json!({
            "category": ["unverified"],
            "tags": ["pending-verification"],
            "mint": "abc",
            "tokenMetadata": { "symbol": "WIF" }
        }))
        .unwrap();

        assert_eq!(metadata.category, vec!["unverified"]);
        assert_eq!(metadata.extra["mint"], "abc");
        assert_eq!(metadata.extra["tokenMetadata"]["symbol"], "WIF");

        let round = serde_json::to_value(&metadata).unwrap();
        assert_eq!(round["mint"], "abc");
    }

    #[test]
    fn test_metadata_merge() {
        let mut base = EntityMetadata::with_category(["dex"]);
        base.extra.insert("liquidity".to_string(), json!(10));

        let mut update = EntityMetadata::default();
        update.description = Some("aggregator".to_string());
        update.extra.insert("liquidity".to_string(), json!(20));
        base.merge(update);

        assert_eq!(base.category, vec!["dex"]);
        assert_eq!(base.description.as_deref(), Some("aggregator"));
        assert_eq!(base.extra["liquidity"], 20);
    }
}
