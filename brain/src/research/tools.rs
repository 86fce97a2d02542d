//! Research tool catalogue.
//!
//! The set of tools is closed: [`ResearchTool`] enumerates every variant,
//! each carrying its schema. Inputs are checked against the schema before
//! dispatch, then decoded into typed arguments.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use entity_memory::ids::now_millis;
use entity_memory::services::DEFAULT_MAX_AGE_MS;
use entity_memory::{
    CreateEntityInput, CreateRepresentationInput, EntityMemory, EntityMetadata, EntityType, ResearchFindings,
    ResearchSource, Sentiment,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::token_metadata::{TokenMetadataSource, JUPITER_TOKENS_SOURCE};
use crate::error::ToolError;
use crate::llm::ToolDefinition;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResearchTool {
    ResolveEntity,
    CreateEntity,
    AddRepresentation,
    CheckResearchFreshness,
    GetCachedResearch,
    StoreResearchResults,
    GetTokenMetadata,
}

impl ResearchTool {
    pub const ALL: [ResearchTool; 7] = [
        ResearchTool::ResolveEntity,
        ResearchTool::CreateEntity,
        ResearchTool::AddRepresentation,
        ResearchTool::CheckResearchFreshness,
        ResearchTool::GetCachedResearch,
        ResearchTool::StoreResearchResults,
        ResearchTool::GetTokenMetadata,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ResearchTool::ResolveEntity => "resolve_entity",
            ResearchTool::CreateEntity => "create_entity",
            ResearchTool::AddRepresentation => "add_representation",
            ResearchTool::CheckResearchFreshness => "check_research_freshness",
            ResearchTool::GetCachedResearch => "get_cached_research",
            ResearchTool::StoreResearchResults => "store_research_results",
            ResearchTool::GetTokenMetadata => "get_token_metadata",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ResearchTool::ResolveEntity => {
                "Resolve identifier (mint, slug, symbol, or name) to canonical entity. Returns best candidate."
            }
            ResearchTool::CreateEntity => "Create a new canonical entity when no match exists.",
            ResearchTool::AddRepresentation => "Add representation metadata (spot/perp/lp) to an existing entity.",
            ResearchTool::CheckResearchFreshness => "Check whether cached research exists and is fresh for an entity.",
            ResearchTool::GetCachedResearch => "Retrieve latest cached research for an entity.",
            ResearchTool::StoreResearchResults => {
                "Store research findings in memory and emit a research-completed event."
            }
            ResearchTool::GetTokenMetadata => {
                "Fetch SPL token metadata and market context by mint using Jupiter Tokens API V2."
            }
        }
    }

    pub fn input_schema(&self) -> Value {
        match self {
            ResearchTool::ResolveEntity => json!({
                "type": "object",
                "properties": { "identifier": { "type": "string" } },
                "required": ["identifier"],
                "additionalProperties": false,
            }),
            ResearchTool::CreateEntity => json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "symbol": { "type": "string" },
                    "type": {
                        "type": "string",
                        "enum": ["crypto-token", "macro-asset", "protocol", "person", "concept", "meme"],
                    },
                    "slug": { "type": "string" },
                    "metadata": { "type": "object" },
                },
                "required": ["name", "type"],
                "additionalProperties": true,
            }),
            ResearchTool::AddRepresentation => json!({
                "type": "object",
                "properties": {
                    "entityId": { "type": "string" },
                    "type": {
                        "type": "string",
                        "enum": ["spot-token", "perp-contract", "lp-pair", "lending", "staking"],
                    },
                    "protocol": { "type": "string" },
                    "chain": { "type": "string" },
                    "context": { "type": "object" },
                },
                "required": ["entityId", "type", "protocol", "context"],
                "additionalProperties": false,
            }),
            ResearchTool::CheckResearchFreshness => json!({
                "type": "object",
                "properties": {
                    "entityId": { "type": "string" },
                    "maxAgeMs": { "type": "number" },
                },
                "required": ["entityId"],
                "additionalProperties": false,
            }),
            ResearchTool::GetCachedResearch => json!({
                "type": "object",
                "properties": { "entityId": { "type": "string" } },
                "required": ["entityId"],
                "additionalProperties": false,
            }),
            ResearchTool::StoreResearchResults => json!({
                "type": "object",
                "properties": {
                    "entityId": { "type": "string" },
                    "findings": { "type": "object" },
                    "sources": { "type": "array" },
                    "ttl": { "type": "number" },
                },
                "required": ["entityId", "findings", "sources"],
                "additionalProperties": false,
            }),
            ResearchTool::GetTokenMetadata => json!({
                "type": "object",
                "properties": { "mint": { "type": "string" } },
                "required": ["mint"],
                "additionalProperties": false,
            }),
        }
    }

    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name(),
            description: self.description(),
            input_schema: self.input_schema(),
        }
    }

    /// Checks required keys, declared property types, enums and
    /// `additionalProperties: false`.
    pub fn validate(&self, input: &Map<String, Value>) -> Result<(), ToolError> {
        let schema = self.input_schema();
        let invalid = |reason: String| ToolError::InvalidInput {
            tool: self.name(),
            reason,
        };

        let required = schema["required"].as_array().cloned().unwrap_or_default();
        for key in required.iter().filter_map(Value::as_str) {
            if input.get(key).map_or(true, Value::is_null) {
                return Err(invalid(format!("missing required field '{}'", key)));
            }
        }

        let properties = schema["properties"].as_object().cloned().unwrap_or_default();
        let closed = schema["additionalProperties"] == Value::Bool(false);
        for (key, value) in input {
            let Some(property) = properties.get(key) else {
                if closed {
                    return Err(invalid(format!("unexpected field '{}'", key)));
                }
                continue;
            };
            if value.is_null() {
                continue;
            }

            let type_ok = match property["type"].as_str() {
                Some("string") => value.is_string(),
                Some("number") => value.is_number(),
                Some("object") => value.is_object(),
                Some("array") => value.is_array(),
                _ => true,
            };
            if !type_ok {
                return Err(invalid(format!("field '{}' must be a {}", key, property["type"])));
            }

            if let Some(allowed) = property["enum"].as_array() {
                if !allowed.contains(value) {
                    return Err(invalid(format!("field '{}' has unsupported value {}", key, value)));
                }
            }
        }
        Ok(())
    }

    fn decode<T: DeserializeOwned>(&self, input: &Map<String, Value>) -> Result<T, ToolError> {
        serde_json::from_value(Value::Object(input.clone())).map_err(|e| ToolError::InvalidInput {
            tool: self.name(),
            reason: e.to_string(),
        })
    }
}

impl fmt::Display for ResearchTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ResearchTool {
    type Err = ToolError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        ResearchTool::ALL
            .into_iter()
            .find(|tool| tool.name() == name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))
    }
}

#[derive(Deserialize)]
struct ResolveEntityArgs {
    identifier: String,
}

#[derive(Deserialize)]
struct CreateEntityArgs {
    name: String,
    #[serde(default)]
    symbol: Option<String>,
    #[serde(rename = "type")]
    entity_type: EntityType,
    #[serde(default)]
    slug: Option<String>,
    #[serde(default)]
    metadata: Option<EntityMetadata>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EntityIdArgs {
    entity_id: String,
    #[serde(default)]
    max_age_ms: Option<f64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FindingsArgs {
    summary: String,
    #[serde(default)]
    sentiment: Option<Sentiment>,
    confidence: f64,
    #[serde(default)]
    risks: Option<Vec<String>>,
    #[serde(default)]
    opportunities: Option<Vec<String>>,
    #[serde(default)]
    metadata: Option<Map<String, Value>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SourceArgs {
    tool: String,
    success: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    timestamp: Option<i64>,
    #[serde(default)]
    data_freshness: Option<i64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoreResearchArgs {
    entity_id: String,
    findings: FindingsArgs,
    sources: Vec<SourceArgs>,
    #[serde(default)]
    ttl: Option<f64>,
}

#[derive(Deserialize)]
struct TokenMetadataArgs {
    mint: String,
}

/// Rounds and clamps a model-supplied confidence into 0..=100.
pub fn clamp_confidence(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, 100.0) as u8
}

/// Executes catalogue tools against entity memory and the metadata source.
#[derive(Clone)]
pub struct ToolRegistry {
    memory: EntityMemory,
    metadata: Arc<dyn TokenMetadataSource>,
}

impl ToolRegistry {
    pub fn new(memory: EntityMemory, metadata: Arc<dyn TokenMetadataSource>) -> Self {
        Self { memory, metadata }
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        ResearchTool::ALL.iter().map(ResearchTool::definition).collect()
    }

    pub async fn execute(&self, name: &str, input: &Map<String, Value>) -> Result<Value, ToolError> {
        let tool: ResearchTool = name.parse()?;
        tool.validate(input)?;

        match tool {
            ResearchTool::ResolveEntity => {
                let args: ResolveEntityArgs = tool.decode(input)?;
                Ok(self.memory.entities.resolve_identifier(&args.identifier).to_json())
            }
            ResearchTool::CreateEntity => {
                let args: CreateEntityArgs = tool.decode(input)?;
                let entity = self.memory.entities.create_entity(CreateEntityInput {
                    slug: args.slug,
                    symbol: args.symbol,
                    metadata: args.metadata.unwrap_or_default(),
                    ..CreateEntityInput::new(args.name, args.entity_type)
                })?;
                Ok(json!({ "success": true, "entity": entity }))
            }
            ResearchTool::AddRepresentation => {
                let args: CreateRepresentationInput = tool.decode(input)?;
                let representation = self.memory.entities.add_representation(args)?;
                Ok(json!({ "success": true, "representation": representation }))
            }
            ResearchTool::CheckResearchFreshness => {
                let args: EntityIdArgs = tool.decode(input)?;
                let max_age_ms = args.max_age_ms.map_or(DEFAULT_MAX_AGE_MS, |ms| ms.max(0.0) as i64);
                let freshness = self.memory.research.check_research_freshness(&args.entity_id, max_age_ms);
                Ok(json!(freshness))
            }
            ResearchTool::GetCachedResearch => {
                let args: EntityIdArgs = tool.decode(input)?;
                Ok(match self.memory.research.get_cached_research(&args.entity_id) {
                    Some(research) => json!({ "found": true, "research": research }),
                    None => json!({ "found": false }),
                })
            }
            ResearchTool::StoreResearchResults => {
                let args: StoreResearchArgs = tool.decode(input)?;
                let now = now_millis();
                let findings = ResearchFindings {
                    summary: args.findings.summary,
                    sentiment: args.findings.sentiment,
                    confidence: clamp_confidence(args.findings.confidence),
                    risks: args.findings.risks.unwrap_or_default(),
                    opportunities: args.findings.opportunities.unwrap_or_default(),
                    metadata: args.findings.metadata.unwrap_or_default(),
                };
                let sources = args
                    .sources
                    .into_iter()
                    .map(|source| ResearchSource {
                        tool: source.tool,
                        timestamp: source.timestamp.unwrap_or(now),
                        data_freshness: source.data_freshness,
                        success: source.success,
                        error: source.error,
                    })
                    .collect();
                let ttl = args.ttl.map(|ttl| ttl.max(0.0) as u64);

                let completed = self
                    .memory
                    .research
                    .complete_research(&args.entity_id, findings, sources, ttl)?;
                Ok(json!({
                    "success": true,
                    "researchId": completed.record.id,
                    "dataCompleteness": completed.data_completeness,
                }))
            }
            ResearchTool::GetTokenMetadata => {
                let args: TokenMetadataArgs = tool.decode(input)?;
                Ok(match self.metadata.get_token_by_mint(&args.mint).await? {
                    Some(token) => json!({ "found": true, "mint": token.mint, "token": token }),
                    None => json!({ "found": false, "mint": args.mint.trim(), "source": JUPITER_TOKENS_SOURCE }),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::research::token_metadata::{StaticTokenMetadata, TokenMetadata};

    const BONK: &str = "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263";

    fn args(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("args must be an object"),
        }
    }

    fn registry() -> (ToolRegistry, EntityMemory, Arc<StaticTokenMetadata>) {
        let memory = EntityMemory::with_seeds().unwrap();
        let metadata = Arc::new(StaticTokenMetadata::new());
        (ToolRegistry::new(memory.clone(), metadata.clone()), memory, metadata)
    }

    #[test]
    fn test_catalogue_is_closed_and_named() {
        let names: Vec<_> = ResearchTool::ALL.iter().map(ResearchTool::name).collect();
        assert_eq!(
            names,
            vec![
                "resolve_entity",
                "create_entity",
                "add_representation",
                "check_research_freshness",
                "get_cached_research",
                "store_research_results",
                "get_token_metadata",
            ]
        );
        for tool in ResearchTool::ALL {
            assert_eq!(tool.name().parse::<ResearchTool>().unwrap(), tool);
            assert_eq!(tool.definition().input_schema["type"], "object");
        }
        assert!(matches!("delete_everything".parse::<ResearchTool>(), Err(ToolError::UnknownTool(_))));
    }

    #[test]
    fn test_schema_validation() {
        let tool = ResearchTool::AddRepresentation;
        let missing = tool.validate(&args(json!({ "entityId": "e", "type": "spot-token", "protocol": "x" })));
        assert_eq!(
            missing.unwrap_err().to_string(),
            "Invalid input for add_representation: missing required field 'context'"
        );

        let bad_enum = tool.validate(&args(json!({
            "entityId": "e", "type": "futures", "protocol": "x", "context": {}
        })));
        assert!(bad_enum.is_err());

        let extra = tool.validate(&args(json!({
            "entityId": "e", "type": "lp-pair", "protocol": "x", "context": {}, "active": true
        })));
        assert!(extra.unwrap_err().to_string().contains("unexpected field 'active'"));

        let wrong_type = ResearchTool::CheckResearchFreshness.validate(&args(json!({ "entityId": 7 })));
        assert!(wrong_type.is_err());

        // create_entity accepts extra keys
        assert!(ResearchTool::CreateEntity
            .validate(&args(json!({ "name": "X", "type": "meme", "website": "x.io" })))
            .is_ok());
    }

    #[tokio::test]
    async fn test_unknown_tool_is_typed_error() {
        let (registry, _, _) = registry();
        let err = registry.execute("launch_rocket", &Map::new()).await.unwrap_err();
        assert_eq!(err.to_string(), "Unknown tool: launch_rocket");
    }

    #[tokio::test]
    async fn test_entity_tools_round_trip() {
        let (registry, memory, _) = registry();

        let resolved = registry
            .execute("resolve_entity", &args(json!({ "identifier": "solana" })))
            .await
            .unwrap();
        assert_eq!(resolved["entity"]["slug"], "solana");

        let created = registry
            .execute(
                "create_entity",
                &args(json!({ "name": "Bonk", "symbol": "bonk", "type": "meme", "metadata": { "category": ["dog"] } })),
            )
            .await
            .unwrap();
        assert_eq!(created["success"], true);
        assert_eq!(created["entity"]["symbol"], "BONK");
        assert_eq!(created["entity"]["metadata"]["category"], json!(["dog"]));
        let entity_id = created["entity"]["id"].as_str().unwrap().to_string();

        let representation = json!({
            "entityId": entity_id, "type": "spot-token", "protocol": "unknown", "chain": "solana",
            "context": { "mint": BONK }
        });
        let added = registry
            .execute("add_representation", &args(representation.clone()))
            .await
            .unwrap();
        assert_eq!(added["representation"]["context"]["mint"], BONK);

        let duplicate = registry.execute("add_representation", &args(representation)).await;
        assert!(matches!(duplicate, Err(ToolError::Memory(_))));

        let by_mint = memory.entities.resolve_identifier(BONK);
        assert_eq!(by_mint.entity().unwrap().id, entity_id);
    }

    #[tokio::test]
    async fn test_memory_tools() {
        let (registry, memory, _) = registry();
        let sol = memory.entities.resolve_identifier("solana").into_entity().unwrap();

        let cached = registry
            .execute("get_cached_research", &args(json!({ "entityId": sol.id })))
            .await
            .unwrap();
        assert_eq!(cached, json!({ "found": false }));

        let stored = registry
            .execute(
                "store_research_results",
                &args(json!({
                    "entityId": sol.id,
                    "findings": { "summary": "L1", "sentiment": "bullish", "confidence": 87.6 },
                    "sources": [
                        { "tool": "get_token_metadata", "success": true },
                        { "tool": "resolve_entity", "success": true },
                        { "tool": "news", "success": false, "error": "timeout" },
                    ],
                    "ttl": 1,
                })),
            )
            .await
            .unwrap();
        assert_eq!(stored["success"], true);
        assert_eq!(stored["dataCompleteness"], 67);

        let research = memory.research.get_cached_research(&sol.id).unwrap();
        assert_eq!(stored["researchId"], research.id.as_str());
        assert_eq!(research.findings.confidence, 88);
        assert_eq!(research.ttl, 300);
        assert!(research.sources.iter().all(|source| source.timestamp > 0));

        let freshness = registry
            .execute("check_research_freshness", &args(json!({ "entityId": sol.id })))
            .await
            .unwrap();
        assert_eq!(freshness["exists"], true);
        assert_eq!(freshness["fresh"], true);

        let missing = registry
            .execute(
                "store_research_results",
                &args(json!({ "entityId": "nope", "findings": { "summary": "s", "confidence": 1 }, "sources": [] })),
            )
            .await;
        assert!(matches!(missing, Err(ToolError::Memory(_))));
    }

    #[tokio::test]
    async fn test_token_metadata_tool() {
        let (registry, _, metadata) = registry();
        let mut token = TokenMetadata::new(BONK);
        token.symbol = Some("Bonk".to_string());
        metadata.insert(token);

        let found = registry
            .execute("get_token_metadata", &args(json!({ "mint": BONK })))
            .await
            .unwrap();
        assert_eq!(found["found"], true);
        assert_eq!(found["token"]["symbol"], "Bonk");

        let unknown = "7GCihgDB8fe6KNjn2MYtkzZcRjQy3t9GHdC8uHYmW2hr";
        let absent = registry
            .execute("get_token_metadata", &args(json!({ "mint": format!(" {} ", unknown) })))
            .await
            .unwrap();
        assert_eq!(absent, json!({ "found": false, "mint": unknown, "source": "jupiter-tokens-v2" }));

        let invalid = registry.execute("get_token_metadata", &args(json!({ "mint": "BONK" }))).await;
        assert!(matches!(invalid, Err(ToolError::Metadata(_))));
    }

    #[test]
    fn test_clamp_confidence() {
        assert_eq!(clamp_confidence(-4.0), 0);
        assert_eq!(clamp_confidence(49.5), 50);
        assert_eq!(clamp_confidence(150.0), 100);
        assert_eq!(clamp_confidence(f64::NAN), 0);
    }
}
