//! Entity resolution and creation.
//!
//! Resolution order for an identifier:
//! 1. mint-shaped: exact representation lookup, never fuzzy
//! 2. exact slug
//! 3. symbol (verified first, then highest researched liquidity)
//! 4. case-insensitive name substring

use std::sync::Arc;

use log::{debug, info};
use serde::ser::{Serialize, SerializeStruct, Serializer};
use serde_json::{json, Value};

use crate::error::{MemoryError, MemoryResult};
use crate::ids::{is_mint_shaped, slugify, time_suffix};
use crate::repositories::{EntityRepository, EntitySearchFilters, RepresentationRepository, ResearchRepository};
use crate::types::{
    CreateEntityInput, CreateRepresentationInput, Entity, EntityMetadata, EntityType, Representation,
};

const FALLBACK_SLUG: &str = "entity";

/// Outcome of [`EntityService::resolve_identifier`].
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Found {
        entity: Entity,
        representation: Option<Representation>,
    },
    /// Several entities matched; `entity` is the one picked automatically.
    Ambiguous {
        entity: Entity,
        candidates: Vec<Entity>,
        message: String,
    },
    NotFound {
        message: String,
    },
}

impl Resolution {
    pub fn entity(&self) -> Option<&Entity> {
        match self {
            Resolution::Found { entity, .. } | Resolution::Ambiguous { entity, .. } => Some(entity),
            Resolution::NotFound { .. } => None,
        }
    }

    pub fn into_entity(self) -> Option<Entity> {
        match self {
            Resolution::Found { entity, .. } | Resolution::Ambiguous { entity, .. } => Some(entity),
            Resolution::NotFound { .. } => None,
        }
    }

    pub fn is_found(&self) -> bool {
        self.entity().is_some()
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| json!({ "entity": null }))
    }

    fn not_found(message: &str) -> Self {
        Resolution::NotFound {
            message: message.to_string(),
        }
    }
}

/// `{entity, representation?, candidates?, message?}` with `entity: null`
/// when nothing matched.
impl Serialize for Resolution {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Resolution::Found { entity, representation } => {
                let mut state = serializer.serialize_struct("Resolution", 2)?;
                state.serialize_field("entity", entity)?;
                if let Some(representation) = representation {
                    state.serialize_field("representation", representation)?;
                } else {
                    state.skip_field("representation")?;
                }
                state.end()
            }
            Resolution::Ambiguous {
                entity,
                candidates,
                message,
            } => {
                let mut state = serializer.serialize_struct("Resolution", 3)?;
                state.serialize_field("entity", entity)?;
                state.serialize_field("candidates", candidates)?;
                state.serialize_field("message", message)?;
                state.end()
            }
            Resolution::NotFound { message } => {
                let mut state = serializer.serialize_struct("Resolution", 2)?;
                state.serialize_field("entity", &Option::<Entity>::None)?;
                state.serialize_field("message", message)?;
                state.end()
            }
        }
    }
}

/// Someone claims a token exists; nothing verifies it yet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnverifiedClaim {
    pub name: String,
    pub symbol: Option<String>,
    pub claimed_slug: Option<String>,
    pub mint: Option<String>,
    /// Defaults to meme.
    pub entity_type: Option<EntityType>,
}

#[derive(Clone)]
pub struct EntityService {
    entities: Arc<EntityRepository>,
    representations: Arc<RepresentationRepository>,
    research: Arc<ResearchRepository>,
}

impl EntityService {
    pub fn new(
        entities: Arc<EntityRepository>,
        representations: Arc<RepresentationRepository>,
        research: Arc<ResearchRepository>,
    ) -> Self {
        Self {
            entities,
            representations,
            research,
        }
    }

    pub fn resolve_identifier(&self, identifier: &str) -> Resolution {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Resolution::not_found("Empty identifier");
        }

        if is_mint_shaped(identifier) {
            let Some(representation) = self.representations.find_by_mint(identifier) else {
                return Resolution::not_found("Mint not found in memory");
            };
            return match self.entities.find_by_id(&representation.entity_id) {
                Some(entity) => Resolution::Found {
                    entity,
                    representation: Some(representation),
                },
                None => Resolution::not_found("Representation exists but entity is missing"),
            };
        }

        if let Some(entity) = self.entities.find_by_slug(&slugify(identifier)) {
            return Resolution::Found {
                entity,
                representation: None,
            };
        }

        let mut by_symbol = self.entities.find_by_symbol(identifier);
        if by_symbol.len() == 1 {
            return Resolution::Found {
                entity: by_symbol.remove(0),
                representation: None,
            };
        }
        if let Some(entity) = self.select_best_candidate(&by_symbol) {
            return Resolution::Ambiguous {
                entity,
                candidates: by_symbol,
                message: "Multiple entities found for symbol; selected best candidate automatically".to_string(),
            };
        }

        let mut by_name = self.entities.search_by_name(identifier);
        match by_name.len() {
            0 => Resolution::not_found("Entity not found"),
            1 => Resolution::Found {
                entity: by_name.remove(0),
                representation: None,
            },
            _ => Resolution::Ambiguous {
                entity: by_name[0].clone(),
                candidates: by_name,
                message: "Multiple entities found by name; returned first match".to_string(),
            },
        }
    }

    /// An explicit slug is used as-is and must be free. Without one the slug
    /// is derived from the name and suffixed `-2`, `-3`, ... until unique.
    pub fn create_entity(&self, mut input: CreateEntityInput) -> MemoryResult<Entity> {
        if let Some(slug) = input.slug.take() {
            let slug = slug.trim().to_string();
            return self.entities.create(slug, input);
        }

        let base = match slugify(&input.name) {
            slug if slug.is_empty() => FALLBACK_SLUG.to_string(),
            slug => slug,
        };
        self.create_with_unique_slug(&base, input)
    }

    pub fn create_unverified_entity_from_claim(&self, claim: UnverifiedClaim) -> MemoryResult<Entity> {
        let suffix = match &claim.mint {
            Some(mint) => mint.chars().take(6).collect::<String>().to_lowercase(),
            None => time_suffix(),
        };
        let base = slugify(&format!("{}-unverified-{}", claim.name, suffix));

        let mut metadata = EntityMetadata::with_category(["unverified"]);
        metadata.tags = Some(vec!["pending-verification".to_string()]);
        metadata.extra.insert(
            "claimedEntity".to_string(),
            claim.claimed_slug.map_or(Value::Null, Value::String),
        );
        metadata
            .extra
            .insert("mint".to_string(), claim.mint.map_or(Value::Null, Value::String));

        let input = CreateEntityInput {
            slug: None,
            name: format!("{} (unverified)", claim.name),
            symbol: claim.symbol,
            entity_type: claim.entity_type.unwrap_or(EntityType::Meme),
            verified: false,
            verified_by: None,
            metadata,
        };

        let entity = self.create_with_unique_slug(&base, input)?;
        info!("🆕 Unverified entity {} created from claim", entity.slug);
        Ok(entity)
    }

    pub fn add_representation(&self, input: CreateRepresentationInput) -> MemoryResult<Representation> {
        if self.entities.find_by_id(&input.entity_id).is_none() {
            return Err(MemoryError::EntityNotFound(input.entity_id));
        }
        self.representations.create(input)
    }

    pub fn get_entity(&self, entity_id: &str) -> Option<Entity> {
        self.entities.find_by_id(entity_id)
    }

    pub fn get_representations(&self, entity_id: &str, active_only: bool) -> Vec<Representation> {
        self.representations.find_many_by_entity_id(entity_id, active_only)
    }

    pub fn search_entities(&self, filters: &EntitySearchFilters) -> Vec<Entity> {
        self.entities.search(filters)
    }

    /// Another writer may take the slug between the check and the insert,
    /// so a duplicate on insert recomputes the suffix.
    fn create_with_unique_slug(&self, base: &str, input: CreateEntityInput) -> MemoryResult<Entity> {
        loop {
            let slug = self.unique_slug(base);
            match self.entities.create(slug, input.clone()) {
                Err(MemoryError::DuplicateSlug(taken)) => {
                    debug!("Slug {} taken concurrently, retrying", taken);
                }
                result => return result,
            }
        }
    }

    fn unique_slug(&self, base: &str) -> String {
        if !self.entities.slug_exists(base) {
            return base.to_string();
        }
        (2u64..)
            .map(|index| format!("{}-{}", base, index))
            .find(|candidate| !self.entities.slug_exists(candidate))
            .unwrap_or_else(|| format!("{}-{}", base, time_suffix()))
    }

    /// Verified first, else highest `liquidity` in the latest research
    /// metadata, else the first candidate.
    fn select_best_candidate(&self, candidates: &[Entity]) -> Option<Entity> {
        if let Some(verified) = candidates.iter().find(|candidate| candidate.verified) {
            return Some(verified.clone());
        }

        let mut best: Option<(&Entity, f64)> = None;
        for candidate in candidates {
            let liquidity = self
                .research
                .get_latest(&candidate.id)
                .and_then(|latest| latest.findings.metadata.get("liquidity").and_then(numeric))
                .unwrap_or(0.0);
            if best.map_or(true, |(_, top)| liquidity > top) {
                best = Some((candidate, liquidity));
            }
        }
        best.map(|(entity, _)| entity.clone())
    }
}

/// Numbers as-is, numeric strings parsed, anything else absent.
pub(crate) fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
    .filter(|number: &f64| number.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RepresentationContext, RepresentationType, ResearchFindings, Verifier};
    use crate::types::CreateResearchInput;
    use serde_json::Map;

    const MINT: &str = "7GCihgDB8fe6KNjn2MYtkzZcRjQy3t9GHdC8uHYmW2hr";

    fn service() -> (EntityService, Arc<ResearchRepository>) {
        let research = Arc::new(ResearchRepository::new());
        let service = EntityService::new(
            Arc::new(EntityRepository::new()),
            Arc::new(RepresentationRepository::new()),
            research.clone(),
        );
        (service, research)
    }

    fn token(name: &str, symbol: &str) -> CreateEntityInput {
        let mut input = CreateEntityInput::new(name, EntityType::CryptoToken);
        input.symbol = Some(symbol.to_string());
        input
    }

    fn spot(entity_id: &str, mint: &str) -> CreateRepresentationInput {
        CreateRepresentationInput {
            entity_id: entity_id.to_string(),
            representation_type: RepresentationType::SpotToken,
            protocol: "unknown".to_string(),
            chain: Some("solana".to_string()),
            context: RepresentationContext::mint(mint),
            active: None,
        }
    }

    #[test]
    fn test_derived_slugs_are_suffixed() {
        let (service, _) = service();
        let first = service.create_entity(token("Dog Wif Hat", "wif")).unwrap();
        let second = service.create_entity(token("dog wif hat!", "wif")).unwrap();
        let third = service.create_entity(token("DOG-WIF-HAT", "wif")).unwrap();

        assert_eq!(first.slug, "dog-wif-hat");
        assert_eq!(second.slug, "dog-wif-hat-2");
        assert_eq!(third.slug, "dog-wif-hat-3");
        assert_eq!(first.symbol.as_deref(), Some("WIF"));
    }

    #[test]
    fn test_explicit_slug_must_be_free() {
        let (service, _) = service();
        let mut input = token("Solana", "SOL");
        input.slug = Some("solana".to_string());
        service.create_entity(input.clone()).unwrap();

        assert_eq!(
            service.create_entity(input).unwrap_err(),
            MemoryError::DuplicateSlug("solana".to_string())
        );
        assert_eq!(service.create_entity(CreateEntityInput::new("???", EntityType::Concept)).unwrap().slug, "entity");
    }

    #[test]
    fn test_resolve_by_mint_is_exact() {
        let (service, _) = service();
        let entity = service.create_entity(token("Wif", "WIF")).unwrap();
        let representation = service.add_representation(spot(&entity.id, MINT)).unwrap();

        match service.resolve_identifier(&format!("  {} ", MINT)) {
            Resolution::Found {
                entity: found,
                representation: Some(rep),
            } => {
                assert_eq!(found.id, entity.id);
                assert_eq!(rep.id, representation.id);
            }
            other => panic!("unexpected resolution: {:?}", other),
        }

        let other_mint = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";
        assert_eq!(
            service.resolve_identifier(other_mint),
            Resolution::NotFound {
                message: "Mint not found in memory".to_string()
            }
        );
    }

    #[test]
    fn test_resolve_slug_symbol_then_name() {
        let (service, _) = service();
        let jupiter = service.create_entity(CreateEntityInput::new("Jupiter", EntityType::Protocol)).unwrap();
        let sol = service.create_entity(token("Solana", "SOL")).unwrap();

        assert_eq!(service.resolve_identifier("JUPITER").entity().unwrap().id, jupiter.id);
        assert_eq!(service.resolve_identifier("sol").entity().unwrap().id, sol.id);
        assert_eq!(service.resolve_identifier("olan").entity().unwrap().id, sol.id);
        assert!(!service.resolve_identifier("nothing here").is_found());
        assert_eq!(
            service.resolve_identifier("   "),
            Resolution::NotFound {
                message: "Empty identifier".to_string()
            }
        );
    }

    #[test]
    fn test_symbol_collision_prefers_verified_then_liquidity() {
        let (service, research) = service();
        let low = service.create_entity(token("Bonk Low", "BONK")).unwrap();
        let high = service.create_entity(token("Bonk High", "BONK")).unwrap();

        for (entity, liquidity) in [(&low, json!(10)), (&high, json!("2500.5"))] {
            let mut metadata = Map::new();
            metadata.insert("liquidity".to_string(), liquidity);
            research.create(CreateResearchInput {
                entity_id: entity.id.clone(),
                findings: ResearchFindings {
                    summary: "s".to_string(),
                    sentiment: None,
                    confidence: 50,
                    risks: vec![],
                    opportunities: vec![],
                    metadata,
                },
                sources: vec![],
                ttl: 600,
                timestamp: None,
            });
        }

        match service.resolve_identifier("bonk") {
            Resolution::Ambiguous { entity, candidates, .. } => {
                assert_eq!(entity.id, high.id);
                assert_eq!(candidates.len(), 2);
            }
            other => panic!("unexpected resolution: {:?}", other),
        }

        let mut verified = token("Bonk Real", "BONK");
        verified.verified = true;
        verified.verified_by = Some(Verifier::Team);
        let verified = service.create_entity(verified).unwrap();
        assert_eq!(service.resolve_identifier("BONK").entity().unwrap().id, verified.id);
    }

    #[test]
    fn test_name_collision_returns_first() {
        let (service, _) = service();
        let first = service.create_entity(CreateEntityInput::new("Pepe Classic", EntityType::Meme)).unwrap();
        service.create_entity(CreateEntityInput::new("Pepe Reborn", EntityType::Meme)).unwrap();

        let resolution = service.resolve_identifier("pepe");
        assert_eq!(resolution.entity().unwrap().id, first.id);
        let value = resolution.to_json();
        assert_eq!(value["message"], "Multiple entities found by name; returned first match");
        assert_eq!(value["candidates"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_unverified_claim() {
        let (service, _) = service();
        let entity = service
            .create_unverified_entity_from_claim(UnverifiedClaim {
                name: "Moon Cat".to_string(),
                symbol: Some("mcat".to_string()),
                claimed_slug: Some("mooncat".to_string()),
                mint: Some(MINT.to_string()),
                entity_type: None,
            })
            .unwrap();

        assert_eq!(entity.slug, "moon-cat-unverified-7gcihg");
        assert_eq!(entity.name, "Moon Cat (unverified)");
        assert_eq!(entity.entity_type, EntityType::Meme);
        assert!(!entity.verified);
        assert_eq!(entity.metadata.category, vec!["unverified"]);
        assert_eq!(entity.metadata.tags, Some(vec!["pending-verification".to_string()]));
        assert_eq!(entity.metadata.extra["claimedEntity"], "mooncat");
        assert_eq!(entity.metadata.extra["mint"], MINT);

        let again = service
            .create_unverified_entity_from_claim(UnverifiedClaim {
                name: "Moon Cat".to_string(),
                mint: Some(MINT.to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(again.slug, "moon-cat-unverified-7gcihg-2");
    }

    #[test]
    fn test_add_representation_requires_entity() {
        let (service, _) = service();
        assert_eq!(
            service.add_representation(spot("missing", MINT)).unwrap_err(),
            MemoryError::EntityNotFound("missing".to_string())
        );

        let entity = service.create_entity(token("Wif", "WIF")).unwrap();
        service.add_representation(spot(&entity.id, MINT)).unwrap();
        assert!(service.add_representation(spot(&entity.id, MINT)).is_err());
        assert_eq!(service.get_representations(&entity.id, true).len(), 1);
    }

    #[test]
    fn test_numeric_metadata() {
        assert_eq!(numeric(&json!(3)), Some(3.0));
        assert_eq!(numeric(&json!(" 4.5 ")), Some(4.5));
        assert_eq!(numeric(&json!("n/a")), None);
        assert_eq!(numeric(&json!(null)), None);
    }
}
