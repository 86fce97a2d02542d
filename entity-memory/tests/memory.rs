use entity_memory::{
    CreateRepresentationInput, EntityMemory, EntityType, RepresentationContext, RepresentationType,
    ResearchFindings, ResearchSource, Sentiment, StoreResearch, UnverifiedClaim,
};
use serde_json::Map;

const MINT: &str = "7GCihgDB8fe6KNjn2MYtkzZcRjQy3t9GHdC8uHYmW2hr";

fn findings(confidence: u8) -> ResearchFindings {
    ResearchFindings {
        summary: "Active holders".to_string(),
        sentiment: Some(Sentiment::Neutral),
        confidence,
        risks: vec![],
        opportunities: vec![],
        metadata: Map::new(),
    }
}

#[test]
fn test_unverified_token_lifecycle() {
    let memory = EntityMemory::with_seeds().unwrap();
    assert!(!memory.entities.resolve_identifier(MINT).is_found());

    let entity = memory
        .entities
        .create_unverified_entity_from_claim(UnverifiedClaim {
            name: "Token 7GCihg".to_string(),
            mint: Some(MINT.to_string()),
            entity_type: Some(EntityType::CryptoToken),
            ..Default::default()
        })
        .unwrap();
    memory
        .entities
        .add_representation(CreateRepresentationInput {
            entity_id: entity.id.clone(),
            representation_type: RepresentationType::SpotToken,
            protocol: "unknown".to_string(),
            chain: Some("solana".to_string()),
            context: RepresentationContext::mint(MINT),
            active: None,
        })
        .unwrap();

    let resolved = memory.entities.resolve_identifier(MINT).into_entity().unwrap();
    assert_eq!(resolved.id, entity.id);
    assert!(!memory.cache.is_fresh(&entity.id, 600_000));

    let sources = vec![
        ResearchSource::succeeded("get_token_metadata", 1),
        ResearchSource::succeeded("research_llm", 2),
    ];
    memory
        .research
        .complete_research(&entity.id, findings(72), sources, None)
        .unwrap();

    assert!(memory.cache.is_fresh(&entity.id, 600_000));
    let result = memory.research.to_research_result(&entity.id).unwrap();
    assert_eq!(result.confidence, 72);
    assert_eq!(result.representations.len(), 1);
    assert_eq!(memory.research.check_research_freshness(&entity.id, 600_000).expires_at, Some(result.expires_at));
}

#[test]
fn test_expired_snapshot_is_stale_even_inside_window() {
    let memory = EntityMemory::new();
    let entity = memory
        .entities
        .create_entity(entity_memory::CreateEntityInput::new("Wif", EntityType::Meme))
        .unwrap();

    // ttl is clamped up to 300s; stored 400s ago it has expired already
    let stored_at = entity_memory::ids::now_millis() - 400_000;
    memory
        .research
        .store_research_results(
            &entity.id,
            StoreResearch {
                findings: findings(60),
                sources: vec![],
                ttl: Some(1),
                timestamp: Some(stored_at),
            },
        )
        .unwrap();

    let freshness = memory.research.check_research_freshness(&entity.id, 3_600_000);
    assert!(freshness.exists);
    assert!(!freshness.fresh);
    assert!(freshness.age.unwrap() >= 400_000);
}
