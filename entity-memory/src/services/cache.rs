use crate::types::Entity;

use super::research::ResearchService;

/// Freshness policy seen by the orchestrator.
#[derive(Clone)]
pub struct CacheService {
    research: ResearchService,
}

impl CacheService {
    pub fn new(research: ResearchService) -> Self {
        Self { research }
    }

    pub fn ttl_for_entity(&self, entity: &Entity) -> u64 {
        self.research.default_ttl_seconds(entity)
    }

    pub fn is_fresh(&self, entity_id: &str, max_age_ms: i64) -> bool {
        self.research.check_research_freshness(entity_id, max_age_ms).fresh
    }
}
