use dashmap::DashMap;

use crate::ids::{create_id, now_millis};
use crate::types::{CreateResearchInput, EntityResearch, FreshnessResult};

/// Research snapshots grouped per entity. Snapshots accumulate; nothing is
/// overwritten.
#[derive(Default)]
pub struct ResearchRepository {
    by_entity: DashMap<String, Vec<EntityResearch>>,
}

impl ResearchRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, input: CreateResearchInput) -> EntityResearch {
        let created_at = now_millis();
        let timestamp = input.timestamp.unwrap_or(created_at);
        let research = EntityResearch {
            id: create_id(),
            entity_id: input.entity_id,
            timestamp,
            ttl: input.ttl,
            expires_at: timestamp.saturating_add((input.ttl as i64).saturating_mul(1000)),
            findings: input.findings,
            sources: input.sources,
            created_at,
        };

        self.by_entity
            .entry(research.entity_id.clone())
            .or_default()
            .push(research.clone());
        research
    }

    /// Snapshot with the greatest timestamp; the earliest stored wins ties.
    pub fn get_latest(&self, entity_id: &str) -> Option<EntityResearch> {
        let records = self.by_entity.get(entity_id)?;
        records
            .iter()
            .fold(None::<&EntityResearch>, |best, record| match best {
                Some(best) if best.timestamp >= record.timestamp => Some(best),
                _ => Some(record),
            })
            .cloned()
    }

    pub fn count(&self, entity_id: &str) -> usize {
        self.by_entity.get(entity_id).map_or(0, |records| records.len())
    }

    pub fn check_freshness(&self, entity_id: &str, max_age_ms: i64) -> FreshnessResult {
        self.check_freshness_at(entity_id, max_age_ms, now_millis())
    }

    /// Fresh only while younger than `max_age_ms` and before the TTL expiry.
    pub fn check_freshness_at(&self, entity_id: &str, max_age_ms: i64, now: i64) -> FreshnessResult {
        let Some(latest) = self.get_latest(entity_id) else {
            return FreshnessResult::default();
        };

        let age = now - latest.timestamp;
        FreshnessResult {
            exists: true,
            fresh: age < max_age_ms && now < latest.expires_at,
            age: Some(age),
            expires_at: Some(latest.expires_at),
        }
    }
}
