//! Research snapshots: TTL policy, insufficient-data override and the
//! derived read model.

use std::sync::Arc;

use log::{info, warn};
use serde_json::{json, Map};

use super::entity::numeric;
use crate::error::{MemoryError, MemoryResult};
use crate::ids::now_millis;
use crate::repositories::{EntityRepository, EventRepository, RepresentationRepository, ResearchRepository, TimelineFilters};
use crate::types::{
    CreateEntityEventInput, CreateResearchInput, Entity, EntityResearch, EntityType, EventSource, EventSourceType,
    EventType, FreshnessResult, ResearchFindings, ResearchResult, ResearchSource, Sentiment, Urgency,
};

pub const MIN_TTL_SECONDS: u64 = 5 * 60;
pub const MAX_TTL_SECONDS: u64 = 24 * 60 * 60;
pub const MIN_SUCCESSFUL_SOURCES: usize = 2;
pub const INSUFFICIENT_DATA_TTL_SECONDS: u64 = 10 * 60;
pub const DEFAULT_MAX_AGE_MS: i64 = 60 * 60 * 1000;
const RECENT_EVENTS_LIMIT: usize = 20;

#[derive(Debug, Clone, PartialEq)]
pub struct StoreResearch {
    pub findings: ResearchFindings,
    pub sources: Vec<ResearchSource>,
    /// Seconds; defaults by entity type. Always clamped.
    pub ttl: Option<u64>,
    pub timestamp: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletedResearch {
    pub record: EntityResearch,
    /// Percentage of sources that succeeded.
    pub data_completeness: u8,
}

#[derive(Clone)]
pub struct ResearchService {
    entities: Arc<EntityRepository>,
    representations: Arc<RepresentationRepository>,
    events: Arc<EventRepository>,
    research: Arc<ResearchRepository>,
}

impl ResearchService {
    pub fn new(
        entities: Arc<EntityRepository>,
        representations: Arc<RepresentationRepository>,
        events: Arc<EventRepository>,
        research: Arc<ResearchRepository>,
    ) -> Self {
        Self {
            entities,
            representations,
            events,
            research,
        }
    }

    pub fn default_ttl_seconds(&self, entity: &Entity) -> u64 {
        match entity.entity_type {
            EntityType::Meme => 10 * 60,
            EntityType::CryptoToken => 60 * 60,
            EntityType::MacroAsset => 4 * 60 * 60,
            _ => 30 * 60,
        }
    }

    pub fn check_research_freshness(&self, entity_id: &str, max_age_ms: i64) -> FreshnessResult {
        self.research.check_freshness(entity_id, max_age_ms)
    }

    pub fn get_cached_research(&self, entity_id: &str) -> Option<EntityResearch> {
        self.research.get_latest(entity_id)
    }

    pub fn store_research_results(&self, entity_id: &str, input: StoreResearch) -> MemoryResult<EntityResearch> {
        let entity = self
            .entities
            .find_by_id(entity_id)
            .ok_or_else(|| MemoryError::EntityNotFound(entity_id.to_string()))?;

        let ttl = clamp_ttl(input.ttl.unwrap_or_else(|| self.default_ttl_seconds(&entity)));
        Ok(self.research.create(CreateResearchInput {
            entity_id: entity_id.to_string(),
            findings: input.findings,
            sources: input.sources,
            ttl,
            timestamp: input.timestamp,
        }))
    }

    /// Stores a finished research pass. With fewer than
    /// [`MIN_SUCCESSFUL_SOURCES`] successful sources the supplied findings are
    /// replaced by a low-confidence record with a short TTL. Always appends a
    /// `research-completed` event.
    pub fn complete_research(
        &self,
        entity_id: &str,
        findings: ResearchFindings,
        sources: Vec<ResearchSource>,
        ttl: Option<u64>,
    ) -> MemoryResult<CompletedResearch> {
        if self.entities.find_by_id(entity_id).is_none() {
            return Err(MemoryError::EntityNotFound(entity_id.to_string()));
        }

        let successful = sources.iter().filter(|source| source.success).count();
        let data_completeness = data_completeness(successful, sources.len());

        let (findings, ttl) = if successful < MIN_SUCCESSFUL_SOURCES {
            warn!(
                "⚠️ Only {}/{} research sources succeeded for {}, storing insufficient-data record",
                successful,
                sources.len(),
                entity_id
            );
            (insufficient_findings(), Some(INSUFFICIENT_DATA_TTL_SECONDS))
        } else {
            (findings, ttl)
        };

        let mut data = Map::new();
        data.insert("confidence".to_string(), json!(findings.confidence));
        data.insert("dataCompleteness".to_string(), json!(data_completeness));
        self.events.create(CreateEntityEventInput {
            entity_id: entity_id.to_string(),
            related_entity_ids: None,
            timestamp: now_millis(),
            event_type: EventType::ResearchCompleted,
            summary: format!("Research completed: {}", findings.summary),
            representation_id: None,
            data,
            source: EventSource {
                source_type: EventSourceType::Manual,
                reference: None,
                confidence: Some(100),
            },
            importance: Some(5),
        });

        let record = self.store_research_results(
            entity_id,
            StoreResearch {
                findings,
                sources,
                ttl,
                timestamp: None,
            },
        )?;

        info!(
            "🔬 Research stored for {} (confidence={}, completeness={}%, ttl={}s)",
            entity_id, record.findings.confidence, data_completeness, record.ttl
        );
        Ok(CompletedResearch {
            record,
            data_completeness,
        })
    }

    /// `None` until the entity exists and has at least one snapshot.
    pub fn to_research_result(&self, entity_id: &str) -> Option<ResearchResult> {
        let entity = self.entities.find_by_id(entity_id)?;
        let latest = self.research.get_latest(entity_id)?;

        let successful = latest.sources.iter().filter(|source| source.success).count();
        let confidence = latest.findings.confidence;
        let risk_score = risk_score(&latest.findings);

        Some(ResearchResult {
            entity_id: entity.id,
            slug: entity.slug,
            symbol: entity.symbol,
            summary: latest.findings.summary,
            sentiment: latest.findings.sentiment.unwrap_or_default(),
            confidence,
            risk_score,
            risks: latest.findings.risks,
            opportunities: latest.findings.opportunities,
            urgency: urgency(confidence, risk_score),
            tradeable: confidence >= 40 && risk_score < 80,
            data_completeness: data_completeness(successful, latest.sources.len()),
            representations: self.representations.find_many_by_entity_id(entity_id, true),
            recent_events: self.events.query_timeline(
                entity_id,
                &TimelineFilters {
                    limit: Some(RECENT_EVENTS_LIMIT),
                    ..TimelineFilters::default()
                },
            ),
            sources: latest.sources,
            timestamp: latest.timestamp,
            expires_at: latest.expires_at,
        })
    }
}

pub fn clamp_ttl(ttl: u64) -> u64 {
    ttl.clamp(MIN_TTL_SECONDS, MAX_TTL_SECONDS)
}

fn insufficient_findings() -> ResearchFindings {
    ResearchFindings {
        summary: "Insufficient data sources available".to_string(),
        sentiment: Some(Sentiment::Unknown),
        confidence: 20,
        risks: vec!["Insufficient data available".to_string()],
        opportunities: Vec::new(),
        metadata: Map::new(),
    }
}

fn data_completeness(successful: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    ((successful as f64 / total as f64) * 100.0).round() as u8
}

/// `100 - rugcheckScore(50) + min(40, top10Concentration / 2)`, clamped.
fn risk_score(findings: &ResearchFindings) -> u8 {
    let metadata = &findings.metadata;
    let rugcheck = metadata.get("rugcheckScore").and_then(numeric).unwrap_or(50.0);
    let concentration = metadata.get("top10Concentration").and_then(numeric).unwrap_or(0.0);

    let risk = (100.0 - rugcheck) + (concentration * 0.5).min(40.0);
    risk.round().clamp(0.0, 100.0) as u8
}

fn urgency(confidence: u8, risk_score: u8) -> Urgency {
    match (confidence, risk_score) {
        (c, r) if c >= 80 && r < 40 => Urgency::Immediate,
        (c, r) if c >= 65 && r < 60 => Urgency::High,
        (c, _) if c >= 40 => Urgency::Medium,
        _ => Urgency::Low,
    }
}
