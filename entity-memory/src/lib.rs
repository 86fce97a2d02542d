//! In-memory knowledge base of entities, their on-chain representations,
//! timeline events and TTL-bounded research snapshots.
//!
//! Storage is owned by an explicitly constructed [`EntityMemory`]; callers
//! only go through its services.

pub mod error;
pub mod ids;
pub mod repositories;
pub mod seeds;
pub mod services;
pub mod types;

use std::sync::Arc;

use log::info;

pub use error::{MemoryError, MemoryResult};
pub use repositories::{
    EntityRepository, EntitySearchFilters, EventRepository, RepresentationRepository, ResearchRepository,
    TimelineFilters,
};
pub use services::{
    CacheService, CompletedResearch, EntityService, Resolution, ResearchService, StoreResearch, UnverifiedClaim,
};
pub use types::*;

#[derive(Clone)]
pub struct Repositories {
    pub entities: Arc<EntityRepository>,
    pub representations: Arc<RepresentationRepository>,
    pub events: Arc<EventRepository>,
    pub research: Arc<ResearchRepository>,
}

#[derive(Clone)]
pub struct EntityMemory {
    pub repositories: Repositories,
    pub entities: EntityService,
    pub research: ResearchService,
    pub cache: CacheService,
}

impl EntityMemory {
    pub fn new() -> Self {
        let repositories = Repositories {
            entities: Arc::new(EntityRepository::new()),
            representations: Arc::new(RepresentationRepository::new()),
            events: Arc::new(EventRepository::new()),
            research: Arc::new(ResearchRepository::new()),
        };

        let entities = EntityService::new(
            repositories.entities.clone(),
            repositories.representations.clone(),
            repositories.research.clone(),
        );
        let research = ResearchService::new(
            repositories.entities.clone(),
            repositories.representations.clone(),
            repositories.events.clone(),
            repositories.research.clone(),
        );
        let cache = CacheService::new(research.clone());

        Self {
            repositories,
            entities,
            research,
            cache,
        }
    }

    pub fn with_seeds() -> MemoryResult<Self> {
        let memory = Self::new();
        memory.seed()?;
        Ok(memory)
    }

    /// Creates every seed entity whose slug is still free. Returns how many
    /// were created.
    pub fn seed(&self) -> MemoryResult<usize> {
        let mut created = 0;
        for input in seeds::initial_entities() {
            let taken = input
                .slug
                .as_deref()
                .is_some_and(|slug| self.repositories.entities.slug_exists(slug));
            if taken {
                continue;
            }
            self.entities.create_entity(input)?;
            created += 1;
        }
        info!("🌱 Seeded {} entities", created);
        Ok(created)
    }
}

impl Default for EntityMemory {
    fn default() -> Self {
        Self::new()
    }
}
