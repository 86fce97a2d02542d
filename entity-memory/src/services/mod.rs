mod cache;
mod entity;
mod research;

pub use cache::CacheService;
pub use entity::{EntityService, Resolution, UnverifiedClaim};
pub use research::{
    CompletedResearch, ResearchService, StoreResearch, DEFAULT_MAX_AGE_MS, INSUFFICIENT_DATA_TTL_SECONDS,
    MAX_TTL_SECONDS, MIN_SUCCESSFUL_SOURCES, MIN_TTL_SECONDS,
};
