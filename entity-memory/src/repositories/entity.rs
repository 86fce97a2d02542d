use std::collections::HashMap;

use log::debug;
use parking_lot::RwLock;

use crate::error::{MemoryError, MemoryResult};
use crate::ids::{create_id, normalize_symbol, now_millis};
use crate::types::{CreateEntityInput, Entity, EntityType, EntityUpdate};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntitySearchFilters {
    pub entity_type: Option<EntityType>,
    pub symbol: Option<String>,
    pub verified: Option<bool>,
    pub category: Option<String>,
}

/// Entities in insertion order, indexed by id and slug.
#[derive(Default)]
struct EntityIndex {
    entities: Vec<Entity>,
    by_id: HashMap<String, usize>,
    by_slug: HashMap<String, usize>,
}

impl EntityIndex {
    fn get(&self, id: &str) -> Option<&Entity> {
        self.by_id.get(id).map(|&pos| &self.entities[pos])
    }
}

#[derive(Default)]
pub struct EntityRepository {
    index: RwLock<EntityIndex>,
}

impl EntityRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the entity under `slug`. The slug must already be unique.
    pub fn create(&self, slug: String, input: CreateEntityInput) -> MemoryResult<Entity> {
        let mut index = self.index.write();
        if index.by_slug.contains_key(&slug) {
            return Err(MemoryError::DuplicateSlug(slug));
        }

        let now = now_millis();
        let entity = Entity {
            id: create_id(),
            slug,
            name: input.name,
            symbol: normalize_symbol(input.symbol.as_deref()),
            entity_type: input.entity_type,
            verified: input.verified,
            verified_by: input.verified_by,
            metadata: input.metadata,
            created_at: now,
            updated_at: now,
        };

        let pos = index.entities.len();
        index.by_id.insert(entity.id.clone(), pos);
        index.by_slug.insert(entity.slug.clone(), pos);
        index.entities.push(entity.clone());

        debug!("Created entity {} ({})", entity.slug, entity.id);
        Ok(entity)
    }

    pub fn find_by_id(&self, id: &str) -> Option<Entity> {
        self.index.read().get(id).cloned()
    }

    pub fn find_by_slug(&self, slug: &str) -> Option<Entity> {
        let index = self.index.read();
        index.by_slug.get(slug).map(|&pos| index.entities[pos].clone())
    }

    pub fn slug_exists(&self, slug: &str) -> bool {
        self.index.read().by_slug.contains_key(slug)
    }

    pub fn find_by_symbol(&self, symbol: &str) -> Vec<Entity> {
        let Some(symbol) = normalize_symbol(Some(symbol)) else {
            return Vec::new();
        };
        self.filter(|entity| entity.symbol.as_deref() == Some(symbol.as_str()))
    }

    /// Case-insensitive substring match on name.
    pub fn search_by_name(&self, query: &str) -> Vec<Entity> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }
        self.filter(|entity| entity.name.to_lowercase().contains(&query))
    }

    pub fn search(&self, filters: &EntitySearchFilters) -> Vec<Entity> {
        let symbol = filters
            .symbol
            .as_deref()
            .and_then(|symbol| normalize_symbol(Some(symbol)));

        self.filter(|entity| {
            if filters.entity_type.is_some_and(|wanted| entity.entity_type != wanted) {
                return false;
            }
            if symbol.is_some() && entity.symbol != symbol {
                return false;
            }
            if filters.verified.is_some_and(|wanted| entity.verified != wanted) {
                return false;
            }
            if let Some(category) = &filters.category {
                if !entity.metadata.category.contains(category) {
                    return false;
                }
            }
            true
        })
    }

    pub fn update(&self, id: &str, update: EntityUpdate) -> MemoryResult<Entity> {
        let mut index = self.index.write();
        let pos = *index
            .by_id
            .get(id)
            .ok_or_else(|| MemoryError::EntityNotFound(id.to_string()))?;

        if let Some(slug) = &update.slug {
            if *slug != index.entities[pos].slug {
                if index.by_slug.contains_key(slug) {
                    return Err(MemoryError::DuplicateSlug(slug.clone()));
                }
                let old = index.entities[pos].slug.clone();
                index.by_slug.remove(&old);
                index.by_slug.insert(slug.clone(), pos);
            }
        }

        let entity = &mut index.entities[pos];
        if let Some(slug) = update.slug {
            entity.slug = slug;
        }
        if let Some(name) = update.name {
            entity.name = name;
        }
        if update.symbol.is_some() {
            entity.symbol = normalize_symbol(update.symbol.as_deref());
        }
        if let Some(entity_type) = update.entity_type {
            entity.entity_type = entity_type;
        }
        if let Some(verified) = update.verified {
            entity.verified = verified;
        }
        if update.verified_by.is_some() {
            entity.verified_by = update.verified_by;
        }
        if let Some(metadata) = update.metadata {
            entity.metadata.merge(metadata);
        }
        entity.updated_at = now_millis();

        Ok(entity.clone())
    }

    pub fn all(&self) -> Vec<Entity> {
        self.index.read().entities.clone()
    }

    pub fn len(&self) -> usize {
        self.index.read().entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn filter<P>(&self, predicate: P) -> Vec<Entity>
    where
        P: Fn(&Entity) -> bool,
    {
        self.index
            .read()
            .entities
            .iter()
            .filter(|entity| predicate(entity))
            .cloned()
            .collect()
    }
}
