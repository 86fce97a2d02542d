use parking_lot::RwLock;

use crate::ids::{create_id, now_millis};
use crate::types::{CreateEntityEventInput, EntityEvent, EventType};

pub const DEFAULT_IMPORTANCE: u8 = 5;
const MAX_IMPORTANCE: u8 = 10;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimelineFilters {
    /// Empty means any type.
    pub types: Vec<EventType>,
    pub since: Option<i64>,
    pub until: Option<i64>,
    pub min_importance: Option<u8>,
    pub limit: Option<usize>,
}

/// Write-once event log.
#[derive(Default)]
pub struct EventRepository {
    events: RwLock<Vec<EntityEvent>>,
}

impl EventRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, input: CreateEntityEventInput) -> EntityEvent {
        let event = EntityEvent {
            id: create_id(),
            entity_id: input.entity_id,
            related_entity_ids: input.related_entity_ids,
            timestamp: input.timestamp,
            event_type: input.event_type,
            summary: input.summary,
            representation_id: input.representation_id,
            data: input.data,
            source: input.source,
            importance: input.importance.unwrap_or(DEFAULT_IMPORTANCE).min(MAX_IMPORTANCE),
            created_at: now_millis(),
        };
        self.events.write().push(event.clone());
        event
    }

    /// Newest first.
    pub fn query_timeline(&self, entity_id: &str, filters: &TimelineFilters) -> Vec<EntityEvent> {
        let mut events: Vec<EntityEvent> = self
            .events
            .read()
            .iter()
            .filter(|event| event.entity_id == entity_id)
            .filter(|event| filters.types.is_empty() || filters.types.contains(&event.event_type))
            .filter(|event| filters.since.map_or(true, |since| event.timestamp >= since))
            .filter(|event| filters.until.map_or(true, |until| event.timestamp <= until))
            .filter(|event| filters.min_importance.map_or(true, |min| event.importance >= min))
            .cloned()
            .collect();

        events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        if let Some(limit) = filters.limit {
            events.truncate(limit);
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EventSource, EventSourceType};
    use serde_json::Map;

    fn event(entity_id: &str, timestamp: i64, event_type: EventType, importance: Option<u8>) -> CreateEntityEventInput {
        CreateEntityEventInput {
            entity_id: entity_id.to_string(),
            related_entity_ids: None,
            timestamp,
            event_type,
            summary: format!("{:?} at {}", event_type, timestamp),
            representation_id: None,
            data: Map::new(),
            source: EventSource {
                source_type: EventSourceType::Transaction,
                reference: None,
                confidence: None,
            },
            importance,
        }
    }

    #[test]
    fn test_importance_defaults_and_caps() {
        let repo = EventRepository::new();
        assert_eq!(repo.create(event("e1", 1, EventType::Trade, None)).importance, 5);
        assert_eq!(repo.create(event("e1", 2, EventType::Trade, Some(42))).importance, 10);
    }

    #[test]
    fn test_timeline_filters_and_order() {
        let repo = EventRepository::new();
        repo.create(event("e1", 100, EventType::Trade, Some(2)));
        repo.create(event("e1", 300, EventType::News, Some(8)));
        repo.create(event("e1", 200, EventType::Trade, Some(6)));
        repo.create(event("e2", 250, EventType::Trade, Some(9)));

        let all = repo.query_timeline("e1", &TimelineFilters::default());
        assert_eq!(all.iter().map(|e| e.timestamp).collect::<Vec<_>>(), [300, 200, 100]);

        let trades = repo.query_timeline(
            "e1",
            &TimelineFilters {
                types: vec![EventType::Trade],
                min_importance: Some(5),
                ..Default::default()
            },
        );
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].timestamp, 200);

        let window = repo.query_timeline(
            "e1",
            &TimelineFilters {
                since: Some(150),
                until: Some(300),
                limit: Some(1),
                ..Default::default()
            },
        );
        assert_eq!(window.len(), 1);
        assert_eq!(window[0].timestamp, 300);
    }
}
