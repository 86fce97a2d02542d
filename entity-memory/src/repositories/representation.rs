use log::debug;
use parking_lot::RwLock;

use crate::error::{MemoryError, MemoryResult};
use crate::ids::{create_id, now_millis};
use crate::types::{CreateRepresentationInput, Representation, RepresentationType};

fn normalize(value: Option<&str>) -> String {
    value.unwrap_or_default().trim().to_lowercase()
}

/// Identifying fields only collide when both sides carry one.
fn same_key(current: Option<&str>, input: Option<&str>) -> bool {
    matches!((current, input), (Some(a), Some(b)) if a == b)
}

#[derive(Default)]
pub struct RepresentationRepository {
    representations: RwLock<Vec<Representation>>,
}

impl RepresentationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, input: CreateRepresentationInput) -> MemoryResult<Representation> {
        let mut representations = self.representations.write();
        ensure_unique(&representations, &input)?;

        let now = now_millis();
        let representation = Representation {
            id: create_id(),
            entity_id: input.entity_id,
            representation_type: input.representation_type,
            protocol: input.protocol,
            chain: input.chain,
            context: input.context,
            active: input.active.unwrap_or(true),
            discovered_at: now,
            last_seen_at: now,
        };
        representations.push(representation.clone());

        debug!(
            "Added {} representation {} for entity {}",
            representation.representation_type.as_str(),
            representation.id,
            representation.entity_id
        );
        Ok(representation)
    }

    pub fn find_by_id(&self, id: &str) -> Option<Representation> {
        self.representations.read().iter().find(|r| r.id == id).cloned()
    }

    /// Exact match on `context.mint`. The first active record wins, falling
    /// back to the first retired one.
    pub fn find_by_mint(&self, mint: &str) -> Option<Representation> {
        let representations = self.representations.read();
        let mut matches = representations.iter().filter(|r| r.context.mint.as_deref() == Some(mint));
        let first = matches.clone().next();
        matches.find(|r| r.active).or(first).cloned()
    }

    pub fn find_many_by_entity_id(&self, entity_id: &str, active_only: bool) -> Vec<Representation> {
        self.representations
            .read()
            .iter()
            .filter(|r| r.entity_id == entity_id && (!active_only || r.active))
            .cloned()
            .collect()
    }

    /// Bumps `last_seen_at`. Unknown ids are ignored.
    pub fn touch(&self, id: &str) {
        if let Some(representation) = self.representations.write().iter_mut().find(|r| r.id == id) {
            representation.last_seen_at = now_millis();
        }
    }

    pub fn deactivate(&self, id: &str) {
        if let Some(representation) = self.representations.write().iter_mut().find(|r| r.id == id) {
            representation.active = false;
            representation.last_seen_at = now_millis();
        }
    }

    pub fn all(&self) -> Vec<Representation> {
        self.representations.read().clone()
    }
}

/// Among active records, same type and protocol plus the same identifying
/// context field is a duplicate. Spot tokens additionally key on chain.
/// Records missing that field never conflict.
fn ensure_unique(existing: &[Representation], input: &CreateRepresentationInput) -> MemoryResult<()> {
    let protocol = normalize(Some(&input.protocol));
    let chain = normalize(input.chain.as_deref());

    for current in existing {
        if !current.active
            || current.representation_type != input.representation_type
            || normalize(Some(&current.protocol)) != protocol
        {
            continue;
        }

        match input.representation_type {
            RepresentationType::SpotToken => {
                if normalize(current.chain.as_deref()) == chain
                    && same_key(current.context.mint.as_deref(), input.context.mint.as_deref())
                {
                    return Err(MemoryError::DuplicateRepresentation {
                        kind: "spot-token",
                        detail: format!(
                            "protocol={}, chain={}, mint={}",
                            input.protocol,
                            input.chain.as_deref().unwrap_or("none"),
                            input.context.mint.as_deref().unwrap_or("none")
                        ),
                    });
                }
            }
            RepresentationType::PerpContract => {
                if same_key(current.context.market.as_deref(), input.context.market.as_deref()) {
                    return Err(MemoryError::DuplicateRepresentation {
                        kind: "perp-contract",
                        detail: format!(
                            "protocol={}, market={}",
                            input.protocol,
                            input.context.market.as_deref().unwrap_or("none")
                        ),
                    });
                }
            }
            RepresentationType::LpPair => {
                if same_key(current.context.pool_address.as_deref(), input.context.pool_address.as_deref()) {
                    return Err(MemoryError::DuplicateRepresentation {
                        kind: "lp-pair",
                        detail: format!(
                            "protocol={}, poolAddress={}",
                            input.protocol,
                            input.context.pool_address.as_deref().unwrap_or("none")
                        ),
                    });
                }
            }
            _ => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RepresentationContext;

    const MINT_A: &str = "7GCihgDB8fe6KNjn2MYtkzZcRjQy3t9GHdC8uHYmW2hr";
    const MINT_B: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";

    fn spot(entity_id: &str, protocol: &str, chain: Option<&str>, mint: &str) -> CreateRepresentationInput {
        CreateRepresentationInput {
            entity_id: entity_id.to_string(),
            representation_type: RepresentationType::SpotToken,
            protocol: protocol.to_string(),
            chain: chain.map(String::from),
            context: RepresentationContext::mint(mint),
            active: None,
        }
    }

    #[test]
    fn test_spot_token_uniqueness() {
        let repo = RepresentationRepository::new();
        repo.create(spot("e1", "unknown", Some("solana"), MINT_A)).unwrap();

        let err = repo
            .create(spot("e2", " Unknown ", Some("SOLANA"), MINT_A))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Duplicate spot-token representation: protocol= Unknown , chain=SOLANA, mint=7GCihgDB8fe6KNjn2MYtkzZcRjQy3t9GHdC8uHYmW2hr"
        );

        repo.create(spot("e1", "unknown", Some("solana"), MINT_B)).unwrap();
        repo.create(spot("e1", "raydium", Some("solana"), MINT_A)).unwrap();
        repo.create(spot("e1", "unknown", Some("ethereum"), MINT_A)).unwrap();
        assert_eq!(repo.all().len(), 4);
    }

    #[test]
    fn test_spot_tokens_without_mint_do_not_conflict() {
        let repo = RepresentationRepository::new();
        let unminted = |entity_id: &str| CreateRepresentationInput {
            context: RepresentationContext::default(),
            ..spot(entity_id, "unknown", Some("solana"), MINT_A)
        };

        repo.create(unminted("e1")).unwrap();
        repo.create(unminted("e2")).unwrap();
        assert_eq!(repo.find_many_by_entity_id("e1", true).len(), 1);
        assert_eq!(repo.find_many_by_entity_id("e2", true).len(), 1);

        // A minted record still collides with its twin.
        repo.create(spot("e3", "unknown", Some("solana"), MINT_A)).unwrap();
        assert!(repo.create(spot("e4", "unknown", Some("solana"), MINT_A)).is_err());
    }

    #[test]
    fn test_perp_and_lp_uniqueness() {
        let repo = RepresentationRepository::new();
        let perp = |market: &str| CreateRepresentationInput {
            entity_id: "e1".to_string(),
            representation_type: RepresentationType::PerpContract,
            protocol: "drift".to_string(),
            chain: None,
            context: RepresentationContext {
                market: Some(market.to_string()),
                ..Default::default()
            },
            active: None,
        };
        repo.create(perp("SOL-PERP")).unwrap();
        assert!(repo.create(perp("SOL-PERP")).is_err());
        repo.create(perp("BTC-PERP")).unwrap();

        let lp = CreateRepresentationInput {
            entity_id: "e1".to_string(),
            representation_type: RepresentationType::LpPair,
            protocol: "meteora".to_string(),
            chain: Some("solana".to_string()),
            context: RepresentationContext {
                pool_address: Some("pool-1".to_string()),
                ..Default::default()
            },
            active: None,
        };
        repo.create(lp.clone()).unwrap();
        assert!(matches!(
            repo.create(lp),
            Err(MemoryError::DuplicateRepresentation { kind: "lp-pair", .. })
        ));
    }

    #[test]
    fn test_find_touch_and_deactivate() {
        let repo = RepresentationRepository::new();
        let created = repo.create(spot("e1", "unknown", Some("solana"), MINT_A)).unwrap();

        assert_eq!(repo.find_by_mint(MINT_A).unwrap().id, created.id);
        assert!(repo.find_by_mint(MINT_B).is_none());

        repo.touch(&created.id);
        assert!(repo.find_by_id(&created.id).unwrap().last_seen_at >= created.last_seen_at);

        repo.deactivate(&created.id);
        assert!(repo.find_many_by_entity_id("e1", true).is_empty());
        assert_eq!(repo.find_many_by_entity_id("e1", false).len(), 1);

        // A retired mint can be registered again.
        assert_eq!(repo.find_by_mint(MINT_A).unwrap().id, created.id);
        let replacement = repo.create(spot("e2", "unknown", Some("solana"), MINT_A)).unwrap();
        assert_eq!(repo.find_by_mint(MINT_A).unwrap().id, replacement.id);

        repo.touch("missing");
        repo.deactivate("missing");
    }
}
