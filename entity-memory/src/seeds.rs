//! Well-known entities preloaded at startup.

use crate::types::{CreateEntityInput, EntityMetadata, EntityType, Verifier};

fn seed(slug: &str, name: &str, symbol: Option<&str>, entity_type: EntityType, category: &str) -> CreateEntityInput {
    CreateEntityInput {
        slug: Some(slug.to_string()),
        name: name.to_string(),
        symbol: symbol.map(String::from),
        entity_type,
        verified: true,
        verified_by: Some(Verifier::Community),
        metadata: EntityMetadata::with_category([category]),
    }
}

pub fn initial_entities() -> Vec<CreateEntityInput> {
    let mut solana = seed("solana", "Solana", Some("SOL"), EntityType::CryptoToken, "layer1");
    solana.metadata.tags = Some(vec!["chain:solana".to_string()]);

    vec![
        solana,
        seed("bitcoin", "Bitcoin", Some("BTC"), EntityType::CryptoToken, "store-of-value"),
        seed("gold", "Gold", Some("XAU"), EntityType::MacroAsset, "commodity"),
        seed("jupiter", "Jupiter", None, EntityType::Protocol, "dex"),
    ]
}
