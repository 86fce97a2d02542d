//! Static protocol registry: program IDs and the funding ("money") mints.

use crate::types::Protocol;

pub const JUPITER_V6: &str = "JUP6LkbZbjS1jKKwapdHNy74zcZ3tLUZoi5QNyVTaV4";
pub const METEORA_DLMM: &str = "LBUZKhRxPF3XUpBCjp4YzTKgLccjZhTSDM9YuVaPwxo";
pub const TOKEN_PROGRAM: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";
pub const ASSOCIATED_TOKEN_PROGRAM: &str = "ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL";
pub const SYSTEM_PROGRAM: &str = "11111111111111111111111111111111";

pub const SOL_MINT: &str = "So11111111111111111111111111111111111111112";
pub const USDC_MINT: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";
pub const USDT_MINT: &str = "Es9vMFrzaCERmJfrF4H2FYD4KCoNkY11McCe8BenwNYB";

/// Known programs in classification precedence order (first match wins).
pub const PROGRAM_PRECEDENCE: [(&str, Protocol); 5] = [
    (JUPITER_V6, Protocol::Jupiter),
    (METEORA_DLMM, Protocol::MeteoraDlmm),
    (TOKEN_PROGRAM, Protocol::SplToken),
    (ASSOCIATED_TOKEN_PROGRAM, Protocol::AssociatedToken),
    (SYSTEM_PROGRAM, Protocol::System),
];

const FUNDING_TOKENS: [(&str, &str); 3] = [
    (SOL_MINT, "SOL"),
    (USDC_MINT, "USDC"),
    (USDT_MINT, "USDT"),
];

pub fn is_known_funding_token(mint: &str) -> bool {
    FUNDING_TOKENS.iter().any(|(known, _)| *known == mint)
}

/// Ticker for a funding mint; unknown mints render as their first 8 chars.
pub fn funding_symbol(mint: &str) -> String {
    FUNDING_TOKENS
        .iter()
        .find(|(known, _)| *known == mint)
        .map(|(_, symbol)| symbol.to_string())
        .unwrap_or_else(|| mint.chars().take(8).collect())
}
